//! Hardware abstraction layer for the Latchkey door controller.
//!
//! The controller talks to the outside world through two narrow capability
//! traits:
//!
//! - [`Transport`]: the serial link to the badge reader, polled one byte at
//!   a time without blocking.
//! - [`ActuatorPanel`]: the door strike, the two status LEDs and the
//!   request-to-exit button.
//!
//! Each trait has one production implementation and one mock:
//!
//! | Trait | Production | Mock |
//! |---|---|---|
//! | [`Transport`] | [`SerialTransport`] (`serialport`) | [`MockTransport`](mock::MockTransport) |
//! | [`ActuatorPanel`] | [`GpioPanel`] (`embedded-hal` pins) | [`MockPanel`](mock::MockPanel) |
//!
//! # Example
//!
//! ```
//! use latchkey_core::Indicator;
//! use latchkey_hardware::mock::{ActuatorCall, MockPanel};
//! use latchkey_hardware::ActuatorPanel;
//!
//! let (mut panel, handle) = MockPanel::new();
//! panel.lock().unwrap();
//! panel.set_indicator(Indicator::Denied, true).unwrap();
//!
//! assert_eq!(
//!     handle.calls(),
//!     vec![ActuatorCall::Lock, ActuatorCall::Indicator(Indicator::Denied, true)]
//! );
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with the
//! [`HardwareError`] error type.

pub mod error;
pub mod gpio;
pub mod mock;
pub mod serial;
pub mod traits;

pub use error::{HardwareError, Result};
pub use gpio::{GpioPanel, PinDirection, SysfsError, SysfsPin};
pub use serial::SerialTransport;
pub use traits::{ActuatorPanel, Transport};
