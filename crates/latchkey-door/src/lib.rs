//! Door access control for the Latchkey controller.
//!
//! This crate ties the pieces together:
//!
//! - [`CredentialGate`] decides whether a badge code opens the door.
//! - [`DoorStateMachine`] tracks the strike and its recent history.
//! - [`DoorController`] runs the read, grant and exit-watch loop over a
//!   [`Transport`](latchkey_hardware::Transport), an
//!   [`ActuatorPanel`](latchkey_hardware::ActuatorPanel) and a
//!   [`CredentialStore`](latchkey_storage::CredentialStore).
//!
//! # Failure handling
//!
//! | Fault | Effect |
//! |---|---|
//! | Reader link closed or failing | [`ControllerError::Transport`], loop stops |
//! | Credential store error | logged, code rejected, loop continues |
//! | Panel error | strike locked if possible, [`ControllerError::Actuator`], loop stops |

pub mod controller;
pub mod error;
pub mod gate;
pub mod state;
pub mod timing;

pub use controller::{CycleOutcome, DoorController};
pub use error::{ControllerError, Result};
pub use gate::{CredentialGate, Verdict};
pub use state::{DoorStateMachine, StateTransition};
pub use timing::DoorTimings;
