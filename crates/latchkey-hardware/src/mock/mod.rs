//! Mock device implementations for testing and development.
//!
//! Each mock comes paired with a handle. The mock is given to the code under
//! test; the handle stays with the test to inject input and inspect what the
//! mock was asked to do.

pub mod panel;
pub mod transport;

pub use panel::{ActuatorCall, MockPanel, MockPanelHandle};
pub use transport::{MockTransport, MockTransportHandle};
