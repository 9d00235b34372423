use latchkey_hardware::HardwareError;

/// Result type alias for door controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Faults that stop the door controller.
///
/// Rejected badges and store outages are not errors; they end a cycle as
/// a denial.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The badge reader link is closed or failed.
    #[error("Badge reader fault: {0}")]
    Transport(#[source] HardwareError),

    /// The strike, an indicator or the exit button failed.
    #[error("Door panel fault: {0}")]
    Actuator(#[source] HardwareError),

    /// The controller attempted an illegal state change.
    #[error("State error: {0}")]
    State(#[from] latchkey_core::Error),
}

impl ControllerError {
    /// Check if the fault came from the badge reader.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if the fault came from the door panel.
    pub fn is_actuator(&self) -> bool {
        matches!(self, Self::Actuator(_))
    }
}
