//! Error types for hardware operations.
//!
//! This module defines error types specific to the serial link and the door
//! panel, covering a reader that cannot be opened or goes away, and GPIO
//! lines that cannot be driven or sampled.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Device is not connected or has been disconnected.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// A GPIO line could not be driven or read.
    #[error("GPIO error on {line}: {message}")]
    Gpio { line: String, message: String },
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    /// Create a new GPIO error.
    pub fn gpio(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gpio {
            line: line.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_error() {
        let error = HardwareError::disconnected("/dev/ttyAMA0");
        assert!(matches!(error, HardwareError::Disconnected { .. }));
        assert_eq!(error.to_string(), "Device disconnected: /dev/ttyAMA0");
    }

    #[test]
    fn test_initialization_error() {
        let error = HardwareError::initialization_failed("no such device");
        assert_eq!(error.to_string(), "Initialization failed: no such device");
    }

    #[test]
    fn test_gpio_error() {
        let error = HardwareError::gpio("strike", "permission denied");
        assert_eq!(error.to_string(), "GPIO error on strike: permission denied");
    }
}
