//! Serial link to the badge reader.
//!
//! The reader is a plain UART device (2400 baud on the stock wiring). The
//! port is opened with a zero read timeout so every call on
//! [`SerialTransport`] is a non-blocking poll.

use std::io::{ErrorKind, Read};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info, warn};

use latchkey_core::config::SerialConfig;

use crate::error::{HardwareError, Result};
use crate::traits::Transport;

/// [`Transport`] backed by a serial port.
///
/// # Examples
///
/// ```no_run
/// use latchkey_core::config::SerialConfig;
/// use latchkey_hardware::{SerialTransport, Transport};
///
/// # fn example() -> latchkey_hardware::Result<()> {
/// let mut transport = SerialTransport::open(&SerialConfig::default())?;
/// assert!(transport.is_open());
///
/// if let Some(byte) = transport.read_byte()? {
///     println!("read {:#04x}", byte);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
    open: bool,
}

impl SerialTransport {
    /// Open the serial port described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] if the port cannot be
    /// opened. The controller must not start without its reader.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        info!(port = %config.port, baud = config.baud_rate, "Opening badge reader");

        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::ZERO)
            .open()
            .map_err(|e| {
                HardwareError::initialization_failed(format!(
                    "Serial connection {} couldn't be opened: {}",
                    config.port, e
                ))
            })?;

        Ok(Self {
            port,
            name: config.port.clone(),
            open: true,
        })
    }

    /// Device path the transport was opened on.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(HardwareError::disconnected(self.name.clone()))
        }
    }

    /// Mark the link dead and turn the driver error into a disconnect.
    fn fail(&mut self, error: impl std::fmt::Display) -> HardwareError {
        warn!(port = %self.name, %error, "Badge reader link failed");
        self.open = false;
        HardwareError::disconnected(format!("{}: {}", self.name, error))
    }
}

impl Transport for SerialTransport {
    fn is_open(&self) -> bool {
        self.open
    }

    fn bytes_available(&mut self) -> Result<usize> {
        self.ensure_open()?;
        match self.port.bytes_to_read() {
            Ok(n) => Ok(n as usize),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        self.ensure_open()?;
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(Some(byte[0])),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn flush_input(&mut self) -> Result<()> {
        self.ensure_open()?;
        match self.port.clear(ClearBuffer::Input) {
            Ok(()) => {
                debug!(port = %self.name, "Flushed reader input");
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .field("open", &self.open)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_port_fails_fast() {
        let config = SerialConfig {
            port: "/dev/latchkey-does-not-exist".to_string(),
            baud_rate: 2400,
        };

        let result = SerialTransport::open(&config);
        match result {
            Err(HardwareError::InitializationFailed { message }) => {
                assert!(message.contains("/dev/latchkey-does-not-exist"));
            }
            other => panic!("expected initialization failure, got {:?}", other),
        }
    }
}
