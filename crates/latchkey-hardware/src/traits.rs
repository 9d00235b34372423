//! Hardware capability traits.
//!
//! These traits establish the contract between the door controller and its
//! peripherals. The controller depends only on these traits, so the serial
//! reader and the GPIO panel can be swapped for mocks in tests.
//!
//! Both traits are synchronous: every method returns as soon as the
//! hardware has been touched. Waiting (for bytes, for the grant hold, for
//! the exit button) is the controller's job, done with `tokio::time` between
//! calls.

use latchkey_core::Indicator;

use crate::error::Result;

/// Byte-level link to the badge reader.
///
/// All reads are non-blocking polls: they return immediately whether or
/// not the reader has sent anything.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::Transport;
/// use latchkey_hardware::error::Result;
///
/// fn drain<T: Transport>(transport: &mut T) -> Result<Vec<u8>> {
///     let mut bytes = Vec::new();
///     while transport.bytes_available()? > 0 {
///         if let Some(byte) = transport.read_byte()? {
///             bytes.push(byte);
///         }
///     }
///     Ok(bytes)
/// }
/// ```
pub trait Transport: Send {
    /// Check if the link is open and usable.
    fn is_open(&self) -> bool;

    /// Number of received bytes waiting to be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is closed or the device went away.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one byte, or `None` if nothing is waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is closed or the device went away.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Discard everything received but not yet read.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is closed or the device went away.
    fn flush_input(&mut self) -> Result<()>;
}

/// Door strike, status indicators and request-to-exit button.
///
/// # Examples
///
/// ```
/// use latchkey_core::Indicator;
/// use latchkey_hardware::ActuatorPanel;
/// use latchkey_hardware::error::Result;
///
/// fn show_idle<P: ActuatorPanel>(panel: &mut P) -> Result<()> {
///     panel.lock()?;
///     panel.set_indicator(Indicator::Granted, false)?;
///     panel.set_indicator(Indicator::Denied, true)
/// }
/// ```
pub trait ActuatorPanel: Send {
    /// Engage the strike.
    fn lock(&mut self) -> Result<()>;

    /// Release the strike.
    fn unlock(&mut self) -> Result<()>;

    /// Switch a status indicator on or off.
    fn set_indicator(&mut self, indicator: Indicator, on: bool) -> Result<()>;

    /// Check if the request-to-exit button is pressed right now.
    fn sample_exit_button(&mut self) -> Result<bool>;
}
