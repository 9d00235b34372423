//! Core constants for the Latchkey door controller.
//!
//! This module centralizes the framing bytes of the badge reader's serial
//! protocol, the default timings of the door cycle, and the default wiring
//! of the controller board.
//!
//! # Reader Framing
//!
//! The badge reader sends each credential as an unframed ASCII run wrapped
//! between a line feed and a carriage return:
//!
//! ```text
//! <preamble> LF <code> CR <anything>
//!            0x0A       0x0D
//! ```
//!
//! There is no checksum and no length prefix, so the decoder caps its
//! accumulation buffer at [`MAX_FRAME_BUFFER`] bytes.
//!
//! # Usage
//!
//! ```
//! use latchkey_core::constants::*;
//!
//! assert_eq!(FRAME_START, b'\n');
//! assert_eq!(FRAME_END, b'\r');
//! assert_eq!(MAX_FRAME_BUFFER, 41);
//! ```

// ============================================================================
// Reader Framing
// ============================================================================

/// Byte that opens a credential frame (line feed).
pub const FRAME_START: u8 = b'\n';

/// Byte that closes a credential frame (carriage return).
pub const FRAME_END: u8 = b'\r';

/// Maximum number of bytes the frame buffer may hold.
///
/// Feeding a byte that would push the buffer past this length discards the
/// whole buffer. A reader that never sends a terminator therefore cannot
/// grow memory, and garbage never survives more than one buffer's worth of
/// input.
pub const MAX_FRAME_BUFFER: usize = 41;

/// Maximum length of a stored credential code, in characters.
///
/// Matches the width of the `key_codes.code` column.
pub const MAX_CODE_LENGTH: usize = 26;

// ============================================================================
// Door Cycle Timing
// ============================================================================

/// Default time the granted indicator stays lit after an unlock (ms).
pub const DEFAULT_GRANT_HOLD_MS: u64 = 1_000;

/// Default interval between exit button samples (ms).
pub const DEFAULT_EXIT_POLL_MS: u64 = 100;

/// Default pause between transport polls when no byte is waiting (ms).
///
/// Keeps the read phase from spinning a core while the reader is idle.
pub const DEFAULT_READ_POLL_MS: u64 = 10;

// ============================================================================
// Serial Transport
// ============================================================================

/// Default serial device of the badge reader (Raspberry Pi UART).
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyAMA0";

/// Default baud rate of the badge reader.
pub const DEFAULT_BAUD_RATE: u32 = 2400;

// ============================================================================
// Storage
// ============================================================================

/// Default SQLite database file.
pub const DEFAULT_DATABASE_PATH: &str = "database.db";

/// Default maximum number of pooled database connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;

// ============================================================================
// GPIO Wiring (BCM numbering)
// ============================================================================

/// Green "access granted" LED.
pub const DEFAULT_GRANTED_LED_PIN: u8 = 23;

/// Red "denied / idle" LED.
pub const DEFAULT_DENIED_LED_PIN: u8 = 24;

/// Door strike relay.
pub const DEFAULT_STRIKE_PIN: u8 = 25;

/// Request-to-exit button.
///
/// The stock button is normally closed: the pin reads high while released
/// and low while pressed.
pub const DEFAULT_EXIT_BUTTON_PIN: u8 = 17;

/// Highest valid BCM GPIO number on the supported boards.
pub const MAX_GPIO_PIN: u8 = 27;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_delimiters_are_distinct() {
        assert_ne!(FRAME_START, FRAME_END);
    }

    #[test]
    fn test_code_fits_in_frame_buffer() {
        // LF + code + CR must fit, otherwise a valid code could never decode
        assert!(MAX_CODE_LENGTH + 2 <= MAX_FRAME_BUFFER);
    }

    #[test]
    fn test_default_pins_are_distinct() {
        let pins = [
            DEFAULT_GRANTED_LED_PIN,
            DEFAULT_DENIED_LED_PIN,
            DEFAULT_STRIKE_PIN,
            DEFAULT_EXIT_BUTTON_PIN,
        ];
        for (i, a) in pins.iter().enumerate() {
            for b in &pins[i + 1..] {
                assert_ne!(a, b);
            }
            assert!(*a <= MAX_GPIO_PIN);
        }
    }
}
