//! Controller configuration.
//!
//! Configuration is layered:
//! 1. TOML file (base values)
//! 2. `LATCHKEY_*` environment variables (deployment overrides)
//! 3. CLI flags (applied by the binary on top of the result)
//!
//! Every section except `[timing]` has usable defaults. `[timing]` must at
//! least set `relock_settle_ms`: deployed doors have used both 5 s and 30 s
//! and neither is a safe guess.
//!
//! ```
//! use latchkey_core::LatchkeyConfig;
//!
//! let config = LatchkeyConfig::from_toml_str(r#"
//!     [serial]
//!     port = "/dev/ttyUSB0"
//!
//!     [timing]
//!     relock_settle_ms = 5000
//! "#).unwrap();
//!
//! assert_eq!(config.serial.port, "/dev/ttyUSB0");
//! assert_eq!(config.serial.baud_rate, 2400);
//! assert_eq!(config.timing.relock_settle().as_secs(), 5);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::*;
use crate::error::{Error, Result};

/// Environment variable overriding `serial.port`.
pub const ENV_SERIAL_PORT: &str = "LATCHKEY_SERIAL_PORT";
/// Environment variable overriding `serial.baud_rate`.
pub const ENV_BAUD_RATE: &str = "LATCHKEY_BAUD_RATE";
/// Environment variable overriding `database.path`.
pub const ENV_DATABASE_PATH: &str = "LATCHKEY_DATABASE_PATH";
/// Environment variable overriding `timing.relock_settle_ms`.
pub const ENV_RELOCK_SETTLE_MS: &str = "LATCHKEY_RELOCK_SETTLE_MS";

/// Top-level controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatchkeyConfig {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub database: DatabaseSection,

    pub timing: TimingConfig,

    #[serde(default)]
    pub gpio: GpioConfig,
}

/// Badge reader serial link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path.
    pub port: String,

    /// Baud rate.
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Credential database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite database file.
    pub path: String,

    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Door cycle timing, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// How long the granted indicator stays on after an unlock.
    #[serde(default = "default_grant_hold_ms")]
    pub grant_hold_ms: u64,

    /// Interval between exit button samples while unlocked.
    #[serde(default = "default_exit_poll_ms")]
    pub exit_poll_ms: u64,

    /// Delay between an exit button press and the re-lock. Required.
    pub relock_settle_ms: u64,

    /// Pause between transport polls while no byte is waiting.
    #[serde(default = "default_read_poll_ms")]
    pub read_poll_ms: u64,

    /// Abandon a read phase after this long without a code. Unset means wait
    /// forever.
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
}

fn default_grant_hold_ms() -> u64 {
    DEFAULT_GRANT_HOLD_MS
}

fn default_exit_poll_ms() -> u64 {
    DEFAULT_EXIT_POLL_MS
}

fn default_read_poll_ms() -> u64 {
    DEFAULT_READ_POLL_MS
}

impl TimingConfig {
    /// Timing with every default applied and the given settle delay.
    pub fn with_relock_settle_ms(relock_settle_ms: u64) -> Self {
        Self {
            grant_hold_ms: DEFAULT_GRANT_HOLD_MS,
            exit_poll_ms: DEFAULT_EXIT_POLL_MS,
            relock_settle_ms,
            read_poll_ms: DEFAULT_READ_POLL_MS,
            read_timeout_ms: None,
        }
    }

    pub fn grant_hold(&self) -> Duration {
        Duration::from_millis(self.grant_hold_ms)
    }

    pub fn exit_poll(&self) -> Duration {
        Duration::from_millis(self.exit_poll_ms)
    }

    pub fn relock_settle(&self) -> Duration {
        Duration::from_millis(self.relock_settle_ms)
    }

    pub fn read_poll(&self) -> Duration {
        Duration::from_millis(self.read_poll_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }
}

/// GPIO wiring of the door panel (BCM numbering).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub granted_led: u8,
    pub denied_led: u8,
    pub strike: u8,
    pub exit_button: u8,

    /// The exit button pulls its pin low when pressed.
    pub exit_button_active_low: bool,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            granted_led: DEFAULT_GRANTED_LED_PIN,
            denied_led: DEFAULT_DENIED_LED_PIN,
            strike: DEFAULT_STRIKE_PIN,
            exit_button: DEFAULT_EXIT_BUTTON_PIN,
            exit_button_active_low: true,
        }
    }
}

impl GpioConfig {
    fn pins(&self) -> [(&'static str, u8); 4] {
        [
            ("granted_led", self.granted_led),
            ("denied_led", self.denied_led),
            ("strike", self.strike),
            ("exit_button", self.exit_button),
        ]
    }
}

impl LatchkeyConfig {
    /// Configuration with every default applied and the given settle delay.
    pub fn with_relock_settle_ms(relock_settle_ms: u64) -> Self {
        Self {
            serial: SerialConfig::default(),
            database: DatabaseSection::default(),
            timing: TimingConfig::with_relock_settle_ms(relock_settle_ms),
            gpio: GpioConfig::default(),
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or the
    /// resulting configuration is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Self = toml::from_str(&text)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(ENV_SERIAL_PORT) {
            self.serial.port = port;
        }
        if let Some(baud) = lookup(ENV_BAUD_RATE) {
            self.serial.baud_rate = parse_number(ENV_BAUD_RATE, &baud)?;
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database.path = path;
        }
        if let Some(settle) = lookup(ENV_RELOCK_SETTLE_MS) {
            self.timing.relock_settle_ms = parse_number(ENV_RELOCK_SETTLE_MS, &settle)?;
        }
        Ok(())
    }

    /// Check the configuration for values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(Error::MissingConfig("serial.port".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("serial.baud_rate must be positive".to_string()));
        }
        if self.database.path.trim().is_empty() {
            return Err(Error::MissingConfig("database.path".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "database.max_connections must be positive".to_string(),
            ));
        }
        if self.timing.exit_poll_ms == 0 {
            return Err(Error::Config("timing.exit_poll_ms must be positive".to_string()));
        }
        if self.timing.read_poll_ms == 0 {
            return Err(Error::Config("timing.read_poll_ms must be positive".to_string()));
        }
        if self.timing.read_timeout_ms == Some(0) {
            return Err(Error::Config(
                "timing.read_timeout_ms must be positive when set".to_string(),
            ));
        }

        let pins = self.gpio.pins();
        for (i, (name, pin)) in pins.iter().enumerate() {
            if *pin > MAX_GPIO_PIN {
                return Err(Error::Config(format!(
                    "gpio.{} = {} is out of range (0-{})",
                    name, pin, MAX_GPIO_PIN
                )));
            }
            if let Some((other, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin) {
                return Err(Error::Config(format!(
                    "gpio.{} and gpio.{} share pin {}",
                    name, other, pin
                )));
            }
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} is not a valid number: {:?}", key, value)))
}
