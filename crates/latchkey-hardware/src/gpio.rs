//! Door panel over GPIO lines.
//!
//! [`GpioPanel`] is generic over `embedded-hal` 1.0 digital pins so it runs
//! on any board with a HAL. [`SysfsPin`] provides those pins on Linux through
//! the `/sys/class/gpio` files, which is what the controller binary uses.
//!
//! Wiring polarity:
//!
//! | Line | Meaning |
//! |---|---|
//! | strike | HIGH = locked, LOW = released |
//! | granted / denied LED | HIGH = lit |
//! | exit button | LOW = pressed (normally closed), unless configured otherwise |

use std::fs;
use std::path::{Path, PathBuf};

use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};
use tracing::{debug, info};

use latchkey_core::Indicator;
use latchkey_core::config::GpioConfig;

use crate::error::{HardwareError, Result};
use crate::traits::ActuatorPanel;

/// Default root of the Linux sysfs GPIO interface.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// [`ActuatorPanel`] driving four digital pins.
///
/// # Examples
///
/// ```no_run
/// use latchkey_core::config::GpioConfig;
/// use latchkey_hardware::{ActuatorPanel, GpioPanel};
///
/// # fn example() -> latchkey_hardware::Result<()> {
/// let mut panel = GpioPanel::from_sysfs(&GpioConfig::default())?;
/// panel.lock()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GpioPanel<S, G, D, B> {
    strike: S,
    granted_led: G,
    denied_led: D,
    exit_button: B,
    exit_active_low: bool,
}

impl<S, G, D, B> GpioPanel<S, G, D, B>
where
    S: OutputPin,
    G: OutputPin,
    D: OutputPin,
    B: InputPin,
{
    /// Assemble a panel from already configured pins.
    ///
    /// No line is driven until the first command.
    pub fn new(strike: S, granted_led: G, denied_led: D, exit_button: B) -> Self {
        Self {
            strike,
            granted_led,
            denied_led,
            exit_button,
            exit_active_low: true,
        }
    }

    /// Set whether the exit button reads LOW when pressed.
    pub fn with_exit_active_low(mut self, active_low: bool) -> Self {
        self.exit_active_low = active_low;
        self
    }
}

impl GpioPanel<SysfsPin, SysfsPin, SysfsPin, SysfsPin> {
    /// Export and configure the configured lines under `/sys/class/gpio`.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::InitializationFailed`] if a line cannot be
    /// exported or configured.
    pub fn from_sysfs(config: &GpioConfig) -> Result<Self> {
        Self::from_sysfs_root(SYSFS_GPIO_ROOT, config)
    }

    /// Same as [`from_sysfs`](Self::from_sysfs) with a different sysfs root.
    pub fn from_sysfs_root(root: impl AsRef<Path>, config: &GpioConfig) -> Result<Self> {
        let root = root.as_ref();
        info!(
            strike = config.strike,
            granted = config.granted_led,
            denied = config.denied_led,
            exit = config.exit_button,
            "Configuring door panel GPIO"
        );

        // The strike comes up driven high so the door never releases while
        // the panel is being configured.
        let strike = SysfsPin::export_in(root, config.strike, PinDirection::OutputHigh)?;
        let granted = SysfsPin::export_in(root, config.granted_led, PinDirection::Output)?;
        let denied = SysfsPin::export_in(root, config.denied_led, PinDirection::Output)?;
        let exit = SysfsPin::export_in(root, config.exit_button, PinDirection::Input)?;

        Ok(Self::new(strike, granted, denied, exit)
            .with_exit_active_low(config.exit_button_active_low))
    }
}

fn pin_error<E: digital::Error>(line: &str, error: E) -> HardwareError {
    HardwareError::gpio(line, format!("{:?}: {:?}", error.kind(), error))
}

fn drive<P: OutputPin>(pin: &mut P, high: bool) -> std::result::Result<(), P::Error> {
    if high { pin.set_high() } else { pin.set_low() }
}

impl<S, G, D, B> ActuatorPanel for GpioPanel<S, G, D, B>
where
    S: OutputPin + Send,
    G: OutputPin + Send,
    D: OutputPin + Send,
    B: InputPin + Send,
{
    fn lock(&mut self) -> Result<()> {
        debug!("strike high (locked)");
        self.strike.set_high().map_err(|e| pin_error("strike", e))
    }

    fn unlock(&mut self) -> Result<()> {
        debug!("strike low (released)");
        self.strike.set_low().map_err(|e| pin_error("strike", e))
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) -> Result<()> {
        match indicator {
            Indicator::Granted => {
                drive(&mut self.granted_led, on).map_err(|e| pin_error("granted_led", e))
            }
            Indicator::Denied => {
                drive(&mut self.denied_led, on).map_err(|e| pin_error("denied_led", e))
            }
        }
    }

    fn sample_exit_button(&mut self) -> Result<bool> {
        let level = if self.exit_active_low {
            self.exit_button.is_low()
        } else {
            self.exit_button.is_high()
        };
        level.map_err(|e| pin_error("exit_button", e))
    }
}

/// Direction a sysfs line is configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    /// Output, initially low.
    Output,
    /// Output, driven high as part of switching direction.
    OutputHigh,
}

impl PinDirection {
    fn as_sysfs(self) -> &'static str {
        match self {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
            PinDirection::OutputHigh => "high",
        }
    }
}

/// Error from a sysfs GPIO file.
#[derive(Debug, thiserror::Error)]
#[error("gpio{pin}: {source}")]
pub struct SysfsError {
    pin: u8,
    #[source]
    source: std::io::Error,
}

impl digital::Error for SysfsError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// One GPIO line driven through `/sys/class/gpio/gpioN/value`.
#[derive(Debug)]
pub struct SysfsPin {
    pin: u8,
    dir: PathBuf,
    direction: PinDirection,
}

impl SysfsPin {
    /// Export `pin` under `root` and set its direction.
    ///
    /// A line that is already exported is reused.
    pub fn export_in(root: impl AsRef<Path>, pin: u8, direction: PinDirection) -> Result<Self> {
        let root = root.as_ref();
        let dir = root.join(format!("gpio{}", pin));

        if !dir.is_dir() {
            fs::write(root.join("export"), pin.to_string()).map_err(|e| {
                HardwareError::initialization_failed(format!("export of gpio{} failed: {}", pin, e))
            })?;
            if !dir.is_dir() {
                return Err(HardwareError::initialization_failed(format!(
                    "gpio{} did not appear under {}",
                    pin,
                    root.display()
                )));
            }
        }

        fs::write(dir.join("direction"), direction.as_sysfs()).map_err(|e| {
            HardwareError::initialization_failed(format!(
                "setting gpio{} direction to {} failed: {}",
                pin,
                direction.as_sysfs(),
                e
            ))
        })?;

        Ok(Self { pin, dir, direction })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    fn write_value(&mut self, value: &str) -> std::result::Result<(), SysfsError> {
        fs::write(self.dir.join("value"), value).map_err(|source| SysfsError {
            pin: self.pin,
            source,
        })
    }

    fn read_value(&mut self) -> std::result::Result<bool, SysfsError> {
        let text = fs::read_to_string(self.dir.join("value"))
            .map_err(|source| SysfsError { pin: self.pin, source })?;
        Ok(text.trim() == "1")
    }
}

impl ErrorType for SysfsPin {
    type Error = SysfsError;
}

impl OutputPin for SysfsPin {
    fn set_low(&mut self) -> std::result::Result<(), Self::Error> {
        self.write_value("0")
    }

    fn set_high(&mut self) -> std::result::Result<(), Self::Error> {
        self.write_value("1")
    }
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> std::result::Result<bool, Self::Error> {
        self.read_value()
    }

    fn is_low(&mut self) -> std::result::Result<bool, Self::Error> {
        self.read_value().map(|high| !high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    /// Fake sysfs tree with the given lines already exported.
    fn fake_sysfs(pins: &[u8]) -> TempDir {
        let root = TempDir::new().unwrap();
        for pin in pins {
            let dir = root.path().join(format!("gpio{}", pin));
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("value"), "0\n").unwrap();
        }
        root
    }

    fn panel_pins(config: &GpioConfig) -> [u8; 4] {
        [
            config.granted_led,
            config.denied_led,
            config.strike,
            config.exit_button,
        ]
    }

    fn value(root: &TempDir, pin: u8) -> String {
        fs::read_to_string(root.path().join(format!("gpio{}/value", pin)))
            .unwrap()
            .trim()
            .to_string()
    }

    fn direction(root: &TempDir, pin: u8) -> String {
        fs::read_to_string(root.path().join(format!("gpio{}/direction", pin))).unwrap()
    }

    #[test]
    fn test_export_sets_direction() {
        let root = fake_sysfs(&[25, 17]);

        let strike = SysfsPin::export_in(root.path(), 25, PinDirection::OutputHigh).unwrap();
        let button = SysfsPin::export_in(root.path(), 17, PinDirection::Input).unwrap();

        assert_eq!(strike.pin(), 25);
        assert_eq!(button.direction(), PinDirection::Input);
        assert_eq!(direction(&root, 25), "high");
        assert_eq!(direction(&root, 17), "in");
        // Already exported lines are not exported again
        assert!(!root.path().join("export").exists());
    }

    #[test]
    fn test_export_missing_line_fails() {
        let root = fake_sysfs(&[]);
        let result = SysfsPin::export_in(root.path(), 4, PinDirection::Output);
        assert!(matches!(result, Err(HardwareError::InitializationFailed { .. })));
    }

    #[test]
    fn test_panel_drives_lines() {
        let config = GpioConfig::default();
        let root = fake_sysfs(&panel_pins(&config));
        let mut panel = GpioPanel::from_sysfs_root(root.path(), &config).unwrap();

        panel.lock().unwrap();
        assert_eq!(value(&root, config.strike), "1");
        panel.unlock().unwrap();
        assert_eq!(value(&root, config.strike), "0");

        panel.set_indicator(Indicator::Granted, true).unwrap();
        panel.set_indicator(Indicator::Denied, false).unwrap();
        assert_eq!(value(&root, config.granted_led), "1");
        assert_eq!(value(&root, config.denied_led), "0");
    }

    #[rstest]
    #[case(true, "0", true)]
    #[case(true, "1", false)]
    #[case(false, "1", true)]
    #[case(false, "0", false)]
    fn test_exit_button_polarity(
        #[case] active_low: bool,
        #[case] level: &str,
        #[case] pressed: bool,
    ) {
        let config = GpioConfig {
            exit_button_active_low: active_low,
            ..GpioConfig::default()
        };
        let root = fake_sysfs(&panel_pins(&config));
        let mut panel = GpioPanel::from_sysfs_root(root.path(), &config).unwrap();

        fs::write(root.path().join(format!("gpio{}/value", config.exit_button)), level).unwrap();
        assert_eq!(panel.sample_exit_button().unwrap(), pressed);
    }

    #[test]
    fn test_pin_failure_maps_to_gpio_error() {
        let config = GpioConfig::default();
        let root = fake_sysfs(&panel_pins(&config));
        let mut panel = GpioPanel::from_sysfs_root(root.path(), &config).unwrap();

        fs::remove_dir_all(root.path().join(format!("gpio{}", config.strike))).unwrap();

        match panel.lock() {
            Err(HardwareError::Gpio { line, .. }) => assert_eq!(line, "strike"),
            other => panic!("expected gpio error, got {:?}", other),
        }
    }
}
