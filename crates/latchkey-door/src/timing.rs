use std::time::Duration;

use latchkey_core::config::TimingConfig;
use latchkey_core::constants::{DEFAULT_EXIT_POLL_MS, DEFAULT_GRANT_HOLD_MS, DEFAULT_READ_POLL_MS};

/// Delays of one door cycle.
///
/// There is no default for `relock_settle`: deployments have used both 5 s
/// and 30 s.
///
/// ```
/// use std::time::Duration;
/// use latchkey_door::DoorTimings;
///
/// let timings = DoorTimings::new(Duration::from_secs(5))
///     .with_read_timeout(Some(Duration::from_secs(60)));
///
/// assert_eq!(timings.grant_hold, Duration::from_secs(1));
/// assert_eq!(timings.exit_poll_interval, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTimings {
    /// Granted indicator on-time after an unlock.
    pub grant_hold: Duration,

    /// Wait between exit button samples.
    pub exit_poll_interval: Duration,

    /// Wait between an exit press and the re-lock.
    pub relock_settle: Duration,

    /// Wait between reader polls while nothing is waiting.
    pub read_poll_interval: Duration,

    /// Give up a read phase after this long. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl DoorTimings {
    pub fn new(relock_settle: Duration) -> Self {
        Self {
            grant_hold: Duration::from_millis(DEFAULT_GRANT_HOLD_MS),
            exit_poll_interval: Duration::from_millis(DEFAULT_EXIT_POLL_MS),
            relock_settle,
            read_poll_interval: Duration::from_millis(DEFAULT_READ_POLL_MS),
            read_timeout: None,
        }
    }

    pub fn with_grant_hold(mut self, hold: Duration) -> Self {
        self.grant_hold = hold;
        self
    }

    pub fn with_exit_poll_interval(mut self, interval: Duration) -> Self {
        self.exit_poll_interval = interval;
        self
    }

    pub fn with_read_poll_interval(mut self, interval: Duration) -> Self {
        self.read_poll_interval = interval;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl From<&TimingConfig> for DoorTimings {
    fn from(config: &TimingConfig) -> Self {
        Self {
            grant_hold: config.grant_hold(),
            exit_poll_interval: config.exit_poll(),
            relock_settle: config.relock_settle(),
            read_poll_interval: config.read_poll(),
            read_timeout: config.read_timeout(),
        }
    }
}
