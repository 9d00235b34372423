//! Mock door panel.
//!
//! Records every actuator command in order so tests can assert the exact
//! sequence a door cycle produces.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use latchkey_core::{DoorState, Indicator};

use crate::error::{HardwareError, Result};
use crate::traits::ActuatorPanel;

/// One command received by a [`MockPanel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Lock,
    Unlock,
    Indicator(Indicator, bool),
}

#[derive(Debug, Default)]
struct PanelState {
    calls: Vec<ActuatorCall>,
    strike: DoorState,
    granted_on: bool,
    denied_on: bool,
    exit_pressed: bool,
    exit_samples: usize,
    failing: bool,
    failing_call: Option<ActuatorCall>,
}

/// Simulated strike, indicators and exit button.
///
/// # Examples
///
/// ```
/// use latchkey_hardware::mock::MockPanel;
/// use latchkey_hardware::ActuatorPanel;
///
/// let (mut panel, handle) = MockPanel::new();
///
/// assert!(!panel.sample_exit_button().unwrap());
/// handle.press_exit_button();
/// assert!(panel.sample_exit_button().unwrap());
/// assert_eq!(handle.exit_samples(), 2);
/// ```
#[derive(Debug)]
pub struct MockPanel {
    state: Arc<Mutex<PanelState>>,
}

impl MockPanel {
    /// Create a panel with the strike locked, both indicators off and the
    /// exit button released.
    pub fn new() -> (Self, MockPanelHandle) {
        let state = Arc::new(Mutex::new(PanelState::default()));
        let panel = Self {
            state: Arc::clone(&state),
        };
        (panel, MockPanelHandle { state })
    }

    fn command(&self, call: ActuatorCall) -> Result<()> {
        let mut state = lock_state(&self.state);
        if state.failing || state.failing_call == Some(call) {
            return Err(HardwareError::gpio("mock panel", format!("injected fault on {:?}", call)));
        }

        state.calls.push(call);
        match call {
            ActuatorCall::Lock => state.strike = DoorState::Locked,
            ActuatorCall::Unlock => state.strike = DoorState::Unlocked,
            ActuatorCall::Indicator(Indicator::Granted, on) => state.granted_on = on,
            ActuatorCall::Indicator(Indicator::Denied, on) => state.denied_on = on,
        }
        Ok(())
    }
}

impl ActuatorPanel for MockPanel {
    fn lock(&mut self) -> Result<()> {
        self.command(ActuatorCall::Lock)
    }

    fn unlock(&mut self) -> Result<()> {
        self.command(ActuatorCall::Unlock)
    }

    fn set_indicator(&mut self, indicator: Indicator, on: bool) -> Result<()> {
        self.command(ActuatorCall::Indicator(indicator, on))
    }

    fn sample_exit_button(&mut self) -> Result<bool> {
        let mut state = lock_state(&self.state);
        if state.failing {
            return Err(HardwareError::gpio("mock panel", "injected fault"));
        }
        state.exit_samples += 1;
        Ok(state.exit_pressed)
    }
}

/// Handle for driving and inspecting a [`MockPanel`].
#[derive(Debug, Clone)]
pub struct MockPanelHandle {
    state: Arc<Mutex<PanelState>>,
}

impl MockPanelHandle {
    pub fn press_exit_button(&self) {
        lock_state(&self.state).exit_pressed = true;
    }

    pub fn release_exit_button(&self) {
        lock_state(&self.state).exit_pressed = false;
    }

    /// Every successful actuator command, oldest first.
    pub fn calls(&self) -> Vec<ActuatorCall> {
        lock_state(&self.state).calls.clone()
    }

    pub fn clear_calls(&self) {
        lock_state(&self.state).calls.clear();
    }

    /// Number of times the exit button was sampled.
    pub fn exit_samples(&self) -> usize {
        lock_state(&self.state).exit_samples
    }

    /// Make every later panel call fail (or succeed again).
    pub fn fail_actuators(&self, failing: bool) {
        lock_state(&self.state).failing = failing;
    }

    /// Make one specific command fail until cleared with `None`.
    pub fn fail_call(&self, call: Option<ActuatorCall>) {
        lock_state(&self.state).failing_call = call;
    }

    /// Check if the strike is currently engaged.
    pub fn is_locked(&self) -> bool {
        lock_state(&self.state).strike.is_locked()
    }

    /// Check if an indicator is currently lit.
    pub fn indicator(&self, indicator: Indicator) -> bool {
        let state = lock_state(&self.state);
        match indicator {
            Indicator::Granted => state.granted_on,
            Indicator::Denied => state.denied_on,
        }
    }
}

fn lock_state(state: &Mutex<PanelState>) -> MutexGuard<'_, PanelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_commands_in_order() {
        let (mut panel, handle) = MockPanel::new();

        panel.unlock().unwrap();
        panel.set_indicator(Indicator::Granted, true).unwrap();
        panel.lock().unwrap();

        assert_eq!(
            handle.calls(),
            vec![
                ActuatorCall::Unlock,
                ActuatorCall::Indicator(Indicator::Granted, true),
                ActuatorCall::Lock,
            ]
        );
        assert!(handle.is_locked());
        assert!(handle.indicator(Indicator::Granted));
        assert!(!handle.indicator(Indicator::Denied));
    }

    #[test]
    fn test_injected_fault() {
        let (mut panel, handle) = MockPanel::new();
        handle.fail_actuators(true);

        assert!(matches!(panel.unlock(), Err(HardwareError::Gpio { .. })));
        assert!(panel.sample_exit_button().is_err());
        assert!(handle.calls().is_empty());
        assert!(handle.is_locked());

        handle.fail_actuators(false);
        panel.unlock().unwrap();
        assert!(!handle.is_locked());
    }

    #[test]
    fn test_single_call_fault() {
        let (mut panel, handle) = MockPanel::new();
        handle.fail_call(Some(ActuatorCall::Unlock));

        assert!(panel.unlock().is_err());
        panel.lock().unwrap();
        assert_eq!(handle.calls(), vec![ActuatorCall::Lock]);

        handle.fail_call(None);
        panel.unlock().unwrap();
    }

    #[test]
    fn test_exit_button_release() {
        let (mut panel, handle) = MockPanel::new();
        handle.press_exit_button();
        assert!(panel.sample_exit_button().unwrap());
        handle.release_exit_button();
        assert!(!panel.sample_exit_button().unwrap());
    }

    #[test]
    fn test_clear_calls() {
        let (mut panel, handle) = MockPanel::new();
        panel.lock().unwrap();
        handle.clear_calls();
        assert!(handle.calls().is_empty());
    }
}
