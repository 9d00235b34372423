//! Door lock state machine.
//!
//! The strike has two states and two legal moves:
//!
//! - Locked → Unlocked (badge accepted)
//! - Unlocked → Locked (exit button pressed, settle delay elapsed)
//!
//! [`DoorStateMachine::force_locked`] is the one exception. It is used when
//! the controller starts and after an actuator fault, where the strike has
//! just been driven locked whatever the machine thought before.
//!
//! ```
//! use latchkey_core::DoorState;
//! use latchkey_door::DoorStateMachine;
//!
//! let mut machine = DoorStateMachine::new();
//! machine.transition_to(DoorState::Unlocked).unwrap();
//! assert!(machine.transition_to(DoorState::Unlocked).is_err());
//!
//! machine.transition_to(DoorState::Locked).unwrap();
//! assert_eq!(machine.history().len(), 2);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use latchkey_core::{DoorState, Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// One door cycle records two transitions, so this covers the last 50
/// badge-ins.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Check if `from` may move to `to` through a normal transition.
pub fn can_transition(from: DoorState, to: DoorState) -> bool {
    matches!(
        (from, to),
        (DoorState::Locked, DoorState::Unlocked) | (DoorState::Unlocked, DoorState::Locked)
    )
}

/// A single recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: DoorState,
    pub to: DoorState,

    /// When the change happened (Tokio clock, so paused-time tests see
    /// virtual time).
    pub timestamp: Instant,
}

impl StateTransition {
    fn new(from: DoorState, to: DoorState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Tracks the door state, when it was entered and recent transitions.
#[derive(Debug)]
pub struct DoorStateMachine {
    current_state: DoorState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl DoorStateMachine {
    /// Create a machine in the Locked state with empty history.
    pub fn new() -> Self {
        Self {
            current_state: DoorState::Locked,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> DoorState {
        self.current_state
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }

    /// Move to `new_state` if the move is legal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] and leaves the machine
    /// untouched if the move is not Locked ↔ Unlocked.
    pub fn transition_to(&mut self, new_state: DoorState) -> Result<StateTransition> {
        if !can_transition(self.current_state, new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        Ok(self.record(new_state))
    }

    /// Record that the strike was just driven locked, from any state.
    pub fn force_locked(&mut self) -> StateTransition {
        self.record(DoorState::Locked)
    }

    fn record(&mut self, new_state: DoorState) -> StateTransition {
        let transition = StateTransition::new(self.current_state, new_state);

        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(transition);

        self.current_state = new_state;
        self.state_entered_at = transition.timestamp;
        transition
    }
}

impl Default for DoorStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
