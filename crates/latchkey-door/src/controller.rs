//! The door controller loop.
//!
//! One cycle:
//!
//! 1. **Read**: flush the reader, reset the decoder, poll until a frame
//!    yields a code (or the optional read timeout passes).
//! 2. **Validate**: ask the [`CredentialGate`]. A rejected code ends the
//!    cycle with nothing actuated.
//! 3. **Grant**: denied LED off, granted LED on, release the strike, hold,
//!    granted LED off, denied LED on.
//! 4. **Exit watch**: sample the exit button every poll interval. Once it is
//!    pressed, wait the settle delay and lock.
//!
//! Every wait is a `tokio::time::sleep`, so tests drive the whole cycle
//! with paused time.

use std::convert::Infallible;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, info};

use latchkey_core::{CredentialCode, DoorState, Indicator};
use latchkey_hardware::{ActuatorPanel, HardwareError, Transport};
use latchkey_protocol::{DecoderStats, FrameDecoder};
use latchkey_storage::CredentialStore;

use crate::error::{ControllerError, Result};
use crate::gate::{CredentialGate, Verdict};
use crate::state::DoorStateMachine;
use crate::timing::DoorTimings;

/// How a [`DoorController::run_cycle`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The door was opened and has been locked again.
    Granted(CredentialCode),

    /// The code was rejected; nothing was actuated.
    Denied(CredentialCode, Verdict),

    /// No code arrived within the read timeout.
    TimedOut,
}

/// Single-door access controller.
///
/// Owns its reader link, door panel and credential gate exclusively.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use latchkey_door::{CredentialGate, DoorController, DoorTimings};
/// use latchkey_hardware::mock::{MockPanel, MockTransport};
/// use latchkey_storage::{CredentialRecord, MemoryCredentialStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (transport, reader) = MockTransport::new();
/// let (panel, _panel_handle) = MockPanel::new();
/// let store = MemoryCredentialStore::new();
/// store.insert("12345", CredentialRecord::linked(true));
///
/// let mut door = DoorController::new(
///     transport,
///     panel,
///     CredentialGate::new(store),
///     DoorTimings::new(Duration::from_secs(5)),
/// )?;
///
/// reader.send_frame("12345")?;
/// let code = door.read_code().await?.unwrap();
/// assert_eq!(code.as_str(), "12345");
/// # Ok(())
/// # }
/// ```
pub struct DoorController<T, P, S> {
    transport: T,
    panel: P,
    gate: CredentialGate<S>,
    timings: DoorTimings,
    decoder: FrameDecoder,
    state: DoorStateMachine,
}

impl<T, P, S> DoorController<T, P, S>
where
    T: Transport,
    P: ActuatorPanel,
    S: CredentialStore,
{
    /// Check the reader link and put the door in its idle state: strike
    /// locked, denied indicator on.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Transport`] if the reader link is not open
    /// and [`ControllerError::Actuator`] if the panel cannot be driven.
    pub fn new(
        transport: T,
        panel: P,
        gate: CredentialGate<S>,
        timings: DoorTimings,
    ) -> Result<Self> {
        if !transport.is_open() {
            return Err(ControllerError::Transport(HardwareError::disconnected(
                "badge reader link is not open",
            )));
        }

        let mut controller = Self {
            transport,
            panel,
            gate,
            timings,
            decoder: FrameDecoder::new(),
            state: DoorStateMachine::new(),
        };

        controller.actuate(|panel| panel.lock())?;
        controller.actuate(|panel| panel.set_indicator(Indicator::Denied, true))?;
        controller.state.force_locked();

        info!(relock_settle = ?timings.relock_settle, "Door controller ready, locked");
        Ok(controller)
    }

    pub fn state(&self) -> DoorState {
        self.state.current_state()
    }

    pub fn state_machine(&self) -> &DoorStateMachine {
        &self.state
    }

    pub fn timings(&self) -> &DoorTimings {
        &self.timings
    }

    pub fn gate(&self) -> &CredentialGate<S> {
        &self.gate
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    /// Wait for the next badge code.
    ///
    /// Discards anything the reader sent before the call. Returns `Ok(None)`
    /// only when a read timeout is configured and expires.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Transport`] if the reader link fails.
    pub async fn read_code(&mut self) -> Result<Option<CredentialCode>> {
        self.transport.flush_input().map_err(ControllerError::Transport)?;
        self.decoder.reset();

        let deadline = self.timings.read_timeout.map(|timeout| Instant::now() + timeout);

        loop {
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!("Read phase timed out");
                return Ok(None);
            }

            let available = self
                .transport
                .bytes_available()
                .map_err(ControllerError::Transport)?;

            if available == 0 {
                sleep(self.timings.read_poll_interval).await;
                continue;
            }

            for _ in 0..available {
                let Some(byte) = self
                    .transport
                    .read_byte()
                    .map_err(ControllerError::Transport)?
                else {
                    break;
                };
                if let Some(code) = self.decoder.feed(byte) {
                    debug!(code = %code, "Decoded badge");
                    return Ok(Some(code));
                }
            }

            tokio::task::yield_now().await;
        }
    }

    /// Open the door for an accepted badge.
    ///
    /// Leaves the strike released and the state [`DoorState::Unlocked`];
    /// [`watch_exit`](Self::watch_exit) locks it again.
    pub async fn grant(&mut self) -> Result<()> {
        self.actuate(|panel| panel.set_indicator(Indicator::Denied, false))?;
        self.actuate(|panel| panel.set_indicator(Indicator::Granted, true))?;
        self.actuate(|panel| panel.unlock())?;
        self.state.transition_to(DoorState::Unlocked)?;

        sleep(self.timings.grant_hold).await;

        self.actuate(|panel| panel.set_indicator(Indicator::Granted, false))?;
        self.actuate(|panel| panel.set_indicator(Indicator::Denied, true))?;
        Ok(())
    }

    /// Wait for the exit button, then lock after the settle delay.
    pub async fn watch_exit(&mut self) -> Result<()> {
        loop {
            sleep(self.timings.exit_poll_interval).await;

            if self.actuate(|panel| panel.sample_exit_button())? {
                info!(
                    settle = ?self.timings.relock_settle,
                    "Exit requested, re-locking after settle"
                );
                sleep(self.timings.relock_settle).await;

                self.actuate(|panel| panel.lock())?;
                self.state.transition_to(DoorState::Locked)?;
                info!("Door locked");
                return Ok(());
            }
        }
    }

    /// Run one read, validate, grant and exit-watch cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let Some(code) = self.read_code().await? else {
            return Ok(CycleOutcome::TimedOut);
        };

        let verdict = self.gate.check(&code).await;
        if !verdict.is_granted() {
            info!(code = %code, %verdict, "Access denied");
            return Ok(CycleOutcome::Denied(code, verdict));
        }

        info!(code = %code, "Access granted");
        self.grant().await?;
        self.watch_exit().await?;
        Ok(CycleOutcome::Granted(code))
    }

    /// Run cycles until a fault stops the controller.
    pub async fn run(&mut self) -> Result<Infallible> {
        info!("Door controller running");
        loop {
            match self.run_cycle().await {
                Ok(outcome) => debug!(?outcome, "Cycle complete"),
                Err(e) => {
                    error!(error = %e, "Door controller stopped");
                    return Err(e);
                }
            }
        }
    }

    /// Lock the strike and turn both indicators off before the process exits.
    pub fn shutdown(&mut self) -> Result<()> {
        self.actuate(|panel| panel.lock())?;
        self.state.force_locked();
        self.actuate(|panel| panel.set_indicator(Indicator::Granted, false))?;
        self.actuate(|panel| panel.set_indicator(Indicator::Denied, false))?;
        info!("Door controller shut down, locked");
        Ok(())
    }

    /// Run one panel operation. On failure, try to lock the strike before
    /// reporting the fault.
    fn actuate<R>(
        &mut self,
        op: impl FnOnce(&mut P) -> latchkey_hardware::Result<R>,
    ) -> Result<R> {
        match op(&mut self.panel) {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(error = %e, "Door panel fault, attempting to lock");
                match self.panel.lock() {
                    Ok(()) => {
                        self.state.force_locked();
                    }
                    Err(lock_error) => {
                        error!(error = %lock_error, "Fail-safe lock failed");
                    }
                }
                Err(ControllerError::Actuator(e))
            }
        }
    }
}

impl<T, P, S> std::fmt::Debug for DoorController<T, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorController")
            .field("state", &self.state.current_state())
            .field("timings", &self.timings)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}
