// src/supervisor/core.rs

//! Pure supervisor state machine.
//!
//! [`SupervisorCore`] consumes [`SupervisorEvent`]s and moves between
//! [`SupervisorState`]s. It has no Tokio types, no processes and no sockets,
//! so every transition can be unit tested directly. The async shell
//! (`supervisor::runtime::Supervisor`) feeds it events and acts on the
//! resulting [`CoreStep`]s.
//!
//! Exit policy:
//! - any exit while `Starting` / `WaitingForReady` is a crash, including
//!   exit code 0, because there is no server left to become ready;
//! - while `Ready`, a non-zero code or a signal is a crash and a clean exit
//!   moves straight to `Stopped`;
//! - while `Stopping`, an exit is the expected result of the stop.

use tracing::{debug, trace};

use crate::errors::{LauncherError, Result};

use super::{ChildExit, FailureReason, SupervisorEvent, SupervisorState};

/// Outcome of feeding one event into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub from: SupervisorState,
    pub to: SupervisorState,
    /// Set only on the step that enters `Failed`, so each failure is
    /// reported exactly once.
    pub failure: Option<FailureReason>,
}

impl CoreStep {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug)]
pub struct SupervisorCore {
    state: SupervisorState,
    pid: Option<u32>,
}

impl Default for SupervisorCore {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisorCore {
    pub fn new() -> Self {
        Self {
            state: SupervisorState::NotStarted,
            pid: None,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        &self.state
    }

    /// Pid of the owned child, if one is owned right now.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Apply one event.
    ///
    /// The only error is `AlreadyRunning` for a start request while a child
    /// is owned. Events that make no sense in the current state (a stale
    /// probe result after a crash, say) are ignored and return an unchanged
    /// step.
    pub fn step(&mut self, event: SupervisorEvent) -> Result<CoreStep> {
        use SupervisorState as S;

        let from = self.state.clone();
        trace!(state = ?from, ?event, "supervisor core event");

        let next = match (&self.state, event) {
            (state, SupervisorEvent::StartRequested) => {
                if state.is_active() {
                    return Err(LauncherError::AlreadyRunning);
                }
                Some(S::Starting)
            }

            (S::Starting, SupervisorEvent::Spawned { pid }) => {
                self.pid = pid;
                Some(S::WaitingForReady)
            }
            (S::Starting, SupervisorEvent::SpawnFailed { message }) => {
                Some(S::Failed(FailureReason::SpawnError(message)))
            }

            (S::WaitingForReady, SupervisorEvent::ProbeSucceeded) => Some(S::Ready),
            (S::WaitingForReady, SupervisorEvent::DeadlineExpired { waited }) => {
                Some(S::Failed(FailureReason::Timeout { waited }))
            }

            (S::Starting | S::WaitingForReady, SupervisorEvent::ChildExited(exit)) => {
                Some(S::Failed(FailureReason::Crashed(exit)))
            }
            (S::Ready, SupervisorEvent::ChildExited(exit)) => Some(exit_while_ready(exit)),
            (S::Stopping, SupervisorEvent::ChildExited(_)) => Some(S::Stopped),

            (S::Starting | S::WaitingForReady | S::Ready, SupervisorEvent::StopRequested) => {
                Some(S::Stopping)
            }
            (S::Stopping, SupervisorEvent::StopCompleted) => Some(S::Stopped),

            (state, event) => {
                debug!(?state, ?event, "ignoring event not applicable in current state");
                None
            }
        };

        let failure = match &next {
            Some(S::Failed(reason)) => Some(reason.clone()),
            _ => None,
        };

        if let Some(next) = next {
            if matches!(next, S::Failed(_) | S::Stopped) {
                self.pid = None;
            }
            self.state = next;
        }

        Ok(CoreStep {
            from,
            to: self.state.clone(),
            failure,
        })
    }
}

fn exit_while_ready(exit: ChildExit) -> SupervisorState {
    if exit.is_clean() {
        SupervisorState::Stopped
    } else {
        SupervisorState::Failed(FailureReason::Crashed(exit))
    }
}
