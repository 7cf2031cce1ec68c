// src/supervisor/mod.rs

//! Backend process supervision.
//!
//! One supervisor owns at most one child server process and drives it
//! through a small lifecycle:
//!
//! ```text
//! NotStarted -> Starting -> WaitingForReady -> Ready -> Stopping -> Stopped
//!                  |              |              |
//!                  +--------------+--------------+--> Failed(reason)
//! ```
//!
//! The pure transition table lives in [`core`]; the async/IO shell that
//! spawns processes, probes the port and delivers signals is
//! [`runtime::Supervisor`]. Process spawning and readiness probing sit
//! behind the [`ProcessBackend`] and [`ReadinessProbe`] traits so tests can
//! swap in fakes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub mod backoff;
pub mod core;
pub mod exit_hint;
pub mod process;
pub mod readiness;
pub mod runtime;

pub use backoff::Backoff;
pub use self::core::{CoreStep, SupervisorCore};
pub use exit_hint::ExitHint;
pub use process::{ChildControl, ProcessBackend, RealProcessBackend, StopSignal};
pub use readiness::{wait_for_ready, ReadinessOutcome, ReadinessProbe, TcpProbe};
pub use runtime::Supervisor;

/// How a child process ended.
///
/// Mirrors what the OS reports: an exit code for normal termination, a
/// signal number when the process was killed. Either may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ChildExit {
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn with_signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Neither a code nor a signal is known.
    pub fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }

    /// Exit code 0 and no signal.
    pub fn is_clean(&self) -> bool {
        self.code == Some(0) && self.signal.is_none()
    }
}

impl From<std::process::ExitStatus> for ChildExit {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), None) => write!(f, "exit code {code}"),
            (None, Some(sig)) => write!(f, "killed by signal {sig}"),
            (Some(code), Some(sig)) => write!(f, "exit code {code}, signal {sig}"),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// Why a run ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The OS refused to create the process.
    SpawnError(String),
    /// No successful probe before the startup timeout.
    Timeout { waited: Duration },
    /// The child exited on its own while it was supposed to be serving.
    Crashed(ChildExit),
}

impl FailureReason {
    /// Human-facing advice for this failure.
    pub fn hint(&self) -> &'static str {
        match self {
            FailureReason::SpawnError(_) => {
                "The backend command could not be started. Check that the command exists, \
                 is on PATH and is executable."
            }
            FailureReason::Timeout { .. } => {
                "Please check:\n1. Backend script path is correct\n2. Backend command is \
                 correct\n3. Required dependencies are installed"
            }
            FailureReason::Crashed(exit) => ExitHint::from_exit(exit).message(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SpawnError(msg) => write!(f, "spawn error: {msg}"),
            FailureReason::Timeout { waited } => {
                write!(f, "backend not ready after {:.1}s", waited.as_secs_f64())
            }
            FailureReason::Crashed(exit) => write!(f, "backend crashed ({exit})"),
        }
    }
}

/// Lifecycle state of the supervised backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    NotStarted,
    Starting,
    WaitingForReady,
    Ready,
    Failed(FailureReason),
    Stopping,
    Stopped,
}

impl SupervisorState {
    /// States in which a child process is (or is about to be) owned.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SupervisorState::Starting
                | SupervisorState::WaitingForReady
                | SupervisorState::Ready
                | SupervisorState::Stopping
        )
    }
}

/// Inputs to [`SupervisorCore::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    StartRequested,
    Spawned { pid: Option<u32> },
    SpawnFailed { message: String },
    ProbeSucceeded,
    DeadlineExpired { waited: Duration },
    ChildExited(ChildExit),
    StopRequested,
    StopCompleted,
}

/// Command line and environment for the backend process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub command: String,
    pub args: Vec<String>,
    /// Layered over the inherited environment.
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchSpec {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `command arg1 arg2 ...` for log lines.
    pub fn display(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Host/port the readiness probe connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Timing knobs for the readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Overall budget, measured from the first probe.
    pub startup_timeout: Duration,
    /// Budget for a single connect attempt.
    pub probe_timeout: Duration,
    /// Pause between spawn and the first probe.
    pub initial_delay: Duration,
    pub backoff: Backoff,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(1),
            initial_delay: Duration::from_millis(500),
            backoff: Backoff::default(),
        }
    }
}

/// Everything a [`Supervisor`] needs to run one backend.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub launch: LaunchSpec,
    pub target: ProbeTarget,
    pub readiness: ReadinessPolicy,
    /// Time between graceful and forceful termination on stop.
    pub grace_period: Duration,
}
