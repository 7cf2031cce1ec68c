// src/supervisor/exit_hint.rs

//! Human-readable hints for well-known backend exit codes.
//!
//! Purely diagnostic: every non-clean exit is `FailureReason::Crashed`
//! regardless of which hint it maps to.

use super::ChildExit;

/// Shell convention: found but not executable.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Shell convention: command not found.
pub const EXIT_COMMAND_NOT_FOUND: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitHint {
    /// 126: permission denied or script not executable.
    PermissionDenied,
    /// 127: the script ran a command that does not exist.
    CommandNotFound,
    /// 1: the script itself reported an error.
    ScriptError,
    /// Code 0 before the port ever answered.
    ExitedEarly,
    /// Killed by a signal.
    Signaled,
    /// Any other non-zero code.
    GenericFailure,
}

impl ExitHint {
    pub fn from_exit(exit: &ChildExit) -> Self {
        match exit.code {
            Some(EXIT_NOT_EXECUTABLE) => ExitHint::PermissionDenied,
            Some(EXIT_COMMAND_NOT_FOUND) => ExitHint::CommandNotFound,
            Some(1) => ExitHint::ScriptError,
            Some(0) => ExitHint::ExitedEarly,
            None if exit.signal.is_some() => ExitHint::Signaled,
            _ => ExitHint::GenericFailure,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ExitHint::PermissionDenied => {
                "Exit code 126: Permission denied or script not executable.\n\n\
                 This usually means:\n\
                 1. The start script is not executable\n\
                 2. The script has incorrect permissions"
            }
            ExitHint::CommandNotFound => {
                "Exit code 127: Command not found.\n\n\
                 The script tried to run a command that does not exist."
            }
            ExitHint::ScriptError => {
                "The backend script encountered an error. Check that:\n\
                 1. All dependencies are installed\n\
                 2. Your .env file is configured\n\
                 3. The project path is correct"
            }
            ExitHint::ExitedEarly => {
                "The backend exited cleanly before it started listening. Make sure the \
                 start script keeps the server in the foreground."
            }
            ExitHint::Signaled => {
                "The backend was killed by a signal it did not receive from the launcher."
            }
            ExitHint::GenericFailure => "The backend exited with an error. Check its log output above.",
        }
    }
}
