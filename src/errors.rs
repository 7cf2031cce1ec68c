// src/errors.rs

//! The launcher's error type. Supervisor failures convert into it and keep
//! their troubleshooting hint.

use thiserror::Error;

use crate::supervisor::{ChildExit, FailureReason};

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Invalid launcher config: {0}")]
    ConfigError(String),

    #[error("I/O failure: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Malformed JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to start backend: {0}")]
    SpawnError(String),

    #[error("Backend did not become ready within {:.1}s", .waited.as_secs_f64())]
    Timeout { waited: std::time::Duration },

    #[error("Backend process exited unexpectedly ({0})")]
    Crashed(ChildExit),

    #[error("Backend is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<FailureReason> for LauncherError {
    fn from(reason: FailureReason) -> Self {
        match reason {
            FailureReason::SpawnError(msg) => LauncherError::SpawnError(msg),
            FailureReason::Timeout { waited } => LauncherError::Timeout { waited },
            FailureReason::Crashed(exit) => LauncherError::Crashed(exit),
        }
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;

impl LauncherError {
    /// Advice to show next to a supervisor failure, if there is any.
    pub fn hint(&self) -> Option<&'static str> {
        let reason = match self {
            LauncherError::SpawnError(msg) => FailureReason::SpawnError(msg.clone()),
            LauncherError::Timeout { waited } => FailureReason::Timeout { waited: *waited },
            LauncherError::Crashed(exit) => FailureReason::Crashed(*exit),
            _ => return None,
        };
        Some(reason.hint())
    }
}
