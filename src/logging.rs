// src/logging.rs

//! `tracing` setup for the launcher.
//!
//! Filter priority:
//! 1. `--log-level` (applies to every target)
//! 2. `BACKEND_LAUNCHER_LOG`, either a bare level (`debug`) or full
//!    `EnvFilter` directives (`info,backend=warn`)
//! 3. `info`
//!
//! Output goes to stderr; stdout is reserved for `locate`, `annotate` and
//! `preset` results. Backend child output is logged under the `backend`
//! target, so `BACKEND_LAUNCHER_LOG=info,backend=off` silences it.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "BACKEND_LAUNCHER_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber. Call once, at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

/// Resolve the filter from the CLI flag and the raw env var value.
///
/// An env value that doesn't parse as directives falls back to the default
/// instead of failing startup.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::default().add_directive(level_of(level).into());
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("ignoring invalid {LOG_ENV_VAR}='{directives}': {e}");
            EnvFilter::new(DEFAULT_DIRECTIVES)
        }),
        None => EnvFilter::new(DEFAULT_DIRECTIVES),
    }
}

fn level_of(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}
