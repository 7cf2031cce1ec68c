// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    BackendConfig, LauncherConfig, RawLauncherConfig, ReadinessConfig, ReadinessSection,
};
use crate::errors::{LauncherError, Result};

impl TryFrom<RawLauncherConfig> for LauncherConfig {
    type Error = crate::errors::LauncherError;

    fn try_from(raw: RawLauncherConfig) -> std::result::Result<Self, Self::Error> {
        validate_backend(&raw)?;
        let readiness = validate_readiness(&raw.readiness)?;
        let grace_period = positive_duration("shutdown.grace_period", &raw.shutdown.grace_period)?;

        let frontend_url = match raw.frontend.url {
            Some(url) if url.trim().is_empty() => {
                return Err(LauncherError::ConfigError(
                    "[frontend].url must not be empty when set".to_string(),
                ));
            }
            Some(url) => url,
            None => format!("http://{}:{}", readiness.host, readiness.port),
        };

        let backend = BackendConfig {
            command: raw.backend.command,
            script: raw.backend.script.map(PathBuf::from),
            args: raw.backend.args,
            working_dir: raw.backend.working_dir.map(PathBuf::from),
            env: raw.backend.env,
        };

        Ok(LauncherConfig::new_unchecked(
            backend,
            readiness,
            grace_period,
            frontend_url,
        ))
    }
}

fn validate_backend(cfg: &RawLauncherConfig) -> Result<()> {
    if cfg.backend.command.trim().is_empty() {
        return Err(LauncherError::ConfigError(
            "[backend].command must not be empty".to_string(),
        ));
    }

    if let Some(script) = &cfg.backend.script {
        if script.trim().is_empty() {
            return Err(LauncherError::ConfigError(
                "[backend].script must not be empty when set".to_string(),
            ));
        }
    }

    for key in cfg.backend.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(LauncherError::ConfigError(format!(
                "[backend].env has invalid variable name '{key}'"
            )));
        }
    }

    Ok(())
}

fn validate_readiness(section: &ReadinessSection) -> Result<ReadinessConfig> {
    if section.host.trim().is_empty() {
        return Err(LauncherError::ConfigError(
            "[readiness].host must not be empty".to_string(),
        ));
    }

    if section.port == 0 {
        return Err(LauncherError::ConfigError(
            "[readiness].port must be >= 1 (got 0)".to_string(),
        ));
    }

    let startup_timeout = positive_duration("readiness.startup_timeout", &section.startup_timeout)?;
    let probe_timeout = positive_duration("readiness.probe_timeout", &section.probe_timeout)?;
    let initial_delay = duration("readiness.initial_delay", &section.initial_delay)?;
    let backoff_base = positive_duration("readiness.backoff_base", &section.backoff_base)?;
    let backoff_cap = positive_duration("readiness.backoff_cap", &section.backoff_cap)?;

    if backoff_base > backoff_cap {
        return Err(LauncherError::ConfigError(format!(
            "[readiness].backoff_base ({:?}) must not exceed backoff_cap ({:?})",
            backoff_base, backoff_cap
        )));
    }

    Ok(ReadinessConfig {
        host: section.host.clone(),
        port: section.port,
        startup_timeout,
        probe_timeout,
        initial_delay,
        backoff_base,
        backoff_cap,
    })
}

fn duration(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| LauncherError::ConfigError(format!("[{field}] invalid duration: {e}")))
}

fn positive_duration(field: &str, value: &str) -> Result<Duration> {
    let d = duration(field, value)?;
    if d.is_zero() {
        return Err(LauncherError::ConfigError(format!(
            "[{field}] must be greater than zero"
        )));
    }
    Ok(d)
}
