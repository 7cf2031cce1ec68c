// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::{Backoff, LaunchSpec, ProbeTarget, ReadinessPolicy, SupervisorSettings};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [backend]
/// command = "bash"
/// script = "start-server.sh"
///
/// [readiness]
/// port = 3000
/// startup_timeout = "60s"
///
/// [shutdown]
/// grace_period = "5s"
///
/// [frontend]
/// url = "http://localhost:3000"
/// ```
///
/// `[backend]` and `[readiness]` are required; everything else has defaults.
/// Durations stay as strings here and are parsed during validation, which
/// produces a [`LauncherConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawLauncherConfig {
    pub backend: BackendSection,

    pub readiness: ReadinessSection,

    #[serde(default)]
    pub shutdown: ShutdownSection,

    #[serde(default)]
    pub frontend: FrontendSection,
}

/// `[backend]` section: what to run.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendSection {
    /// Program to execute (`bash`, `python3`, `node`, ...).
    pub command: String,

    /// Script handed to `command` as its first argument.
    ///
    /// Relative paths are resolved against the config file's directory, or
    /// against `--resources-dir` for packaged installs.
    #[serde(default)]
    pub script: Option<String>,

    /// Extra arguments appended after the script.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the child. Defaults to the launcher's cwd.
    #[serde(default)]
    pub working_dir: Option<String>,

    /// Variables layered over the inherited environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[readiness]` section: how to tell the backend is up.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessSection {
    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    #[serde(default = "default_startup_timeout")]
    pub startup_timeout: String,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: String,

    /// Pause between spawning the child and the first probe.
    #[serde(default = "default_initial_delay")]
    pub initial_delay: String,

    #[serde(default = "default_backoff_base")]
    pub backoff_base: String,

    #[serde(default = "default_backoff_cap")]
    pub backoff_cap: String,
}

/// `[shutdown]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownSection {
    /// Time between SIGTERM and SIGKILL.
    #[serde(default = "default_grace_period")]
    pub grace_period: String,
}

impl Default for ShutdownSection {
    fn default() -> Self {
        Self {
            grace_period: default_grace_period(),
        }
    }
}

/// `[frontend]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FrontendSection {
    /// URL announced once the backend is ready. Defaults to
    /// `http://<host>:<port>`.
    #[serde(default)]
    pub url: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_startup_timeout() -> String {
    "60s".to_string()
}

fn default_probe_timeout() -> String {
    "1s".to_string()
}

fn default_initial_delay() -> String {
    "500ms".to_string()
}

fn default_backoff_base() -> String {
    "100ms".to_string()
}

fn default_backoff_cap() -> String {
    "1s".to_string()
}

fn default_grace_period() -> String {
    "5s".to_string()
}

impl ReadinessSection {
    /// A section with every optional field at its default.
    pub fn with_port(port: u16) -> Self {
        Self {
            host: default_host(),
            port,
            startup_timeout: default_startup_timeout(),
            probe_timeout: default_probe_timeout(),
            initial_delay: default_initial_delay(),
            backoff_base: default_backoff_base(),
            backoff_cap: default_backoff_cap(),
        }
    }
}

/// Validated configuration with parsed durations.
///
/// Only constructible through `TryFrom<RawLauncherConfig>` (see
/// `validate.rs`) or [`LauncherConfig::new_unchecked`].
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub backend: BackendConfig,
    pub readiness: ReadinessConfig,
    pub grace_period: Duration,
    pub frontend_url: String,
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub command: String,
    pub script: Option<PathBuf>,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub host: String,
    pub port: u16,
    pub startup_timeout: Duration,
    pub probe_timeout: Duration,
    pub initial_delay: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl LauncherConfig {
    pub(crate) fn new_unchecked(
        backend: BackendConfig,
        readiness: ReadinessConfig,
        grace_period: Duration,
        frontend_url: String,
    ) -> Self {
        Self {
            backend,
            readiness,
            grace_period,
            frontend_url,
        }
    }

    /// Build the command line for the backend.
    ///
    /// `script_root` is where a relative `script` lives: the config file's
    /// directory in development, the resources directory when packaged.
    pub fn launch_spec(&self, script_root: &Path) -> LaunchSpec {
        let mut args = Vec::with_capacity(self.backend.args.len() + 1);
        if let Some(script) = &self.backend.script {
            let resolved = if script.is_absolute() {
                script.clone()
            } else {
                script_root.join(script)
            };
            args.push(resolved.to_string_lossy().into_owned());
        }
        args.extend(self.backend.args.iter().cloned());

        LaunchSpec {
            command: self.backend.command.clone(),
            args,
            env: self.backend.env.clone(),
            working_dir: self.backend.working_dir.clone(),
        }
    }

    pub fn probe_target(&self) -> ProbeTarget {
        ProbeTarget {
            host: self.readiness.host.clone(),
            port: self.readiness.port,
        }
    }

    pub fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            startup_timeout: self.readiness.startup_timeout,
            probe_timeout: self.readiness.probe_timeout,
            initial_delay: self.readiness.initial_delay,
            backoff: Backoff::new(self.readiness.backoff_base, self.readiness.backoff_cap),
        }
    }

    /// Everything the supervisor needs, resolved against `script_root`.
    pub fn supervisor_settings(&self, script_root: &Path) -> SupervisorSettings {
        SupervisorSettings {
            launch: self.launch_spec(script_root),
            target: self.probe_target(),
            readiness: self.readiness_policy(),
            grace_period: self.grace_period,
        }
    }
}
