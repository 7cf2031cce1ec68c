#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use backend_launcher::config::{
    BackendSection, FrontendSection, LauncherConfig, RawLauncherConfig, ReadinessSection,
    ShutdownSection,
};
use backend_launcher::supervisor::{
    Backoff, LaunchSpec, ProbeTarget, ReadinessPolicy, SupervisorSettings,
};

/// Builder for `LauncherConfig` to simplify test setup.
///
/// Starts from a minimal valid config (`command`, `port`) with every other
/// field at its serde default.
pub struct LauncherConfigBuilder {
    config: RawLauncherConfig,
}

impl LauncherConfigBuilder {
    pub fn new(command: &str, port: u16) -> Self {
        Self {
            config: RawLauncherConfig {
                backend: BackendSection {
                    command: command.to_string(),
                    script: None,
                    args: vec![],
                    working_dir: None,
                    env: BTreeMap::new(),
                },
                readiness: ReadinessSection::with_port(port),
                shutdown: ShutdownSection::default(),
                frontend: FrontendSection::default(),
            },
        }
    }

    pub fn script(mut self, script: &str) -> Self {
        self.config.backend.script = Some(script.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.backend.args.push(arg.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .backend
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn working_dir(mut self, dir: &str) -> Self {
        self.config.backend.working_dir = Some(dir.to_string());
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.readiness.host = host.to_string();
        self
    }

    pub fn startup_timeout(mut self, val: &str) -> Self {
        self.config.readiness.startup_timeout = val.to_string();
        self
    }

    pub fn probe_timeout(mut self, val: &str) -> Self {
        self.config.readiness.probe_timeout = val.to_string();
        self
    }

    pub fn initial_delay(mut self, val: &str) -> Self {
        self.config.readiness.initial_delay = val.to_string();
        self
    }

    pub fn backoff(mut self, base: &str, cap: &str) -> Self {
        self.config.readiness.backoff_base = base.to_string();
        self.config.readiness.backoff_cap = cap.to_string();
        self
    }

    pub fn grace_period(mut self, val: &str) -> Self {
        self.config.shutdown.grace_period = val.to_string();
        self
    }

    pub fn frontend_url(mut self, url: &str) -> Self {
        self.config.frontend.url = Some(url.to_string());
        self
    }

    /// The unvalidated config, for exercising validation errors.
    pub fn raw(self) -> RawLauncherConfig {
        self.config
    }

    pub fn build(self) -> LauncherConfig {
        LauncherConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for `SupervisorSettings`, bypassing config files entirely.
///
/// Defaults mirror the production defaults: 60s startup timeout, 1s probe
/// timeout, 500ms initial delay, 100ms..1s backoff and a 5s grace period.
pub struct SettingsBuilder {
    settings: SupervisorSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: SupervisorSettings {
                launch: LaunchSpec::new("fake-backend"),
                target: ProbeTarget {
                    host: "localhost".to_string(),
                    port: 3000,
                },
                readiness: ReadinessPolicy::default(),
                grace_period: Duration::from_secs(5),
            },
        }
    }

    pub fn launch(mut self, launch: LaunchSpec) -> Self {
        self.settings.launch = launch;
        self
    }

    pub fn target(mut self, host: &str, port: u16) -> Self {
        self.settings.target = ProbeTarget {
            host: host.to_string(),
            port,
        };
        self
    }

    pub fn startup_timeout(mut self, val: Duration) -> Self {
        self.settings.readiness.startup_timeout = val;
        self
    }

    pub fn probe_timeout(mut self, val: Duration) -> Self {
        self.settings.readiness.probe_timeout = val;
        self
    }

    pub fn initial_delay(mut self, val: Duration) -> Self {
        self.settings.readiness.initial_delay = val;
        self
    }

    pub fn backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.settings.readiness.backoff = Backoff::new(base, cap);
        self
    }

    pub fn grace_period(mut self, val: Duration) -> Self {
        self.settings.grace_period = val;
        self
    }

    pub fn build(self) -> SupervisorSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
