use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use backend_launcher::supervisor::{ProbeTarget, ReadinessProbe};

/// When a [`ScriptedProbe`] starts answering.
#[derive(Debug, Clone, Copy)]
pub enum ProbeScript {
    /// The port never opens.
    Never,
    /// The port is open from the start.
    Always,
    /// The n-th probe (1-based) and every later one succeeds.
    AfterAttempts(u32),
    /// Probes at or after this instant succeed.
    ReadyAt(Instant),
}

/// A fake readiness probe that:
/// - answers according to its [`ProbeScript`]
/// - optionally takes `latency` (bounded by the probe timeout) per attempt
/// - records the instant of every probe.
///
/// Clones share the recorded attempts.
#[derive(Debug, Clone)]
pub struct ScriptedProbe {
    script: ProbeScript,
    latency: Duration,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedProbe {
    pub fn new(script: ProbeScript) -> Self {
        Self {
            script,
            latency: Duration::ZERO,
            attempts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn never() -> Self {
        Self::new(ProbeScript::Never)
    }

    pub fn always() -> Self {
        Self::new(ProbeScript::Always)
    }

    pub fn after_attempts(n: u32) -> Self {
        Self::new(ProbeScript::AfterAttempts(n))
    }

    pub fn ready_at(at: Instant) -> Self {
        Self::new(ProbeScript::ReadyAt(at))
    }

    /// Every failed probe takes this long (a filtered port that times out).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl ReadinessProbe for ScriptedProbe {
    fn probe<'a>(
        &'a self,
        _target: &'a ProbeTarget,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            let now = Instant::now();
            let attempt = {
                let mut guard = self.attempts.lock().unwrap();
                guard.push(now);
                guard.len() as u32
            };

            let ready = match self.script {
                ProbeScript::Never => false,
                ProbeScript::Always => true,
                ProbeScript::AfterAttempts(n) => attempt >= n,
                ProbeScript::ReadyAt(at) => now >= at,
            };

            if !ready && !self.latency.is_zero() {
                tokio::time::sleep(self.latency.min(timeout)).await;
            }
            ready
        })
    }
}
