// src/supervisor/runtime.rs

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::errors::{LauncherError, Result};

use super::core::{CoreStep, SupervisorCore};
use super::process::{wait_for_child_exit, ChildControl, ProcessBackend, StopSignal};
use super::readiness::{wait_for_ready, ReadinessOutcome, ReadinessProbe};
use super::{ChildExit, SupervisorEvent, SupervisorSettings, SupervisorState};

/// How long to wait for the exit status after a forceful kill.
const FORCE_KILL_WAIT: Duration = Duration::from_secs(2);

/// Drives [`SupervisorCore`] with real (or fake) processes and probes.
///
/// Async IO shell around the core. Everything it observes from the
/// [`ProcessBackend`] and the [`ReadinessProbe`] becomes a
/// [`SupervisorEvent`]; state decisions are made by the core only.
pub struct Supervisor<B: ProcessBackend, P: ReadinessProbe> {
    core: SupervisorCore,
    backend: B,
    probe: P,
    settings: SupervisorSettings,
    child: Option<ChildControl>,
}

impl<B: ProcessBackend, P: ReadinessProbe> fmt::Debug for Supervisor<B, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("settings", &self.settings)
            .field("child", &self.child)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend, P: ReadinessProbe> Supervisor<B, P> {
    pub fn new(settings: SupervisorSettings, backend: B, probe: P) -> Self {
        Self {
            core: SupervisorCore::new(),
            backend,
            probe,
            settings,
            child: None,
        }
    }

    pub fn state(&self) -> &SupervisorState {
        self.core.state()
    }

    pub fn pid(&self) -> Option<u32> {
        self.core.pid()
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Spawn the backend and wait until its port accepts connections.
    ///
    /// Resolves `Ok(())` once `Ready`. Every failure (spawn error, timeout,
    /// early exit) resolves the call exactly once with the matching
    /// `LauncherError`, and leaves no child behind. Calling this while a
    /// child is owned fails with `AlreadyRunning` and leaves the running
    /// child untouched.
    pub async fn start(&mut self) -> Result<()> {
        self.apply(SupervisorEvent::StartRequested)?;

        let launch = &self.settings.launch;
        info!(cmd = %launch.display(), "starting backend process");

        let control = match self.backend.spawn(launch) {
            Ok(control) => control,
            Err(err) => {
                let message = match err {
                    LauncherError::SpawnError(msg) => msg,
                    other => other.to_string(),
                };
                error!(error = %message, "failed to start backend");
                let step = self.apply(SupervisorEvent::SpawnFailed { message })?;
                return Err(failure_error(step));
            }
        };

        self.apply(SupervisorEvent::Spawned { pid: control.pid() })?;
        let mut exit_rx = control.exit_watch();
        self.child = Some(control);

        info!(
            target = %self.settings.target,
            timeout = ?self.settings.readiness.startup_timeout,
            "waiting for backend to be ready"
        );

        let outcome = wait_for_ready(
            &self.probe,
            &self.settings.target,
            &self.settings.readiness,
            &mut exit_rx,
        )
        .await;

        match outcome {
            ReadinessOutcome::Ready { attempts, elapsed } => {
                self.apply(SupervisorEvent::ProbeSucceeded)?;
                info!(attempts, ?elapsed, pid = ?self.pid(), "backend is ready");
                Ok(())
            }
            ReadinessOutcome::TimedOut { attempts, waited } => {
                error!(attempts, ?waited, "backend startup timeout");
                let step = self.apply(SupervisorEvent::DeadlineExpired { waited })?;
                if let Some(child) = self.child.take() {
                    let exit = terminate(child, self.settings.grace_period).await;
                    debug!(%exit, "released backend after startup timeout");
                }
                Err(failure_error(step))
            }
            ReadinessOutcome::Exited(exit) => {
                self.child = None;
                let step = self.apply(SupervisorEvent::ChildExited(exit))?;
                error!(%exit, "backend exited before it became ready");
                Err(failure_error(step))
            }
        }
    }

    /// Keep supervising the ready backend until `shutdown` resolves (then
    /// stop it gracefully) or the child exits on its own.
    ///
    /// A crash resolves to `Err(LauncherError::Crashed)`; a clean exit or a
    /// completed stop resolves to `Ok(())`.
    pub async fn supervise_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Some(mut exit_rx) = self.child.as_ref().map(ChildControl::exit_watch) else {
            debug!(state = ?self.state(), "no backend process to supervise");
            return Ok(());
        };

        tokio::select! {
            _ = shutdown => {
                info!("shutdown requested");
                self.stop().await
            }
            exit = wait_for_child_exit(&mut exit_rx) => self.record_exit(exit),
        }
    }

    /// Suspend until the backend exits on its own.
    pub async fn wait_for_exit(&mut self) -> Result<()> {
        self.supervise_until(std::future::pending()).await
    }

    /// Stop the backend: graceful signal now, forceful kill after the grace
    /// period if it's still running.
    ///
    /// A no-op when nothing is running.
    pub async fn stop(&mut self) -> Result<()> {
        let step = self.apply(SupervisorEvent::StopRequested)?;
        if step.to != SupervisorState::Stopping {
            debug!(state = ?step.to, "stop requested but backend is not running");
            return Ok(());
        }

        info!(pid = ?self.pid(), "stopping backend process");
        match self.child.take() {
            Some(child) => {
                let exit = terminate(child, self.settings.grace_period).await;
                self.apply(SupervisorEvent::ChildExited(exit))?;
            }
            None => {
                self.apply(SupervisorEvent::StopCompleted)?;
            }
        }
        Ok(())
    }

    fn record_exit(&mut self, exit: ChildExit) -> Result<()> {
        self.child = None;
        let step = self.apply(SupervisorEvent::ChildExited(exit))?;
        match step.failure {
            Some(reason) => {
                error!(%exit, hint = reason.hint(), "backend process exited unexpectedly");
                Err(reason.into())
            }
            None => {
                info!(%exit, "backend process exited cleanly");
                Ok(())
            }
        }
    }

    fn apply(&mut self, event: SupervisorEvent) -> Result<CoreStep> {
        let step = self.core.step(event)?;
        if step.changed() {
            debug!(from = ?step.from, to = ?step.to, "supervisor state changed");
        }
        Ok(step)
    }
}

/// Terminate `child`: graceful signal, then a forceful one once `grace`
/// has passed without an exit.
async fn terminate(mut child: ChildControl, grace: Duration) -> ChildExit {
    if let Some(exit) = child.exit_status() {
        return exit;
    }

    let pid = child.pid();
    if !child.signal(StopSignal::Graceful) {
        return child.wait().await;
    }

    if let Ok(exit) = timeout(grace, child.wait()).await {
        debug!(?pid, %exit, "backend exited after graceful termination");
        return exit;
    }

    warn!(?pid, ?grace, "backend did not exit after graceful termination; force killing");
    child.signal(StopSignal::Forceful);

    match timeout(FORCE_KILL_WAIT, child.wait()).await {
        Ok(exit) => exit,
        Err(_) => {
            error!(?pid, "backend still running after forceful kill");
            ChildExit {
                code: None,
                signal: None,
            }
        }
    }
}

fn failure_error(step: CoreStep) -> LauncherError {
    match step.failure {
        Some(reason) => reason.into(),
        None => LauncherError::Other(anyhow::anyhow!(
            "unexpected supervisor transition {:?} -> {:?}",
            step.from,
            step.to
        )),
    }
}
