// src/supervisor/process.rs

//! Process spawning and signal delivery.
//!
//! The supervisor never touches `tokio::process::Command` itself; it asks a
//! [`ProcessBackend`] for a child. [`RealProcessBackend`] is the production
//! one, tests plug in scripted fakes.
//!
//! A spawned child is owned by a background "exit observer" task. The
//! supervisor only holds a [`ChildControl`]: a pid, a channel for
//! [`StopSignal`]s and a `watch` channel on which the observer publishes the
//! exit status exactly once.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::errors::{LauncherError, Result};

use super::{ChildExit, LaunchSpec};

/// Termination request delivered to the exit observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// SIGTERM-equivalent; the child may clean up.
    Graceful,
    /// SIGKILL-equivalent.
    Forceful,
}

/// Trait abstracting how the backend process is created.
///
/// Production code uses [`RealProcessBackend`]; tests can provide an
/// implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send {
    /// Spawn the child described by `spec`.
    ///
    /// Must return `LauncherError::SpawnError` when the OS refuses to
    /// create the process.
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<ChildControl>;
}

/// The supervisor's side of a running child.
///
/// Dropping it closes the signal channel, which makes the real observer
/// kill the child.
#[derive(Debug)]
pub struct ChildControl {
    pid: Option<u32>,
    signal_tx: mpsc::Sender<StopSignal>,
    exit_rx: watch::Receiver<Option<ChildExit>>,
}

impl ChildControl {
    pub fn new(
        pid: Option<u32>,
        signal_tx: mpsc::Sender<StopSignal>,
        exit_rx: watch::Receiver<Option<ChildExit>>,
    ) -> Self {
        Self {
            pid,
            signal_tx,
            exit_rx,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the observer to deliver `signal`.
    ///
    /// Returns `false` if the observer is gone, i.e. the child has already
    /// been reaped.
    pub fn signal(&self, signal: StopSignal) -> bool {
        match self.signal_tx.try_send(signal) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Observer is busy with earlier requests; the child is still
                // being handled.
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Exit status if the child has already exited.
    pub fn exit_status(&self) -> Option<ChildExit> {
        *self.exit_rx.borrow()
    }

    /// A receiver that resolves when the child exits.
    pub fn exit_watch(&self) -> watch::Receiver<Option<ChildExit>> {
        self.exit_rx.clone()
    }

    /// Suspend until the child has exited.
    pub async fn wait(&mut self) -> ChildExit {
        wait_for_child_exit(&mut self.exit_rx).await
    }
}

/// Resolve once an exit status has been published on `exit_rx`.
///
/// If the publisher goes away without ever reporting an exit, the child is
/// treated as gone with an unknown status.
pub async fn wait_for_child_exit(exit_rx: &mut watch::Receiver<Option<ChildExit>>) -> ChildExit {
    match exit_rx.wait_for(Option::is_some).await {
        Ok(guard) => (*guard).unwrap_or_else(ChildExit::unknown),
        Err(_) => {
            warn!("exit observer went away without reporting; assuming the child is gone");
            ChildExit::unknown()
        }
    }
}

/// Real backend used in production: `tokio::process::Command`.
///
/// - environment is inherited with `LaunchSpec::env` layered on top;
/// - stdout lines are logged at `info`, stderr lines at `warn`;
/// - on Unix the child gets its own process group so that termination
///   signals reach whatever the start script spawned.
#[derive(Debug, Clone, Default)]
pub struct RealProcessBackend;

impl RealProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<ChildControl> {
        let mut cmd = Command::new(&spec.command);
        cmd.args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| LauncherError::SpawnError(format!("{}: {e}", spec.display())))?;

        let pid = child.id();
        info!(?pid, cmd = %spec.display(), "backend process spawned");

        pump_output(&mut child, pid);

        let (signal_tx, signal_rx) = mpsc::channel::<StopSignal>(4);
        let (exit_tx, exit_rx) = watch::channel::<Option<ChildExit>>(None);

        tokio::spawn(observe_child(child, pid, signal_rx, exit_tx));

        Ok(ChildControl::new(pid, signal_tx, exit_rx))
    }
}

/// Consume stdout/stderr so pipes never fill, forwarding lines to tracing.
fn pump_output(child: &mut Child, pid: Option<u32>) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(drain_lines(stdout, pid, OutputStream::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(drain_lines(stderr, pid, OutputStream::Stderr));
    }
}

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

/// Read `pipe` line by line until EOF.
///
/// Lines are decoded lossily: a child that prints invalid UTF-8 must keep a
/// reader on its pipe, or its next write dies with SIGPIPE.
async fn drain_lines<R>(pipe: R, pid: Option<u32>, stream: OutputStream)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();
                match stream {
                    OutputStream::Stdout => info!(target: "backend", ?pid, "{line}"),
                    OutputStream::Stderr => warn!(target: "backend", ?pid, "{line}"),
                }
            }
            Err(e) => {
                warn!(?pid, ?stream, error = %e, "reading backend output failed");
                break;
            }
        }
    }
    debug!(?pid, ?stream, "backend output closed");
}

/// Own the child until it exits, delivering stop signals on request.
async fn observe_child(
    mut child: Child,
    pid: Option<u32>,
    mut signal_rx: mpsc::Receiver<StopSignal>,
    exit_tx: watch::Sender<Option<ChildExit>>,
) {
    let exit = loop {
        tokio::select! {
            status = child.wait() => {
                break match status {
                    Ok(status) => ChildExit::from(status),
                    Err(e) => {
                        error!(?pid, error = %e, "failed to wait for backend process");
                        ChildExit::unknown()
                    }
                };
            }

            request = signal_rx.recv() => {
                match request {
                    Some(signal) => deliver(&mut child, pid, signal),
                    None => {
                        debug!(?pid, "child control dropped; killing backend process");
                        deliver(&mut child, pid, StopSignal::Forceful);
                        break match child.wait().await {
                            Ok(status) => ChildExit::from(status),
                            Err(_) => ChildExit::unknown(),
                        };
                    }
                }
            }
        }
    };

    info!(?pid, code = ?exit.code, signal = ?exit.signal, "backend process exited");
    let _ = exit_tx.send(Some(exit));
}

fn deliver(child: &mut Child, pid: Option<u32>, signal: StopSignal) {
    debug!(?pid, ?signal, "delivering stop signal to backend");

    if send_to_group(pid, signal) {
        return;
    }

    if let Err(e) = child.start_kill() {
        warn!(?pid, error = %e, "failed to kill backend process");
    }
}

/// Signal the child's process group (falling back to the child alone).
#[cfg(unix)]
fn send_to_group(pid: Option<u32>, signal: StopSignal) -> bool {
    use nix::sys::signal::{self, killpg, Signal};
    use nix::unistd::Pid;

    let Some(raw) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return false;
    };

    let sig = match signal {
        StopSignal::Graceful => Signal::SIGTERM,
        StopSignal::Forceful => Signal::SIGKILL,
    };
    let target = Pid::from_raw(raw);

    match killpg(target, sig).or_else(|_| signal::kill(target, sig)) {
        Ok(()) => true,
        Err(e) => {
            warn!(?pid, ?signal, error = %e, "signal delivery failed; falling back to kill");
            false
        }
    }
}

/// No process groups or SIGTERM here; every stop is a kill.
#[cfg(not(unix))]
fn send_to_group(_pid: Option<u32>, _signal: StopSignal) -> bool {
    false
}
