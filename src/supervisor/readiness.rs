// src/supervisor/readiness.rs

//! Readiness probing: poll a TCP port until it accepts a connection.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace};

use super::process::wait_for_child_exit;
use super::{ChildExit, ProbeTarget, ReadinessPolicy};

/// A boolean liveness check against the backend.
///
/// Production uses [`TcpProbe`]. Implementations must respect `timeout`
/// themselves and never error: an unreachable port is just `false`.
pub trait ReadinessProbe: Send + Sync {
    fn probe<'a>(
        &'a self,
        target: &'a ProbeTarget,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Connect-only TCP probe. No payload is sent or read.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl ReadinessProbe for TcpProbe {
    fn probe<'a>(
        &'a self,
        target: &'a ProbeTarget,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            let connect = TcpStream::connect((target.host.as_str(), target.port));
            match tokio::time::timeout(timeout, connect).await {
                Ok(Ok(_stream)) => true,
                Ok(Err(e)) => {
                    trace!(%target, error = %e, "connect failed");
                    false
                }
                Err(_) => {
                    trace!(%target, ?timeout, "connect timed out");
                    false
                }
            }
        })
    }
}

/// How a readiness wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// A probe succeeded. `elapsed` is measured from the first probe.
    Ready { attempts: u32, elapsed: Duration },
    /// The startup timeout passed without a successful probe.
    TimedOut { attempts: u32, waited: Duration },
    /// The child exited before it became ready.
    Exited(ChildExit),
}

/// Probe `target` until it answers, the deadline passes, or the child exits.
///
/// - sleeps `policy.initial_delay` before the first probe;
/// - between failed probes waits `policy.backoff.delay(attempt)`, clamped
///   so the last sleep ends exactly at the deadline;
/// - gives up after a failed probe once `policy.startup_timeout` has
///   elapsed since the first probe, so a timeout is reported no earlier than
///   the deadline and no later than one probe past it;
/// - races every probe and sleep against `exit_rx`.
pub async fn wait_for_ready<P: ReadinessProbe + ?Sized>(
    probe: &P,
    target: &ProbeTarget,
    policy: &ReadinessPolicy,
    exit_rx: &mut watch::Receiver<Option<ChildExit>>,
) -> ReadinessOutcome {
    if !policy.initial_delay.is_zero() {
        if let Some(exit) = sleep_unless_exited(policy.initial_delay, exit_rx).await {
            return ReadinessOutcome::Exited(exit);
        }
    }

    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if let Some(exit) = *exit_rx.borrow() {
            return ReadinessOutcome::Exited(exit);
        }

        let reachable = tokio::select! {
            biased;
            exit = wait_for_child_exit(exit_rx) => return ReadinessOutcome::Exited(exit),
            ok = probe.probe(target, policy.probe_timeout) => ok,
        };
        attempts += 1;

        let elapsed = started.elapsed();
        if reachable {
            info!(%target, attempts, ?elapsed, "backend is accepting connections");
            return ReadinessOutcome::Ready { attempts, elapsed };
        }

        if elapsed >= policy.startup_timeout {
            return ReadinessOutcome::TimedOut {
                attempts,
                waited: elapsed,
            };
        }

        let remaining = policy.startup_timeout - elapsed;
        let delay = policy.backoff.delay(attempts - 1).min(remaining);
        debug!(%target, attempt = attempts, ?delay, "waiting for backend");

        if let Some(exit) = sleep_unless_exited(delay, exit_rx).await {
            return ReadinessOutcome::Exited(exit);
        }
    }
}

async fn sleep_unless_exited(
    delay: Duration,
    exit_rx: &mut watch::Receiver<Option<ChildExit>>,
) -> Option<ChildExit> {
    tokio::select! {
        biased;
        exit = wait_for_child_exit(exit_rx) => Some(exit),
        _ = sleep(delay) => None,
    }
}
