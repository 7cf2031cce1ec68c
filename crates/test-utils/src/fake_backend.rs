use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use backend_launcher::errors::{LauncherError, Result};
use backend_launcher::supervisor::{
    ChildControl, ChildExit, LaunchSpec, ProcessBackend, StopSignal,
};

pub const SIGTERM: i32 = 15;
pub const SIGKILL: i32 = 9;

/// How a fake child behaves once spawned.
#[derive(Debug, Clone)]
pub enum ChildScript {
    /// Runs until signalled; exits on the first graceful signal.
    Cooperative,
    /// Ignores graceful signals; only a forceful one ends it.
    Stubborn,
    /// Exits on its own with `exit` after `after`, unless signalled first.
    ExitsAfter { after: Duration, exit: ChildExit },
    /// The spawn itself fails with this message.
    SpawnFails(String),
}

/// A stop signal as seen by a fake child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRecord {
    pub pid: u32,
    pub signal: StopSignal,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    scripts: VecDeque<ChildScript>,
    next_pid: u32,
    spawned: Vec<(u32, LaunchSpec)>,
    signals: Vec<SignalRecord>,
    exits: Vec<(u32, ChildExit)>,
}

/// A fake process backend that:
/// - hands out scripted children in order (falling back to `Cooperative`)
/// - records every spawn, delivered signal and exit.
///
/// Clones share state, so keep one clone in the test to inspect what the
/// supervisor did.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessBackend {
    inner: Arc<Mutex<Inner>>,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: ChildScript) -> Self {
        let backend = Self::new();
        backend.push(script);
        backend
    }

    /// Queue the behaviour of the next spawned child.
    pub fn push(&self, script: ChildScript) {
        self.inner.lock().unwrap().scripts.push_back(script);
    }

    pub fn spawn_count(&self) -> usize {
        self.inner.lock().unwrap().spawned.len()
    }

    pub fn spawned(&self) -> Vec<(u32, LaunchSpec)> {
        self.inner.lock().unwrap().spawned.clone()
    }

    pub fn signals(&self) -> Vec<SignalRecord> {
        self.inner.lock().unwrap().signals.clone()
    }

    pub fn exits(&self) -> Vec<(u32, ChildExit)> {
        self.inner.lock().unwrap().exits.clone()
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<ChildControl> {
        let (script, pid) = {
            let mut guard = self.inner.lock().unwrap();
            let script = guard.scripts.pop_front().unwrap_or(ChildScript::Cooperative);
            if let ChildScript::SpawnFails(msg) = &script {
                return Err(LauncherError::SpawnError(msg.clone()));
            }
            guard.next_pid += 1;
            let pid = 1000 + guard.next_pid;
            guard.spawned.push((pid, spec.clone()));
            (script, pid)
        };
        debug!(pid, ?script, command = %spec.command, "fake backend spawned child");

        let (signal_tx, signal_rx) = mpsc::channel::<StopSignal>(4);
        let (exit_tx, exit_rx) = watch::channel::<Option<ChildExit>>(None);

        tokio::spawn(run_fake_child(
            pid,
            script,
            signal_rx,
            exit_tx,
            Arc::clone(&self.inner),
        ));

        Ok(ChildControl::new(Some(pid), signal_tx, exit_rx))
    }
}

async fn run_fake_child(
    pid: u32,
    script: ChildScript,
    mut signal_rx: mpsc::Receiver<StopSignal>,
    exit_tx: watch::Sender<Option<ChildExit>>,
    inner: Arc<Mutex<Inner>>,
) {
    let natural = match &script {
        ChildScript::ExitsAfter { after, exit } => Some((Instant::now() + *after, *exit)),
        _ => None,
    };

    let exit = loop {
        let natural_exit = async {
            match natural {
                Some((deadline, exit)) => {
                    sleep_until(deadline).await;
                    exit
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            exit = natural_exit => break exit,
            request = signal_rx.recv() => {
                let Some(signal) = request else {
                    break ChildExit::with_signal(SIGKILL);
                };
                inner.lock().unwrap().signals.push(SignalRecord {
                    pid,
                    signal,
                    at: Instant::now(),
                });
                match (signal, &script) {
                    (StopSignal::Forceful, _) => break ChildExit::with_signal(SIGKILL),
                    (StopSignal::Graceful, ChildScript::Stubborn) => continue,
                    (StopSignal::Graceful, _) => break ChildExit::with_signal(SIGTERM),
                }
            }
        }
    };

    inner.lock().unwrap().exits.push((pid, exit));
    let _ = exit_tx.send(Some(exit));
}
