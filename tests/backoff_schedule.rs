// tests/backoff_schedule.rs

mod common;
use crate::common::fake_probe::ScriptedProbe;
use crate::common::init_tracing;

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use backend_launcher::supervisor::process::wait_for_child_exit;
use backend_launcher::supervisor::{
    wait_for_ready, Backoff, ChildExit, ProbeTarget, ReadinessOutcome, ReadinessPolicy,
};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn target() -> ProbeTarget {
    ProbeTarget {
        host: "localhost".to_string(),
        port: 3000,
    }
}

#[test]
fn default_schedule_doubles_then_caps() {
    let delays: Vec<Duration> = Backoff::default().delays().take(7).collect();
    assert_eq!(
        delays,
        vec![ms(100), ms(200), ms(400), ms(800), ms(1000), ms(1000), ms(1000)]
    );
}

#[test]
fn large_attempts_saturate_at_cap() {
    let backoff = Backoff::default();
    assert_eq!(backoff.delay(31), ms(1000));
    assert_eq!(backoff.delay(u32::MAX), ms(1000));
}

#[test]
fn base_above_cap_is_clamped() {
    let backoff = Backoff::new(ms(5000), ms(250));
    assert_eq!(backoff.base(), ms(250));
    assert_eq!(backoff.delay(0), ms(250));
    assert_eq!(backoff.delay(3), ms(250));
}

/// Gaps between consecutive probes.
fn gaps(attempts: &[Instant]) -> Vec<Duration> {
    attempts.windows(2).map(|w| w[1] - w[0]).collect()
}

#[tokio::test(start_paused = true)]
async fn probes_follow_backoff_until_ready() {
    init_tracing();

    let probe = ScriptedProbe::after_attempts(6);
    let (_exit_tx, mut exit_rx) = watch::channel::<Option<ChildExit>>(None);
    let policy = ReadinessPolicy::default();

    let start = Instant::now();
    let outcome = wait_for_ready(&probe, &target(), &policy, &mut exit_rx).await;

    let ReadinessOutcome::Ready { attempts, elapsed } = outcome else {
        panic!("expected Ready, got {outcome:?}");
    };
    assert_eq!(attempts, 6);
    assert_eq!(elapsed, ms(100 + 200 + 400 + 800 + 1000));

    let recorded = probe.attempts();
    assert_eq!(recorded[0] - start, ms(500), "initial grace delay before first probe");
    assert_eq!(
        gaps(&recorded),
        vec![ms(100), ms(200), ms(400), ms(800), ms(1000)]
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_lands_within_one_interval_of_deadline() {
    init_tracing();

    let probe = ScriptedProbe::never();
    let (_exit_tx, mut exit_rx) = watch::channel::<Option<ChildExit>>(None);
    let policy = ReadinessPolicy {
        startup_timeout: Duration::from_secs(5),
        ..ReadinessPolicy::default()
    };

    let outcome = wait_for_ready(&probe, &target(), &policy, &mut exit_rx).await;

    let ReadinessOutcome::TimedOut { waited, .. } = outcome else {
        panic!("expected TimedOut, got {outcome:?}");
    };
    assert!(waited >= policy.startup_timeout, "waited {waited:?}");
    assert!(waited < policy.startup_timeout + ms(1000), "waited {waited:?}");
}

#[tokio::test(start_paused = true)]
async fn slow_probes_overrun_deadline_by_at_most_one_probe() {
    init_tracing();

    // Every probe hangs for the full probe timeout, like a filtered port.
    let probe = ScriptedProbe::never().with_latency(Duration::from_secs(1));
    let (_exit_tx, mut exit_rx) = watch::channel::<Option<ChildExit>>(None);
    let policy = ReadinessPolicy {
        startup_timeout: ms(2500),
        ..ReadinessPolicy::default()
    };

    let outcome = wait_for_ready(&probe, &target(), &policy, &mut exit_rx).await;

    let ReadinessOutcome::TimedOut { waited, .. } = outcome else {
        panic!("expected TimedOut, got {outcome:?}");
    };
    assert!(waited >= policy.startup_timeout, "waited {waited:?}");
    assert!(
        waited <= policy.startup_timeout + policy.probe_timeout,
        "waited {waited:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn port_opening_mid_wait_is_seen_on_next_probe() {
    init_tracing();

    let opens_at = Instant::now() + ms(1700);
    let probe = ScriptedProbe::ready_at(opens_at);
    let (_exit_tx, mut exit_rx) = watch::channel::<Option<ChildExit>>(None);
    let policy = ReadinessPolicy::default();

    let outcome = wait_for_ready(&probe, &target(), &policy, &mut exit_rx).await;
    assert!(matches!(outcome, ReadinessOutcome::Ready { .. }), "{outcome:?}");

    // Probes at 0.5, 0.6, 0.8, 1.2, 2.0: the first one after the port opened.
    let last = *probe.attempts().last().expect("at least one probe");
    assert!(last >= opens_at);
    assert!(last - opens_at <= ms(1000));
}

#[tokio::test(start_paused = true)]
async fn child_exit_interrupts_the_wait() {
    init_tracing();

    let probe = ScriptedProbe::never();
    let (exit_tx, mut exit_rx) = watch::channel::<Option<ChildExit>>(None);
    let policy = ReadinessPolicy::default();

    tokio::spawn(async move {
        tokio::time::sleep(ms(1500)).await;
        let _ = exit_tx.send(Some(ChildExit::with_code(3)));
    });

    let start = Instant::now();
    let outcome = wait_for_ready(&probe, &target(), &policy, &mut exit_rx).await;

    assert_eq!(outcome, ReadinessOutcome::Exited(ChildExit::with_code(3)));
    assert_eq!(start.elapsed(), ms(1500));
}

#[tokio::test(start_paused = true)]
async fn vanished_exit_observer_counts_as_exit() {
    init_tracing();

    let (exit_tx, mut exit_rx) = watch::channel::<Option<ChildExit>>(None);
    drop(exit_tx);
    assert_eq!(
        wait_for_child_exit(&mut exit_rx).await,
        ChildExit::unknown()
    );

    let probe = ScriptedProbe::never();
    let start = Instant::now();
    let outcome = wait_for_ready(&probe, &target(), &ReadinessPolicy::default(), &mut exit_rx).await;

    assert_eq!(outcome, ReadinessOutcome::Exited(ChildExit::unknown()));
    assert!(start.elapsed() < ReadinessPolicy::default().startup_timeout);
}
