// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod locate;
pub mod logging;
pub mod supervisor;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::cli::{CliArgs, Command, LaunchArgs};
use crate::config::{config_root_dir, load_and_validate, LauncherConfig};
use crate::errors::LauncherError;
use crate::locate::{locate, parse_annotations, segment, MatchKind, MatchResult};
use crate::supervisor::{RealProcessBackend, Supervisor, SupervisorSettings, TcpProbe};

/// High-level entry point used by `main.rs`.
///
/// Dispatches on the subcommand. `launch` wires together:
/// - config loading
/// - script path resolution (dev vs packaged)
/// - supervisor with the real process backend and TCP probe
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command() {
        Command::Launch(launch) => run_launch(Path::new(&args.config), &launch).await,
        Command::Locate { text, span } => run_locate(&text, &span),
        Command::Annotate { text, annotations } => run_annotate(&text, &annotations),
        Command::Preset { name } => {
            print!("{}", name.to_toml());
            Ok(())
        }
    }
}

async fn run_launch(config_path: &Path, launch: &LaunchArgs) -> Result<()> {
    let cfg = load_and_validate(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let script_root = script_root(config_path, launch);
    let settings = cfg.supervisor_settings(&script_root);

    if launch.dry_run {
        print_dry_run(&cfg, &script_root, &settings);
        return Ok(());
    }

    let mut supervisor = Supervisor::new(settings, RealProcessBackend::new(), TcpProbe);

    if let Err(err) = supervisor.start().await {
        log_failure(&err);
        return Err(err).context("backend failed to start");
    }

    info!(url = %cfg.frontend_url, "backend ready; frontend can be opened");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    if let Err(err) = supervisor.supervise_until(shutdown).await {
        log_failure(&err);
        return Err(err).context("backend stopped unexpectedly");
    }

    info!(state = ?supervisor.state(), "launcher exiting");
    Ok(())
}

/// Where a relative backend script is looked up.
///
/// A packaged install passes its resources directory; otherwise the script
/// sits next to the config file.
fn script_root(config_path: &Path, launch: &LaunchArgs) -> PathBuf {
    match &launch.resources_dir {
        Some(dir) => dir.clone(),
        None => config_root_dir(config_path),
    }
}

fn log_failure(err: &LauncherError) {
    match err.hint() {
        Some(hint) => error!(error = %err, "{hint}"),
        None => error!(error = %err, "backend failure"),
    }
}

fn run_locate(text_path: &Path, needle: &str) -> Result<()> {
    let text = fs::read_to_string(text_path)
        .with_context(|| format!("reading text from {}", text_path.display()))?;

    match locate(&text, needle) {
        MatchResult::Found { span, kind } => {
            debug!(start = span.start, end = span.end, ?kind, "span located");
            let kind = match kind {
                MatchKind::Exact => "exact",
                MatchKind::Normalized => "normalized",
            };
            println!("{} {} {kind}", span.start, span.end);
        }
        MatchResult::NotFound => println!("not found"),
    }
    Ok(())
}

fn run_annotate(text_path: &Path, annotations_path: &Path) -> Result<()> {
    let text = fs::read_to_string(text_path)
        .with_context(|| format!("reading text from {}", text_path.display()))?;
    let raw = fs::read_to_string(annotations_path)
        .with_context(|| format!("reading annotations from {}", annotations_path.display()))?;
    let annotations = parse_annotations(&raw)
        .with_context(|| format!("parsing annotations in {}", annotations_path.display()))?;

    let result = segment(&text, &annotations);
    info!(
        matched = result.matched(),
        total = annotations.len(),
        unmatched = result.unmatched.len(),
        overlapping = result.overlapping.len(),
        "annotate complete"
    );

    let out = result.views(&text, &annotations);
    let json = serde_json::to_string_pretty(&out).context("serializing segments")?;
    println!("{json}");
    Ok(())
}

/// Simple dry-run output: print the resolved launch settings.
fn print_dry_run(
    cfg: &LauncherConfig,
    script_root: &Path,
    settings: &SupervisorSettings,
) {
    println!("backend-launcher dry-run");
    println!("  script root = {}", script_root.display());
    println!();

    println!("backend:");
    println!("  cmd: {}", settings.launch.display());
    if let Some(dir) = &settings.launch.working_dir {
        println!("  working_dir: {}", dir.display());
    }
    for (key, value) in &settings.launch.env {
        println!("  env: {key}={value}");
    }

    println!("readiness:");
    println!("  target: {}", settings.target);
    println!("  startup_timeout: {:?}", settings.readiness.startup_timeout);
    println!("  probe_timeout: {:?}", settings.readiness.probe_timeout);
    println!("  initial_delay: {:?}", settings.readiness.initial_delay);
    println!(
        "  backoff: {:?} .. {:?}",
        settings.readiness.backoff.base(),
        settings.readiness.backoff.cap()
    );

    println!("shutdown:");
    println!("  grace_period: {:?}", settings.grace_period);

    println!("frontend:");
    println!("  url: {}", cfg.frontend_url);

    debug!("dry-run complete (nothing started)");
}
