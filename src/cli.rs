// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Preset;

/// Command-line arguments for `backend-launcher`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "backend-launcher",
    version,
    about = "Start a backend server, wait until its port answers, and keep it supervised.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the launcher config file (TOML).
    ///
    /// Default: `Launcher.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Launcher.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BACKEND_LAUNCHER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// What to do. Defaults to `launch`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The subcommand to run, falling back to a plain `launch`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Launch(LaunchArgs::default()))
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the backend and supervise it until Ctrl-C or a crash.
    Launch(LaunchArgs),

    /// Locate a span inside a text file (exact first, then normalized).
    Locate {
        /// File holding the source text.
        #[arg(long, value_name = "FILE")]
        text: PathBuf,

        /// The span to look for.
        #[arg(long, value_name = "STRING")]
        span: String,
    },

    /// Cut a text file into annotated segments and print them as JSON.
    Annotate {
        /// File holding the source text.
        #[arg(long, value_name = "FILE")]
        text: PathBuf,

        /// JSON array of annotations (`textSpan`, `insight`, `timestamp`, `type`).
        #[arg(long, value_name = "FILE")]
        annotations: PathBuf,
    },

    /// Print a starter config for a common backend setup.
    Preset {
        #[arg(value_enum)]
        name: Preset,
    },
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct LaunchArgs {
    /// Resolve a relative backend script against this resources directory
    /// (packaged install) instead of the config file's directory.
    #[arg(long, value_name = "DIR")]
    pub resources_dir: Option<PathBuf>,

    /// Parse + validate, print the resolved launch settings, but don't start
    /// anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
