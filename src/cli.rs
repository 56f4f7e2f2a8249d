// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::engine::RunArgs;

/// Command-line arguments for `runwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runwatch",
    version,
    about = "Run a command and report its progress from the log lines it emits.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Runwatch.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory to run the command in.
    #[arg(long, short = 'C', value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Known number of units the command will process.
    #[arg(long, value_name = "N", conflicts_with = "discover")]
    pub total: Option<u64>,

    /// Shell command whose non-empty stdout lines are counted as the total.
    #[arg(long, value_name = "CMD")]
    pub discover: Option<String>,

    /// Progress token for push notifications.
    ///
    /// Required for `--mode push`.
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// How progress is reported.
    #[arg(long, value_enum, default_value_t = ReportMode::Poll)]
    pub mode: ReportMode,

    /// Extra operation settings, exported to the command as `RUNWATCH_<KEY>`.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub settings: Vec<(String, String)>,

    /// Print the command instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, short)]
    pub verbose: bool,

    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate and print the effective configuration, then exit.
    #[arg(long)]
    pub print_config: bool,

    /// The command to run.
    #[arg(last = true, value_name = "COMMAND", required_unless_present = "print_config")]
    pub command: Vec<String>,
}

impl CliArgs {
    /// The wrapped command as a single shell string.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

impl RunArgs for CliArgs {
    fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }

    fn verbose(&self) -> bool {
        self.verbose
    }

    fn debug(&self) -> bool {
        self.debug
    }
}

/// Progress reporting mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum ReportMode {
    /// JSON-RPC progress notifications on stdout.
    Push,
    /// Human-readable status lines on stderr.
    Poll,
    /// No progress reporting, only the final result.
    Silent,
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

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
