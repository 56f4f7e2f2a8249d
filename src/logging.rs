// src/logging.rs

//! Logging setup for `runwatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the console log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `RUNWATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Console logs go to STDERR so that stdout carries only notifications and
//! the final result. The capture layer is installed next to the console
//! layer and is not limited by the console level; collectors apply their own
//! minimum level.

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

use crate::capture::LogFacade;
use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV: &str = "RUNWATCH_LOG";

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var(LOG_ENV)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::from_level(level));

    registry()
        .with(console)
        .with(LogFacade::global().layer())
        .try_init()
        .context("installing global tracing subscriber")?;

    Ok(())
}

pub fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

pub fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
