// src/config/validate.rs

use std::time::Duration;

use tracing::Level;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunwatchError};
use crate::logging::parse_level_str;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RunwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let interval = validate_interval(&raw)?;
        let capture_level = validate_capture_level(&raw)?;
        validate_discovery(&raw)?;
        Ok(ConfigFile::new_unchecked(
            interval,
            raw.progress,
            capture_level,
            raw.discovery,
        ))
    }
}

fn validate_interval(cfg: &RawConfigFile) -> Result<Duration> {
    let interval = parse_duration(&cfg.progress.interval)?;
    if interval.is_zero() {
        return Err(RunwatchError::ConfigError(
            "[progress].interval must be greater than zero".to_string(),
        ));
    }
    Ok(interval)
}

fn validate_capture_level(cfg: &RawConfigFile) -> Result<Level> {
    parse_level_str(&cfg.capture.level).ok_or_else(|| {
        RunwatchError::ConfigError(format!(
            "[capture].level: unknown level '{}' (expected error, warn, info, debug or trace)",
            cfg.capture.level
        ))
    })
}

fn validate_discovery(cfg: &RawConfigFile) -> Result<()> {
    let discovery = &cfg.discovery;

    if discovery.total.is_some() && discovery.command.is_some() {
        return Err(RunwatchError::ConfigError(
            "[discovery]: `total` and `command` are mutually exclusive".to_string(),
        ));
    }

    if discovery
        .command
        .as_deref()
        .is_some_and(|c| c.trim().is_empty())
    {
        return Err(RunwatchError::ConfigError(
            "[discovery].command must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(RunwatchError::InvalidDuration(
            "empty duration string".to_string(),
        ));
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| RunwatchError::InvalidDuration(format!("'{s}' is missing a unit suffix")))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part.parse().map_err(|e| {
        RunwatchError::InvalidDuration(format!("invalid duration number '{num_part}': {e}"))
    })?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(60 * 60))),
        _ => Err(RunwatchError::InvalidDuration(format!(
            "unsupported duration unit '{unit}'; expected ms, s, m, or h"
        ))),
    }
}
