// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;
use tracing::Level;

use crate::capture::CollectorOptions;
use crate::discovery::{CommandDiscovery, StaticDiscovery};
use crate::engine::ProgressOptions;
use crate::progress::DEFAULT_MESSAGE;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [progress]
/// interval = "2s"
/// fallback_message = "Processing..."
/// completion_message = "Release finished"
/// placeholder_log = "No log output captured"
///
/// [capture]
/// level = "info"
///
/// [discovery]
/// command = "ls packages"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub progress: ProgressSection,

    #[serde(default)]
    pub capture: CaptureSection,

    #[serde(default)]
    pub discovery: DiscoverySection,
}

/// `[progress]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressSection {
    /// Tick interval as a duration string (`"250ms"`, `"2s"`, `"1m"`).
    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    #[serde(default = "default_completion_message")]
    pub completion_message: String,

    #[serde(default = "default_placeholder_log")]
    pub placeholder_log: String,
}

fn default_interval() -> String {
    "2s".to_string()
}

fn default_fallback_message() -> String {
    DEFAULT_MESSAGE.to_string()
}

fn default_completion_message() -> String {
    ProgressOptions::default().completion_message
}

fn default_placeholder_log() -> String {
    ProgressOptions::default().placeholder_log
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            fallback_message: default_fallback_message(),
            completion_message: default_completion_message(),
            placeholder_log: default_placeholder_log(),
        }
    }
}

/// `[capture]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaptureSection {
    /// Most verbose level the collector keeps.
    #[serde(default = "default_capture_level")]
    pub level: String,
}

fn default_capture_level() -> String {
    "info".to_string()
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            level: default_capture_level(),
        }
    }
}

/// `[discovery]` section.
///
/// Either a fixed `total` or a probe `command`, never both.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DiscoverySection {
    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub command: Option<String>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (or `Default`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub interval: Duration,
    pub fallback_message: String,
    pub completion_message: String,
    pub placeholder_log: String,
    pub capture_level: Level,
    pub discovery: DiscoverySection,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let options = ProgressOptions::default();
        Self {
            interval: options.interval,
            fallback_message: options.fallback_message,
            completion_message: options.completion_message,
            placeholder_log: options.placeholder_log,
            capture_level: options.capture.min_level,
            discovery: DiscoverySection::default(),
        }
    }
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        interval: Duration,
        progress: ProgressSection,
        capture_level: Level,
        discovery: DiscoverySection,
    ) -> Self {
        Self {
            interval,
            fallback_message: progress.fallback_message,
            completion_message: progress.completion_message,
            placeholder_log: progress.placeholder_log,
            capture_level,
            discovery,
        }
    }

    /// Options for the orchestrator.
    pub fn progress_options(&self) -> ProgressOptions {
        ProgressOptions {
            interval: self.interval,
            fallback_message: self.fallback_message.clone(),
            completion_message: self.completion_message.clone(),
            placeholder_log: self.placeholder_log.clone(),
            capture: CollectorOptions {
                min_level: self.capture_level,
            },
        }
    }

    /// Fixed discovery, if `[discovery] total` is set.
    pub fn static_discovery(&self) -> Option<StaticDiscovery> {
        self.discovery
            .total
            .map(|total| StaticDiscovery::new(total, self.discovery.message.clone()))
    }

    /// Probe discovery, if `[discovery] command` is set.
    pub fn command_discovery(&self) -> Option<CommandDiscovery> {
        self.discovery.command.as_deref().map(CommandDiscovery::new)
    }
}
