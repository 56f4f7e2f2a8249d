// src/discovery.rs

//! Optional upfront probes that estimate how many units a run will process.
//!
//! Discovery is best-effort: the orchestrator treats both `Ok(None)` and any
//! error as "no discovery data" and carries on without a known total.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::{Context, bail};
use tracing::debug;

use crate::exec::command::shell_command;

/// Result of a discovery probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryInfo {
    pub total: u64,
    pub message: String,
}

impl DiscoveryInfo {
    pub fn new(total: u64, message: impl Into<String>) -> Self {
        Self {
            total,
            message: message.into(),
        }
    }
}

/// Trait abstracting a discovery probe.
pub trait Discovery<A: ?Sized>: Send + Sync {
    fn discover<'a>(
        &'a self,
        args: &'a A,
        directory: &'a Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<DiscoveryInfo>>> + Send + 'a>>;
}

/// Discovery with a fixed answer (e.g. from config or a CLI flag).
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    info: DiscoveryInfo,
}

impl StaticDiscovery {
    pub fn new(total: u64, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| format!("Found {total} units"));
        Self {
            info: DiscoveryInfo::new(total, message),
        }
    }
}

impl<A: ?Sized + Sync> Discovery<A> for StaticDiscovery {
    fn discover<'a>(
        &'a self,
        _args: &'a A,
        _directory: &'a Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<DiscoveryInfo>>> + Send + 'a>> {
        Box::pin(async move { Ok(Some(self.info.clone())) })
    }
}

/// Runs a probe command; every non-empty stdout line counts as one unit.
#[derive(Debug, Clone)]
pub struct CommandDiscovery {
    command: String,
}

impl CommandDiscovery {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn probe(&self, directory: &Path) -> anyhow::Result<Option<DiscoveryInfo>> {
        debug!(cmd = %self.command, dir = %directory.display(), "running discovery probe");

        let output = shell_command(&self.command)
            .current_dir(directory)
            .output()
            .await
            .with_context(|| format!("spawning discovery command '{}'", self.command))?;

        if !output.status.success() {
            bail!(
                "discovery command '{}' exited with {}",
                self.command,
                output.status.code().unwrap_or(-1)
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let total = stdout.lines().filter(|l| !l.trim().is_empty()).count();
        if total == 0 {
            return Ok(None);
        }

        let total = u64::try_from(total).unwrap_or(u64::MAX);
        Ok(Some(DiscoveryInfo::new(total, format!("Found {total} units"))))
    }
}

impl<A: ?Sized + Sync> Discovery<A> for CommandDiscovery {
    fn discover<'a>(
        &'a self,
        _args: &'a A,
        directory: &'a Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<DiscoveryInfo>>> + Send + 'a>> {
        Box::pin(self.probe(directory))
    }
}
