// src/engine/mod.rs

//! Execution orchestration for runwatch.
//!
//! This module ties together:
//! - the log collector (what the worker says)
//! - the progress extractor (what that means)
//! - the notification sink (who hears about it)
//! - the working-directory scope and the periodic progress timer
//!
//! The pure progress/dedup state machine lives in [`core`]; the async/IO
//! shell that drives a single run is implemented in [`runtime`].

use std::time::Duration;

use crate::capture::CollectorOptions;
use crate::progress::DEFAULT_MESSAGE;

pub mod context;
pub mod core;
pub mod directory;
pub mod error;
pub mod result;
pub mod runtime;
pub mod timer;

pub use context::{ConfigHook, ExecutionContext, OperationConfig, ResultHook, RunArgs, RunHooks};
pub use core::{ProgressCore, RunPhase};
pub use directory::DirectoryScope;
pub use error::{ErrorReport, OperationError};
pub use result::{ErrorDetails, RunResult};
pub use runtime::Orchestrator;
pub use timer::ProgressTimer;

/// Default delay between progress ticks.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Options shared by the core and the async shell.
#[derive(Debug, Clone)]
pub struct ProgressOptions {
    /// Delay between progress ticks.
    pub interval: Duration,
    /// Message used when a snapshot has nothing better to say.
    pub fallback_message: String,
    /// Message of the final notification and of successful results.
    pub completion_message: String,
    /// Single log line reported when nothing at all was captured.
    pub placeholder_log: String,
    /// What the per-run collector keeps.
    pub capture: CollectorOptions,
}

impl Default for ProgressOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            fallback_message: DEFAULT_MESSAGE.to_string(),
            completion_message: "Operation completed successfully".to_string(),
            placeholder_log: "No log output captured".to_string(),
            capture: CollectorOptions::default(),
        }
    }
}
