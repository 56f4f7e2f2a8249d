// src/exec/mod.rs

//! Process execution layer.
//!
//! This module provides the shell-command operation used by the `runwatch`
//! binary. It runs the command with `tokio::process::Command` and re-emits
//! every stdout/stderr line as a `tracing` event under [`WORKER_TARGET`], which
//! is how the worker's free text reaches the log collector.
//!
//! - [`command`] builds the platform shell command and runs it to completion.

pub mod command;

pub use command::{CommandOutput, run_shell, shell_command};

/// Target used for re-emitted worker output lines.
pub const WORKER_TARGET: &str = "runwatch::worker";
