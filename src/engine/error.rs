// src/engine/error.rs

//! Operation failures and their user-facing decomposition.

use std::error::Error as StdError;

use thiserror::Error;

use super::result::ErrorDetails;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error returned by a wrapped operation.
///
/// Only `message` is required; everything else is best-effort diagnostic
/// context that ends up in the failed run's `details`.
#[derive(Debug, Error, Default)]
#[error("{message}")]
pub struct OperationError {
    pub message: String,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: Option<i32>,
    /// Named step the operation was in when it failed (e.g. `"build"`).
    pub phase: Option<String>,
    /// Files involved in the failure.
    pub files: Vec<String>,
    pub recoverable: Option<bool>,
    #[source]
    pub cause: Option<BoxError>,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Set the phase only if the error does not carry one already.
    pub fn or_phase(mut self, phase: impl Into<String>) -> Self {
        if self.phase.is_none() {
            self.phase = Some(phase.into());
        }
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.recoverable = Some(recoverable);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Break the error down into what a failed run reports.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            message: self.message.clone(),
            context: self.context_line(),
            recovery: self.recovery_steps(),
            details: ErrorDetails {
                stdout: self.stdout.clone().filter(|s| !s.is_empty()),
                stderr: self.stderr.clone().filter(|s| !s.is_empty()),
                exit_code: self.exit_code,
                phase: self.phase.clone(),
                files: (!self.files.is_empty()).then(|| self.files.clone()),
            },
        }
    }

    fn context_line(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(phase) = &self.phase {
            parts.push(format!("failed during the {phase} phase"));
        }
        if let Some(code) = self.exit_code {
            parts.push(format!("exited with code {code}"));
        }
        let mut source = self.cause.as_deref().map(|e| e as &(dyn StdError + 'static));
        while let Some(err) = source {
            let text = err.to_string();
            if text != self.message {
                parts.push(format!("caused by: {text}"));
            }
            source = err.source();
        }

        if parts.is_empty() {
            None
        } else {
            Some(format!("Operation {}", parts.join("; ")))
        }
    }

    fn recovery_steps(&self) -> Vec<String> {
        let mut steps = Vec::new();
        if self.recoverable == Some(true) {
            steps.push("The failure is recoverable; retry the operation.".to_string());
        }
        if !self.files.is_empty() {
            steps.push(format!("Review the affected files: {}", self.files.join(", ")));
        }
        if self.stderr.as_deref().is_some_and(|s| !s.is_empty()) {
            steps.push("Inspect details.stderr for the underlying tool output.".to_string());
        }
        if let Some(code) = self.exit_code {
            steps.push(format!(
                "Re-run the failing command by hand to reproduce (exit code {code})."
            ));
        }
        if steps.is_empty() {
            steps.push(
                "Check the captured logs for the last step that succeeded before the failure."
                    .to_string(),
            );
        }
        steps
    }
}

impl From<anyhow::Error> for OperationError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err.to_string()).with_cause(err)
    }
}

impl From<std::io::Error> for OperationError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string()).with_cause(err)
    }
}

/// Structured decomposition of an [`OperationError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub message: String,
    pub context: Option<String>,
    pub recovery: Vec<String>,
    pub details: ErrorDetails,
}
