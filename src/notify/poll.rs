// src/notify/poll.rs

//! Direct-callback notification channel.

use std::fmt;
use std::io::Write;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::debug;

/// Arguments handed to a poll callback.
#[derive(Debug, Clone, Copy)]
pub struct PollUpdate<'a> {
    pub progress: u64,
    pub total: Option<u64>,
    pub message: &'a str,
    /// Lines appended since the previous delivery, if any.
    ///
    /// Counted from the last delivered update rather than the last tick:
    /// lines seen during a tick whose progress did not change ride along
    /// with the next delivery, so none are skipped.
    pub new_log_lines: Option<&'a [String]>,
}

type PollFn = dyn Fn(&PollUpdate<'_>) -> anyhow::Result<()> + Send + Sync;

/// Caller-supplied progress callback.
#[derive(Clone)]
pub struct PollCallback {
    callback: Arc<PollFn>,
}

impl fmt::Debug for PollCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollCallback").finish_non_exhaustive()
    }
}

impl PollCallback {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&PollUpdate<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Callback that prints human-readable progress and new lines to stderr.
    pub fn stderr_printer() -> Self {
        Self::new(|update| {
            let mut err = std::io::stderr().lock();
            for line in update.new_log_lines.unwrap_or_default() {
                writeln!(err, "  | {line}")?;
            }
            match update.total {
                Some(total) => writeln!(err, "[{}/{}] {}", update.progress, total, update.message)?,
                None => writeln!(err, "[{}] {}", update.progress, update.message)?,
            }
            Ok(())
        })
    }

    /// Invoke the callback, containing both errors and panics.
    ///
    /// Returns `true` if the callback ran to completion without error.
    pub fn invoke(&self, update: &PollUpdate<'_>) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (self.callback)(update))) {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                debug!(error = %err, "poll callback failed; discarded");
                false
            }
            Err(_) => {
                debug!("poll callback panicked; discarded");
                false
            }
        }
    }
}
