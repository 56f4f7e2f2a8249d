// src/notify/push.rs

//! Push-token notification channel.
//!
//! The orchestrator talks to a [`PushTransport`] rather than to a concrete
//! writer, so the host integration can be swapped out and tests can record
//! what was sent.
//!
//! - [`JsonLinesTransport`] is the production transport used by the
//!   `runwatch` binary. It writes one JSON-RPC `notifications/progress`
//!   message per line.
//! - Tests provide their own transport that, e.g., forwards every
//!   notification into an mpsc channel.

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use serde_json::json;
use tracing::debug;

use super::payload::{ProgressNotification, ProgressToken, ProgressUpdate};

/// Trait abstracting how a push notification reaches the host.
pub trait PushTransport: Send + Sync {
    /// Deliver one notification.
    ///
    /// Errors are reported back to the channel, which logs and drops them.
    fn send(
        &self,
        notification: ProgressNotification,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;
}

/// A push transport addressed by a progress token.
#[derive(Clone)]
pub struct PushChannel {
    token: ProgressToken,
    transport: Arc<dyn PushTransport>,
}

impl std::fmt::Debug for PushChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushChannel")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl PushChannel {
    pub fn new(token: impl Into<ProgressToken>, transport: Arc<dyn PushTransport>) -> Self {
        Self {
            token: token.into(),
            transport,
        }
    }

    pub fn token(&self) -> &ProgressToken {
        &self.token
    }

    /// Spawn a detached send for `update`.
    ///
    /// Returns `false` when no Tokio runtime is available to run the send;
    /// the notification is dropped in that case.
    pub fn dispatch(&self, update: &ProgressUpdate) -> bool {
        let notification = ProgressNotification::from_update(&self.token, update);

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(token = %self.token, "no runtime available; dropping push notification");
            return false;
        };

        let transport = Arc::clone(&self.transport);
        let token = self.token.clone();
        handle.spawn(async move {
            if let Err(err) = transport.send(notification).await {
                debug!(token = %token, error = %err, "push notification failed; discarded");
            }
        });
        true
    }
}

/// Writes `notifications/progress` JSON-RPC messages, one per line.
pub struct JsonLinesTransport {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesTransport {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    fn write_line(&self, notification: &ProgressNotification) -> anyhow::Result<()> {
        let message = json!({
            "jsonrpc": "2.0",
            "method": "notifications/progress",
            "params": notification,
        });
        let line = serde_json::to_string(&message).context("serializing progress notification")?;

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}").context("writing progress notification")?;
        writer.flush().context("flushing progress notification")?;
        Ok(())
    }
}

impl PushTransport for JsonLinesTransport {
    fn send(
        &self,
        notification: ProgressNotification,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move { self.write_line(&notification) })
    }
}
