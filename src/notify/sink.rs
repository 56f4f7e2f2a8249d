// src/notify/sink.rs

use tracing::trace;

use super::payload::ProgressUpdate;
use super::poll::{PollCallback, PollUpdate};
use super::push::PushChannel;

/// The delivery channel of one run.
#[derive(Debug, Clone)]
pub enum NotificationSink {
    Push(PushChannel),
    Poll(PollCallback),
    /// Neither channel was supplied; updates are computed but go nowhere.
    Silent,
}

impl NotificationSink {
    /// Pick the channel for a run. Push wins when both are present.
    pub fn select(push: Option<PushChannel>, poll: Option<PollCallback>) -> Self {
        match (push, poll) {
            (Some(push), _) => NotificationSink::Push(push),
            (None, Some(poll)) => NotificationSink::Poll(poll),
            (None, None) => NotificationSink::Silent,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            NotificationSink::Push(_) => "push",
            NotificationSink::Poll(_) => "poll",
            NotificationSink::Silent => "silent",
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, NotificationSink::Push(_))
    }

    /// Whether this sink consumes incremental log lines.
    pub fn streams_lines(&self) -> bool {
        matches!(self, NotificationSink::Poll(_))
    }

    /// Deliver one update. Never fails; returns whether a delivery was
    /// attempted successfully (push sends are only known to be spawned).
    pub fn deliver(&self, update: &ProgressUpdate) -> bool {
        trace!(
            sink = self.kind(),
            progress = update.progress,
            total = ?update.total,
            "delivering progress update"
        );

        match self {
            NotificationSink::Push(channel) => channel.dispatch(update),
            NotificationSink::Poll(callback) => {
                let new_lines =
                    (!update.new_log_lines.is_empty()).then_some(update.new_log_lines.as_slice());
                callback.invoke(&PollUpdate {
                    progress: update.progress,
                    total: update.total,
                    message: update.message.as_deref().unwrap_or_default(),
                    new_log_lines: new_lines,
                })
            }
            NotificationSink::Silent => false,
        }
    }
}
