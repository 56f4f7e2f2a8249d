use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use runwatch::notify::{PollCallback, ProgressNotification, PushTransport};
use tokio::sync::mpsc;

/// A push transport that:
/// - records every notification it is asked to send
/// - forwards a copy into an unbounded channel so tests can await delivery.
pub struct RecordingTransport {
    sent: Mutex<Vec<ProgressNotification>>,
    tx: mpsc::UnboundedSender<ProgressNotification>,
}

impl RecordingTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ProgressNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            tx,
        });
        (transport, rx)
    }

    pub fn sent(&self) -> Vec<ProgressNotification> {
        self.sent.lock().unwrap().clone()
    }
}

impl PushTransport for RecordingTransport {
    fn send(
        &self,
        notification: ProgressNotification,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(notification.clone());
            // The receiver may already be gone at the end of a test.
            let _ = self.tx.send(notification);
            Ok(())
        })
    }
}

/// A push transport whose every send fails.
pub struct FailingTransport;

impl PushTransport for FailingTransport {
    fn send(
        &self,
        _notification: ProgressNotification,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async { Err(anyhow!("host went away")) })
    }
}

/// One observed poll callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecord {
    pub progress: u64,
    pub total: Option<u64>,
    pub message: String,
    pub new_log_lines: Option<Vec<String>>,
}

/// Records every poll callback invocation.
#[derive(Clone, Default)]
pub struct PollSpy {
    calls: Arc<Mutex<Vec<PollRecord>>>,
}

impl PollSpy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records into this spy.
    pub fn callback(&self) -> PollCallback {
        let calls = Arc::clone(&self.calls);
        PollCallback::new(move |update| {
            calls.lock().unwrap().push(PollRecord {
                progress: update.progress,
                total: update.total,
                message: update.message.to_string(),
                new_log_lines: update.new_log_lines.map(<[String]>::to_vec),
            });
            Ok(())
        })
    }

    pub fn calls(&self) -> Vec<PollRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<PollRecord> {
        self.calls.lock().unwrap().last().cloned()
    }
}
