// src/notify/payload.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token the host uses to correlate push notifications with a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgressToken {
    Number(i64),
    String(String),
}

impl fmt::Display for ProgressToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressToken::Number(n) => write!(f, "{n}"),
            ProgressToken::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ProgressToken {
    fn from(s: &str) -> Self {
        ProgressToken::String(s.to_string())
    }
}

impl From<String> for ProgressToken {
    fn from(s: String) -> Self {
        ProgressToken::String(s)
    }
}

impl From<i64> for ProgressToken {
    fn from(n: i64) -> Self {
        ProgressToken::Number(n)
    }
}

/// Channel-independent progress update produced by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressUpdate {
    pub progress: u64,
    pub total: Option<u64>,
    pub message: Option<String>,
    /// Lines captured since the previous delivery. Only poll callbacks see
    /// these.
    pub new_log_lines: Vec<String>,
}

impl ProgressUpdate {
    pub fn new(progress: u64) -> Self {
        Self {
            progress,
            ..Self::default()
        }
    }

    pub fn with_total(mut self, total: Option<u64>) -> Self {
        self.total = total;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_new_lines(mut self, lines: Vec<String>) -> Self {
        self.new_log_lines = lines;
        self
    }
}

/// Wire payload of a push notification.
///
/// Absent optional fields are omitted rather than sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNotification {
    pub progress_token: ProgressToken,
    pub progress: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressNotification {
    pub fn from_update(token: &ProgressToken, update: &ProgressUpdate) -> Self {
        Self {
            progress_token: token.clone(),
            progress: update.progress,
            total: update.total,
            message: update.message.clone(),
        }
    }
}
