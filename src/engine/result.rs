// src/engine/result.rs

use serde::Serialize;
use serde_json::Value;

use super::error::OperationError;

/// Best-effort breakdown of what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

/// Terminal outcome of one run, produced exactly once.
///
/// Serializes to the shape the host expects: `data` on success, `error`,
/// `context`, `recovery` and `details` on failure, `message` and `logs`
/// always.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
    pub message: String,
    pub logs: Vec<String>,
}

impl RunResult {
    pub fn success(data: Value, message: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
            recovery: None,
            details: None,
            message: message.into(),
            logs,
        }
    }

    pub fn failure(err: &OperationError, logs: Vec<String>) -> Self {
        let report = err.report();
        Self {
            success: false,
            data: None,
            message: format!("Operation failed: {}", report.message),
            error: Some(report.message),
            context: report.context,
            recovery: Some(report.recovery),
            details: Some(report.details),
            logs,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
