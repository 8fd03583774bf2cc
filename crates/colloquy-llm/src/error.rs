use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::{FileId, RunId, RunStatus};

#[derive(Error, Debug)]
pub enum AssistantError {
    /// Connection or I/O failure before any response was received
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Response was missing expected fields or could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Timed out after {timeout:?} waiting for {operation}")]
    Timeout { operation: String, timeout: Duration },

    #[error("Run {run_id} ended with status {status}{}", detail_suffix(.detail))]
    RunFailed {
        run_id: RunId,
        status: RunStatus,
        detail: Option<String>,
    },

    #[error("Ingestion of file {file_id} failed: {reason}")]
    IngestionFailed { file_id: FileId, reason: String },

    /// Local file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Message history is empty")]
    EmptyHistory,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl AssistantError {
    /// Build a `Remote` error from a non-success status and the raw body,
    /// preferring the service-provided `error.message` when present.
    pub fn remote(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());

        Self::Remote { status, message }
    }

    /// Stable short name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Remote { .. } => "remote",
            Self::Protocol(_) => "protocol",
            Self::Validation(_) => "validation",
            Self::Timeout { .. } => "timeout",
            Self::RunFailed { .. } => "run_failed",
            Self::IngestionFailed { .. } => "ingestion_failed",
            Self::NotFound(_) => "not_found",
            Self::Precondition(_) => "precondition",
            Self::EmptyHistory => "empty_history",
        }
    }

    /// The remote service answered 404 for the requested object
    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, Self::Remote { status: 404, .. })
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Protocol(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AssistantError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<std::io::Error> for AssistantError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
