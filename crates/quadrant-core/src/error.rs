use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status} {reason}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        reason: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("server refused the request: {0}")]
    Rejected(String),
}

/// Failure of a reload. Same taxonomy as any other API call.
pub type FetchError = NetworkError;

impl NetworkError {
    /// Short, user-facing reason, e.g. for the "Export failed" message.
    pub fn reason(&self) -> String {
        match self {
            NetworkError::Status { status, reason, .. } if reason.is_empty() => {
                format!("HTTP {status}")
            }
            NetworkError::Status { reason, .. } => reason.clone(),
            NetworkError::Transport { source, .. } => source.to_string(),
            NetworkError::Decode { message, .. } => message.clone(),
            NetworkError::Rejected(reason) => reason.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a task before adding")]
    EmptyText,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeadlineError {
    #[error("unrecognized deadline: {0} (expected YYYY-MM-DD, DD-MM-YYYY, today, tomorrow or +N[d|w])")]
    Unrecognized(String),

    #[error("deadline {deadline} is before the earliest selectable date {min}")]
    BeforeMinimum { deadline: String, min: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export failed: {}", .0.reason())]
    Network(#[from] NetworkError),

    #[error("failed to save export to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
