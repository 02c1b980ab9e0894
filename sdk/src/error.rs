use std::time::Duration;

pub use http::StatusCode;
use tracelogs_common::types::ValidationError;

use crate::prompt::Prompt;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] url::ParseError),

    #[error("Failed to initialize HTTP client: {0}")]
    Init(String),

    #[error("Failed to build request: {0}")]
    Request(#[source] http::Error),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{}", status_text(*.status, .body))]
    Status {
        status: http::StatusCode,
        body: String,
    },

    #[error("Malformed response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Failed to save '{filename}': {source}")]
    Save {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ClientError {
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn status_text(status: http::StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    if body.trim().is_empty() {
        format!("{reason} (HTTP {})", status.as_u16())
    } else {
        format!("{reason} (HTTP {}): {}", status.as_u16(), body.trim())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access session store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A batch in which at least one window failed.
///
/// Which windows failed is not exposed: a batch is all or
/// nothing. `source` is the error of the earliest failed window.
#[derive(Debug, thiserror::Error)]
#[error("{failed} of {total} log windows failed")]
pub struct BatchError {
    pub failed: usize,
    pub total: usize,
    #[source]
    pub source: ClientError,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to download logs: {source}")]
    Batch {
        /// Where the user should be sent to recover.
        next: Prompt,
        /// Whether the cached token was discarded because of this failure.
        token_invalidated: bool,
        #[source]
        source: BatchError,
    },
}

impl DownloadError {
    pub fn next_prompt(&self) -> Prompt {
        match self {
            Self::Store(_) => Prompt::Login,
            Self::Batch { next, .. } => *next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClientError;

    #[test]
    fn status_error_uses_reason_phrase() {
        let err = ClientError::Status {
            status: http::StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "Unauthorized (HTTP 401)");

        let err = ClientError::Status {
            status: http::StatusCode::BAD_GATEWAY,
            body: " upstream down\n".to_owned(),
        };
        assert_eq!(err.to_string(), "Bad Gateway (HTTP 502): upstream down");
    }
}
