//! Unified client error type.
//!
//! Every fallible operation in this crate returns [`ClientError`]. Failed
//! HTTP exchanges are classified by the interceptor first and then surface
//! here unchanged, so call sites can still react (stop a spinner, re-enable
//! a form).

use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (DNS, refused connection, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{path} returned {status}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Request path, e.g. `/auth/login`.
        path: String,
        /// Backend-provided `message`/`error` field, if any.
        detail: Option<String>,
    },

    /// The backend answered 2xx but reported `success: false` or no data.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Reading or writing persisted session state failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// An endpoint path could not be joined onto the API base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The operation needs a token and none is held.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ClientError {
    /// HTTP status of the failure, if the backend answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend definitively rejected the credential (401/403).
    ///
    /// Transport failures and every other status are inconclusive.
    #[must_use]
    pub fn is_authoritative_rejection(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
