//! Fetch error taxonomy and user-facing normalization.

use thiserror::Error;

/// Errors from a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request failed before any HTTP status was received.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-2xx status.
    #[error("http status {0}")]
    Status(u16),

    /// The body was not valid JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Normalized user-facing message.
    ///
    /// 4xx maps to "Not Found"; network failures, timeouts, 5xx,
    /// status 0, and anything unrecognized map to "Server Down".
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::Status(status) if (400..500).contains(status) => "Not Found",
            _ => "Server Down",
        }
    }

    /// Whether a retry could plausibly help: network failures with no
    /// status, or 5xx. Client errors fail immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) => true,
            FetchError::Status(status) => *status >= 500 || *status == 0,
            FetchError::Decode(_) => false,
        }
    }
}
