//! Remote call error type for retry classification.

use thiserror::Error;

/// Error returned by a single remote call (route chunk fetch, sub-task
/// request, location report, upload). Kept structured so callers can classify
/// it before it is folded into a job outcome.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No route to the remote host (DNS, refused connection, offline).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),
    /// Connect or transfer timed out.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Remote rejected the request (4xx).
    #[error("HTTP {status}: {message}")]
    Client { status: u32, message: String },
    /// Remote failed (5xx or other non-success status).
    #[error("HTTP {status}: {message}")]
    Server { status: u32, message: String },
    /// Response arrived but could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// Any other libcurl failure.
    #[error("transport: {0}")]
    Transport(#[source] curl::Error),
}

impl FetchError {
    /// Build the status variant matching `status`.
    pub fn from_status(status: u32, message: impl Into<String>) -> Self {
        let message = message.into();
        if (400..500).contains(&status) {
            FetchError::Client { status, message }
        } else {
            FetchError::Server { status, message }
        }
    }

    /// Map a curl error onto the variants the retry policy cares about.
    pub fn from_curl(e: curl::Error) -> Self {
        if e.is_operation_timedout() {
            return FetchError::Timeout(e.to_string());
        }
        if e.is_couldnt_connect() || e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
            return FetchError::NetworkUnavailable(e.to_string());
        }
        FetchError::Transport(e)
    }
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::from_curl(e)
    }
}
