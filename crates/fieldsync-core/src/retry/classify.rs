//! Classify HTTP status and remote call errors into retry failure kinds.

use super::error::FetchError;
use super::policy::FailureKind;

/// Classify an HTTP status code for retry decisions.
///
/// Request timeout and throttling are the only 4xx codes worth another try.
pub fn classify_http_status(code: u32) -> FailureKind {
    match code {
        408 | 429 => FailureKind::Transient,
        400..=499 => FailureKind::Permanent,
        _ => FailureKind::Transient,
    }
}

/// Classify a remote call error into a FailureKind.
pub fn classify(e: &FetchError) -> FailureKind {
    match e {
        FetchError::Client { status, .. } | FetchError::Server { status, .. } => {
            classify_http_status(*status)
        }
        FetchError::NetworkUnavailable(_)
        | FetchError::Timeout(_)
        | FetchError::InvalidResponse(_)
        | FetchError::Transport(_) => FailureKind::Transient,
    }
}
