//! Retry and backoff policy.
//!
//! Failure classification (transient vs permanent) and the pure retry
//! decision live here so the job runner, the route stitcher's callers and the
//! CLI scheduler loop share one policy.

mod classify;
mod error;
mod policy;

pub use classify::{classify, classify_http_status};
pub use error::FetchError;
pub use policy::{decide, Decision, FailureKind, RetryPolicy};
