//! Job results and the error type bodies return.

use thiserror::Error;

use super::payload::Payload;
use crate::error::ConfigurationError;
use crate::retry::{classify, FailureKind, FetchError};
use crate::route::RouteError;
use crate::sync::SyncTally;

/// What a job body produced on a successful pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobOutput {
    pub payload: Payload,
    /// Present for multi-part jobs; an all-false tally asks for a retry.
    pub tally: Option<SyncTally>,
}

impl JobOutput {
    pub fn new(payload: Payload) -> Self {
        Self {
            payload,
            tally: None,
        }
    }

    pub fn with_tally(mut self, tally: SyncTally) -> Self {
        self.tally = Some(tally);
        self
    }
}

/// Result of one job invocation, as seen by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Success(JobOutput),
    /// Run again later.
    Retry,
    /// Terminal; do not run again.
    Failure,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Success(_) => "success",
            JobOutcome::Retry => "retry",
            JobOutcome::Failure => "failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success(_))
    }

    pub fn output(&self) -> Option<&JobOutput> {
        match self {
            JobOutcome::Success(out) => Some(out),
            _ => None,
        }
    }
}

/// Errors a job body may return.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Remote(#[from] FetchError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("job cancelled")]
    Cancelled,
    #[error("{0:#}")]
    Permanent(anyhow::Error),
    #[error("{0:#}")]
    Transient(anyhow::Error),
}

impl From<anyhow::Error> for JobError {
    fn from(e: anyhow::Error) -> Self {
        JobError::Transient(e)
    }
}

impl JobError {
    pub fn kind(&self) -> FailureKind {
        match self {
            JobError::Configuration(_) | JobError::Cancelled | JobError::Permanent(_) => {
                FailureKind::Permanent
            }
            JobError::Remote(e) => classify(e),
            JobError::Route(e) => e.kind(),
            JobError::Transient(_) => FailureKind::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        assert_eq!(
            JobError::from(ConfigurationError::MissingInput("latitude".into())).kind(),
            FailureKind::Permanent
        );
        assert_eq!(
            JobError::from(FetchError::from_status(503, "busy")).kind(),
            FailureKind::Transient
        );
        assert_eq!(
            JobError::from(FetchError::from_status(404, "gone")).kind(),
            FailureKind::Permanent
        );
        assert_eq!(
            JobError::from(anyhow::anyhow!("flaky")).kind(),
            FailureKind::Transient
        );
        assert_eq!(
            JobError::Permanent(anyhow::anyhow!("bad file")).kind(),
            FailureKind::Permanent
        );
    }

    #[test]
    fn cancelled_route_classifies_like_cancelled_job() {
        let route = JobError::from(RouteError::Cancelled);
        assert_eq!(route.kind(), JobError::Cancelled.kind());
        assert_eq!(route.kind(), FailureKind::Permanent);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(JobOutcome::Retry.as_str(), "retry");
        assert_eq!(JobOutcome::Failure.as_str(), "failure");
        let ok = JobOutcome::Success(JobOutput::default());
        assert!(ok.is_success());
        assert_eq!(ok.output(), Some(&JobOutput::default()));
    }
}
