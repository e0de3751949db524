//! Retry decision and backoff for a job's attempt budget.

use std::time::Duration;

use crate::config::RetryConfig;

/// Retry classification of a failure.
///
/// Callers map HTTP statuses, transport errors and input validation failures
/// into one of these; see `classify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unavailable, remote timeout, 5xx, unexpected error.
    Transient,
    /// Malformed input, missing required data, 4xx. Never retried.
    Permanent,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Ask the scheduler to run the job again.
    RetryNow,
    /// Give up: terminal failure.
    Failed,
}

/// Pure retry decision.
///
/// `attempt` is the number of earlier attempts (0 on the first run). Permanent
/// failures never retry; transient ones retry while `attempt < max_attempts`.
pub fn decide(attempt: u32, kind: FailureKind, max_attempts: u32) -> Decision {
    match kind {
        FailureKind::Permanent => Decision::Failed,
        FailureKind::Transient if attempt < max_attempts => Decision::RetryNow,
        FailureKind::Transient => Decision::Failed,
    }
}

/// Per-job-class retry budget with exponential backoff hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempt count at which transient failures stop being retried.
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn decide(&self, attempt: u32, kind: FailureKind) -> Decision {
        decide(attempt, kind, self.max_attempts)
    }

    /// Delay the external scheduler should wait before re-running after
    /// `attempt` earlier attempts: base * 2^attempt, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = 1u32 << attempt.min(16);
        self.base_delay.saturating_mul(exp).min(self.max_delay)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }
}
