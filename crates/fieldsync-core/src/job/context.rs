//! Per-invocation job context: attempt number, input, cancellation, session.

use std::sync::Arc;

use super::payload::Payload;
use crate::control::CancelToken;
use crate::error::ConfigurationError;
use crate::network::{NetworkProbe, StaticProbe};

/// Authenticated user a job acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Everything the scheduler hands one job invocation.
#[derive(Clone)]
pub struct JobContext {
    /// Zero-based count of earlier attempts that asked for a retry.
    pub attempt: u32,
    pub input: Payload,
    pub cancel: CancelToken,
    pub network: Arc<dyn NetworkProbe>,
    pub session: Option<Session>,
}

impl JobContext {
    pub fn new(attempt: u32, network: Arc<dyn NetworkProbe>) -> Self {
        Self {
            attempt,
            input: Payload::new(),
            cancel: CancelToken::new(),
            network,
            session: None,
        }
    }

    /// Context whose network probe always answers `online`.
    pub fn offline_aware(attempt: u32, online: bool) -> Self {
        Self::new(attempt, Arc::new(StaticProbe(online)))
    }

    pub fn with_input(mut self, input: Payload) -> Self {
        self.input = input;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn is_network_available(&self) -> bool {
        self.network.is_network_available()
    }

    pub fn require_session(&self, job: &str) -> Result<&Session, ConfigurationError> {
        self.session
            .as_ref()
            .ok_or_else(|| ConfigurationError::MissingSession(job.to_string()))
    }
}
