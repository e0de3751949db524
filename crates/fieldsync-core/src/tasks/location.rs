//! Location report job and its reporter seam.

use serde::Serialize;

use crate::error::ConfigurationError;
use crate::geo::Coordinate;
use crate::job::{
    keys, now_millis, Job, JobContext, JobError, JobOutput, Payload, PayloadValue, ProgressSink,
};
use crate::retry::{FetchError, RetryPolicy};

/// One position fix as sent to the location endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Unix milliseconds.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Delivers a fix to the remote service.
pub trait LocationReporter: Send + Sync {
    fn send(&self, fix: &LocationFix) -> Result<(), FetchError>;
}

impl<F> LocationReporter for F
where
    F: Fn(&LocationFix) -> Result<(), FetchError> + Send + Sync,
{
    fn send(&self, fix: &LocationFix) -> Result<(), FetchError> {
        self(fix)
    }
}

pub struct LocationJob<R> {
    reporter: R,
    policy: RetryPolicy,
}

impl<R: LocationReporter> LocationJob<R> {
    pub const NAME: &'static str = super::names::LOCATION_REPORT;

    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            policy: RetryPolicy::with_max_attempts(3),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn read_fix(ctx: &JobContext) -> Result<LocationFix, ConfigurationError> {
        let latitude = ctx.input.require_f64(keys::LATITUDE)?;
        let longitude = ctx.input.require_f64(keys::LONGITUDE)?;
        let position = Coordinate::new(latitude, longitude);
        if !position.is_valid() {
            return Err(ConfigurationError::InvalidInput {
                key: format!("{}/{}", keys::LATITUDE, keys::LONGITUDE),
                reason: format!("{position} is out of range"),
            });
        }
        Ok(LocationFix {
            latitude,
            longitude,
            accuracy: ctx.input.get_f64(keys::ACCURACY),
            timestamp: ctx.input.get_i64(keys::TIMESTAMP).unwrap_or_else(now_millis),
            user_id: ctx.session.as_ref().map(|s| s.user_id.clone()),
        })
    }
}

impl<R: LocationReporter> Job for LocationJob<R> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    fn execute(
        &mut self,
        ctx: &JobContext,
        progress: &dyn ProgressSink,
    ) -> Result<JobOutput, JobError> {
        let fix = Self::read_fix(ctx)?;
        progress.report("Reporting location", None);
        self.reporter.send(&fix)?;
        tracing::debug!(lat = fix.latitude, lon = fix.longitude, "location reported");

        let mut payload = Payload::new()
            .with(keys::LATITUDE, PayloadValue::Float(fix.latitude))
            .with(keys::LONGITUDE, PayloadValue::Float(fix.longitude))
            .with(keys::TIMESTAMP, PayloadValue::Timestamp(fix.timestamp));
        if let Some(accuracy) = fix.accuracy {
            payload.insert(keys::ACCURACY, PayloadValue::Float(accuracy));
        }
        Ok(JobOutput::new(payload))
    }
}
