//! Data sync job: pull every configured source through the orchestrator.

use std::sync::Arc;

use crate::config::FieldsyncConfig;
use crate::job::{
    keys, now_millis, FaultSink, Job, JobContext, JobError, JobOutput, Payload, PayloadValue,
    ProgressSink,
};
use crate::retry::RetryPolicy;
use crate::sync::{SubTask, SyncOrchestrator};

use super::http::HttpSubTask;

/// Pulls every configured data source, one sub-task per source.
pub struct SyncJob {
    orchestrator: SyncOrchestrator,
    subtasks: Vec<Arc<dyn SubTask>>,
    policy: RetryPolicy,
}

impl SyncJob {
    pub const NAME: &'static str = super::names::DATA_SYNC;

    pub fn new(orchestrator: SyncOrchestrator, subtasks: Vec<Arc<dyn SubTask>>) -> Self {
        Self {
            orchestrator,
            subtasks,
            policy: RetryPolicy::with_max_attempts(3),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// One `HttpSubTask` per configured endpoint, in file order.
    pub fn from_config(
        cfg: &FieldsyncConfig,
        progress: Arc<dyn ProgressSink>,
        faults: Arc<dyn FaultSink>,
    ) -> Self {
        let timeout = cfg.subtask_timeout();
        let subtasks = cfg
            .sync
            .endpoints
            .iter()
            .map(|ep| Arc::new(HttpSubTask::new(&ep.name, &ep.url, timeout)) as Arc<dyn SubTask>)
            .collect();
        let orchestrator = SyncOrchestrator::new(progress, faults).with_wait(timeout);
        Self::new(orchestrator, subtasks).with_policy(RetryPolicy::from(&cfg.retry.sync))
    }
}

impl Job for SyncJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    fn execute(
        &mut self,
        ctx: &JobContext,
        _progress: &dyn ProgressSink,
    ) -> Result<JobOutput, JobError> {
        let tally = self.orchestrator.execute(&self.subtasks, &ctx.cancel);
        if ctx.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        tracing::info!(
            succeeded = tally.success_count(),
            failed = tally.failure_count(),
            "sync pass complete"
        );
        let payload = Payload::new()
            .with(keys::SUCCESS_COUNT, PayloadValue::Int(tally.success_count() as i64))
            .with(keys::FAILURE_COUNT, PayloadValue::Int(tally.failure_count() as i64))
            .with(keys::SYNC_TIMESTAMP, PayloadValue::Timestamp(now_millis()));
        Ok(JobOutput::new(payload).with_tally(tally))
    }
}
