//! One pass of a background job: precondition, body, then a retry decision.
//!
//! The runner owns no attempt state. The caller passes the attempt number in
//! the context and persists whatever it needs between invocations.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::context::JobContext;
use super::outcome::{JobError, JobOutcome, JobOutput};
use super::sink::{FaultSink, ProgressSink};
use crate::retry::{Decision, RetryPolicy};

/// A unit of background work.
pub trait Job {
    fn name(&self) -> &str;

    fn retry_policy(&self) -> RetryPolicy;

    /// Checked before the body. `false` yields `Retry` without spending an attempt.
    fn can_run(&self, ctx: &JobContext) -> bool {
        ctx.is_network_available()
    }

    fn execute(
        &mut self,
        ctx: &JobContext,
        progress: &dyn ProgressSink,
    ) -> Result<JobOutput, JobError>;
}

type Precondition<'a> = Box<dyn Fn(&JobContext) -> bool + 'a>;
type Body<'a> = Box<dyn FnMut(&JobContext, &dyn ProgressSink) -> Result<JobOutput, JobError> + 'a>;

/// Closure-built job: a name, a retry budget, a precondition and a body.
pub struct JobSpec<'a> {
    name: String,
    policy: RetryPolicy,
    precondition: Precondition<'a>,
    body: Body<'a>,
}

impl<'a> JobSpec<'a> {
    /// Job with the default precondition (network available).
    pub fn new<F>(name: impl Into<String>, max_attempts: u32, body: F) -> Self
    where
        F: FnMut(&JobContext, &dyn ProgressSink) -> Result<JobOutput, JobError> + 'a,
    {
        Self {
            name: name.into(),
            policy: RetryPolicy::with_max_attempts(max_attempts),
            precondition: Box::new(JobContext::is_network_available),
            body: Box::new(body),
        }
    }

    pub fn precondition<P>(mut self, check: P) -> Self
    where
        P: Fn(&JobContext) -> bool + 'a,
    {
        self.precondition = Box::new(check);
        self
    }
}

impl Job for JobSpec<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    fn can_run(&self, ctx: &JobContext) -> bool {
        (self.precondition)(ctx)
    }

    fn execute(
        &mut self,
        ctx: &JobContext,
        progress: &dyn ProgressSink,
    ) -> Result<JobOutput, JobError> {
        (self.body)(ctx, progress)
    }
}

pub struct JobRunner {
    progress: Arc<dyn ProgressSink>,
    faults: Arc<dyn FaultSink>,
}

impl JobRunner {
    pub fn new(progress: Arc<dyn ProgressSink>, faults: Arc<dyn FaultSink>) -> Self {
        Self { progress, faults }
    }

    pub fn progress(&self) -> Arc<dyn ProgressSink> {
        Arc::clone(&self.progress)
    }

    pub fn faults(&self) -> Arc<dyn FaultSink> {
        Arc::clone(&self.faults)
    }

    /// Run one pass of `job`. Never panics and never returns an error: every
    /// failure of the body is folded into `Retry` or `Failure`.
    pub fn run<J: Job + ?Sized>(&self, job: &mut J, ctx: &JobContext) -> JobOutcome {
        let name = job.name().to_string();
        let span = tracing::info_span!("job", job = %name, attempt = ctx.attempt);
        let _guard = span.enter();

        if !job.can_run(ctx) {
            tracing::info!("precondition not met; asking to run later");
            return JobOutcome::Retry;
        }
        if ctx.cancel.is_cancelled() {
            tracing::info!("cancelled before start");
            return JobOutcome::Failure;
        }

        self.progress.report(&format!("{name}: started"), Some(0));
        let policy = job.retry_policy();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            job.execute(ctx, self.progress.as_ref())
        }))
        .unwrap_or_else(|payload| {
            let msg = panic_message(payload.as_ref());
            Err(JobError::Transient(anyhow::anyhow!("job body panicked: {msg}")))
        });

        if ctx.cancel.is_cancelled() || matches!(result, Err(JobError::Cancelled)) {
            tracing::info!("cancelled during execution");
            return JobOutcome::Failure;
        }

        match result {
            Ok(output) => self.judge(&name, ctx, output),
            Err(e) => self.on_error(&name, ctx, &policy, e),
        }
    }

    fn judge(
        &self,
        name: &str,
        ctx: &JobContext,
        output: JobOutput,
    ) -> JobOutcome {
        if let Some(tally) = &output.tally {
            // The attempt budget does not apply here; the scheduler caps reruns.
            if tally.all_failed() {
                tracing::warn!(
                    sub_tasks = tally.len(),
                    attempt = ctx.attempt,
                    "every sub-task failed; asking to run later"
                );
                return JobOutcome::Retry;
            }
            if tally.failure_count() > 0 {
                tracing::warn!(
                    succeeded = tally.success_count(),
                    failed = tally.failure_count(),
                    "partial success; not retrying"
                );
            }
        }
        self.progress.report(&format!("{name}: finished"), Some(100));
        tracing::info!("job succeeded");
        JobOutcome::Success(output)
    }

    fn on_error(
        &self,
        name: &str,
        ctx: &JobContext,
        policy: &RetryPolicy,
        err: JobError,
    ) -> JobOutcome {
        let kind = err.kind();
        match policy.decide(ctx.attempt, kind) {
            Decision::RetryNow => {
                tracing::warn!(error = %err, ?kind, max_attempts = policy.max_attempts, "attempt failed; will retry");
                JobOutcome::Retry
            }
            Decision::Failed => {
                tracing::error!(error = %err, ?kind, "job failed");
                self.faults.report(
                    &err,
                    &format!("job {name} failed on attempt {}", ctx.attempt),
                );
                JobOutcome::Failure
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
