//! Runs an ordered list of sync sub-tasks, each on its own worker thread,
//! waiting for each with a bounded, cancellable wait before starting the next.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use super::completion::{completion, WaitOutcome};
use super::tally::SyncTally;
use crate::control::CancelToken;
use crate::job::{FaultSink, ProgressSink};

/// One unit of sync work. `Ok(false)` is a reported failure; `Err` is a raised one.
pub trait SubTask: Send + Sync {
    fn name(&self) -> &str;
    fn run(&self) -> anyhow::Result<bool>;
}

/// Closure-backed sub-task.
pub struct FnSubTask<F> {
    name: String,
    f: F,
}

impl<F> SubTask for FnSubTask<F>
where
    F: Fn() -> anyhow::Result<bool> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> anyhow::Result<bool> {
        (self.f)()
    }
}

pub fn subtask<F>(name: impl Into<String>, f: F) -> Arc<dyn SubTask>
where
    F: Fn() -> anyhow::Result<bool> + Send + Sync + 'static,
{
    Arc::new(FnSubTask {
        name: name.into(),
        f,
    })
}

#[derive(Debug, Error)]
#[error("sub-task {0} stopped without reporting a result")]
struct SubTaskAbandoned(String);

pub struct SyncOrchestrator {
    progress: Arc<dyn ProgressSink>,
    faults: Arc<dyn FaultSink>,
    wait: Duration,
}

impl SyncOrchestrator {
    pub const DEFAULT_WAIT: Duration = Duration::from_secs(60);

    pub fn new(progress: Arc<dyn ProgressSink>, faults: Arc<dyn FaultSink>) -> Self {
        Self {
            progress,
            faults,
            wait: Self::DEFAULT_WAIT,
        }
    }

    /// Per-sub-task wait bound.
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Run every sub-task in order. Failures never stop the loop; only
    /// cancellation does, and sub-tasks after the cancel point get no entry.
    pub fn execute(&self, subtasks: &[Arc<dyn SubTask>], cancel: &CancelToken) -> SyncTally {
        let mut tally = SyncTally::new();
        let total = subtasks.len();
        for (i, task) in subtasks.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(remaining = total - i, "sync cancelled; skipping remaining sub-tasks");
                break;
            }
            let name = task.name().to_string();
            let percent = (i * 100 / total) as u8;
            self.progress.report(&format!("Syncing {name}"), Some(percent));

            let ok = self.run_one(task, cancel);
            tracing::debug!(subtask = %name, ok, "sub-task finished");
            tally.record(&name, ok);
        }
        tally
    }

    fn run_one(&self, task: &Arc<dyn SubTask>, cancel: &CancelToken) -> bool {
        let name = task.name().to_string();
        let (done, waiter) = completion();
        let worker = Arc::clone(task);
        let spawned = thread::Builder::new()
            .name(format!("subtask-{name}"))
            .spawn(move || done.complete(worker.run()));
        if let Err(e) = spawned {
            self.faults.report(&e, &format!("spawning sync sub-task {name}"));
            return false;
        }

        match waiter.wait(self.wait, cancel) {
            WaitOutcome::Ready(Ok(ok)) => {
                if !ok {
                    tracing::warn!(subtask = %name, "sub-task reported failure");
                }
                ok
            }
            WaitOutcome::Ready(Err(e)) => {
                tracing::warn!(subtask = %name, error = %e, "sub-task raised an error");
                self.faults.report(&*e, &format!("sync sub-task {name}"));
                false
            }
            WaitOutcome::TimedOut => {
                tracing::warn!(subtask = %name, wait = ?self.wait, "sub-task timed out; detaching");
                false
            }
            WaitOutcome::Cancelled => {
                tracing::info!(subtask = %name, "cancelled while waiting on sub-task");
                false
            }
            WaitOutcome::Abandoned => {
                let err = SubTaskAbandoned(name.clone());
                self.faults.report(&err, &format!("sync sub-task {name}"));
                false
            }
        }
    }
}
