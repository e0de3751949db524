//! `fieldsync run <job>` – invoke a reference job the way an external
//! scheduler would: read the attempt counter, run one pass, record the outcome,
//! and with `--until-done` keep going after the backoff delay.

use anyhow::{anyhow, bail, Result};
use fieldsync_core::attempt_db::AttemptDb;
use fieldsync_core::config::FieldsyncConfig;
use fieldsync_core::control::{CancelToken, JobControl};
use fieldsync_core::job::{
    keys, now_millis, ChannelProgress, JobContext, JobOutcome, JobOutput, JobRunner, Payload,
    PayloadValue, ProgressUpdate, Session, TracingFaults,
};
use fieldsync_core::network::{NetworkProbe, TcpProbe};
use fieldsync_core::retry::RetryPolicy;
use fieldsync_core::tasks::{
    HttpLocationReporter, HttpUploader, LocationJob, SyncJob, UploadJob,
};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{JobCommand, JobKind};

/// Everything a pass needs besides the attempt store.
struct Invocation {
    name: &'static str,
    cfg: Arc<FieldsyncConfig>,
    job: JobCommand,
    input: Payload,
    session: Option<Session>,
    policy: RetryPolicy,
    probe: Arc<dyn NetworkProbe>,
    until_done: bool,
}

pub async fn run_job(
    db: &AttemptDb,
    cfg: Arc<FieldsyncConfig>,
    control: &JobControl,
    job: JobCommand,
    user: Option<String>,
    until_done: bool,
) -> Result<()> {
    let kind = job.kind();
    let inv = Invocation {
        name: kind.job_name(),
        policy: retry_policy(&cfg, kind),
        probe: Arc::new(TcpProbe::from_config(&cfg.network)),
        input: job_input(&job),
        session: user.map(|user_id| Session { user_id }),
        cfg,
        job,
        until_done,
    };

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressUpdate>(16);
    let printer = tokio::spawn(async move {
        while let Some(update) = progress_rx.recv().await {
            match update.percent {
                Some(p) => println!("  [{:>3}%] {}", p, update.message),
                None => println!("  {}", update.message),
            }
        }
    });
    let runner = Arc::new(JobRunner::new(
        Arc::new(ChannelProgress::new(progress_tx)),
        Arc::new(TracingFaults),
    ));

    let token = control.register(inv.name);
    let result = drive(db, &inv, runner, &token).await;
    control.unregister(inv.name);
    let _ = printer.await;
    result
}

async fn drive(
    db: &AttemptDb,
    inv: &Invocation,
    runner: Arc<JobRunner>,
    token: &CancelToken,
) -> Result<()> {
    let name = inv.name;
    loop {
        if token.is_cancelled() {
            println!("{name}: cancelled");
            return Ok(());
        }
        let attempt = db.attempt(name).await?;

        // An unmet precondition must not spend an attempt, so probe before
        // the runner gets a chance to answer Retry.
        let probe = Arc::clone(&inv.probe);
        let online = tokio::task::spawn_blocking(move || probe.is_network_available()).await?;
        if !online {
            println!("{name}: network unavailable; attempt counter unchanged");
            if !inv.until_done {
                return Ok(());
            }
            wait_or_cancel(inv.policy.backoff_delay(attempt), token).await;
            continue;
        }

        let mut ctx = JobContext::new(attempt, Arc::clone(&inv.probe))
            .with_input(inv.input.clone())
            .with_cancel(token.clone());
        ctx.session = inv.session.clone();
        let pass_runner = Arc::clone(&runner);
        let cfg = Arc::clone(&inv.cfg);
        let job = inv.job.clone();
        let outcome =
            tokio::task::spawn_blocking(move || invoke(&pass_runner, &cfg, &job, &ctx)).await??;

        let next = db.record_outcome(name, &outcome).await?;
        tracing::info!(job = name, attempt, outcome = outcome.as_str(), "pass recorded");
        match outcome {
            JobOutcome::Success(out) => {
                print_output(name, &out);
                return Ok(());
            }
            JobOutcome::Failure => {
                bail!("{name} failed on attempt {attempt}; see the log for the last error");
            }
            JobOutcome::Retry => {
                println!(
                    "{name}: retry requested ({next} of {} attempts used)",
                    inv.policy.max_attempts
                );
                if !inv.until_done {
                    return Ok(());
                }
                if scheduler_gives_up(next, &inv.policy) {
                    bail!(
                        "{name} still asks for a retry after {next} attempts; giving up \
                         (`fieldsync reset` clears the counter)"
                    );
                }
                let delay = inv.policy.backoff_delay(attempt);
                println!("{name}: next pass in {:.1}s", delay.as_secs_f64());
                wait_or_cancel(delay, token).await;
            }
        }
    }
}

/// Build the job for `cmd` and run one pass.
fn invoke(
    runner: &JobRunner,
    cfg: &FieldsyncConfig,
    cmd: &JobCommand,
    ctx: &JobContext,
) -> Result<JobOutcome> {
    let outcome = match cmd {
        JobCommand::Sync => {
            if cfg.sync.endpoints.is_empty() {
                tracing::warn!("no sync endpoints configured; nothing to pull");
            }
            let mut job = SyncJob::from_config(cfg, runner.progress(), runner.faults());
            runner.run(&mut job, ctx)
        }
        JobCommand::Location { .. } => {
            let endpoint = cfg
                .location_endpoint
                .as_deref()
                .ok_or_else(|| anyhow!("location_endpoint is not set in the config file"))?;
            let mut job = LocationJob::new(HttpLocationReporter::new(endpoint)?)
                .with_policy(RetryPolicy::from(&cfg.retry.location));
            runner.run(&mut job, ctx)
        }
        JobCommand::Upload { .. } => {
            let endpoint = cfg
                .upload_endpoint
                .as_deref()
                .ok_or_else(|| anyhow!("upload_endpoint is not set in the config file"))?;
            let mut job = UploadJob::new(HttpUploader::new(endpoint)?)
                .with_policy(RetryPolicy::from(&cfg.retry.upload));
            runner.run(&mut job, ctx)
        }
    };
    Ok(outcome)
}

fn retry_policy(cfg: &FieldsyncConfig, kind: JobKind) -> RetryPolicy {
    match kind {
        JobKind::Sync => RetryPolicy::from(&cfg.retry.sync),
        JobKind::Location => RetryPolicy::from(&cfg.retry.location),
        JobKind::Upload => RetryPolicy::from(&cfg.retry.upload),
    }
}

/// Retry answers that never spend the job's budget (all sub-tasks failed)
/// still stop the `--until-done` loop once the counter reaches it.
fn scheduler_gives_up(attempts_used: u32, policy: &RetryPolicy) -> bool {
    attempts_used >= policy.max_attempts
}

/// Job input payload from the command-line arguments.
pub(crate) fn job_input(cmd: &JobCommand) -> Payload {
    match cmd {
        JobCommand::Sync => Payload::new(),
        JobCommand::Location { lat, lon, accuracy } => {
            let mut input = Payload::new()
                .with(keys::LATITUDE, PayloadValue::Float(*lat))
                .with(keys::LONGITUDE, PayloadValue::Float(*lon))
                .with(keys::TIMESTAMP, PayloadValue::Timestamp(now_millis()));
            if let Some(accuracy) = accuracy {
                input.insert(keys::ACCURACY, PayloadValue::Float(*accuracy));
            }
            input
        }
        JobCommand::Upload { path } => {
            let path = path.canonicalize().unwrap_or_else(|_| path.clone());
            Payload::new().with(keys::FILE_PATH, PayloadValue::Text(path.display().to_string()))
        }
    }
}

async fn wait_or_cancel(delay: Duration, token: &CancelToken) {
    const SLICE: Duration = Duration::from_millis(200);
    let deadline = tokio::time::Instant::now() + delay;
    loop {
        let now = tokio::time::Instant::now();
        if now >= deadline || token.is_cancelled() {
            return;
        }
        tokio::time::sleep((deadline - now).min(SLICE)).await;
    }
}

fn format_value(value: &PayloadValue) -> String {
    match value {
        PayloadValue::Int(i) => i.to_string(),
        PayloadValue::Float(f) => f.to_string(),
        PayloadValue::Text(s) => s.clone(),
        PayloadValue::Timestamp(ms) => format!("{ms} (unix ms)"),
    }
}

fn print_output(name: &str, out: &JobOutput) {
    println!("{name}: success");
    for (key, value) in out.payload.iter() {
        println!("  {:<18} {}", key, format_value(value));
    }
    if let Some(tally) = &out.tally {
        for (sub, ok) in tally.iter() {
            println!("  {:<18} {}", sub, if ok { "ok" } else { "failed" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsync_core::job::TracingProgress;
    use std::path::PathBuf;

    #[test]
    fn location_input_carries_fix() {
        let input = job_input(&JobCommand::Location {
            lat: -33.86,
            lon: 151.21,
            accuracy: Some(4.0),
        });
        assert_eq!(input.get_f64(keys::LATITUDE), Some(-33.86));
        assert_eq!(input.get_f64(keys::ACCURACY), Some(4.0));
        assert!(input.get_i64(keys::TIMESTAMP).is_some());
    }

    #[test]
    fn upload_input_keeps_missing_paths() {
        let input = job_input(&JobCommand::Upload {
            path: PathBuf::from("does/not/exist.jpg"),
        });
        assert_eq!(input.get_str(keys::FILE_PATH), Some("does/not/exist.jpg"));
    }

    #[test]
    fn missing_endpoint_is_an_error_before_running() {
        let cfg = FieldsyncConfig::default();
        let runner = JobRunner::new(Arc::new(TracingProgress), Arc::new(TracingFaults));
        let ctx = JobContext::offline_aware(0, true);
        let err = invoke(&runner, &cfg, &JobCommand::Upload { path: "x".into() }, &ctx).unwrap_err();
        assert!(err.to_string().contains("upload_endpoint"));
    }

    #[test]
    fn until_done_loop_stops_at_the_budget() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert!(!scheduler_gives_up(2, &policy));
        assert!(scheduler_gives_up(3, &policy));
        assert!(scheduler_gives_up(9, &policy));
    }

    #[tokio::test]
    async fn wait_returns_early_when_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let start = std::time::Instant::now();
        wait_or_cancel(Duration::from_secs(30), &token).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
