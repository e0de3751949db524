//! `fieldsync reset <job>` – clear a job's attempt counter.

use anyhow::Result;
use fieldsync_core::attempt_db::AttemptDb;

use crate::cli::JobKind;

pub async fn run_reset(db: &AttemptDb, job: JobKind) -> Result<()> {
    let name = job.job_name();
    db.reset(name).await?;
    println!("Reset attempt counter for {name}");
    Ok(())
}
