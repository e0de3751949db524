//! `fieldsync status` – attempt counters and last outcomes.

use anyhow::Result;
use fieldsync_core::attempt_db::AttemptDb;

pub async fn run_status(db: &AttemptDb, json: bool) -> Result<()> {
    let records = db.list().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No jobs have run yet.");
        return Ok(());
    }
    println!("{:<18} {:<8} {:<10} {}", "JOB", "ATTEMPT", "LAST", "UPDATED");
    for r in records {
        println!(
            "{:<18} {:<8} {:<10} {}",
            r.name,
            r.attempt,
            r.last_outcome.as_deref().unwrap_or("-"),
            r.updated_at
        );
    }
    Ok(())
}
