//! Attempt counter reads and updates.

use anyhow::Result;
use sqlx::Row;

use super::db::{unix_timestamp, AttemptDb};
use crate::job::JobOutcome;

/// One row of the store, for `status` listings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AttemptRecord {
    pub name: String,
    pub attempt: u32,
    pub last_outcome: Option<String>,
    /// Unix seconds.
    pub updated_at: i64,
}

impl AttemptDb {
    /// Current attempt count; 0 for a job never seen.
    pub async fn attempt(&self, name: &str) -> Result<u32> {
        let row = sqlx::query("SELECT attempt FROM job_attempts WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("attempt") as u32).unwrap_or(0))
    }

    /// Bump the counter and return the new value.
    pub async fn increment(&self, name: &str) -> Result<u32> {
        sqlx::query(
            r#"
            INSERT INTO job_attempts (name, attempt, last_outcome, updated_at)
            VALUES (?1, 1, NULL, ?2)
            ON CONFLICT(name) DO UPDATE
            SET attempt = attempt + 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        self.attempt(name).await
    }

    /// Clear the counter, keeping the row and its last outcome.
    pub async fn reset(&self, name: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE job_attempts
            SET attempt = 0,
                updated_at = ?2
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply an invocation's outcome: `Retry` bumps the counter, terminal
    /// outcomes clear it. Returns the attempt count for the next invocation.
    pub async fn record_outcome(&self, name: &str, outcome: &JobOutcome) -> Result<u32> {
        let next = match outcome {
            JobOutcome::Retry => self.increment(name).await?,
            JobOutcome::Success(_) | JobOutcome::Failure => 0,
        };
        sqlx::query(
            r#"
            INSERT INTO job_attempts (name, attempt, last_outcome, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE
            SET attempt = excluded.attempt,
                last_outcome = excluded.last_outcome,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(name)
        .bind(next as i64)
        .bind(outcome.as_str())
        .bind(unix_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(next)
    }

    /// Every known job, by name.
    pub async fn list(&self) -> Result<Vec<AttemptRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT name, attempt, last_outcome, updated_at
            FROM job_attempts
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| AttemptRecord {
                name: row.get("name"),
                attempt: row.get::<i64, _>("attempt") as u32,
                last_outcome: row.get("last_outcome"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }
}
