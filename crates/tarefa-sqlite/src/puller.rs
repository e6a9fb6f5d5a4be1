use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tarefa_core::{Job, Puller, QueueError, QueueResult, Status};

use crate::model::{duration_millis, millis_to_utc, rows_to_jobs, status_code, JobRow};
use crate::store::{storage_err, SqliteStore};

/// Claim in one atomic statement: the subquery picks eligible rows and
/// the enclosing update transitions them, so concurrent claimants can
/// never both win a row.
const PULL: &str = r#"
UPDATE jobs SET
    status = ?,
    attempts = attempts + 1,
    locked_until = ?,
    updated_at = ?
WHERE id IN (
    SELECT id FROM jobs
    WHERE next_run_at <= ?
      AND (status = ? OR (status = ? AND locked_until < ?))
    ORDER BY next_run_at ASC
    LIMIT ?
)
RETURNING id, created_at, updated_at, status, attempts, locked_until, next_run_at, metadata, payload
"#;

const EXTEND: &str = r#"
UPDATE jobs SET locked_until = ?, updated_at = ?
WHERE id = ? AND status = ?
"#;

const COMPLETE: &str = r#"
UPDATE jobs SET status = ?, locked_until = NULL, updated_at = ?
WHERE id = ? AND status = ?
"#;

const REQUEUE: &str = r#"
UPDATE jobs SET status = ?, next_run_at = ?, locked_until = NULL, updated_at = ?
WHERE id = ? AND status = ?
"#;

const KILL: &str = r#"
UPDATE jobs SET status = ?, locked_until = NULL, updated_at = ?
WHERE id = ? AND status IN (?, ?)
"#;

#[async_trait]
impl Puller for SqliteStore {
    async fn pull(&self, batch: u32, lock: Duration) -> QueueResult<Vec<Job>> {
        let now_ms = Utc::now().timestamp_millis();
        let locked_until_ms = now_ms.saturating_add(duration_millis(lock));

        let rows: Vec<JobRow> = sqlx::query_as(PULL)
            .bind(status_code(Status::Processing))
            .bind(locked_until_ms)
            .bind(now_ms)
            .bind(now_ms)
            .bind(status_code(Status::Pending))
            .bind(status_code(Status::Processing))
            .bind(now_ms)
            .bind(i64::from(batch))
            .fetch_all(self.pool())
            .await
            .map_err(storage_err)?;

        let mut jobs = rows_to_jobs(rows)?;
        // RETURNING has no defined order; the contract promises oldest-due first.
        jobs.sort_by_key(|job| job.next_run_at);
        Ok(jobs)
    }

    async fn extend_lock(&self, job: &mut Job, lock: Duration) -> QueueResult<()> {
        let now_ms = Utc::now().timestamp_millis();
        let new_lock_ms = now_ms.saturating_add(duration_millis(lock));

        let result = sqlx::query(EXTEND)
            .bind(new_lock_ms)
            .bind(now_ms)
            .bind(job.id().to_string())
            .bind(status_code(Status::Processing))
            .execute(self.pool())
            .await
            .map_err(storage_err)?;
        if result.rows_affected() == 0 {
            return Err(QueueError::LockLost);
        }

        job.status = Status::Processing;
        job.locked_until = Some(millis_to_utc(new_lock_ms)?);
        job.updated_at = millis_to_utc(now_ms)?;
        Ok(())
    }

    async fn complete(&self, job: &mut Job) -> QueueResult<()> {
        let now_ms = Utc::now().timestamp_millis();

        let result = sqlx::query(COMPLETE)
            .bind(status_code(Status::Done))
            .bind(now_ms)
            .bind(job.id().to_string())
            .bind(status_code(Status::Processing))
            .execute(self.pool())
            .await
            .map_err(storage_err)?;
        if result.rows_affected() == 0 {
            return Err(QueueError::CompleteFailed);
        }

        job.status = Status::Done;
        job.locked_until = None;
        job.updated_at = millis_to_utc(now_ms)?;
        Ok(())
    }

    async fn requeue(&self, job: &mut Job, backoff: Duration) -> QueueResult<()> {
        let now_ms = Utc::now().timestamp_millis();
        let next_run_ms = now_ms.saturating_add(duration_millis(backoff));

        let result = sqlx::query(REQUEUE)
            .bind(status_code(Status::Pending))
            .bind(next_run_ms)
            .bind(now_ms)
            .bind(job.id().to_string())
            .bind(status_code(Status::Processing))
            .execute(self.pool())
            .await
            .map_err(storage_err)?;
        if result.rows_affected() == 0 {
            return Err(QueueError::JobLost);
        }

        job.status = Status::Pending;
        job.next_run_at = millis_to_utc(next_run_ms)?;
        job.locked_until = None;
        job.updated_at = millis_to_utc(now_ms)?;
        Ok(())
    }

    async fn kill(&self, job: &mut Job) -> QueueResult<()> {
        let now_ms = Utc::now().timestamp_millis();

        let result = sqlx::query(KILL)
            .bind(status_code(Status::Dead))
            .bind(now_ms)
            .bind(job.id().to_string())
            .bind(status_code(Status::Pending))
            .bind(status_code(Status::Processing))
            .execute(self.pool())
            .await
            .map_err(storage_err)?;
        if result.rows_affected() == 0 {
            return Err(QueueError::JobLost);
        }

        job.status = Status::Dead;
        job.locked_until = None;
        job.updated_at = millis_to_utc(now_ms)?;
        Ok(())
    }
}
