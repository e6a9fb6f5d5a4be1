use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tarefa_core::{Message, Pusher, QueueResult, Status};

use crate::model::{duration_millis, metadata_to_json, status_code};
use crate::store::{storage_err, SqliteStore};

const INSERT_JOB: &str = r#"
INSERT INTO jobs (id, created_at, updated_at, status, attempts, locked_until, next_run_at, metadata, payload)
VALUES (?, ?, ?, ?, 0, NULL, ?, ?, ?)
"#;

#[async_trait]
impl Pusher for SqliteStore {
    /// Insert a new `Pending` job eligible after `delay`. A duplicate
    /// id violates the primary key and surfaces as a storage error.
    async fn push(&self, msg: &Message, delay: Duration) -> QueueResult<()> {
        let now_ms = Utc::now().timestamp_millis();
        let next_run_ms = now_ms.saturating_add(duration_millis(delay));
        let metadata = metadata_to_json(&msg.metadata)?;
        let payload = if msg.payload.is_empty() {
            None
        } else {
            Some(msg.payload.as_slice())
        };

        sqlx::query(INSERT_JOB)
            .bind(msg.id.to_string())
            .bind(now_ms)
            .bind(now_ms)
            .bind(status_code(Status::Pending))
            .bind(next_run_ms)
            .bind(metadata)
            .bind(payload)
            .execute(self.pool())
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}
