use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tarefa_core::{Cleaner, QueueError, QueueResult, Status};

use crate::model::status_code;
use crate::store::{storage_err, SqliteStore};

#[async_trait]
impl Cleaner for SqliteStore {
    /// Delete terminal rows. `Unknown` targets both `Done` and `Dead`;
    /// any other non-terminal status is rejected with `BadStatus`
    /// before touching the database.
    async fn clean(&self, status: Status, before: Option<DateTime<Utc>>) -> QueueResult<u64> {
        if status != Status::Unknown && !status.is_terminal() {
            return Err(QueueError::BadStatus);
        }

        let mut sql = String::from("DELETE FROM jobs WHERE ");
        if status == Status::Unknown {
            sql.push_str("status IN (?, ?)");
        } else {
            sql.push_str("status = ?");
        }
        if before.is_some() {
            sql.push_str(" AND updated_at <= ?");
        }

        let mut query = sqlx::query(&sql);
        if status == Status::Unknown {
            query = query
                .bind(status_code(Status::Done))
                .bind(status_code(Status::Dead));
        } else {
            query = query.bind(status_code(status));
        }
        if let Some(cutoff) = before {
            query = query.bind(cutoff.timestamp_millis());
        }

        let result = query.execute(self.pool()).await.map_err(storage_err)?;
        Ok(result.rows_affected())
    }
}
