use async_trait::async_trait;
use tarefa_core::{Job, Observer, QueueResult, Status};
use uuid::Uuid;

use crate::model::{rows_to_jobs, status_code, JobRow, JOB_COLUMNS};
use crate::store::{storage_err, SqliteStore};

#[async_trait]
impl Observer for SqliteStore {
    async fn get(&self, id: Uuid) -> QueueResult<Option<Job>> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?");
        let row: Option<JobRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await
            .map_err(storage_err)?;
        row.map(JobRow::into_job).transpose()
    }

    async fn list(&self, status: Status, limit: i64) -> QueueResult<Vec<Job>> {
        let mut sql = format!("SELECT {JOB_COLUMNS} FROM jobs");
        if status != Status::Unknown {
            sql.push_str(" WHERE status = ?");
        }
        if limit > 0 {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query_as::<_, JobRow>(&sql);
        if status != Status::Unknown {
            query = query.bind(status_code(status));
        }
        if limit > 0 {
            query = query.bind(limit);
        }

        let rows = query.fetch_all(self.pool()).await.map_err(storage_err)?;
        rows_to_jobs(rows)
    }
}
