use tarefa_core::QueueResult;

use crate::store::{storage_err, SqliteStore};

const CREATE_JOBS: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id           TEXT PRIMARY KEY,
    created_at   INTEGER NOT NULL,
    updated_at   INTEGER NOT NULL,
    status       INTEGER NOT NULL,
    attempts     INTEGER NOT NULL DEFAULT 0,
    locked_until INTEGER,
    next_run_at  INTEGER NOT NULL,
    metadata     TEXT,
    payload      BLOB
)
"#;

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_jobs_status_next ON jobs (status, next_run_at)",
    "CREATE INDEX IF NOT EXISTS idx_jobs_status_lock ON jobs (status, locked_until)",
    "CREATE INDEX IF NOT EXISTS idx_jobs_status_updated ON jobs (status, updated_at)",
];

impl SqliteStore {
    /// Create the `jobs` table and its indexes if missing, inside one
    /// transaction; on failure nothing is left behind. Safe to call on
    /// every startup.
    pub async fn init(&self) -> QueueResult<()> {
        let mut tx = self.pool().begin().await.map_err(storage_err)?;
        sqlx::query(CREATE_JOBS)
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;
        for statement in CREATE_INDEXES {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(storage_err)?;
        }
        tx.commit().await.map_err(storage_err)?;
        Ok(())
    }
}
