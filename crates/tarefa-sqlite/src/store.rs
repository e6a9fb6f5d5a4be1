use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tarefa_core::{QueueError, QueueResult};

/// SQLite-backed store implementing all four queue contracts.
///
/// Cloning is cheap; clones share the underlying connection pool. Call
/// [`init`](SqliteStore::init) once before use to create the schema.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wrap an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) a database file with WAL journaling and a busy
    /// timeout, the settings the queue's concurrent write patterns
    /// expect.
    pub async fn connect(path: impl AsRef<Path>) -> QueueResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(storage_err)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn storage_err(err: sqlx::Error) -> QueueError {
    QueueError::storage(err)
}
