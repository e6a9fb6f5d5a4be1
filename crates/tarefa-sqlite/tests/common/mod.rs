#![allow(dead_code)]

use std::time::Duration;

use tarefa_core::{Job, Observer, Status};
use tarefa_sqlite::SqliteStore;
use tempfile::TempDir;
use uuid::Uuid;

/// Fresh on-disk store (WAL + busy timeout) with the schema applied.
/// The temp dir must stay alive for the duration of the test.
pub async fn open_store() -> (SqliteStore, TempDir) {
    tarefa_core::telemetry::init_tracing();
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = SqliteStore::connect(dir.path().join("jobs.db"))
        .await
        .expect("open store");
    store.init().await.expect("init schema");
    (store, dir)
}

/// Poll the observer until the job reaches `want`, panicking at the
/// deadline with the last observed state.
pub async fn wait_for_status(
    store: &SqliteStore,
    id: Uuid,
    want: Status,
    timeout: Duration,
) -> Job {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut last: Option<Status> = None;
    loop {
        if let Some(job) = store.get(id).await.expect("observer get") {
            if job.status == want {
                return job;
            }
            last = Some(job.status);
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("job {id} did not reach {want} within {timeout:?} (last seen: {last:?})");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
