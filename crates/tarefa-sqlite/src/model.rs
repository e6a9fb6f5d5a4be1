use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::FromRow;
use tarefa_core::{Job, Message, QueueError, QueueResult, Status};
use uuid::Uuid;

/// Row shape of the `jobs` table. Timestamps are epoch milliseconds,
/// ids are hyphenated uuid text, metadata is a JSON object or NULL.
#[derive(Debug, FromRow)]
pub(crate) struct JobRow {
    pub id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub status: i64,
    pub attempts: i64,
    pub locked_until: Option<i64>,
    pub next_run_at: i64,
    pub metadata: Option<String>,
    pub payload: Option<Vec<u8>>,
}

impl JobRow {
    pub(crate) fn into_job(self) -> QueueResult<Job> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| QueueError::Storage(format!("malformed job id {:?}: {e}", self.id)))?;
        let status = u8::try_from(self.status)
            .ok()
            .and_then(|code| Status::try_from(code).ok())
            .ok_or_else(|| QueueError::Storage(format!("invalid status code: {}", self.status)))?;
        let attempts = u32::try_from(self.attempts)
            .map_err(|_| QueueError::Storage(format!("invalid attempts value: {}", self.attempts)))?;
        let metadata: HashMap<String, serde_json::Value> = match self.metadata {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| QueueError::Storage(format!("malformed metadata: {e}")))?,
            None => HashMap::new(),
        };

        Ok(Job {
            message: Message {
                id,
                metadata,
                payload: self.payload.unwrap_or_default(),
            },
            created_at: millis_to_utc(self.created_at)?,
            updated_at: millis_to_utc(self.updated_at)?,
            status,
            attempts,
            locked_until: self.locked_until.map(millis_to_utc).transpose()?,
            next_run_at: millis_to_utc(self.next_run_at)?,
        })
    }
}

/// Column list shared by every job-returning statement, in `JobRow`
/// field order.
pub(crate) const JOB_COLUMNS: &str =
    "id, created_at, updated_at, status, attempts, locked_until, next_run_at, metadata, payload";

pub(crate) fn millis_to_utc(ms: i64) -> QueueResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| QueueError::Storage(format!("timestamp out of range: {ms}")))
}

pub(crate) fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

pub(crate) fn status_code(status: Status) -> i64 {
    i64::from(u8::from(status))
}

/// JSON text for a metadata map; an empty map persists as NULL.
pub(crate) fn metadata_to_json(
    metadata: &HashMap<String, serde_json::Value>,
) -> QueueResult<Option<String>> {
    if metadata.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(metadata)
        .map(Some)
        .map_err(|e| QueueError::Storage(format!("metadata encode: {e}")))
}

pub(crate) fn rows_to_jobs(rows: Vec<JobRow>) -> QueueResult<Vec<Job>> {
    rows.into_iter().map(JobRow::into_job).collect()
}
