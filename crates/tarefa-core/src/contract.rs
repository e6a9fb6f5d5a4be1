//! Storage contracts. Implementations plug any durable store into the
//! queue without coupling the runtime to a database.
//!
//! All mutating operations must be atomic with respect to concurrent
//! callers: they succeed only when the observed pre-state matches the
//! required pre-state and otherwise fail with a typed
//! [`QueueError`](crate::error::QueueError) without partial effect.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::QueueResult;
use crate::job::{Job, Status};
use crate::message::Message;

/// Write-side entry point of the queue.
#[async_trait]
pub trait Pusher: Send + Sync {
    /// Durably persist `msg` as a new `Pending` job that becomes
    /// eligible for claiming after `delay` (zero means immediately).
    ///
    /// On success the job starts with zero attempts, no lease, and
    /// creation/update stamps set to the enqueue time. `msg` is not
    /// mutated. On error no job exists. Duplicate identifiers are not
    /// deduplicated; they surface as a storage-layer uniqueness error.
    async fn push(&self, msg: &Message, delay: Duration) -> QueueResult<()>;
}

/// Lifecycle transitions with visibility-timeout semantics.
///
/// `pull` claims jobs under a lease; while the lease holds, the job is
/// invisible to other claimants. A claimant that crashes or stalls
/// loses the row once `locked_until` passes. Delivery is therefore
/// at-least-once and handlers must be idempotent.
///
/// The mutating operations refresh the caller's `Job` snapshot on
/// success so transitions can be chained without re-reading.
#[async_trait]
pub trait Puller: Send + Sync {
    /// Atomically claim up to `batch` eligible jobs.
    ///
    /// A row is eligible when `next_run_at` has passed and it is either
    /// `Pending` or `Processing` with an expired lease. Claimed rows
    /// move to `Processing` with `attempts` incremented and
    /// `locked_until` set to now + `lock`, and are returned oldest-due
    /// first. No eligible rows is an empty result, not an error.
    ///
    /// No two concurrent calls may both claim the same row.
    async fn pull(&self, batch: u32, lock: Duration) -> QueueResult<Vec<Job>>;

    /// Extend the lease of a `Processing` job to now + `lock`.
    ///
    /// Fails with [`LockLost`](crate::error::QueueError::LockLost) when
    /// the row is no longer `Processing`. Ownership is temporal, not
    /// cryptographic: a well-behaved holder extends before the lease
    /// elapses.
    async fn extend_lock(&self, job: &mut Job, lock: Duration) -> QueueResult<()>;

    /// Transition a `Processing` job to `Done` and clear its lease.
    ///
    /// Fails with
    /// [`CompleteFailed`](crate::error::QueueError::CompleteFailed)
    /// when the row is not `Processing`.
    async fn complete(&self, job: &mut Job) -> QueueResult<()>;

    /// Return a `Processing` job to `Pending`, scheduling it to run
    /// again after `backoff`.
    ///
    /// Fails with [`JobLost`](crate::error::QueueError::JobLost) when
    /// the row is not `Processing`.
    async fn requeue(&self, job: &mut Job, backoff: Duration) -> QueueResult<()>;

    /// Transition a `Pending` or `Processing` job to `Dead`.
    ///
    /// Fails with [`JobLost`](crate::error::QueueError::JobLost) when
    /// the row is missing or already terminal.
    async fn kill(&self, job: &mut Job) -> QueueResult<()>;
}

/// Read-only snapshots for diagnostics and administration. Never
/// mutates state and takes no part in lease handling.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Snapshot of the job with the given id, or `None` when absent.
    async fn get(&self, id: Uuid) -> QueueResult<Option<Job>>;

    /// Up to `limit` snapshots filtered by `status`. `Status::Unknown`
    /// means no status filter; a non-positive `limit` means unbounded
    /// at this layer.
    async fn list(&self, status: Status, limit: i64) -> QueueResult<Vec<Job>>;
}

/// Retention management: permanent removal of terminal jobs.
#[async_trait]
pub trait Cleaner: Send + Sync {
    /// Delete jobs in the given terminal `status`, or in both `Done`
    /// and `Dead` when `status` is `Unknown`, optionally restricted to
    /// rows with `updated_at <= before`. Returns the number of rows
    /// deleted.
    ///
    /// Non-terminal statuses are rejected with
    /// [`BadStatus`](crate::error::QueueError::BadStatus); rows outside
    /// terminal states are never touched.
    async fn clean(&self, status: Status, before: Option<DateTime<Utc>>) -> QueueResult<u64>;
}
