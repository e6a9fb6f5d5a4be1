//! Storage-agnostic durable job queue with at-least-once delivery and
//! visibility-timeout semantics.
//!
//! tarefa models a durable queue with explicit state transitions. It
//! separates transport data ([`Message`]) from delivery state ([`Job`])
//! and defines four storage contracts ([`Pusher`], [`Puller`],
//! [`Observer`], [`Cleaner`]) so queue logic stays decoupled from any
//! particular database.
//!
//! # Delivery semantics
//!
//! Delivery is at-least-once. A job may be handled more than once when
//! a worker crashes before completing it, when the visibility timeout
//! expires, or when the lease is lost to a concurrent claimant.
//! Handlers must therefore be idempotent.
//!
//! # Lease model
//!
//! Pulling a job transitions it from `Pending` to `Processing` and
//! assigns a visibility timeout (`locked_until`). While the lease is
//! valid the job is invisible to other claimants; once it expires the
//! job becomes eligible again. The [`Worker`] extends the lease
//! automatically while a handler runs.
//!
//! # State machine
//!
//! ```text
//! Pending    -> Processing
//! Processing -> Done
//! Processing -> Pending   (requeue with delay)
//! Processing -> Dead
//! Pending    -> Dead      (force kill)
//! ```
//!
//! Terminal states (`Done`, `Dead`) are never retried.
//!
//! # Retry policy
//!
//! When a handler fails, [`BackoffConfig`] decides between rescheduling
//! with a computed delay and transitioning the job to `Dead`. Attempts
//! are counted on every successful claim.
//!
//! # Worker
//!
//! [`Worker`] periodically polls storage for eligible jobs, dispatches
//! them through a bounded channel to a fixed pool of handler runners,
//! renews leases while handlers execute, applies the retry schedule on
//! failure, and shuts down gracefully under a timeout.

pub mod backoff;
pub mod clean;
pub mod config;
pub mod contract;
pub mod error;
pub mod job;
pub mod message;
mod runtime;
pub mod telemetry;
pub mod worker;

pub use backoff::BackoffConfig;
pub use clean::CleanWorker;
pub use config::{CleanConfig, WorkerConfig};
pub use contract::{Cleaner, Observer, Puller, Pusher};
pub use error::{HandlerError, LifecycleError, QueueError, QueueResult};
pub use job::{Job, Status};
pub use message::Message;
pub use worker::{Handler, Worker};
