/// Failures surfaced by the storage contracts.
///
/// The transition errors (`JobLost`, `LockLost`, `CompleteFailed`)
/// signal that the caller's snapshot is stale relative to the store:
/// the row was removed, re-claimed or already transitioned by another
/// actor. They carry no partial effect.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// The referenced job no longer exists or is not in the pre-state
    /// the operation requires.
    #[error("job lost")]
    JobLost,

    /// The caller no longer owns the job's lease. Typically the
    /// visibility timeout expired and another worker claimed the row.
    #[error("lock lost")]
    LockLost,

    /// The job could not be completed because it is not `Processing`.
    #[error("complete failed")]
    CompleteFailed,

    /// A non-terminal status was passed to
    /// [`Cleaner::clean`](crate::contract::Cleaner::clean).
    #[error("bad job status")]
    BadStatus,

    /// Infrastructure failure in the backend, rendered by the
    /// implementation. The core never names a driver type.
    #[error("storage error: {0}")]
    Storage(String),
}

impl QueueError {
    /// Wrap a backend error as a rendered storage failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        QueueError::Storage(err.to_string())
    }
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Worker lifecycle misuse. Start and stop are strictly once-each per
/// instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// `start` was called on a worker that is already running.
    #[error("worker double start")]
    DoubleStarted,

    /// `stop` was called on a worker that is not running.
    #[error("worker double stop")]
    DoubleStopped,

    /// Shutdown did not finish within the given timeout. Background
    /// tasks may still be draining; no further calls are legal on the
    /// instance.
    #[error("worker stop timeout")]
    StopTimeout,
}

/// Error channel of a message handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Sentinel: transition the job straight to `Dead`, skipping the
    /// retry schedule.
    #[error("job killed by handler")]
    Kill,

    /// Ordinary failure; the worker consults the retry schedule.
    #[error("handler failed: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Wrap an arbitrary error (or message) as a retryable failure.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        HandlerError::Other(err.into())
    }

    pub fn is_kill(&self) -> bool {
        matches!(self, HandlerError::Kill)
    }
}
