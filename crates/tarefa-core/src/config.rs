use std::time::Duration;

use serde::Deserialize;

use crate::backoff::BackoffConfig;
use crate::job::Status;

/// Runtime shape of a [`Worker`](crate::worker::Worker).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of concurrent handler runners.
    pub concurrency: usize,
    /// Dispatch channel capacity between the polling driver and the
    /// runners.
    pub queue: usize,
    /// Maximum rows claimed per pull.
    pub batch_size: u32,
    /// Period between polling ticks.
    pub pull_interval_ms: u64,
    /// Lease duration per claim. Renewal fires at half this value.
    pub lock_timeout_ms: u64,
    /// Retry schedule applied when a handler fails.
    pub backoff: BackoffConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            queue: 64,
            batch_size: 16,
            pull_interval_ms: 1_000,
            lock_timeout_ms: 30_000,
            backoff: BackoffConfig::default(),
        }
    }
}

impl WorkerConfig {
    pub fn pull_interval(&self) -> Duration {
        Duration::from_millis(self.pull_interval_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

/// Schedule and filter for a [`CleanWorker`](crate::clean::CleanWorker).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Terminal status to purge. `Unknown` targets both `Done` and
    /// `Dead`.
    pub status: Status,
    /// Period between cleaning ticks.
    pub interval_ms: u64,
    /// When true, only rows with `updated_at <= now - delta` are
    /// deleted.
    pub before: bool,
    pub delta_ms: u64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            status: Status::Unknown,
            interval_ms: 60_000,
            before: false,
            delta_ms: 0,
        }
    }
}

impl CleanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
