use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Retry schedule applied when a handler fails.
///
/// The delay for attempt `n` grows as
/// `initial_interval * multiplier^(n-1)`, clamped to `max_interval`,
/// with optional uniform jitter. `max_retries == 0` means unbounded
/// retry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub max_retries: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
    /// Jitter factor in `[0, 1]`. When non-zero the delay is drawn
    /// uniformly from `[exp * (1 - r), exp * (1 + r)]`.
    pub randomization_factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_interval_ms: 1_000,
            max_interval_ms: 60_000,
            multiplier: 2.0,
            randomization_factor: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Delay before the job may run again, or `None` when the retry
    /// budget is exhausted.
    ///
    /// `attempt` is the claim counter after the failing run: the first
    /// failure passes 1. Exhaustion is `attempt > max_retries` with a
    /// non-zero budget.
    pub fn next(&self, attempt: u32) -> Option<Duration> {
        if self.max_retries > 0 && attempt > self.max_retries {
            return None;
        }
        let mut exp =
            self.initial_interval_ms as f64 * self.multiplier.powi(attempt.saturating_sub(1) as i32);
        if exp > self.max_interval_ms as f64 {
            exp = self.max_interval_ms as f64;
        }
        if self.randomization_factor > 0.0 {
            let delta = self.randomization_factor * exp;
            exp = rand::rng().random_range(exp - delta..=exp + delta);
        }
        Some(Duration::from_secs_f64(exp.max(0.0) / 1000.0))
    }
}
