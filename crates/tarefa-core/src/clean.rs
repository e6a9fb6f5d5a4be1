use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::CleanConfig;
use crate::contract::Cleaner;
use crate::error::LifecycleError;
use crate::runtime::lifecycle::{join_all_within, Lifecycle};
use crate::runtime::timer::TimerTask;

/// Periodic retention driver: invokes a [`Cleaner`] on a schedule.
///
/// Runs independently of [`Worker`](crate::worker::Worker); safety
/// rests entirely on the Cleaner's terminal-status filter. Errors are
/// logged and the next tick proceeds.
///
/// The lifecycle is strict: [`start`](CleanWorker::start) and
/// [`stop`](CleanWorker::stop) each succeed once per instance.
pub struct CleanWorker {
    lifecycle: Lifecycle,
    cleaner: Arc<dyn Cleaner>,
    config: CleanConfig,
    task: Mutex<Option<TimerTask>>,
}

impl CleanWorker {
    pub fn new(cleaner: Arc<dyn Cleaner>, config: CleanConfig) -> Self {
        Self {
            lifecycle: Lifecycle::default(),
            cleaner,
            config,
            task: Mutex::new(None),
        }
    }

    fn cutoff(config: &CleanConfig) -> Option<DateTime<Utc>> {
        if !config.before {
            return None;
        }
        let mut stamp = Utc::now();
        if config.delta_ms > 0 {
            stamp -= chrono::Duration::milliseconds(config.delta_ms as i64);
        }
        Some(stamp)
    }

    /// Begin periodic cleaning. The first tick fires immediately.
    pub fn start(&self, shutdown: &CancellationToken) -> Result<(), LifecycleError> {
        self.lifecycle.try_start()?;

        let cleaner = self.cleaner.clone();
        let config = self.config.clone();
        let task = TimerTask::spawn(shutdown, self.config.interval(), move || {
            let cleaner = cleaner.clone();
            let config = config.clone();
            async move {
                let before = Self::cutoff(&config);
                match cleaner.clean(config.status, before).await {
                    Ok(count) => info!(count, status = %config.status, "cleaned jobs"),
                    Err(e) => error!(error = %e, "error while cleaning"),
                }
            }
        });

        *self.task.lock().expect("clean worker state mutex poisoned") = Some(task);
        Ok(())
    }

    /// Stop the background task, waiting up to `timeout` for it to
    /// finish its current tick.
    pub async fn stop(&self, timeout: Duration) -> Result<(), LifecycleError> {
        self.lifecycle.try_stop()?;

        let task = self.task.lock().expect("clean worker state mutex poisoned").take();
        let Some(task) = task else {
            return Ok(());
        };
        join_all_within(timeout, vec![task.stop()]).await
    }
}
