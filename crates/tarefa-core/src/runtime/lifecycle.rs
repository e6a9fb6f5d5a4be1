use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::LifecycleError;

const STOPPED: u8 = 0;
const STARTED: u8 = 1;

/// Two-state start/stop guard shared by the queue workers.
///
/// Transitions are compare-and-set, so start and stop each succeed at
/// most once per cycle regardless of caller concurrency.
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub(crate) fn try_start(&self) -> Result<(), LifecycleError> {
        self.state
            .compare_exchange(STOPPED, STARTED, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| LifecycleError::DoubleStarted)
    }

    pub(crate) fn try_stop(&self) -> Result<(), LifecycleError> {
        self.state
            .compare_exchange(STARTED, STOPPED, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| LifecycleError::DoubleStopped)
    }
}

/// Join every handle, failing with `StopTimeout` when the deadline
/// elapses first. Join errors are swallowed: a panicked task has
/// already been logged at its failure site.
pub(crate) async fn join_all_within(
    timeout: Duration,
    handles: Vec<JoinHandle<()>>,
) -> Result<(), LifecycleError> {
    let join = async {
        for handle in handles {
            let _ = handle.await;
        }
    };
    tokio::time::timeout(timeout, join)
        .await
        .map_err(|_| LifecycleError::StopTimeout)
}
