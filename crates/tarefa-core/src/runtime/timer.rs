use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodic tick driver. The first tick fires immediately, then every
/// `period`. Stopping cancels the loop; a tick already in flight runs
/// to completion.
pub(crate) struct TimerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl TimerTask {
    pub(crate) fn spawn<F, Fut>(parent: &CancellationToken, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = parent.child_token();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = interval.tick() => tick().await,
                }
            }
        });
        Self { cancel, handle }
    }

    /// Cancel the loop and hand back the task handle for joining.
    pub(crate) fn stop(self) -> JoinHandle<()> {
        self.cancel.cancel();
        self.handle
    }
}
