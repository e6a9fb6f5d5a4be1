use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Bounded dispatch channel fanned out to a fixed set of runner tasks.
///
/// The channel is single-producer (the polling driver) / multi-consumer
/// (the runners). After cancellation each runner finishes the item in
/// hand and exits; buffered items are abandoned.
pub(crate) struct WorkerPool<T> {
    dispatcher: Dispatcher<T>,
    runners: Vec<JoinHandle<()>>,
}

/// Sending side of a pool's dispatch channel.
pub(crate) struct Dispatcher<T> {
    tx: mpsc::Sender<T>,
    cancel: CancellationToken,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> Dispatcher<T> {
    /// Hand an item to the pool, waiting for channel capacity. Returns
    /// `false` when the pool is cancelled before a slot opens.
    pub(crate) async fn dispatch(&self, item: T) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            res = self.tx.send(item) => res.is_ok(),
        }
    }
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `concurrency` runner tasks consuming from a channel of
    /// capacity `queue`, each awaiting `run` per item.
    pub(crate) fn start<F, Fut>(
        concurrency: usize,
        queue: usize,
        cancel: CancellationToken,
        run: F,
    ) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(queue.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let run = Arc::new(run);

        let runners = (0..concurrency.max(1))
            .map(|_| {
                let rx = rx.clone();
                let run = run.clone();
                let token = cancel.clone();
                tokio::spawn(async move {
                    loop {
                        let item = tokio::select! {
                            _ = token.cancelled() => None,
                            item = async { rx.lock().await.recv().await } => item,
                        };
                        let Some(item) = item else { break };
                        run(item).await;
                    }
                })
            })
            .collect();

        Self {
            dispatcher: Dispatcher { tx, cancel },
            runners,
        }
    }

    pub(crate) fn dispatcher(&self) -> Dispatcher<T> {
        self.dispatcher.clone()
    }

    /// Cancel the pool and hand back the runner handles for joining.
    pub(crate) fn stop(self) -> Vec<JoinHandle<()>> {
        self.dispatcher.cancel.cancel();
        self.runners
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn items_fan_out_across_runners() {
        let handled = Arc::new(AtomicU32::new(0));
        let counter = handled.clone();
        let pool = WorkerPool::start(3, 8, CancellationToken::new(), move |n: u32| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(n, Ordering::SeqCst);
            }
        });

        let dispatcher = pool.dispatcher();
        for n in 1..=4 {
            assert!(dispatcher.dispatch(n).await);
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handled.load(Ordering::SeqCst), 10);

        for handle in pool.stop() {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn dispatch_fails_after_cancellation() {
        let cancel = CancellationToken::new();
        let pool = WorkerPool::start(1, 1, cancel.clone(), |_: u32| async {});
        let dispatcher = pool.dispatcher();

        cancel.cancel();
        assert!(!dispatcher.dispatch(1).await);

        for handle in pool.stop() {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn full_channel_blocks_until_shutdown() {
        // A single runner stuck on its first item leaves the one-slot
        // channel full, so a third dispatch must wait; shutdown releases it.
        let cancel = CancellationToken::new();
        let blocker = CancellationToken::new();
        let gate = blocker.clone();
        let pool = WorkerPool::start(1, 1, cancel.clone(), move |_: u32| {
            let gate = gate.clone();
            async move {
                gate.cancelled().await;
            }
        });
        let dispatcher = pool.dispatcher();

        assert!(dispatcher.dispatch(1).await);
        assert!(dispatcher.dispatch(2).await);

        let waiting = tokio::spawn({
            let dispatcher = dispatcher.clone();
            async move { dispatcher.dispatch(3).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished(), "dispatch should block on a full channel");

        cancel.cancel();
        assert!(!waiting.await.unwrap(), "blocked dispatch should abandon on shutdown");

        blocker.cancel();
        for handle in pool.stop() {
            handle.await.unwrap();
        }
    }
}
