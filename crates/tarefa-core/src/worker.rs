use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::backoff::BackoffConfig;
use crate::config::WorkerConfig;
use crate::contract::Puller;
use crate::error::{HandlerError, LifecycleError, QueueError};
use crate::job::Job;
use crate::message::Message;
use crate::runtime::lifecycle::{join_all_within, Lifecycle};
use crate::runtime::pool::{Dispatcher, WorkerPool};
use crate::runtime::timer::TimerTask;

/// User-supplied processing logic, invoked once per delivery.
///
/// `cancel` fires when the worker shuts down or the job's lease is
/// lost; handlers should return promptly once it does. Delivery is
/// at-least-once, so handlers must be idempotent.
///
/// Returning `Ok(())` completes the job. [`HandlerError::Kill`] moves
/// it straight to `Dead`. Any other error consults the retry schedule.
///
/// Closures of the matching shape implement the trait directly:
///
/// ```
/// # use tarefa_core::{HandlerError, Message};
/// # use tokio_util::sync::CancellationToken;
/// let handler = |_cancel: CancellationToken, msg: Message| async move {
///     println!("handling {}", msg.id);
///     Ok::<(), HandlerError>(())
/// };
/// ```
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, cancel: CancellationToken, msg: Message) -> Result<(), HandlerError>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(CancellationToken, Message) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, cancel: CancellationToken, msg: Message) -> Result<(), HandlerError> {
        self(cancel, msg).await
    }
}

/// Coordinates pulling, dispatching, lease renewal, retrying and
/// completing jobs.
///
/// The worker polls storage on a timer, pushes claimed jobs into a
/// bounded dispatch channel, and fans them out to a fixed set of
/// handler runners. While a handler executes, the job's lease is
/// renewed at half the lock timeout; on handler completion the outcome
/// is folded into `complete`, `kill`, or `requeue` per the retry
/// schedule. Delivery is at-least-once, never exactly-once.
///
/// The lifecycle is strict: [`start`](Worker::start) and
/// [`stop`](Worker::stop) each succeed once per instance.
pub struct Worker {
    lifecycle: Lifecycle,
    shared: Arc<Shared>,
    config: WorkerConfig,
    running: Mutex<Option<Running>>,
}

struct Shared {
    puller: Arc<dyn Puller>,
    handler: Arc<dyn Handler>,
    batch_size: u32,
    lock: Duration,
    half_lock: Duration,
    backoff: BackoffConfig,
}

struct Running {
    pull_task: TimerTask,
    pool: WorkerPool<Job>,
}

impl Worker {
    /// Build a worker over the given puller and handler. Processing
    /// begins only on [`start`](Worker::start).
    pub fn new(puller: Arc<dyn Puller>, handler: Arc<dyn Handler>, config: WorkerConfig) -> Self {
        let lock = config.lock_timeout();
        Self {
            lifecycle: Lifecycle::default(),
            shared: Arc::new(Shared {
                puller,
                handler,
                batch_size: config.batch_size,
                lock,
                half_lock: lock / 2,
                backoff: config.backoff.clone(),
            }),
            config,
            running: Mutex::new(None),
        }
    }

    /// Begin background pulling and processing.
    ///
    /// `shutdown` is the caller's cancellation root: cancelling it stops
    /// new work the way [`stop`](Worker::stop) does, but does not
    /// replace the stop join. Returns
    /// [`DoubleStarted`](LifecycleError::DoubleStarted) when already
    /// running.
    pub fn start(&self, shutdown: &CancellationToken) -> Result<(), LifecycleError> {
        self.lifecycle.try_start()?;

        let pool_cancel = shutdown.child_token();
        let shared = self.shared.clone();
        let runner_cancel = pool_cancel.clone();
        let pool = WorkerPool::start(
            self.config.concurrency,
            self.config.queue,
            pool_cancel,
            move |job| run_job(shared.clone(), runner_cancel.clone(), job),
        );

        let dispatcher = pool.dispatcher();
        let shared = self.shared.clone();
        let pull_task = TimerTask::spawn(shutdown, self.config.pull_interval(), move || {
            pull_tick(shared.clone(), dispatcher.clone())
        });

        *self.running.lock().expect("worker state mutex poisoned") =
            Some(Running { pull_task, pool });
        Ok(())
    }

    /// Graceful shutdown: stop polling, cancel the dispatch pool, and
    /// join both.
    ///
    /// In-flight handlers observe a cancelled token, finish their
    /// current job and exit. When the join outlasts `timeout`,
    /// [`StopTimeout`](LifecycleError::StopTimeout) is returned and
    /// background work may still be draining. Returns
    /// [`DoubleStopped`](LifecycleError::DoubleStopped) when not
    /// running.
    pub async fn stop(&self, timeout: Duration) -> Result<(), LifecycleError> {
        self.lifecycle.try_stop()?;

        let running = self.running.lock().expect("worker state mutex poisoned").take();
        let Some(Running { pull_task, pool }) = running else {
            return Ok(());
        };

        let mut handles = vec![pull_task.stop()];
        handles.extend(pool.stop());
        join_all_within(timeout, handles).await
    }
}

async fn pull_tick(shared: Arc<Shared>, dispatcher: Dispatcher<Job>) {
    let jobs = match shared.puller.pull(shared.batch_size, shared.lock).await {
        Ok(jobs) => jobs,
        Err(e) => {
            error!(error = %e, "pull failed");
            return;
        }
    };
    for job in jobs {
        let id = job.id();
        if !dispatcher.dispatch(job).await {
            // Undispatched claims stay Processing and become eligible
            // again once their leases expire.
            debug!(%id, "dispatch interrupted by shutdown");
            return;
        }
    }
}

/// Outcome of racing the handler task against the lease-renewal timer.
enum Served {
    Handler(Result<Result<(), HandlerError>, tokio::task::JoinError>),
    LeaseLost(QueueError),
}

async fn run_job(shared: Arc<Shared>, pool_cancel: CancellationToken, mut job: Job) {
    let job_cancel = pool_cancel.child_token();
    let id = job.id();

    match handle_or_extend(&shared, &job_cancel, &mut job).await {
        Served::LeaseLost(e) => {
            // The row progresses under whoever holds its lease now.
            warn!(%id, error = %e, "job lease lost, abandoning");
        }
        Served::Handler(Err(join_err)) => {
            // Panicked or aborted handler task. No transition: the lease
            // runs out on its own and the job is re-delivered.
            error!(%id, error = %join_err, "handler task failed");
        }
        Served::Handler(Ok(Ok(()))) => {
            if let Err(e) = shared.puller.complete(&mut job).await {
                error!(%id, error = %e, "cannot complete job");
            }
        }
        Served::Handler(Ok(Err(err))) if err.is_kill() => {
            if let Err(e) = shared.puller.kill(&mut job).await {
                error!(%id, error = %e, "cannot kill job");
            }
        }
        Served::Handler(Ok(Err(err))) => {
            debug!(%id, error = %err, attempts = job.attempts, "handler failed");
            match shared.backoff.next(job.attempts) {
                Some(delay) => {
                    if let Err(e) = shared.puller.requeue(&mut job, delay).await {
                        error!(%id, error = %e, "cannot requeue job");
                    }
                }
                None => {
                    if let Err(e) = shared.puller.kill(&mut job).await {
                        error!(%id, error = %e, "cannot kill job");
                    }
                }
            }
        }
    }
}

/// Run the handler in its own task while renewing the job's lease at
/// half-lock cadence. Any extension failure cancels the per-job token
/// and abandons the job without further transitions.
async fn handle_or_extend(
    shared: &Shared,
    job_cancel: &CancellationToken,
    job: &mut Job,
) -> Served {
    let handler = shared.handler.clone();
    let msg = job.message.clone();
    let token = job_cancel.clone();
    let mut handler_task = tokio::spawn(async move { handler.handle(token, msg).await });

    let renew = tokio::time::sleep(shared.half_lock);
    tokio::pin!(renew);

    loop {
        tokio::select! {
            res = &mut handler_task => return Served::Handler(res),
            _ = renew.as_mut() => {
                match shared.puller.extend_lock(job, shared.lock).await {
                    Ok(()) => {
                        renew.as_mut().reset(tokio::time::Instant::now() + shared.half_lock);
                    }
                    Err(e) => {
                        job_cancel.cancel();
                        return Served::LeaseLost(e);
                    }
                }
            }
        }
    }
}
