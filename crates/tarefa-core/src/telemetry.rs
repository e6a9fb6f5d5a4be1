use tracing_subscriber::EnvFilter;

/// Tracing bootstrap for processes embedding the queue.
///
/// The default filter keeps worker lifecycle events at `info` while
/// silencing per-statement chatter from the sql driver; set `RUST_LOG`
/// to override it. Output is the compact single-line format, which
/// suits the worker's short structured events (`id`, `error`, `count`).
///
/// Reinitialization is a no-op, so test binaries may call this from
/// every suite.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
