use crate::orchestrator::panic_is_guarded;
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Keeps the file-writer thread alive; dropping it flushes pending lines.
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Installs the global subscriber.
///
/// The terminal is in raw mode while the visualizer runs, so logs either go
/// to `log_file` (default level `info`) or to stderr, where they stay off
/// unless `RUST_LOG` asks for them. File writes happen on a worker thread so
/// the frame loop never blocks on disk.
pub fn init(log_file: Option<&Path>) -> Result<Option<LogGuard>> {
    let default_level = if log_file.is_some() {
        LevelFilter::INFO
    } else {
        LevelFilter::OFF
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let (file_layer, console_layer, guard) = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create log file {}", path.display()))?;
            let (writer, worker) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter);
            (Some(layer), None, Some(LogGuard { _worker: worker }))
        }
        None => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter);
            (None, Some(layer), None)
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("init tracing: {e}"))?;

    install_panic_hook();
    tracing::info!("logging initialized");
    Ok(guard)
}

/// Sends panic messages to the log so they do not smear the frame.
/// Panics inside a fault guard are skipped; the guard reports them throttled.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        if panic_is_guarded() {
            return;
        }
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let payload = info.payload();
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_default();
        tracing::error!(%location, "panic: {msg}");
    }));
}
