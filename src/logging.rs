use crate::config::LoggingConfig;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Stdout plus a daily-rotated file under `cfg.dir`.
///
/// Keep the returned guard alive for the whole process, otherwise buffered
/// file lines are lost on exit.
pub fn init_logger(cfg: &LoggingConfig) -> WorkerGuard {
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let file_appender = tracing_appender::rolling::daily(&cfg.dir, &cfg.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    info!(dir = %cfg.dir.display(), "logging to stdout and rotating file");

    guard
}
