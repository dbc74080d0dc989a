use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::SchedulerConfig;

const LOG_FILE_PREFIX: &str = "scheduler.log";

/// Holds the background file writer; dropping it flushes buffered lines
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Installs the global subscriber: stdout always, a daily file when
/// `config.log_dir` is set and can be created.
pub fn init_tracing(config: &SchedulerConfig) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let file = config.log_dir.as_deref().and_then(|dir| match open_log_dir(dir) {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(err) => {
            eprintln!("file logging disabled, cannot use {dir}: {err}");
            None
        }
    });
    let (file_layer, guard) = match file {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true)),
            Some(FileLogGuard { _guard: guard }),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    guard
}

fn open_log_dir(dir: &str) -> std::io::Result<RollingFileAppender> {
    std::fs::create_dir_all(Path::new(dir))?;
    Ok(RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX))
}
