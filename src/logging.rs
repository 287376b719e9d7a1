//! Tracing subscriber setup

use std::fs;
use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Build the filter: RUST_LOG wins over the configured level
pub fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber
///
/// Logs go to stderr unless `config.file` is set. The returned guard flushes
/// the file writer on drop and must be held for the life of the program.
pub fn init(config: &LogConfig) -> io::Result<WorkerGuard> {
    let (writer, guard) = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(io::stderr()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(writer)
        .with_ansi(config.file.is_none());

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(guard)
}
