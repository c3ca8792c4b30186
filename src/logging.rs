//! Logging setup.
//!
//! The terminal is owned by the UI, so log output goes to a daily-rolling
//! file. `RUST_LOG` takes precedence over the configured level. Keep the
//! returned guard alive for the program's duration so buffered lines flush.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::Result;

pub const LOG_FILE_PREFIX: &str = "lms.log";

/// Flushes buffered log lines when dropped.
pub struct LogGuard(#[allow(dead_code)] WorkerGuard);

/// Initialize file logging under `directory` with `level` as the default filter.
pub fn init(directory: &Path, level: &str) -> Result<LogGuard> {
    std::fs::create_dir_all(directory)?;

    let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let env_filter = match std::env::var("RUST_LOG") {
        Ok(val) => EnvFilter::new(val),
        Err(_) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    // A subscriber may already be installed (e.g. in tests); keep that one.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init();

    Ok(LogGuard(guard))
}
