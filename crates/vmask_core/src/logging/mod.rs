//! Logging infrastructure.
//!
//! This module provides:
//! - A per-run logger with file + callback dual output
//! - Compact mode with progress filtering
//! - Tail buffer for tool failure diagnosis
//! - Global `tracing` subscriber setup (stderr, optionally a rolling file)
//!
//! # Example
//!
//! ```no_run
//! use vmask_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("clip", ".logs", LogConfig::default(), None).unwrap();
//! logger.phase("Split");
//! logger.command("ffmpeg -i clip.webm input_frames/frame_%04d.png");
//! logger.progress(50);
//! logger.success("Run completed");
//! ```

mod run_logger;
mod types;

use std::path::Path;

pub use run_logger::RunLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name prefix of the daily application log.
const APP_LOG_PREFIX: &str = "video-mask.log";

fn env_filter(default_level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()))
}

/// Initialize the global tracing subscriber (stderr only).
///
/// Respects `RUST_LOG`, falling back to `default_level`. Call once.
pub fn init_tracing(default_level: LogLevel) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(env_filter(default_level))
        .try_init();
}

/// Initialize tracing to stderr plus a daily-rolling file in `log_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive for
/// the lifetime of the program.
pub fn init_tracing_with_file(default_level: LogLevel, log_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir, APP_LOG_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .with(env_filter(default_level))
        .try_init();

    guard
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
