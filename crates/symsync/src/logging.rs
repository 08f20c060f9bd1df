//! Logging setup for processes driving symsync.
//!
//! Both initializers install a global subscriber and fail if one is already
//! set. `RUST_LOG` is honored unless `verbose` forces `debug`.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log file name prefix inside the logs directory.
pub const LOG_FILE: &str = "symsync.log";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize logging to stderr.
pub fn init_logging(verbose: bool) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter(verbose))
        .try_init()
}

/// Initialize logging to daily-rotated files in `symsync_dir/logs`.
///
/// Falls back to stderr if the logs directory cannot be created.
pub fn init_file_logging(symsync_dir: &Path, verbose: bool) -> Result<(), TryInitError> {
    let logs_dir = symsync_dir.join("logs");

    if let Err(e) = std::fs::create_dir_all(&logs_dir) {
        init_logging(verbose)?;
        tracing::warn!(
            "Failed to create logs directory {}: {}",
            logs_dir.display(),
            e
        );
        return Ok(());
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, LOG_FILE);

    // Dropping the guard would stop the background writer
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter(verbose))
        .try_init()?;

    let _ = FILE_GUARD.set(guard);
    Ok(())
}
