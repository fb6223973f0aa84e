//! Logging initialization and configuration.
//!
//! Logs go to a file, never to the console: stdout belongs to the tool output
//! the operator is watching. Each run writes its own timestamped file.
//!
//! # Configuration
//!
//! The log level can be controlled via the `RUST_LOG` environment variable:
//! - `RUST_LOG=debug` - Show debug and higher level logs
//! - `RUST_LOG=info` - Show info and higher level logs (default)
//! - `RUST_LOG=warn` - Show warnings and errors only
//! - `RUST_LOG=error` - Show errors only

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log directory: `logs/` next to the executable, or `./logs`.
pub fn default_log_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Log file path for a run started now, e.g.
/// `logs/forensic-console.2024-12-06-14-30-25.log`
fn log_file_path(log_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    log_dir.join(format!("forensic-console.{}.log", timestamp))
}

/// Initialize the logging system.
///
/// Returns the path of the log file, or `None` when logging could not be set
/// up. A failure here is reported on stderr and never stops the run.
pub fn init_logging(log_dir: Option<&Path>) -> Option<PathBuf> {
    let log_dir = log_dir.map(Path::to_path_buf).unwrap_or_else(default_log_dir);

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        return None;
    }

    let log_path = log_file_path(&log_dir);
    let log_file = match fs::File::create(&log_path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Warning: Failed to create log file: {}", e);
            return None;
        }
    };

    // Non-blocking writer so logging never stalls output streaming
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: Failed to install log subscriber: {}", e);
        return None;
    }

    // The guard flushes the writer on drop; keep it for the whole process
    std::mem::forget(guard);

    tracing::info!("Logging initialized - writing to {}", log_path.display());
    Some(log_path)
}
