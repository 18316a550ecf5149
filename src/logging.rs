//! Logging setup: daily log file, plus stdout for non-interactive runs.

use std::path::Path;

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "NEWSDESK_LOG";

const LOG_FILE_PREFIX: &str = "newsdesk.log";

/// Filter from `NEWSDESK_LOG`, then `RUST_LOG`, defaulting to "info".
pub fn env_filter() -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV)
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging into `log_dir`.
///
/// The terminal belongs to the UI, so stdout output is only added for
/// non-interactive runs. Keep the returned guard alive until exit or buffered
/// lines are lost.
pub fn init(log_dir: &Path, to_stdout: bool) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
  let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(non_blocking)
    .with_ansi(false)
    .with_filter(env_filter());

  let stdout_layer = to_stdout.then(|| {
    tracing_subscriber::fmt::layer()
      .with_writer(std::io::stdout)
      .with_target(false)
      .compact()
      .with_filter(env_filter())
  });

  tracing_subscriber::registry()
    .with(file_layer)
    .with(stdout_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
