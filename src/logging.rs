use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::project_dirs;

pub const LOG_ENV: &str = "BRANDSCAN_LOG";

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to a daily file in the data dir; the terminal belongs to the TUI.
/// Keep the guard alive until exit so buffered lines are flushed.
pub fn init_file() -> Result<WorkerGuard> {
  let dir = project_dirs().context("No home directory for log files")?.data_dir().join("logs");
  std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
  let appender = tracing_appender::rolling::daily(&dir, "brandscan.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);
  tracing_subscriber::fmt()
    .with_env_filter(env_filter())
    .with_writer(writer)
    .with_ansi(false)
    .try_init()
    .map_err(|e| anyhow::anyhow!(e))
    .context("Failed to install log subscriber")?;
  Ok(guard)
}

/// Log to stderr for headless commands, keeping stdout for output.
pub fn init_stderr() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter())
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init()
    .map_err(|e| anyhow::anyhow!(e))
    .context("Failed to install log subscriber")
}
