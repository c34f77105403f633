//! Logging setup for one-shot commands and `serve`

use std::path::Path;

use depot::config::DaemonConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Parse log level from config string
fn parse_log_level(level: &str) -> tracing::Level {
  match level.to_lowercase().as_str() {
    "off" | "error" => tracing::Level::ERROR,
    "warn" => tracing::Level::WARN,
    "info" => tracing::Level::INFO,
    "debug" => tracing::Level::DEBUG,
    "trace" => tracing::Level::TRACE,
    _ => tracing::Level::INFO,
  }
}

fn env_filter(level: &str) -> EnvFilter {
  // RUST_LOG overrides the configured level
  EnvFilter::builder()
    .with_default_directive(parse_log_level(level).into())
    .from_env_lossy()
}

/// Console logging for one-shot commands
pub fn init_cli_logging(level: &str) {
  tracing_subscriber::fmt()
    .with_env_filter(env_filter(level))
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

/// Rolling file logging for `serve`.
///
/// Returns the guard that must be kept alive for the duration of the program.
/// Falls back to console logging if the log directory cannot be created.
pub fn init_serve_logging(config: &DaemonConfig, data_dir: &Path) -> Option<WorkerGuard> {
  let log_dir = depot::dirs::log_dir(data_dir);
  if std::fs::create_dir_all(&log_dir).is_err() {
    init_cli_logging(&config.log_level);
    return None;
  }

  let file_appender = match config.log_rotation.as_str() {
    "hourly" => tracing_appender::rolling::hourly(&log_dir, "depot.log"),
    "never" => tracing_appender::rolling::never(&log_dir, "depot.log"),
    _ => tracing_appender::rolling::daily(&log_dir, "depot.log"),
  };
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::fmt()
    .with_env_filter(env_filter(&config.log_level))
    .with_target(true)
    .with_ansi(false)
    .with_writer(file_writer)
    .init();

  Some(guard)
}
