//! Configuration system for the depot.
//!
//! Config priority: explicit path > `$CONFIG_DIR/config.toml` >
//! `$XDG_CONFIG_HOME/depot/config.toml` > platform config dir > defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::artifact::ArtifactType;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Failed to parse config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },
}

// ============================================================================
// Refresh Configuration
// ============================================================================

/// Per-version refresh behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
  /// Seconds before a refresh lease is considered abandoned (default: 600)
  pub lease_ttl_secs: u64,

  /// Maximum depth walked when computing a transitive closure (default: 64)
  /// Deeper graphs produce an invalid report instead of unbounded work.
  pub max_dependency_depth: usize,

  /// Artifact types processed for every version, in this order
  pub artifact_types: Vec<ArtifactType>,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self {
      lease_ttl_secs: 600,
      max_dependency_depth: 64,
      artifact_types: ArtifactType::defaults(),
    }
  }
}

// ============================================================================
// Queue Configuration
// ============================================================================

/// Work queue and worker pool sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
  /// Number of concurrent refresh workers (default: 4)
  pub workers: usize,

  /// Pending requests above which the queue logs a warning (default: 1024)
  pub capacity: usize,
}

impl Default for QueueConfig {
  fn default() -> Self {
    Self {
      workers: 4,
      capacity: 1024,
    }
  }
}

// ============================================================================
// Scheduler Configuration
// ============================================================================

/// Background task intervals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
  /// How often expired leases are reaped (default: 60)
  pub lease_sweep_interval_secs: u64,

  /// How often the store snapshot is written to disk (default: 300)
  pub snapshot_interval_secs: u64,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      lease_sweep_interval_secs: 60,
      snapshot_interval_secs: 300,
    }
  }
}

// ============================================================================
// Repository Configuration
// ============================================================================

/// Upstream artifact repository
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
  /// Root of the local repository layout
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,
}

// ============================================================================
// Daemon Configuration
// ============================================================================

/// Process-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
  /// Log level: "off", "error", "warn", "info", "debug", "trace"
  /// Default: "info"
  pub log_level: String,

  /// Log file rotation: "daily", "hourly", "never"
  /// Default: "daily"
  pub log_rotation: String,

  /// Data directory override (store snapshot, logs)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_dir: Option<PathBuf>,
}

impl Default for DaemonConfig {
  fn default() -> Self {
    Self {
      log_level: "info".to_string(),
      log_rotation: "daily".to_string(),
      data_dir: None,
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub refresh: RefreshConfig,
  pub queue: QueueConfig,
  pub scheduler: SchedulerConfig,
  pub repository: RepositoryConfig,
  pub daemon: DaemonConfig,
}

impl Config {
  /// Load from an explicit file. Missing keys take their defaults.
  pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(content)
  }

  /// Load the user config, falling back to defaults when absent or unreadable.
  pub fn load_global() -> Self {
    let Some(path) = Self::user_config_path() else {
      return Self::default();
    };

    if !path.exists() {
      return Self::default();
    }

    match Self::load_from(&path) {
      Ok(config) => config,
      Err(e) => {
        warn!(error = %e, "Ignoring unreadable config, using defaults");
        Self::default()
      }
    }
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("depot").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("depot").join("config.toml"))
  }

  /// Data directory, honoring the config override before the environment.
  pub fn data_dir(&self) -> PathBuf {
    self.daemon.data_dir.clone().unwrap_or_else(crate::dirs::default_data_dir)
  }
}
