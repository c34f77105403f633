//! Filesystem locations of persisted depot state.

use std::path::{Path, PathBuf};

/// Overrides every other data directory source when set.
pub const DATA_DIR_ENV: &str = "DEPOT_DATA_DIR";

const APP_DIR: &str = "depot";

/// Base data directory: `$DEPOT_DATA_DIR`, then `$XDG_DATA_HOME/depot`, then
/// the platform's local data dir.
pub fn default_data_dir() -> PathBuf {
  if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
    return PathBuf::from(dir);
  }

  std::env::var_os("XDG_DATA_HOME")
    .map(PathBuf::from)
    .or_else(dirs::data_local_dir)
    .unwrap_or_else(|| PathBuf::from("."))
    .join(APP_DIR)
}

pub fn store_snapshot_path(data_dir: &Path) -> PathBuf {
  data_dir.join("store.json")
}

/// Rolling log files of `depot serve`.
pub fn log_dir(data_dir: &Path) -> PathBuf {
  data_dir.join("logs")
}
