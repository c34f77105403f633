//! CLI command implementations

mod refresh;
mod serve;
mod versions;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use depot::{MemoryStore, RuntimeConfig, config::Config, dirs, response::RefreshResponse};

pub use refresh::{RefreshTarget, cmd_refresh};
pub use serve::cmd_serve;
pub use versions::{cmd_evict, cmd_exclude, cmd_show};

/// Loaded configuration with command-line overrides applied
pub struct Settings {
  pub config: Config,
}

impl Settings {
  pub fn load(config_path: Option<&Path>, repository: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
    let mut config = match config_path {
      Some(path) => Config::load_from(path).with_context(|| format!("Failed to load config {}", path.display()))?,
      None => Config::load_global(),
    };

    if repository.is_some() {
      config.repository.path = repository;
    }
    if data_dir.is_some() {
      config.daemon.data_dir = data_dir;
    }

    Ok(Self { config })
  }

  pub fn data_dir(&self) -> PathBuf {
    self.config.data_dir()
  }

  pub fn runtime(&self) -> RuntimeConfig {
    RuntimeConfig::new(self.config.clone())
  }

  fn snapshot_path(&self) -> PathBuf {
    dirs::store_snapshot_path(&self.data_dir())
  }

  /// Load the persisted store without starting workers
  pub async fn open_store(&self) -> Result<MemoryStore> {
    let path = self.snapshot_path();
    MemoryStore::load(&path)
      .await
      .with_context(|| format!("Failed to load store {}", path.display()))
  }

  pub async fn save_store(&self, store: &MemoryStore) -> Result<()> {
    let path = self.snapshot_path();
    store
      .save(&path)
      .await
      .with_context(|| format!("Failed to save store {}", path.display()))
  }
}

/// Print a response and turn its errors into a failing exit
pub fn report(response: &RefreshResponse, json_output: bool) -> Result<()> {
  if json_output {
    println!("{}", serde_json::to_string_pretty(response)?);
  } else {
    for message in &response.messages {
      println!("{message}");
    }
    for error in &response.errors {
      eprintln!("error: {error}");
    }
  }

  if response.has_errors() {
    anyhow::bail!("{} error(s)", response.errors.len());
  }
  Ok(())
}
