//! `depot serve`

use anyhow::{Context, Result};
use depot::Depot;
use tracing::info;

use super::Settings;

pub async fn cmd_serve(settings: Settings) -> Result<()> {
  let depot = Depot::open(settings.runtime()).await.context("Failed to open depot")?;

  let stats = depot.serve().await.context("Depot stopped with an error")?;
  info!(
    processed = stats.processed,
    failed = stats.failed,
    skipped = stats.skipped,
    leases_reaped = stats.leases_reaped,
    "Depot stopped"
  );
  Ok(())
}
