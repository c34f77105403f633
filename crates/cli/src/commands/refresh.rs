//! `depot refresh ...`

use anyhow::{Context, Result};
use depot::{
  Depot,
  coordinate::Coordinate,
  service::{admin, bulk::RefreshOptions},
};
use tracing::info;

use super::{Settings, report};

pub enum RefreshTarget {
  All,
  Snapshots,
  Project {
    group: String,
    artifact: String,
  },
  Version {
    group: String,
    artifact: String,
    version: String,
  },
}

/// Queue the target, run workers until every request (and its fan-out) is
/// handled, then persist the store.
pub async fn cmd_refresh(settings: Settings, target: RefreshTarget, options: RefreshOptions, json_output: bool) -> Result<()> {
  let depot = Depot::open(settings.runtime()).await.context("Failed to open depot")?;

  let queued = match target {
    RefreshTarget::All => depot.bulk().refresh_all(options).await,
    RefreshTarget::Snapshots => depot.bulk().refresh_default_snapshots_all(options).await,
    RefreshTarget::Project { group, artifact } => {
      depot
        .bulk()
        .refresh_project(&Coordinate::new(group, artifact), options)
        .await
    }
    RefreshTarget::Version {
      group,
      artifact,
      version,
    } => {
      let coordinate = Coordinate::new(group, artifact);
      let gav = admin::resolve_version(depot.store().as_ref(), &coordinate, &version).await?;
      depot.bulk().refresh_version(&gav, options).await
    }
  };

  let stats = depot.run_until_idle().await.context("Failed to finish refresh")?;
  info!(
    processed = stats.processed,
    failed = stats.failed,
    skipped = stats.skipped,
    queued = stats.queued,
    "Refresh complete"
  );

  if !json_output {
    println!(
      "Processed {} version(s): {} failed, {} skipped",
      stats.processed + stats.failed,
      stats.failed,
      stats.skipped
    );
  }
  report(&queued, json_output)?;

  if stats.failed > 0 {
    anyhow::bail!("{} version(s) failed to refresh, see log for details", stats.failed);
  }
  Ok(())
}
