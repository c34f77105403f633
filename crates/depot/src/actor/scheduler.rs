use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
  db::MemoryStore,
  domain::config::SchedulerConfig,
  service::{lease::RefreshLeases, stats::RefreshStats},
};

/// Background task scheduler.
///
/// Handles:
/// - Reaping expired refresh leases
/// - Periodic store snapshots
pub struct Scheduler {
  leases: RefreshLeases,
  stats: Arc<RefreshStats>,
  snapshot: Option<(Arc<MemoryStore>, PathBuf)>,
  config: SchedulerConfig,
}

impl Scheduler {
  pub fn new(leases: RefreshLeases, stats: Arc<RefreshStats>, config: SchedulerConfig) -> Self {
    Self {
      leases,
      stats,
      snapshot: None,
      config,
    }
  }

  /// Also write the store to `path` on every snapshot tick.
  pub fn with_snapshots(mut self, store: Arc<MemoryStore>, path: PathBuf) -> Self {
    self.snapshot = Some((store, path));
    self
  }

  /// Run the scheduler until cancelled.
  pub async fn run(self, cancel: CancellationToken) {
    let mut sweep_timer = interval(Duration::from_secs(self.config.lease_sweep_interval_secs.max(1)));
    let mut snapshot_timer = interval(Duration::from_secs(self.config.snapshot_interval_secs.max(1)));

    // Skip the immediate ticks
    sweep_timer.tick().await;
    snapshot_timer.tick().await;

    info!("Scheduler started");

    loop {
      tokio::select! {
          biased;

          _ = cancel.cancelled() => {
              info!("Scheduler shutting down (cancelled)");
              break;
          }

          _ = sweep_timer.tick() => {
              self.reap_leases().await;
          }

          _ = snapshot_timer.tick() => {
              self.save_snapshot().await;
          }
      }
    }

    info!("Scheduler stopped");
  }

  async fn reap_leases(&self) {
    match self.leases.reap_expired().await {
      Ok(0) => debug!("No expired leases"),
      Ok(count) => {
        self.stats.record_reaped(count as u64);
        info!(count, "Reaped expired leases");
      }
      Err(e) => warn!(error = %e, "Lease sweep failed"),
    }
  }

  async fn save_snapshot(&self) {
    let Some((store, path)) = &self.snapshot else {
      return;
    };
    if let Err(e) = store.save(path).await {
      warn!(path = %path.display(), error = %e, "Failed to save store snapshot");
    }
  }
}
