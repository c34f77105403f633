//! In-process refresh counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct RefreshStats {
  processed: AtomicU64,
  skipped: AtomicU64,
  failed: AtomicU64,
  queued: AtomicU64,
  leases_reaped: AtomicU64,
}

/// Point-in-time copy of [`RefreshStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
  pub processed: u64,
  pub skipped: u64,
  pub failed: u64,
  pub queued: u64,
  pub leases_reaped: u64,
}

impl RefreshStats {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record_processed(&self) {
    self.processed.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_skipped(&self) {
    self.skipped.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_failed(&self) {
    self.failed.fetch_add(1, Ordering::Relaxed);
  }

  pub fn record_queued(&self, count: u64) {
    self.queued.fetch_add(count, Ordering::Relaxed);
  }

  pub fn record_reaped(&self, count: u64) {
    self.leases_reaped.fetch_add(count, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> StatsSnapshot {
    StatsSnapshot {
      processed: self.processed.load(Ordering::Relaxed),
      skipped: self.skipped.load(Ordering::Relaxed),
      failed: self.failed.load(Ordering::Relaxed),
      queued: self.queued.load(Ordering::Relaxed),
      leases_reaped: self.leases_reaped.load(Ordering::Relaxed),
    }
  }
}
