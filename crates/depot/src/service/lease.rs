//! Refresh leases over the store's lease table.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, instrument, warn};

use crate::{
  db::{LeaseAcquisition, LeaseStore, Store, StoreError},
  domain::coordinate::ProjectVersion,
};

#[derive(Clone)]
pub struct RefreshLeases {
  store: Arc<dyn Store>,
  ttl: Duration,
}

impl RefreshLeases {
  pub fn new(store: Arc<dyn Store>, ttl_secs: u64) -> Self {
    Self {
      store,
      ttl: i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX),
    }
  }

  pub async fn acquire(&self, gav: &ProjectVersion) -> Result<LeaseAcquisition, StoreError> {
    self.store.try_acquire_lease(gav, Utc::now(), self.ttl).await
  }

  pub async fn release(&self, gav: &ProjectVersion) -> Result<(), StoreError> {
    self.store.release_lease(gav).await
  }

  /// Delete every lease that has expired. Live leases are never touched, so
  /// this can run alongside acquire and release.
  #[instrument(level = "debug", skip(self))]
  pub async fn reap_expired(&self) -> Result<usize, StoreError> {
    let now = Utc::now();
    let mut reaped = 0;

    for lease in self.store.list_leases().await? {
      if !lease.is_expired(now) {
        continue;
      }
      match self.store.delete_lease_if_expired(&lease.gav, now).await {
        Ok(true) => {
          debug!(gav = %lease.gav, expired_at = %lease.expires_at, "Reaped expired lease");
          reaped += 1;
        }
        Ok(false) => {}
        Err(e) => warn!(gav = %lease.gav, error = %e, "Failed to reap lease"),
      }
    }

    Ok(reaped)
  }
}
