//! Collaborators shared by the refresh services.

use std::sync::Arc;

use super::stats::RefreshStats;
use crate::{
  actor::queue::RefreshQueue, artifact::HandlerRegistry, db::Store, domain::config::RefreshConfig,
  repository::ArtifactRepository,
};

#[derive(Clone)]
pub struct RefreshContext {
  pub store: Arc<dyn Store>,
  pub repository: Arc<dyn ArtifactRepository>,
  pub registry: Arc<HandlerRegistry>,
  pub queue: Arc<dyn RefreshQueue>,
  pub config: Arc<RefreshConfig>,
  pub stats: Arc<RefreshStats>,
}

impl RefreshContext {
  pub fn new(
    store: Arc<dyn Store>,
    repository: Arc<dyn ArtifactRepository>,
    registry: Arc<HandlerRegistry>,
    queue: Arc<dyn RefreshQueue>,
    config: RefreshConfig,
  ) -> Self {
    Self {
      store,
      repository,
      registry,
      queue,
      config: Arc::new(config),
      stats: Arc::new(RefreshStats::new()),
    }
  }
}
