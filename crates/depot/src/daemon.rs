//! Depot runtime: wires the store, repository, handlers, queue and workers.
//!
//! # Architecture
//!
//! ```text
//! Depot
//!   ├── BulkRefresher ──push──┐
//!   ├── ChannelQueue  <───────┤
//!   ├── refresh workers ──> RefreshHandler ──fan-out push──┘
//!   └── Scheduler (lease reaping, store snapshots; serve mode only)
//! ```
//!
//! # Lifecycle
//!
//! 1. Load the store snapshot from the data directory
//! 2. Register one `RawFilesHandler` per configured artifact type
//! 3. Spawn the worker pool with a child `CancellationToken`
//! 4. Either drain the queue once (`run_until_idle`) or serve until ctrl-c
//! 5. Cancel workers, wait for them, and save the store snapshot

use std::{path::PathBuf, sync::Arc};

use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
  actor::{queue::ChannelQueue, scheduler::Scheduler, worker::spawn_workers},
  artifact::{HandlerRegistry, RawFilesHandler},
  db::{MemoryStore, Store, StoreError},
  dirs,
  domain::config::Config,
  repository::{ArtifactRepository, LocalRepository},
  service::{
    bulk::BulkRefresher,
    context::RefreshContext,
    refresh::RefreshHandler,
    stats::{RefreshStats, StatsSnapshot},
  },
};

#[derive(Debug, thiserror::Error)]
pub enum DepotError {
  #[error("No repository configured, set [repository].path")]
  MissingRepository,
  #[error("Repository root {0} does not exist")]
  RepositoryNotFound(PathBuf),
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// Runtime configuration: the loaded config plus resolved paths.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
  pub config: Config,
  pub data_dir: PathBuf,
  /// Where the store snapshot is read and written; `None` keeps the store
  /// purely in memory
  pub snapshot_path: Option<PathBuf>,
}

impl RuntimeConfig {
  pub fn new(config: Config) -> Self {
    let data_dir = config.data_dir();
    let snapshot_path = Some(dirs::store_snapshot_path(&data_dir));
    Self {
      config,
      data_dir,
      snapshot_path,
    }
  }

  pub fn in_memory(config: Config) -> Self {
    Self {
      data_dir: config.data_dir(),
      config,
      snapshot_path: None,
    }
  }
}

pub struct Depot {
  runtime_config: RuntimeConfig,
  store: Arc<MemoryStore>,
  queue: ChannelQueue,
  handler: Arc<RefreshHandler>,
  bulk: BulkRefresher,
  cancel: CancellationToken,
  workers: Vec<JoinHandle<()>>,
}

impl Depot {
  /// Open the configured repository and the persisted store, and start the
  /// worker pool.
  pub async fn open(runtime_config: RuntimeConfig) -> Result<Self, DepotError> {
    let root = runtime_config
      .config
      .repository
      .path
      .clone()
      .ok_or(DepotError::MissingRepository)?;
    if !tokio::fs::try_exists(&root).await? {
      return Err(DepotError::RepositoryNotFound(root));
    }

    let store = match &runtime_config.snapshot_path {
      Some(path) => MemoryStore::load(path).await?,
      None => MemoryStore::new(),
    };

    info!(repository = %root.display(), data_dir = %runtime_config.data_dir.display(), "Opening depot");
    Ok(Self::start(
      runtime_config,
      Arc::new(store),
      Arc::new(LocalRepository::new(root)),
      None,
    ))
  }

  /// Start with explicit collaborators. Without a registry, every configured
  /// artifact type gets a [`RawFilesHandler`].
  pub fn start(
    runtime_config: RuntimeConfig,
    store: Arc<MemoryStore>,
    repository: Arc<dyn ArtifactRepository>,
    registry: Option<HandlerRegistry>,
  ) -> Self {
    let config = &runtime_config.config;
    let dyn_store: Arc<dyn Store> = store.clone();

    let registry = registry.unwrap_or_else(|| {
      config
        .refresh
        .artifact_types
        .iter()
        .fold(HandlerRegistry::new(), |registry, artifact_type| {
          registry.with(Arc::new(RawFilesHandler::new(artifact_type.clone(), dyn_store.clone())))
        })
    });
    debug!(registry = ?registry, "Artifact handlers registered");

    let (queue, receiver) = ChannelQueue::new(config.queue.capacity);
    let ctx = RefreshContext::new(
      dyn_store,
      repository,
      Arc::new(registry),
      Arc::new(queue.clone()),
      config.refresh.clone(),
    );

    let handler = Arc::new(RefreshHandler::new(ctx.clone()));
    let bulk = BulkRefresher::new(ctx);
    let cancel = CancellationToken::new();
    let workers = spawn_workers(config.queue.workers, receiver, handler.clone(), &cancel.child_token());
    info!(workers = workers.len(), "Refresh workers started");

    Self {
      runtime_config,
      store,
      queue,
      handler,
      bulk,
      cancel,
      workers,
    }
  }

  pub fn bulk(&self) -> &BulkRefresher {
    &self.bulk
  }

  pub fn handler(&self) -> &RefreshHandler {
    &self.handler
  }

  pub fn store(&self) -> &Arc<MemoryStore> {
    &self.store
  }

  pub fn stats(&self) -> Arc<RefreshStats> {
    self.handler.context().stats.clone()
  }

  /// Wait until the queue, including every fan-out, has drained.
  pub async fn wait_idle(&self) {
    self.queue.wait_idle().await;
  }

  /// Drain the queue, stop the workers and persist the store.
  pub async fn run_until_idle(self) -> Result<StatsSnapshot, DepotError> {
    self.wait_idle().await;
    let stats = self.stats();
    self.shutdown().await?;
    Ok(stats.snapshot())
  }

  /// Run workers and the scheduler until ctrl-c.
  pub async fn serve(self) -> Result<StatsSnapshot, DepotError> {
    let config = &self.runtime_config.config;
    let mut scheduler = Scheduler::new(self.handler.leases().clone(), self.stats(), config.scheduler.clone());
    if let Some(path) = &self.runtime_config.snapshot_path {
      scheduler = scheduler.with_snapshots(self.store.clone(), path.clone());
    }
    let scheduler_task = tokio::spawn(scheduler.run(self.cancel.child_token()));

    info!("Depot serving, press ctrl-c to stop");
    tokio::select! {
        _ = signal::ctrl_c() => info!("Received ctrl-c, shutting down"),
        _ = self.cancel.cancelled() => info!("Shutdown requested"),
    }

    self.cancel.cancel();
    if let Err(e) = scheduler_task.await {
      warn!(error = %e, "Scheduler task failed");
    }

    let stats = self.stats();
    self.shutdown().await?;
    Ok(stats.snapshot())
  }

  /// Token that stops a serving depot when cancelled.
  pub fn cancellation_token(&self) -> CancellationToken {
    self.cancel.clone()
  }

  async fn shutdown(self) -> Result<(), DepotError> {
    self.cancel.cancel();
    for worker in self.workers {
      if let Err(e) = worker.await {
        warn!(error = %e, "Refresh worker failed");
      }
    }

    if let Some(path) = &self.runtime_config.snapshot_path {
      self.store.save(path).await?;
      info!(path = %path.display(), "Store snapshot saved");
    }
    Ok(())
  }
}
