mod actor;
mod daemon;
mod db;

pub mod artifact;
pub mod dirs;
pub mod repository;
pub mod service;

mod domain;
pub use actor::queue::{ChannelQueue, QueueError, RefreshQueue};
pub use daemon::{Depot, DepotError, RuntimeConfig};
pub use db::{
  ArtifactEntry, ArtifactFileRecord, ArtifactFileStore, LeaseAcquisition, LeaseStore, MemoryStore, ProjectStore,
  RefreshLease, Store, StoreError, VersionStore,
};
pub use domain::{config, coordinate, notification, project, response, version};
