mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{
  ArtifactEntry, ArtifactFileRecord, ArtifactFileStore, LeaseAcquisition, LeaseStore, ProjectStore, RefreshLease,
  Store, StoreError, VersionStore,
};
