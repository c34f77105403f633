//! Store contracts required by the refresh pipeline.
//!
//! The store is the only shared mutable resource. Each table gets its own
//! trait so collaborators can be read at a glance; [`Store`] bundles them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  artifact::ArtifactType,
  domain::{
    coordinate::{Coordinate, ProjectVersion},
    project::{ProjectRecord, ProjectVersionRecord},
  },
};

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
  #[error("Not found: {0}")]
  NotFound(String),
  #[error("Store unavailable: {0}")]
  Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Time-bounded mutual exclusion over one GAV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshLease {
  pub gav: ProjectVersion,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl RefreshLease {
  pub fn new(gav: ProjectVersion, now: DateTime<Utc>, ttl: Duration) -> Self {
    Self {
      gav,
      created_at: now,
      expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
  }

  /// A stale lease is treated as absent.
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now > self.expires_at
  }
}

/// Outcome of a conditional lease insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseAcquisition {
  Acquired(RefreshLease),
  /// A live lease held by someone else
  AlreadyLeased(RefreshLease),
}

impl LeaseAcquisition {
  pub fn is_acquired(&self) -> bool {
    matches!(self, Self::Acquired(_))
  }
}

/// Last processed checksum of an upstream artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactFileRecord {
  pub path: String,
  /// Hex SHA-256 of the file content
  pub checksum: String,
  pub updated_at: DateTime<Utc>,
}

/// One ingested artifact file of a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
  pub artifact_type: ArtifactType,
  pub path: String,
  pub checksum: String,
  pub size: u64,
}

#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
  async fn find_project(&self, coordinate: &Coordinate) -> Result<Option<ProjectRecord>>;

  async fn list_projects(&self) -> Result<Vec<ProjectRecord>>;

  /// Insert unless a record for the coordinate exists. Returns whichever
  /// record is stored afterwards, so concurrent creators agree on one winner.
  async fn insert_project_if_absent(&self, project: ProjectRecord) -> Result<ProjectRecord>;

  async fn save_project(&self, project: &ProjectRecord) -> Result<()>;

  /// Apply [`ProjectRecord::evaluate_and_update`] atomically. Returns the
  /// updated record if the latest release changed.
  async fn evaluate_latest_version(&self, coordinate: &Coordinate, candidate: &str) -> Result<Option<ProjectRecord>>;
}

#[async_trait::async_trait]
pub trait VersionStore: Send + Sync {
  async fn find_version(&self, gav: &ProjectVersion) -> Result<Option<ProjectVersionRecord>>;

  /// All stored versions of a project, evicted ones included.
  async fn find_versions(&self, coordinate: &Coordinate) -> Result<Vec<ProjectVersionRecord>>;

  /// Versions whose direct dependencies contain `gav`.
  async fn find_dependents(&self, gav: &ProjectVersion) -> Result<Vec<ProjectVersionRecord>>;

  async fn save_version(&self, record: &ProjectVersionRecord) -> Result<()>;
}

#[async_trait::async_trait]
pub trait LeaseStore: Send + Sync {
  /// Insert a lease if none exists or the existing one has expired.
  async fn try_acquire_lease(&self, gav: &ProjectVersion, now: DateTime<Utc>, ttl: Duration)
  -> Result<LeaseAcquisition>;

  /// Delete unconditionally. Idempotent.
  async fn release_lease(&self, gav: &ProjectVersion) -> Result<()>;

  async fn list_leases(&self) -> Result<Vec<RefreshLease>>;

  /// Delete only if expired at `now`. Returns true if something was deleted.
  async fn delete_lease_if_expired(&self, gav: &ProjectVersion, now: DateTime<Utc>) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait ArtifactFileStore: Send + Sync {
  async fn find_artifact_file(&self, path: &str) -> Result<Option<ArtifactFileRecord>>;

  async fn save_artifact_file(&self, record: &ArtifactFileRecord) -> Result<()>;

  /// Replace every entry of `artifact_type` for the version.
  async fn replace_artifact_entries(
    &self,
    gav: &ProjectVersion,
    artifact_type: &ArtifactType,
    entries: Vec<ArtifactEntry>,
  ) -> Result<()>;

  async fn find_artifact_entries(&self, gav: &ProjectVersion) -> Result<Vec<ArtifactEntry>>;
}

/// Every table the pipeline touches.
pub trait Store: ProjectStore + VersionStore + LeaseStore + ArtifactFileStore {}

impl<T> Store for T where T: ProjectStore + VersionStore + LeaseStore + ArtifactFileStore {}
