//! In-process store backed by `DashMap` tables.
//!
//! Every operation is atomic per key. Lease acquisition and project creation
//! go through the entry API so the check and the write happen under the same
//! shard lock.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::store::{
  ArtifactEntry, ArtifactFileRecord, ArtifactFileStore, LeaseAcquisition, LeaseStore, ProjectStore, RefreshLease,
  Result, StoreError, VersionStore,
};
use crate::{
  artifact::ArtifactType,
  domain::{
    coordinate::{Coordinate, ProjectVersion},
    project::{ProjectRecord, ProjectVersionRecord},
  },
};

#[derive(Debug, Default)]
pub struct MemoryStore {
  projects: DashMap<Coordinate, ProjectRecord>,
  versions: DashMap<ProjectVersion, ProjectVersionRecord>,
  leases: DashMap<ProjectVersion, RefreshLease>,
  artifact_files: DashMap<String, ArtifactFileRecord>,
  artifact_entries: DashMap<ProjectVersion, Vec<ArtifactEntry>>,
}

/// On-disk form of the store. Leases are advisory and never persisted.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreSnapshot {
  projects: Vec<ProjectRecord>,
  versions: Vec<ProjectVersionRecord>,
  artifact_files: Vec<ArtifactFileRecord>,
  #[serde(default)]
  artifact_entries: Vec<(ProjectVersion, Vec<ArtifactEntry>)>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Load a snapshot written by [`MemoryStore::save`]. A missing file yields
  /// an empty store.
  pub async fn load(path: &Path) -> Result<Self> {
    let store = Self::new();

    if !tokio::fs::try_exists(path).await? {
      debug!(path = %path.display(), "No store snapshot, starting empty");
      return Ok(store);
    }

    let content = tokio::fs::read(path).await?;
    let snapshot: StoreSnapshot = serde_json::from_slice(&content)?;

    for project in snapshot.projects {
      store.projects.insert(project.coordinate(), project);
    }
    for version in snapshot.versions {
      store.versions.insert(version.gav(), version);
    }
    for file in snapshot.artifact_files {
      store.artifact_files.insert(file.path.clone(), file);
    }
    for (gav, entries) in snapshot.artifact_entries {
      store.artifact_entries.insert(gav, entries);
    }

    info!(
      path = %path.display(),
      projects = store.projects.len(),
      versions = store.versions.len(),
      "Loaded store snapshot"
    );
    Ok(store)
  }

  /// Write a snapshot atomically (temp file + rename).
  pub async fn save(&self, path: &Path) -> Result<()> {
    let snapshot = StoreSnapshot {
      projects: self.projects.iter().map(|e| e.value().clone()).collect(),
      versions: self.versions.iter().map(|e| e.value().clone()).collect(),
      artifact_files: self.artifact_files.iter().map(|e| e.value().clone()).collect(),
      artifact_entries: self
        .artifact_entries
        .iter()
        .map(|e| (e.key().clone(), e.value().clone()))
        .collect(),
    };

    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!(path = %path.display(), versions = snapshot.versions.len(), "Saved store snapshot");
    Ok(())
  }
}

#[async_trait::async_trait]
impl ProjectStore for MemoryStore {
  async fn find_project(&self, coordinate: &Coordinate) -> Result<Option<ProjectRecord>> {
    Ok(self.projects.get(coordinate).map(|p| p.value().clone()))
  }

  async fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
    let mut projects: Vec<ProjectRecord> = self.projects.iter().map(|p| p.value().clone()).collect();
    projects.sort_by(|a, b| a.coordinate().cmp(&b.coordinate()));
    Ok(projects)
  }

  #[tracing::instrument(level = "trace", skip(self, project), fields(coordinate = %project.coordinate()))]
  async fn insert_project_if_absent(&self, project: ProjectRecord) -> Result<ProjectRecord> {
    match self.projects.entry(project.coordinate()) {
      Entry::Occupied(existing) => Ok(existing.get().clone()),
      Entry::Vacant(vacant) => Ok(vacant.insert(project).value().clone()),
    }
  }

  async fn save_project(&self, project: &ProjectRecord) -> Result<()> {
    self.projects.insert(project.coordinate(), project.clone());
    Ok(())
  }

  async fn evaluate_latest_version(&self, coordinate: &Coordinate, candidate: &str) -> Result<Option<ProjectRecord>> {
    let mut project = self
      .projects
      .get_mut(coordinate)
      .ok_or_else(|| StoreError::NotFound(format!("project {coordinate}")))?;
    Ok(project.evaluate_and_update(candidate).then(|| project.clone()))
  }
}

#[async_trait::async_trait]
impl VersionStore for MemoryStore {
  async fn find_version(&self, gav: &ProjectVersion) -> Result<Option<ProjectVersionRecord>> {
    Ok(self.versions.get(gav).map(|v| v.value().clone()))
  }

  async fn find_versions(&self, coordinate: &Coordinate) -> Result<Vec<ProjectVersionRecord>> {
    Ok(
      self
        .versions
        .iter()
        .filter(|v| v.group_id == coordinate.group_id && v.artifact_id == coordinate.artifact_id)
        .map(|v| v.value().clone())
        .collect(),
    )
  }

  async fn find_dependents(&self, gav: &ProjectVersion) -> Result<Vec<ProjectVersionRecord>> {
    Ok(
      self
        .versions
        .iter()
        .filter(|v| v.depends_on(gav))
        .map(|v| v.value().clone())
        .collect(),
    )
  }

  #[tracing::instrument(level = "trace", skip(self, record), fields(gav = %record.gav()))]
  async fn save_version(&self, record: &ProjectVersionRecord) -> Result<()> {
    self.versions.insert(record.gav(), record.clone());
    Ok(())
  }
}

#[async_trait::async_trait]
impl LeaseStore for MemoryStore {
  #[tracing::instrument(level = "trace", skip(self))]
  async fn try_acquire_lease(
    &self,
    gav: &ProjectVersion,
    now: DateTime<Utc>,
    ttl: Duration,
  ) -> Result<LeaseAcquisition> {
    let lease = RefreshLease::new(gav.clone(), now, ttl);

    let outcome = match self.leases.entry(gav.clone()) {
      Entry::Occupied(mut existing) => {
        if existing.get().is_expired(now) {
          existing.insert(lease.clone());
          LeaseAcquisition::Acquired(lease)
        } else {
          LeaseAcquisition::AlreadyLeased(existing.get().clone())
        }
      }
      Entry::Vacant(vacant) => {
        vacant.insert(lease.clone());
        LeaseAcquisition::Acquired(lease)
      }
    };

    Ok(outcome)
  }

  async fn release_lease(&self, gav: &ProjectVersion) -> Result<()> {
    self.leases.remove(gav);
    Ok(())
  }

  async fn list_leases(&self) -> Result<Vec<RefreshLease>> {
    Ok(self.leases.iter().map(|l| l.value().clone()).collect())
  }

  async fn delete_lease_if_expired(&self, gav: &ProjectVersion, now: DateTime<Utc>) -> Result<bool> {
    Ok(self.leases.remove_if(gav, |_, lease| lease.is_expired(now)).is_some())
  }
}

#[async_trait::async_trait]
impl ArtifactFileStore for MemoryStore {
  async fn find_artifact_file(&self, path: &str) -> Result<Option<ArtifactFileRecord>> {
    Ok(self.artifact_files.get(path).map(|f| f.value().clone()))
  }

  async fn save_artifact_file(&self, record: &ArtifactFileRecord) -> Result<()> {
    self.artifact_files.insert(record.path.clone(), record.clone());
    Ok(())
  }

  async fn replace_artifact_entries(
    &self,
    gav: &ProjectVersion,
    artifact_type: &ArtifactType,
    entries: Vec<ArtifactEntry>,
  ) -> Result<()> {
    let mut slot = self.artifact_entries.entry(gav.clone()).or_default();
    slot.retain(|e| &e.artifact_type != artifact_type);
    slot.extend(entries);
    Ok(())
  }

  async fn find_artifact_entries(&self, gav: &ProjectVersion) -> Result<Vec<ArtifactEntry>> {
    Ok(self.artifact_entries.get(gav).map(|e| e.value().clone()).unwrap_or_default())
  }
}
