//! Direct and transitive dependency resolution.
//!
//! The closure is computed with an explicit frontier and visited set. Stored
//! versions contribute their persisted reports without being walked again;
//! versions unknown to the store are expanded from the repository.

use std::{
  collections::{BTreeSet, HashSet, VecDeque},
  sync::Arc,
};

use chrono::Utc;
use tracing::{debug, instrument, trace};

use crate::{
  db::{Store, StoreError, VersionStore},
  domain::{
    coordinate::ProjectVersion,
    project::TransitiveDependencyReport,
    version,
  },
  repository::{ArtifactRepository, RepositoryError},
};

#[derive(Debug, thiserror::Error)]
pub enum DependencyError {
  #[error("Version {0} is not stored")]
  NotStored(ProjectVersion),
  #[error("Version {0} is excluded")]
  Excluded(ProjectVersion),
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Repository(#[from] RepositoryError),
}

pub struct DependencyManager {
  store: Arc<dyn Store>,
  repository: Arc<dyn ArtifactRepository>,
  max_depth: usize,
}

impl DependencyManager {
  pub fn new(store: Arc<dyn Store>, repository: Arc<dyn ArtifactRepository>, max_depth: usize) -> Self {
    Self {
      store,
      repository,
      max_depth,
    }
  }

  /// Declared dependencies of a version, verbatim from the repository.
  pub async fn direct_dependencies(&self, gav: &ProjectVersion) -> Result<Vec<ProjectVersion>, DependencyError> {
    Ok(self.repository.find_dependencies(gav).await?)
  }

  /// Everything reachable from `direct`.
  ///
  /// The first excluded, invalid, missing or too-deep branch makes the whole
  /// report invalid. Repository and store failures are returned as errors.
  #[instrument(level = "trace", skip_all, fields(direct = direct.len()))]
  pub async fn transitive_closure(
    &self,
    direct: &[ProjectVersion],
  ) -> Result<TransitiveDependencyReport, DependencyError> {
    let mut closure = BTreeSet::new();
    // Nodes already checked. Separate from `closure`, which also holds
    // members of stored reports that still need their own check when reached.
    let mut visited = HashSet::new();
    let mut frontier: VecDeque<(ProjectVersion, usize)> = direct.iter().cloned().map(|d| (d, 1)).collect();

    while let Some((dependency, depth)) = frontier.pop_front() {
      if !visited.insert(dependency.clone()) {
        continue;
      }
      closure.insert(dependency.clone());

      if depth > self.max_depth {
        return Ok(TransitiveDependencyReport::invalid(format!(
          "Dependency graph deeper than {} at {dependency}",
          self.max_depth
        )));
      }

      if let Some(record) = self.store.find_version(&dependency).await? {
        if record.excluded {
          let reason = record.exclusion_reason.as_deref().unwrap_or("no reason given");
          return Ok(TransitiveDependencyReport::invalid(format!(
            "Dependency {dependency} is excluded: {reason}"
          )));
        }
        if !record.transitive_dependencies_report.valid {
          return Ok(TransitiveDependencyReport::invalid(format!(
            "Dependency {dependency} has unresolvable dependencies"
          )));
        }
        closure.extend(record.version_data.dependencies);
        closure.extend(record.transitive_dependencies_report.dependencies);
        continue;
      }

      match self.repository.find_dependencies(&dependency).await {
        Ok(children) => {
          trace!(gav = %dependency, children = children.len(), "Expanded dependency from repository");
          frontier.extend(children.into_iter().map(|c| (c, depth + 1)));
        }
        Err(RepositoryError::MissingVersion(_)) => {
          return Ok(TransitiveDependencyReport::invalid(format!(
            "Dependency {dependency} does not exist upstream"
          )));
        }
        Err(e) => return Err(e.into()),
      }
    }

    Ok(TransitiveDependencyReport::valid(closure))
  }

  /// Recompute and persist the closure of a stored version. For a snapshot,
  /// dependents are recomputed as well, recursively through snapshot
  /// dependents. Returns every version that was rewritten.
  #[instrument(level = "debug", skip(self), fields(gav = %gav))]
  pub async fn update_transitive_dependencies(
    &self,
    gav: &ProjectVersion,
  ) -> Result<Vec<ProjectVersion>, DependencyError> {
    let record = self
      .store
      .find_version(gav)
      .await?
      .ok_or_else(|| DependencyError::NotStored(gav.clone()))?;
    if record.excluded {
      return Err(DependencyError::Excluded(gav.clone()));
    }
    self.cascade(vec![gav.clone()]).await
  }

  /// Recompute the closures of versions depending on `gav`, which was just
  /// persisted with a fresh report.
  pub async fn update_dependents(&self, gav: &ProjectVersion) -> Result<Vec<ProjectVersion>, DependencyError> {
    let mut visited = HashSet::from([gav.clone()]);
    let start = self.unvisited_dependents(gav, &mut visited).await?;
    self.cascade_from(start, visited).await
  }

  async fn cascade(&self, start: Vec<ProjectVersion>) -> Result<Vec<ProjectVersion>, DependencyError> {
    let visited = start.iter().cloned().collect();
    self.cascade_from(start, visited).await
  }

  async fn cascade_from(
    &self,
    start: Vec<ProjectVersion>,
    mut visited: HashSet<ProjectVersion>,
  ) -> Result<Vec<ProjectVersion>, DependencyError> {
    let mut updated = Vec::new();
    let mut frontier = VecDeque::from(start);

    while let Some(gav) = frontier.pop_front() {
      let Some(mut record) = self.store.find_version(&gav).await? else {
        continue;
      };
      if record.excluded {
        debug!(gav = %gav, "Skipping excluded version");
        continue;
      }

      record.transitive_dependencies_report = self.transitive_closure(&record.version_data.dependencies).await?;
      record.updated_at = Utc::now();
      self.store.save_version(&record).await?;
      updated.push(gav.clone());

      // Released dependents are immutable and are not walked.
      if record.is_snapshot() {
        frontier.extend(self.unvisited_dependents(&gav, &mut visited).await?);
      }
    }

    Ok(updated)
  }

  async fn unvisited_dependents(
    &self,
    gav: &ProjectVersion,
    visited: &mut HashSet<ProjectVersion>,
  ) -> Result<Vec<ProjectVersion>, DependencyError> {
    Ok(
      self
        .store
        .find_dependents(gav)
        .await?
        .into_iter()
        .map(|r| r.gav())
        .filter(|d| visited.insert(d.clone()))
        .collect(),
    )
  }
}

/// One error per snapshot dependency of a release version.
pub fn validate_dependencies(dependencies: &[ProjectVersion], own_version_id: &str) -> Vec<String> {
  if !version::is_valid_release_version(own_version_id) {
    return Vec::new();
  }

  dependencies
    .iter()
    .filter(|d| d.is_snapshot())
    .map(|d| format!("Snapshot dependency {} not allowed in versions", d.key()))
    .collect()
}
