//! Project and project-version records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
  coordinate::{Coordinate, ProjectVersion},
  version::{self, VersionAlias},
};

/// One record per coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
  pub project_id: String,
  pub group_id: String,
  pub artifact_id: String,
  pub default_branch: String,
  /// Last known latest release
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latest_version: Option<String>,
}

impl ProjectRecord {
  pub fn new(project_id: impl Into<String>, coordinate: &Coordinate) -> Self {
    Self {
      project_id: project_id.into(),
      group_id: coordinate.group_id.clone(),
      artifact_id: coordinate.artifact_id.clone(),
      default_branch: version::DEFAULT_BRANCH.to_string(),
      latest_version: None,
    }
  }

  pub fn coordinate(&self) -> Coordinate {
    Coordinate::new(&self.group_id, &self.artifact_id)
  }

  /// The snapshot version tracking the default branch.
  pub fn default_snapshot(&self) -> ProjectVersion {
    self.coordinate().version(version::branch_snapshot(&self.default_branch))
  }

  /// Replace the latest release if `candidate` is a release that compares
  /// greater. Snapshots never update it. Returns true if the record changed.
  pub fn evaluate_and_update(&mut self, candidate: &str) -> bool {
    if !version::is_valid_release_version(candidate) {
      return false;
    }

    let newer = match &self.latest_version {
      None => true,
      Some(current) => version::compare_releases(candidate, current).is_some_and(|o| o.is_gt()),
    };

    if newer {
      self.latest_version = Some(candidate.to_string());
    }
    newer
  }

  /// Resolve an alias to a concrete version id.
  pub fn resolve_alias(&self, alias: VersionAlias) -> Option<String> {
    match alias {
      VersionAlias::Latest => self.latest_version.clone(),
      VersionAlias::Head => Some(version::branch_snapshot(&self.default_branch)),
    }
  }
}

/// A name/value pair extracted from project metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
  pub name: String,
  pub value: String,
}

impl Property {
  pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      value: value.into(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionData {
  /// Direct dependencies in declaration order
  pub dependencies: Vec<ProjectVersion>,
  pub properties: Vec<Property>,
}

/// The set of versions reachable from a version, plus whether it could be
/// fully resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitiveDependencyReport {
  pub dependencies: BTreeSet<ProjectVersion>,
  pub valid: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub invalid_reason: Option<String>,
}

impl TransitiveDependencyReport {
  pub fn valid(dependencies: BTreeSet<ProjectVersion>) -> Self {
    Self {
      dependencies,
      valid: true,
      invalid_reason: None,
    }
  }

  /// An invalid report never carries a partial closure.
  pub fn invalid(reason: impl Into<String>) -> Self {
    Self {
      dependencies: BTreeSet::new(),
      valid: false,
      invalid_reason: Some(reason.into()),
    }
  }
}

impl Default for TransitiveDependencyReport {
  fn default() -> Self {
    Self::valid(BTreeSet::new())
  }
}

/// One record per GAV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersionRecord {
  pub group_id: String,
  pub artifact_id: String,
  pub version_id: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  /// Retention marker, the record is kept but no longer refreshed
  #[serde(default)]
  pub evicted: bool,
  #[serde(default)]
  pub excluded: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exclusion_reason: Option<String>,
  #[serde(default)]
  pub version_data: VersionData,
  #[serde(default)]
  pub transitive_dependencies_report: TransitiveDependencyReport,
}

impl ProjectVersionRecord {
  pub fn new(gav: &ProjectVersion) -> Self {
    let now = Utc::now();
    Self {
      group_id: gav.group_id.clone(),
      artifact_id: gav.artifact_id.clone(),
      version_id: gav.version_id.clone(),
      created_at: now,
      updated_at: now,
      evicted: false,
      excluded: false,
      exclusion_reason: None,
      version_data: VersionData::default(),
      transitive_dependencies_report: TransitiveDependencyReport::default(),
    }
  }

  pub fn gav(&self) -> ProjectVersion {
    ProjectVersion::new(&self.group_id, &self.artifact_id, &self.version_id)
  }

  pub fn is_snapshot(&self) -> bool {
    version::is_snapshot_version(&self.version_id)
  }

  pub fn depends_on(&self, gav: &ProjectVersion) -> bool {
    self.version_data.dependencies.iter().any(|d| d == gav)
  }

  pub fn exclude(&mut self, reason: impl Into<String>) {
    self.excluded = true;
    self.exclusion_reason = Some(reason.into());
    self.updated_at = Utc::now();
  }

  /// A successful refresh clears any previous exclusion.
  pub fn clear_exclusion(&mut self) {
    self.excluded = false;
    self.exclusion_reason = None;
  }
}
