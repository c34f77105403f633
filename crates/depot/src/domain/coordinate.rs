//! Project coordinates and version references.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::version;

/// Identifies a project: `(groupId, artifactId)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
  pub group_id: String,
  pub artifact_id: String,
}

impl Coordinate {
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
    }
  }

  /// Reference a version of this project.
  pub fn version(&self, version_id: impl Into<String>) -> ProjectVersion {
    ProjectVersion::new(&self.group_id, &self.artifact_id, version_id)
  }

  /// Both identifiers match the identifier pattern.
  pub fn is_valid(&self) -> bool {
    version::is_valid_group_id(&self.group_id) && version::is_valid_artifact_id(&self.artifact_id)
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.group_id, self.artifact_id)
  }
}

/// A `(group, artifact, version)` reference, the GAV of one published version.
///
/// Ordering is lexicographic over the three fields so that sets of references
/// iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
  pub group_id: String,
  pub artifact_id: String,
  pub version_id: String,
}

impl ProjectVersion {
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version_id: impl Into<String>) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
      version_id: version_id.into(),
    }
  }

  pub fn coordinate(&self) -> Coordinate {
    Coordinate::new(&self.group_id, &self.artifact_id)
  }

  /// Flat `group-artifact-version` key used in messages and store keys.
  pub fn key(&self) -> String {
    format!("{}-{}-{}", self.group_id, self.artifact_id, self.version_id)
  }

  pub fn is_snapshot(&self) -> bool {
    version::is_snapshot_version(&self.version_id)
  }

  pub fn is_release(&self) -> bool {
    version::is_valid_release_version(&self.version_id)
  }
}

impl fmt::Display for ProjectVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version_id)
  }
}
