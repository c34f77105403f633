//! Upstream artifact repository contract.
//!
//! The pipeline only ever asks the repository what exists: versions, declared
//! dependencies, project metadata and artifact files. "Not found" is `Ok(None)`
//! (or an empty list); every `Err` is an access failure.

mod local;

use std::collections::BTreeMap;

pub use local::LocalRepository;

use crate::{
  artifact::ArtifactType,
  domain::coordinate::{Coordinate, ProjectVersion},
};

pub type PropertyMap = BTreeMap<String, String>;

/// An artifact file as published upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
  /// Repository-relative path, unique across versions
  pub path: String,
  pub content: Vec<u8>,
}

impl FileRef {
  pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
    Self {
      path: path.into(),
      content: content.into(),
    }
  }

  pub fn size(&self) -> u64 {
    self.content.len() as u64
  }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Malformed metadata {path}: {source}")]
  Malformed {
    path: String,
    #[source]
    source: serde_json::Error,
  },
  /// Asked for the dependencies of a version the repository does not have
  #[error("Version {0} not found in repository")]
  MissingVersion(ProjectVersion),
  #[error("Repository unavailable: {0}")]
  Unavailable(String),
}

#[async_trait::async_trait]
pub trait ArtifactRepository: Send + Sync {
  /// Every published version of the project, releases and snapshots.
  async fn find_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, RepositoryError>;

  async fn find_version(&self, gav: &ProjectVersion) -> Result<Option<String>, RepositoryError>;

  /// Declared dependencies, deduplicated, in declaration order.
  async fn find_dependencies(&self, gav: &ProjectVersion) -> Result<Vec<ProjectVersion>, RepositoryError>;

  async fn find_files(
    &self,
    artifact_type: &ArtifactType,
    gav: &ProjectVersion,
  ) -> Result<Vec<FileRef>, RepositoryError>;

  async fn get_project_metadata(&self, gav: &ProjectVersion) -> Result<Option<PropertyMap>, RepositoryError>;

  async fn are_valid_coordinates(&self, coordinate: &Coordinate) -> Result<bool, RepositoryError>;
}
