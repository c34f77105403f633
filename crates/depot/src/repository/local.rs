// Directory-layout repository
//
// Layout under the root:
//
//   <group with '.' -> '/'>/<artifact>/<version>/project.json
//   <group with '.' -> '/'>/<artifact>/<version>/<artifact-type>/**
//
// project.json carries the declared dependencies and metadata properties:
//
//   { "dependencies": [{"groupId": "g", "artifactId": "b", "version": "1.0.0"}],
//     "properties": {"owner": "team"} }
//
// A missing project.json means no dependencies and no properties.

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::trace;
use walkdir::WalkDir;

use super::{ArtifactRepository, FileRef, PropertyMap, RepositoryError};
use crate::{
  artifact::ArtifactType,
  domain::{
    coordinate::{Coordinate, ProjectVersion},
    version,
  },
};

const MANIFEST: &str = "project.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectManifest {
  dependencies: Vec<DeclaredDependency>,
  properties: PropertyMap,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeclaredDependency {
  group_id: String,
  artifact_id: String,
  version: String,
}

#[derive(Debug, Clone)]
pub struct LocalRepository {
  root: PathBuf,
}

impl LocalRepository {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn artifact_dir(&self, coordinate: &Coordinate) -> PathBuf {
    self
      .root
      .join(coordinate.group_id.replace('.', "/"))
      .join(&coordinate.artifact_id)
  }

  fn version_dir(&self, gav: &ProjectVersion) -> PathBuf {
    self.artifact_dir(&gav.coordinate()).join(&gav.version_id)
  }

  async fn read_manifest(&self, gav: &ProjectVersion) -> Result<Option<ProjectManifest>, RepositoryError> {
    let dir = self.version_dir(gav);
    if !tokio::fs::try_exists(&dir).await? {
      return Ok(None);
    }

    let path = dir.join(MANIFEST);
    if !tokio::fs::try_exists(&path).await? {
      return Ok(Some(ProjectManifest::default()));
    }

    let content = tokio::fs::read(&path).await?;
    let manifest = serde_json::from_slice(&content).map_err(|source| RepositoryError::Malformed {
      path: path.display().to_string(),
      source,
    })?;
    Ok(Some(manifest))
  }

  fn relative(&self, path: &Path) -> String {
    let relative = path.strip_prefix(&self.root).unwrap_or(path);
    relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/")
  }
}

#[async_trait::async_trait]
impl ArtifactRepository for LocalRepository {
  async fn find_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, RepositoryError> {
    let dir = self.artifact_dir(coordinate);
    if !tokio::fs::try_exists(&dir).await? {
      return Ok(Vec::new());
    }

    let mut versions = Vec::new();
    let mut entries = tokio::fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
      if !entry.file_type().await?.is_dir() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().to_string();
      if version::is_valid(&name) {
        versions.push(name);
      }
    }

    versions.sort();
    Ok(versions)
  }

  async fn find_version(&self, gav: &ProjectVersion) -> Result<Option<String>, RepositoryError> {
    let dir = self.version_dir(gav);
    let exists = tokio::fs::try_exists(&dir).await? && tokio::fs::metadata(&dir).await?.is_dir();
    Ok(exists.then(|| gav.version_id.clone()))
  }

  async fn find_dependencies(&self, gav: &ProjectVersion) -> Result<Vec<ProjectVersion>, RepositoryError> {
    let manifest = self
      .read_manifest(gav)
      .await?
      .ok_or_else(|| RepositoryError::MissingVersion(gav.clone()))?;

    let mut seen = HashSet::new();
    let dependencies = manifest
      .dependencies
      .into_iter()
      .map(|d| ProjectVersion::new(d.group_id, d.artifact_id, d.version))
      .filter(|d| seen.insert(d.clone()))
      .collect();

    Ok(dependencies)
  }

  async fn find_files(
    &self,
    artifact_type: &ArtifactType,
    gav: &ProjectVersion,
  ) -> Result<Vec<FileRef>, RepositoryError> {
    let dir = self.version_dir(gav).join(artifact_type.as_str());
    if !tokio::fs::try_exists(&dir).await? {
      return Ok(Vec::new());
    }

    let paths = tokio::task::spawn_blocking(move || {
      WalkDir::new(&dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| RepositoryError::Unavailable(format!("file listing task failed: {e}")))?;

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
      let content = tokio::fs::read(&path).await?;
      files.push(FileRef::new(self.relative(&path), content));
    }

    trace!(gav = %gav, artifact_type = %artifact_type, count = files.len(), "Listed artifact files");
    Ok(files)
  }

  async fn get_project_metadata(&self, gav: &ProjectVersion) -> Result<Option<PropertyMap>, RepositoryError> {
    Ok(self.read_manifest(gav).await?.map(|m| m.properties))
  }

  async fn are_valid_coordinates(&self, coordinate: &Coordinate) -> Result<bool, RepositoryError> {
    if !coordinate.is_valid() {
      return Ok(false);
    }
    Ok(tokio::fs::try_exists(self.artifact_dir(coordinate)).await?)
  }
}
