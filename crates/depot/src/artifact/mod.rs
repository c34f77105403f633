//! Artifact-type handlers
//!
//! Each artifact type (entities, versioned entities, file generations, ...)
//! has one handler that extracts and persists type-specific content from the
//! changed files of a version. Handlers are registered in a [`HandlerRegistry`]
//! built at process start and passed to the refresh handler; the registry does
//! nothing beyond lookup by key.

mod raw;

use std::{collections::HashMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use raw::RawFilesHandler;

use crate::{
  domain::{coordinate::ProjectVersion, response::RefreshResponse},
  repository::FileRef,
};

/// Key of an artifact handler, also the directory name of the type's files
/// upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactType(String);

impl ArtifactType {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Types processed when nothing is configured, in processing order.
  pub fn defaults() -> Vec<Self> {
    vec![
      Self::new("entities"),
      Self::new("versioned-entities"),
      Self::new("file-generations"),
    ]
  }
}

impl fmt::Display for ArtifactType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Hex SHA-256 of file content.
pub fn content_checksum(content: &[u8]) -> String {
  hex::encode(Sha256::digest(content))
}

#[async_trait::async_trait]
pub trait ArtifactHandler: Send + Sync {
  fn artifact_type(&self) -> &ArtifactType;

  /// Whether this handler consumes the file.
  fn matches(&self, file: &FileRef) -> bool;

  /// Ingest `files` for the version. Failures are reported in the response.
  async fn refresh(&self, gav: &ProjectVersion, files: Vec<FileRef>) -> RefreshResponse;
}

#[derive(Clone, Default)]
pub struct HandlerRegistry {
  handlers: HashMap<ArtifactType, Arc<dyn ArtifactHandler>>,
}

impl HandlerRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a handler under its own type. Returns the handler it replaced.
  pub fn register(&mut self, handler: Arc<dyn ArtifactHandler>) -> Option<Arc<dyn ArtifactHandler>> {
    self.handlers.insert(handler.artifact_type().clone(), handler)
  }

  pub fn with(mut self, handler: Arc<dyn ArtifactHandler>) -> Self {
    self.register(handler);
    self
  }

  pub fn get(&self, artifact_type: &ArtifactType) -> Option<Arc<dyn ArtifactHandler>> {
    self.handlers.get(artifact_type).cloned()
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }
}

impl fmt::Debug for HandlerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut types: Vec<&ArtifactType> = self.handlers.keys().collect();
    types.sort();
    f.debug_struct("HandlerRegistry").field("types", &types).finish()
  }
}
