//! Default handler: records every file of its type as an artifact entry.

use std::sync::Arc;

use tracing::debug;

use super::{ArtifactHandler, ArtifactType, content_checksum};
use crate::{
  db::{ArtifactEntry, ArtifactFileStore, Store},
  domain::{coordinate::ProjectVersion, response::RefreshResponse},
  repository::FileRef,
};

pub struct RawFilesHandler {
  artifact_type: ArtifactType,
  store: Arc<dyn Store>,
}

impl RawFilesHandler {
  pub fn new(artifact_type: ArtifactType, store: Arc<dyn Store>) -> Self {
    Self { artifact_type, store }
  }
}

#[async_trait::async_trait]
impl ArtifactHandler for RawFilesHandler {
  fn artifact_type(&self) -> &ArtifactType {
    &self.artifact_type
  }

  /// Hidden files are never ingested.
  fn matches(&self, file: &FileRef) -> bool {
    file
      .path
      .rsplit('/')
      .next()
      .is_some_and(|name| !name.is_empty() && !name.starts_with('.'))
  }

  async fn refresh(&self, gav: &ProjectVersion, files: Vec<FileRef>) -> RefreshResponse {
    let entries: Vec<ArtifactEntry> = files
      .iter()
      .map(|file| ArtifactEntry {
        artifact_type: self.artifact_type.clone(),
        path: file.path.clone(),
        checksum: content_checksum(&file.content),
        size: file.size(),
      })
      .collect();
    let count = entries.len();

    match self.store.replace_artifact_entries(gav, &self.artifact_type, entries).await {
      Ok(()) => {
        debug!(gav = %gav, artifact_type = %self.artifact_type, count, "Stored artifact entries");
        RefreshResponse::with_message(format!("Processed {count} {} files for {gav}", self.artifact_type))
      }
      Err(e) => RefreshResponse::with_error(format!(
        "Failed to store {} files for {gav}: {e}",
        self.artifact_type
      )),
    }
  }
}
