//! Per-type artifact processing with content-hash change detection.

use chrono::Utc;
use tracing::{debug, trace};

use crate::service::{context::RefreshContext, util::ServiceError};
use crate::{
  artifact::{ArtifactHandler, ArtifactType, content_checksum},
  db::{ArtifactFileRecord, ArtifactFileStore, StoreError},
  domain::{coordinate::ProjectVersion, response::RefreshResponse},
  repository::{ArtifactRepository, FileRef},
};

/// Files whose checksum differs from the stored one, paired with their new
/// checksum. With `force` every file counts as changed.
pub(crate) async fn changed_files(
  ctx: &RefreshContext,
  files: Vec<FileRef>,
  force: bool,
) -> Result<Vec<(FileRef, String)>, StoreError> {
  let mut changed = Vec::with_capacity(files.len());

  for file in files {
    let checksum = content_checksum(&file.content);
    if !force
      && let Some(previous) = ctx.store.find_artifact_file(&file.path).await?
      && previous.checksum == checksum
    {
      trace!(path = %file.path, "Unchanged artifact file");
      continue;
    }
    changed.push((file, checksum));
  }

  Ok(changed)
}

/// Run every configured artifact type over the changed files of `gav`.
///
/// Stops at the first type reporting an error. Errors are collected into the
/// returned response.
pub(crate) async fn process_artifacts(ctx: &RefreshContext, gav: &ProjectVersion, full_update: bool) -> RefreshResponse {
  let mut response = RefreshResponse::new();
  let force = full_update && gav.is_snapshot();

  for artifact_type in &ctx.config.artifact_types {
    match process_type(ctx, gav, artifact_type, force).await {
      Ok(Some(result)) => {
        let failed = result.has_errors();
        response.merge(result);
        if failed {
          debug!(gav = %gav, artifact_type = %artifact_type, "Artifact type failed, halting");
          break;
        }
      }
      Ok(None) => {}
      Err(e) => {
        response.add_error(format!("Failed to process {artifact_type} files for {gav}: {e}"));
        break;
      }
    }
  }

  response
}

async fn process_type(
  ctx: &RefreshContext,
  gav: &ProjectVersion,
  artifact_type: &ArtifactType,
  force: bool,
) -> Result<Option<RefreshResponse>, ServiceError> {
  let files = ctx.repository.find_files(artifact_type, gav).await?;
  let candidates = changed_files(ctx, files, force).await?;
  if candidates.is_empty() {
    return Ok(None);
  }

  let handler = ctx
    .registry
    .get(artifact_type)
    .ok_or_else(|| ServiceError::config(format!("no handler registered for artifact type {artifact_type}")))?;

  let candidates: Vec<(FileRef, String)> = candidates.into_iter().filter(|(f, _)| handler.matches(f)).collect();
  if candidates.is_empty() {
    return Ok(None);
  }

  // Checksums are recorded before the handler runs.
  let now = Utc::now();
  for (file, checksum) in &candidates {
    ctx
      .store
      .save_artifact_file(&ArtifactFileRecord {
        path: file.path.clone(),
        checksum: checksum.clone(),
        updated_at: now,
      })
      .await?;
  }

  debug!(gav = %gav, artifact_type = %artifact_type, files = candidates.len(), "Invoking artifact handler");
  let files = candidates.into_iter().map(|(f, _)| f).collect();
  Ok(Some(handler.refresh(gav, files).await))
}
