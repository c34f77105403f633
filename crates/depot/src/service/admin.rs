//! Operator actions on stored versions.

use tracing::info;

use super::util::ServiceError;
use crate::{
  db::{ProjectStore, Store, VersionStore},
  domain::{
    coordinate::{Coordinate, ProjectVersion},
    project::ProjectVersionRecord,
    version::{self, VersionAlias},
  },
};

/// Resolve `latest`/`head` against the stored project. Concrete versions are
/// returned unchanged.
pub async fn resolve_version(
  store: &dyn Store,
  coordinate: &Coordinate,
  version_or_alias: &str,
) -> Result<ProjectVersion, ServiceError> {
  let Some(alias) = VersionAlias::parse(version_or_alias) else {
    if !version::is_valid(version_or_alias) {
      return Err(ServiceError::validation(format!("Invalid version '{version_or_alias}'")));
    }
    return Ok(coordinate.version(version_or_alias));
  };

  let project = store
    .find_project(coordinate)
    .await?
    .ok_or_else(|| ServiceError::not_found("Project", coordinate.to_string()))?;
  let version_id = project
    .resolve_alias(alias)
    .ok_or_else(|| ServiceError::not_found("Version", format!("{coordinate}:{}", alias.as_str())))?;
  Ok(coordinate.version(version_id))
}

pub async fn find_version(
  store: &dyn Store,
  coordinate: &Coordinate,
  version_or_alias: &str,
) -> Result<Option<ProjectVersionRecord>, ServiceError> {
  let gav = resolve_version(store, coordinate, version_or_alias).await?;
  Ok(store.find_version(&gav).await?)
}

/// Mark a stored version unresolvable. It stays excluded until a later
/// successful refresh.
pub async fn exclude_version(
  store: &dyn Store,
  gav: &ProjectVersion,
  reason: &str,
) -> Result<ProjectVersionRecord, ServiceError> {
  let mut record = store
    .find_version(gav)
    .await?
    .ok_or_else(|| ServiceError::not_found("Version", gav.to_string()))?;
  record.exclude(reason);
  store.save_version(&record).await?;
  info!(gav = %gav, reason, "Excluded version");
  Ok(record)
}

/// Retire a stored version from bulk refreshes. The record is kept.
pub async fn evict_version(store: &dyn Store, gav: &ProjectVersion) -> Result<ProjectVersionRecord, ServiceError> {
  let mut record = store
    .find_version(gav)
    .await?
    .ok_or_else(|| ServiceError::not_found("Version", gav.to_string()))?;
  if !record.evicted {
    record.evicted = true;
    record.updated_at = chrono::Utc::now();
    store.save_version(&record).await?;
    info!(gav = %gav, "Evicted version");
  }
  Ok(record)
}
