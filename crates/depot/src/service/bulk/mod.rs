//! Bulk refresh: decides which versions need work and queues one request per
//! version.

use std::collections::HashSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{context::RefreshContext, util::ServiceError};
use crate::{
  actor::queue::RefreshQueue,
  db::{ProjectStore, VersionStore},
  domain::{
    coordinate::{Coordinate, ProjectVersion},
    notification::MetadataNotification,
    project::ProjectRecord,
    response::RefreshResponse,
    version,
  },
  repository::ArtifactRepository,
};

/// Flags shared by every bulk entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOptions {
  /// Reprocess every artifact file of snapshots
  pub full_update: bool,
  /// Queue upstream releases even if already stored
  pub all_versions: bool,
  /// Fan out to dependencies
  pub transitive: bool,
}

pub struct BulkRefresher {
  ctx: RefreshContext,
}

impl BulkRefresher {
  pub fn new(ctx: RefreshContext) -> Self {
    Self { ctx }
  }

  /// Queue the default snapshot and every upstream release not yet stored.
  #[instrument(level = "debug", skip(self), fields(coordinate = %coordinate))]
  pub async fn refresh_project(&self, coordinate: &Coordinate, options: RefreshOptions) -> RefreshResponse {
    match self.try_refresh_project(coordinate, options).await {
      Ok(response) => response,
      Err(e) => RefreshResponse::with_error(format!("Unable to refresh {coordinate}: {e}")),
    }
  }

  /// Refresh every known project. One project's failure is recorded and the
  /// others still run.
  pub async fn refresh_all(&self, options: RefreshOptions) -> RefreshResponse {
    let projects = match self.ctx.store.list_projects().await {
      Ok(projects) => projects,
      Err(e) => return RefreshResponse::with_error(format!("Unable to list projects: {e}")),
    };
    info!(projects = projects.len(), "Refreshing all projects");

    let results = join_all(
      projects
        .iter()
        .map(|p| async move { self.refresh_project(&p.coordinate(), options).await }),
    )
    .await;
    results.into_iter().collect()
  }

  /// Queue the default branch snapshot of every known project.
  pub async fn refresh_default_snapshots_all(&self, options: RefreshOptions) -> RefreshResponse {
    let projects = match self.ctx.store.list_projects().await {
      Ok(projects) => projects,
      Err(e) => return RefreshResponse::with_error(format!("Unable to list projects: {e}")),
    };
    info!(projects = projects.len(), "Refreshing default snapshots");

    let results = join_all(projects.iter().map(|project| async move {
      let mut response = RefreshResponse::new();
      let gav = project.default_snapshot();
      if let Err(e) = self.queue_default_snapshot(&gav, Some(project), options, &mut response).await {
        response.add_error(format!("Unable to refresh {}: {e}", project.coordinate()));
      }
      response
    }))
    .await;
    results.into_iter().collect()
  }

  /// Queue one version.
  pub async fn refresh_version(&self, gav: &ProjectVersion, options: RefreshOptions) -> RefreshResponse {
    if !gav.coordinate().is_valid() || !version::is_valid(&gav.version_id) {
      return RefreshResponse::with_error(format!("Invalid coordinates {gav}"));
    }

    let mut response = RefreshResponse::new();
    let notification = MetadataNotification::new(gav, options.full_update, options.transitive);
    if let Err(e) = self.queue(notification, &mut response).await {
      response.add_error(format!("Unable to queue {gav}: {e}"));
    }
    response
  }

  async fn try_refresh_project(
    &self,
    coordinate: &Coordinate,
    options: RefreshOptions,
  ) -> Result<RefreshResponse, ServiceError> {
    if !self.ctx.repository.are_valid_coordinates(coordinate).await? {
      return Err(ServiceError::not_found("Project", coordinate.to_string()));
    }

    let project = self.ctx.store.find_project(coordinate).await?;
    let mut response = RefreshResponse::new();

    let default_snapshot = match &project {
      Some(project) => project.default_snapshot(),
      None => coordinate.version(version::branch_snapshot(version::DEFAULT_BRANCH)),
    };
    self
      .queue_default_snapshot(&default_snapshot, project.as_ref(), options, &mut response)
      .await?;

    let upstream = self.ctx.repository.find_versions(coordinate).await?;
    let stored = self.ctx.store.find_versions(coordinate).await?;
    let evicted: HashSet<&str> = stored
      .iter()
      .filter(|r| r.evicted)
      .map(|r| r.version_id.as_str())
      .collect();
    let known: HashSet<&str> = stored.iter().map(|r| r.version_id.as_str()).collect();

    let candidates: Vec<&String> = upstream
      .iter()
      .filter(|v| !version::is_snapshot_version(v))
      .filter(|v| !evicted.contains(v.as_str()))
      .filter(|v| options.all_versions || !known.contains(v.as_str()))
      .collect();
    debug!(
      coordinate = %coordinate,
      upstream = upstream.len(),
      stored = stored.len(),
      candidates = candidates.len(),
      "Computed release candidates"
    );

    for version_id in candidates {
      let gav = coordinate.version(version_id.as_str());
      let notification = self.notification(project.as_ref(), &gav, options);
      self.queue(notification, &mut response).await?;
    }

    Ok(response)
  }

  /// The default snapshot is queued whenever upstream has it and it has not
  /// been evicted.
  async fn queue_default_snapshot(
    &self,
    gav: &ProjectVersion,
    project: Option<&ProjectRecord>,
    options: RefreshOptions,
    response: &mut RefreshResponse,
  ) -> Result<(), ServiceError> {
    if self.ctx.repository.find_version(gav).await?.is_none() {
      debug!(gav = %gav, "No default snapshot upstream");
      return Ok(());
    }
    if let Some(record) = self.ctx.store.find_version(gav).await?
      && record.evicted
    {
      debug!(gav = %gav, "Default snapshot evicted, skipping");
      return Ok(());
    }

    let notification = self.notification(project, gav, options);
    self.queue(notification, response).await
  }

  fn notification(
    &self,
    project: Option<&ProjectRecord>,
    gav: &ProjectVersion,
    options: RefreshOptions,
  ) -> MetadataNotification {
    let notification = MetadataNotification::new(gav, options.full_update, options.transitive);
    match project {
      Some(project) => notification.with_project_id(&project.project_id),
      None => notification,
    }
  }

  async fn queue(&self, notification: MetadataNotification, response: &mut RefreshResponse) -> Result<(), ServiceError> {
    let gav = notification.gav();
    let request_id = self.ctx.queue.push(notification).await.inspect_err(|e| {
      warn!(gav = %gav, error = %e, "Unable to queue refresh");
    })?;
    self.ctx.stats.record_queued(1);
    response.add_message(format!("Queued refresh of {gav} ({request_id})"));
    Ok(())
  }
}
