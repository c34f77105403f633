//! Per-event refresh of one project version.
//!
//! A request is validated, guarded by a lease, resolved against the
//! repository, run through the artifact handlers, persisted, and finally fans
//! out to its dependencies. Every failure ends up in the returned
//! [`RefreshResponse`]; nothing escapes to the worker loop.

mod artifacts;

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{context::RefreshContext, dependency::DependencyManager, lease::RefreshLeases, util::ServiceError};
use crate::{
  actor::queue::RefreshQueue,
  db::{LeaseAcquisition, ProjectStore, VersionStore},
  domain::{
    coordinate::{Coordinate, ProjectVersion},
    notification::MetadataNotification,
    project::{ProjectRecord, ProjectVersionRecord, Property, TransitiveDependencyReport, VersionData},
    response::RefreshResponse,
    version,
  },
  repository::ArtifactRepository,
};

/// Outcome of dependency resolution.
enum Resolution {
  Resolved(Resolved),
  /// Rejected before anything was touched
  Rejected(RefreshResponse),
}

struct Resolved {
  dependencies: Vec<ProjectVersion>,
  report: TransitiveDependencyReport,
  properties: Vec<Property>,
}

pub struct RefreshHandler {
  ctx: RefreshContext,
  dependencies: DependencyManager,
  leases: RefreshLeases,
}

impl RefreshHandler {
  pub fn new(ctx: RefreshContext) -> Self {
    let dependencies = DependencyManager::new(
      ctx.store.clone(),
      ctx.repository.clone(),
      ctx.config.max_dependency_depth,
    );
    let leases = RefreshLeases::new(ctx.store.clone(), ctx.config.lease_ttl_secs);
    Self {
      ctx,
      dependencies,
      leases,
    }
  }

  pub fn context(&self) -> &RefreshContext {
    &self.ctx
  }

  pub fn dependencies(&self) -> &DependencyManager {
    &self.dependencies
  }

  pub fn leases(&self) -> &RefreshLeases {
    &self.leases
  }

  /// Handle one refresh request to completion.
  #[instrument(level = "debug", skip_all, fields(gav = %notification.gav(), event_id = %notification.event_id))]
  pub async fn handle(&self, notification: &MetadataNotification) -> RefreshResponse {
    let started = Instant::now();
    let gav = notification.gav();

    let project = match self.validate(notification).await {
      Ok(project) => project,
      Err(e) => {
        self.ctx.stats.record_failed();
        warn!(gav = %gav, attempt = notification.attempt, error = %e, "Rejected refresh request");
        return RefreshResponse::with_error(e.to_string());
      }
    };

    match self.leases.acquire(&gav).await {
      Ok(LeaseAcquisition::Acquired(_)) => {}
      Ok(LeaseAcquisition::AlreadyLeased(lease)) => {
        self.ctx.stats.record_skipped();
        debug!(gav = %gav, expires_at = %lease.expires_at, "Refresh already in progress, skipping");
        return RefreshResponse::with_message(format!("Refresh of {gav} already in progress, skipped"));
      }
      Err(e) => {
        self.ctx.stats.record_failed();
        return RefreshResponse::with_error(format!("Unable to lease {gav}: {e}"));
      }
    }

    let mut response = match self.refresh(notification, project).await {
      Ok(response) => response,
      Err(e) => RefreshResponse::with_error(e.to_string()),
    };

    if let Err(e) = self.leases.release(&gav).await {
      response.add_error(format!("Unable to release lease for {gav}: {e}"));
    }

    if response.has_errors() {
      self.ctx.stats.record_failed();
    } else {
      self.ctx.stats.record_processed();
    }

    info!(
      gav = %gav,
      event_id = %notification.event_id,
      parent_event = notification.parent_event.as_deref().unwrap_or("-"),
      attempt = notification.attempt,
      duration_ms = started.elapsed().as_millis() as u64,
      errors = response.errors.len(),
      "Refresh finished"
    );
    response
  }

  /// Syntax checks and project registration. Returns the project the
  /// coordinate belongs to.
  async fn validate(&self, notification: &MetadataNotification) -> Result<ProjectRecord, ServiceError> {
    let coordinate = Coordinate::new(&notification.group_id, &notification.artifact_id);
    if !version::is_valid_group_id(&coordinate.group_id) {
      return Err(ServiceError::validation(format!("Invalid group id '{}'", coordinate.group_id)));
    }
    if !version::is_valid_artifact_id(&coordinate.artifact_id) {
      return Err(ServiceError::validation(format!(
        "Invalid artifact id '{}'",
        coordinate.artifact_id
      )));
    }
    if !version::is_valid(&notification.version_id) {
      return Err(ServiceError::validation(format!(
        "Invalid version '{}'",
        notification.version_id
      )));
    }

    let project = match self.ctx.store.find_project(&coordinate).await? {
      Some(project) => project,
      None => {
        let project_id = notification
          .project_id
          .clone()
          .unwrap_or_else(|| Uuid::new_v4().to_string());
        let created = self
          .ctx
          .store
          .insert_project_if_absent(ProjectRecord::new(project_id, &coordinate))
          .await?;
        debug!(coordinate = %coordinate, project_id = %created.project_id, "Registered project");
        created
      }
    };

    if let Some(expected) = &notification.project_id
      && expected != &project.project_id
    {
      return Err(ServiceError::conflict(format!(
        "Coordinate {coordinate} belongs to project {}, not {expected}",
        project.project_id
      )));
    }

    Ok(project)
  }

  async fn refresh(
    &self,
    notification: &MetadataNotification,
    project: ProjectRecord,
  ) -> Result<RefreshResponse, ServiceError> {
    let gav = notification.gav();

    let resolved = match self.resolve(&gav).await? {
      Resolution::Resolved(resolved) => resolved,
      Resolution::Rejected(response) => return Ok(response),
    };

    let mut response = artifacts::process_artifacts(&self.ctx, &gav, notification.full_update).await;
    if response.has_errors() {
      return Ok(response);
    }

    self.persist(&gav, &project, &resolved, &mut response).await?;
    self.fan_out(notification, &resolved.dependencies, &mut response).await?;

    Ok(response)
  }

  /// Resolve dependencies and metadata of a version that exists upstream.
  async fn resolve(&self, gav: &ProjectVersion) -> Result<Resolution, ServiceError> {
    if self.ctx.repository.find_version(gav).await?.is_none() {
      return Err(ServiceError::not_found("Version", gav.to_string()));
    }

    let dependencies = self.dependencies.direct_dependencies(gav).await?;
    let errors = super::dependency::validate_dependencies(&dependencies, &gav.version_id);
    if !errors.is_empty() {
      for error in &errors {
        warn!(gav = %gav, error = %error, "Dependency validation failed");
      }
      return Ok(Resolution::Rejected(RefreshResponse {
        messages: Vec::new(),
        errors,
      }));
    }

    let report = self.dependencies.transitive_closure(&dependencies).await?;
    if !report.valid {
      let reason = report.invalid_reason.as_deref().unwrap_or("unknown reason");
      return Ok(Resolution::Rejected(RefreshResponse::with_error(format!(
        "Unable to resolve dependencies of {gav}: {reason}"
      ))));
    }

    if gav.is_release() {
      let errors = super::dependency::validate_dependencies(
        &report.dependencies.iter().cloned().collect::<Vec<_>>(),
        &gav.version_id,
      );
      if !errors.is_empty() {
        return Ok(Resolution::Rejected(RefreshResponse {
          messages: Vec::new(),
          errors,
        }));
      }
    }

    let properties = self
      .ctx
      .repository
      .get_project_metadata(gav)
      .await?
      .unwrap_or_default()
      .into_iter()
      .map(|(name, value)| Property::new(name, value))
      .collect();

    Ok(Resolution::Resolved(Resolved {
      dependencies,
      report,
      properties,
    }))
  }

  async fn persist(
    &self,
    gav: &ProjectVersion,
    project: &ProjectRecord,
    resolved: &Resolved,
    response: &mut RefreshResponse,
  ) -> Result<(), ServiceError> {
    let mut record = self
      .ctx
      .store
      .find_version(gav)
      .await?
      .unwrap_or_else(|| ProjectVersionRecord::new(gav));

    record.version_data = VersionData {
      dependencies: resolved.dependencies.clone(),
      properties: resolved.properties.clone(),
    };
    record.transitive_dependencies_report = resolved.report.clone();
    record.clear_exclusion();
    record.updated_at = Utc::now();
    self.ctx.store.save_version(&record).await?;
    response.add_message(format!("Refreshed {gav}"));

    if gav.is_release() {
      let coordinate = project.coordinate();
      if let Some(updated) = self
        .ctx
        .store
        .evaluate_latest_version(&coordinate, &gav.version_id)
        .await?
      {
        debug!(coordinate = %coordinate, latest = ?updated.latest_version, "Updated latest release");
      }
    } else {
      match self.dependencies.update_dependents(gav).await {
        Ok(updated) if !updated.is_empty() => {
          response.add_message(format!("Updated dependency graph of {} dependents of {gav}", updated.len()));
        }
        Ok(_) => {}
        Err(e) => response.add_error(format!("Unable to update dependents of {gav}: {e}")),
      }
    }

    Ok(())
  }

  async fn fan_out(
    &self,
    notification: &MetadataNotification,
    dependencies: &[ProjectVersion],
    response: &mut RefreshResponse,
  ) -> Result<(), ServiceError> {
    let gav = notification.gav();

    for dependency in dependencies {
      let stored = self.ctx.store.find_version(dependency).await?;

      if !notification.transitive {
        if stored.is_none() {
          response.add_error(format!("Dependency {dependency} of {gav} is not loaded"));
        }
        continue;
      }

      let enqueue = match &stored {
        None => true,
        // Snapshots already refreshed in this wave are resolved.
        Some(record) => record.is_snapshot() && record.updated_at < notification.origin_at,
      };
      if !enqueue {
        continue;
      }

      match self.ctx.queue.push(notification.fan_out(dependency)).await {
        Ok(request_id) => {
          self.ctx.stats.record_queued(1);
          debug!(gav = %gav, dependency = %dependency, request_id = %request_id, "Queued dependency refresh");
          response.add_message(format!("Queued refresh of dependency {dependency}"));
        }
        Err(e) => response.add_error(format!("Unable to queue dependency {dependency}: {e}")),
      }
    }

    Ok(())
  }
}
