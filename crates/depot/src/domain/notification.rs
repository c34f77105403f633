//! Refresh requests carried through the work queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::coordinate::ProjectVersion;

/// Unique identifier for a queued request (for correlation in logs and responses)
pub type RequestId = String;

/// A request to refresh one version.
///
/// Produced by the bulk orchestrator, by dependency fan-out, or by an external
/// trigger. `parent_event` and `origin_at` describe the fan-out wave the
/// request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataNotification {
  pub event_id: String,
  /// Project id the sender expects the coordinate to belong to
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_id: Option<String>,
  pub group_id: String,
  pub artifact_id: String,
  pub version_id: String,
  /// Reprocess every artifact file of a snapshot, not just changed ones
  #[serde(default)]
  pub full_update: bool,
  /// Enqueue refreshes for missing or snapshot dependencies
  #[serde(default)]
  pub transitive: bool,
  /// Root event of the fan-out chain, diagnostics only
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent_event: Option<String>,
  /// Deliveries of this event so far, as counted by an external trigger that
  /// re-sends failed requests. Fan-out requests start over at 0.
  #[serde(default)]
  pub attempt: u32,
  /// When the fan-out wave this request belongs to started
  pub origin_at: DateTime<Utc>,
}

impl MetadataNotification {
  pub fn new(gav: &ProjectVersion, full_update: bool, transitive: bool) -> Self {
    Self {
      event_id: Uuid::now_v7().to_string(),
      project_id: None,
      group_id: gav.group_id.clone(),
      artifact_id: gav.artifact_id.clone(),
      version_id: gav.version_id.clone(),
      full_update,
      transitive,
      parent_event: None,
      attempt: 0,
      origin_at: Utc::now(),
    }
  }

  pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
    self.project_id = Some(project_id.into());
    self
  }

  pub fn gav(&self) -> ProjectVersion {
    ProjectVersion::new(&self.group_id, &self.artifact_id, &self.version_id)
  }

  /// Build the request refreshing `dependency` as part of this request's wave.
  pub fn fan_out(&self, dependency: &ProjectVersion) -> Self {
    let root = self.parent_event.clone().unwrap_or_else(|| self.event_id.clone());
    Self {
      event_id: Uuid::now_v7().to_string(),
      project_id: None,
      group_id: dependency.group_id.clone(),
      artifact_id: dependency.artifact_id.clone(),
      version_id: dependency.version_id.clone(),
      full_update: self.full_update,
      transitive: self.transitive,
      parent_event: Some(root),
      attempt: 0,
      origin_at: self.origin_at,
    }
  }
}
