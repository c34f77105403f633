//! Shared test helpers for service-level scenario tests.

use std::{
  collections::{BTreeMap, HashMap, HashSet},
  sync::{Arc, Mutex},
};

use dashmap::DashMap;

use crate::{
  actor::queue::{QueueError, RefreshQueue},
  artifact::{ArtifactHandler, ArtifactType, HandlerRegistry},
  db::{MemoryStore, Store},
  domain::{
    config::RefreshConfig,
    coordinate::{Coordinate, ProjectVersion},
    notification::{MetadataNotification, RequestId},
    response::RefreshResponse,
  },
  repository::{ArtifactRepository, FileRef, PropertyMap, RepositoryError},
  service::{bulk::BulkRefresher, context::RefreshContext, dependency::DependencyManager, refresh::RefreshHandler},
};

pub fn gav(coordinates: &str) -> ProjectVersion {
  let mut parts = coordinates.splitn(3, ':');
  let group = parts.next().unwrap_or_default();
  let artifact = parts.next().unwrap_or_default();
  let version = parts.next().unwrap_or_default();
  ProjectVersion::new(group, artifact, version)
}

#[derive(Debug, Clone, Default)]
struct ScriptedVersion {
  dependencies: Vec<ProjectVersion>,
  properties: PropertyMap,
  files: HashMap<ArtifactType, Vec<FileRef>>,
}

/// In-memory upstream repository populated by the test.
#[derive(Default)]
pub struct ScriptedRepository {
  versions: DashMap<ProjectVersion, ScriptedVersion>,
  unavailable: DashMap<Coordinate, ()>,
}

impl ScriptedRepository {
  pub fn add_version(&self, coordinates: &str, dependencies: &[&str]) -> ProjectVersion {
    let version = gav(coordinates);
    self.versions.insert(
      version.clone(),
      ScriptedVersion {
        dependencies: dependencies.iter().map(|d| gav(d)).collect(),
        ..Default::default()
      },
    );
    version
  }

  pub fn set_property(&self, coordinates: &str, name: &str, value: &str) {
    if let Some(mut version) = self.versions.get_mut(&gav(coordinates)) {
      version.properties.insert(name.to_string(), value.to_string());
    }
  }

  /// Add or replace one artifact file.
  pub fn put_file(&self, coordinates: &str, artifact_type: &str, name: &str, content: &str) {
    let version = gav(coordinates);
    let path = format!(
      "{}/{}/{}/{artifact_type}/{name}",
      version.group_id.replace('.', "/"),
      version.artifact_id,
      version.version_id
    );
    if let Some(mut scripted) = self.versions.get_mut(&version) {
      let files = scripted.files.entry(ArtifactType::new(artifact_type)).or_default();
      files.retain(|f| f.path != path);
      files.push(FileRef::new(path, content));
    }
  }

  /// Every call for the coordinate fails with an access error.
  pub fn make_unavailable(&self, group: &str, artifact: &str) {
    self.unavailable.insert(Coordinate::new(group, artifact), ());
  }

  fn check(&self, coordinate: &Coordinate) -> Result<(), RepositoryError> {
    if self.unavailable.contains_key(coordinate) {
      return Err(RepositoryError::Unavailable(format!("{coordinate} unreachable")));
    }
    Ok(())
  }
}

#[async_trait::async_trait]
impl ArtifactRepository for ScriptedRepository {
  async fn find_versions(&self, coordinate: &Coordinate) -> Result<Vec<String>, RepositoryError> {
    self.check(coordinate)?;
    let mut versions: Vec<String> = self
      .versions
      .iter()
      .filter(|e| &e.key().coordinate() == coordinate)
      .map(|e| e.key().version_id.clone())
      .collect();
    versions.sort();
    Ok(versions)
  }

  async fn find_version(&self, gav: &ProjectVersion) -> Result<Option<String>, RepositoryError> {
    self.check(&gav.coordinate())?;
    Ok(self.versions.contains_key(gav).then(|| gav.version_id.clone()))
  }

  async fn find_dependencies(&self, gav: &ProjectVersion) -> Result<Vec<ProjectVersion>, RepositoryError> {
    self.check(&gav.coordinate())?;
    self
      .versions
      .get(gav)
      .map(|v| v.dependencies.clone())
      .ok_or_else(|| RepositoryError::MissingVersion(gav.clone()))
  }

  async fn find_files(
    &self,
    artifact_type: &ArtifactType,
    gav: &ProjectVersion,
  ) -> Result<Vec<FileRef>, RepositoryError> {
    self.check(&gav.coordinate())?;
    Ok(
      self
        .versions
        .get(gav)
        .and_then(|v| v.files.get(artifact_type).cloned())
        .unwrap_or_default(),
    )
  }

  async fn get_project_metadata(&self, gav: &ProjectVersion) -> Result<Option<PropertyMap>, RepositoryError> {
    self.check(&gav.coordinate())?;
    Ok(self.versions.get(gav).map(|v| v.properties.clone()))
  }

  async fn are_valid_coordinates(&self, coordinate: &Coordinate) -> Result<bool, RepositoryError> {
    self.check(coordinate)?;
    Ok(self.versions.iter().any(|e| &e.key().coordinate() == coordinate))
  }
}

/// Queue that only records what was pushed.
#[derive(Default)]
pub struct RecordingQueue {
  pushed: Mutex<Vec<MetadataNotification>>,
}

impl RecordingQueue {
  pub fn pushed(&self) -> Vec<MetadataNotification> {
    self.pushed.lock().unwrap().clone()
  }

  pub fn pushed_versions(&self) -> Vec<String> {
    self.pushed().iter().map(|n| n.gav().to_string()).collect()
  }
}

#[async_trait::async_trait]
impl RefreshQueue for RecordingQueue {
  async fn push(&self, notification: MetadataNotification) -> Result<RequestId, QueueError> {
    let id = notification.event_id.clone();
    self.pushed.lock().unwrap().push(notification);
    Ok(id)
  }
}

/// Handler recording every invocation, optionally failing each one.
pub struct RecordingHandler {
  artifact_type: ArtifactType,
  fail: bool,
  calls: Mutex<Vec<(ProjectVersion, Vec<String>)>>,
}

impl RecordingHandler {
  pub fn new(artifact_type: &str, fail: bool) -> Self {
    Self {
      artifact_type: ArtifactType::new(artifact_type),
      fail,
      calls: Mutex::new(Vec::new()),
    }
  }

  /// File paths passed on each call, in call order.
  pub fn calls(&self) -> Vec<Vec<String>> {
    self.calls.lock().unwrap().iter().map(|(_, paths)| paths.clone()).collect()
  }
}

#[async_trait::async_trait]
impl ArtifactHandler for RecordingHandler {
  fn artifact_type(&self) -> &ArtifactType {
    &self.artifact_type
  }

  fn matches(&self, _file: &FileRef) -> bool {
    true
  }

  async fn refresh(&self, gav: &ProjectVersion, files: Vec<FileRef>) -> RefreshResponse {
    let paths = files.into_iter().map(|f| f.path).collect();
    self.calls.lock().unwrap().push((gav.clone(), paths));
    if self.fail {
      RefreshResponse::with_error(format!("{} extraction failed for {gav}", self.artifact_type))
    } else {
      RefreshResponse::with_message(format!("{} processed for {gav}", self.artifact_type))
    }
  }
}

/// Test context wiring a memory store, a scripted repository, a recording
/// queue and recording handlers.
pub struct TestContext {
  pub store: Arc<MemoryStore>,
  pub repository: Arc<ScriptedRepository>,
  pub queue: Arc<RecordingQueue>,
  pub handlers: BTreeMap<String, Arc<RecordingHandler>>,
  pub ctx: RefreshContext,
}

impl TestContext {
  /// Artifact types `types` in order, each with a succeeding handler.
  pub fn new(types: &[&str]) -> Self {
    Self::with_handlers(types, types, &[])
  }

  /// Artifact types `types` in order. Only `registered` get a handler; the
  /// ones in `failing` report errors.
  pub fn with_handlers(types: &[&str], registered: &[&str], failing: &[&str]) -> Self {
    let store = Arc::new(MemoryStore::new());
    let repository = Arc::new(ScriptedRepository::default());
    let queue = Arc::new(RecordingQueue::default());
    let failing: HashSet<&str> = failing.iter().copied().collect();

    let mut registry = HandlerRegistry::new();
    let mut handlers = BTreeMap::new();
    for name in registered {
      let handler = Arc::new(RecordingHandler::new(name, failing.contains(name)));
      registry.register(handler.clone());
      handlers.insert(name.to_string(), handler);
    }

    let config = RefreshConfig {
      artifact_types: types.iter().map(|t| ArtifactType::new(*t)).collect(),
      ..RefreshConfig::default()
    };
    let dyn_store: Arc<dyn Store> = store.clone();
    let ctx = RefreshContext::new(dyn_store, repository.clone(), Arc::new(registry), queue.clone(), config);

    Self {
      store,
      repository,
      queue,
      handlers,
      ctx,
    }
  }

  pub fn handler(&self) -> RefreshHandler {
    RefreshHandler::new(self.ctx.clone())
  }

  pub fn bulk(&self) -> BulkRefresher {
    BulkRefresher::new(self.ctx.clone())
  }

  pub fn dependencies(&self, max_depth: usize) -> DependencyManager {
    DependencyManager::new(self.ctx.store.clone(), self.ctx.repository.clone(), max_depth)
  }

  pub fn recorded(&self, artifact_type: &str) -> Vec<Vec<String>> {
    self.handlers.get(artifact_type).map(|h| h.calls()).unwrap_or_default()
  }

  pub async fn notify(&self, coordinates: &str) -> RefreshResponse {
    self
      .handler()
      .handle(&MetadataNotification::new(&gav(coordinates), false, false))
      .await
  }
}
