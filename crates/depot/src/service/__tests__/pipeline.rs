//! End-to-end runs through the queue and worker pool.

use std::{sync::Arc, time::Duration};

use pretty_assertions::assert_eq;

use super::helpers::{ScriptedRepository, gav};
use crate::{
  daemon::{Depot, RuntimeConfig},
  db::{ArtifactFileStore, MemoryStore, ProjectStore, VersionStore},
  domain::{config::Config, coordinate::Coordinate},
  service::bulk::RefreshOptions,
};

fn transitive() -> RefreshOptions {
  RefreshOptions {
    transitive: true,
    ..Default::default()
  }
}

async fn drain(depot: &Depot) {
  tokio::time::timeout(Duration::from_secs(10), depot.wait_idle())
    .await
    .expect("queue drained");
}

#[tokio::test]
async fn test_transitive_refresh_materializes_the_graph() {
  let repository = Arc::new(ScriptedRepository::default());
  repository.add_version("g:app:1.0.0", &["g:lib:1.0.0"]);
  repository.add_version("g:lib:1.0.0", &["g:core:1.0.0"]);
  repository.add_version("g:core:1.0.0", &[]);
  repository.put_file("g:core:1.0.0", "entities", "model.json", "{}");

  let store = Arc::new(MemoryStore::new());
  let depot = Depot::start(
    RuntimeConfig::in_memory(Config::default()),
    store.clone(),
    repository,
    None,
  );

  let response = depot.bulk().refresh_version(&gav("g:app:1.0.0"), transitive()).await;
  assert!(!response.has_errors());
  drain(&depot).await;

  for coordinates in ["g:app:1.0.0", "g:lib:1.0.0", "g:core:1.0.0"] {
    let record = store.find_version(&gav(coordinates)).await.unwrap();
    assert!(record.is_some(), "{coordinates} stored");
  }
  let app = store.find_version(&gav("g:app:1.0.0")).await.unwrap().unwrap();
  assert_eq!(app.transitive_dependencies_report.dependencies.len(), 2);

  let entries = store.find_artifact_entries(&gav("g:core:1.0.0")).await.unwrap();
  assert_eq!(entries.len(), 1);
  assert_eq!(entries[0].path, "g/core/1.0.0/entities/model.json");

  let stats = depot.run_until_idle().await.unwrap();
  assert_eq!(stats.processed, 3);
  assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_snapshot_cycle_terminates() {
  let repository = Arc::new(ScriptedRepository::default());
  repository.add_version("g:a:master-SNAPSHOT", &["g:b:master-SNAPSHOT"]);
  repository.add_version("g:b:master-SNAPSHOT", &["g:a:master-SNAPSHOT"]);

  let store = Arc::new(MemoryStore::new());
  let depot = Depot::start(
    RuntimeConfig::in_memory(Config::default()),
    store.clone(),
    repository,
    None,
  );

  depot
    .bulk()
    .refresh_version(&gav("g:a:master-SNAPSHOT"), transitive())
    .await;
  drain(&depot).await;

  assert!(store.find_version(&gav("g:b:master-SNAPSHOT")).await.unwrap().is_some());
  let stats = depot.run_until_idle().await.unwrap();
  assert_eq!(stats.processed, 2);
}

#[tokio::test]
async fn test_refresh_project_then_latest_release() {
  let repository = Arc::new(ScriptedRepository::default());
  repository.add_version("g:a:1.2.0", &[]);
  repository.add_version("g:a:1.10.0", &[]);
  repository.add_version("g:a:1.9.0", &[]);

  let store = Arc::new(MemoryStore::new());
  let depot = Depot::start(
    RuntimeConfig::in_memory(Config::default()),
    store.clone(),
    repository,
    None,
  );

  depot
    .bulk()
    .refresh_project(&Coordinate::new("g", "a"), RefreshOptions::default())
    .await;
  drain(&depot).await;

  let project = store.find_project(&Coordinate::new("g", "a")).await.unwrap().unwrap();
  assert_eq!(project.latest_version.as_deref(), Some("1.10.0"));
  assert_eq!(store.list_projects().await.unwrap().len(), 1);
  depot.run_until_idle().await.unwrap();
}
