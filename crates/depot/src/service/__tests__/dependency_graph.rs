//! Transitive closure and dependent cascade scenarios.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;

use super::helpers::{TestContext, gav};
use crate::{
  db::VersionStore,
  domain::{
    coordinate::ProjectVersion,
    project::{ProjectVersionRecord, TransitiveDependencyReport},
  },
  service::dependency::DependencyError,
};

fn set(members: &[&str]) -> BTreeSet<ProjectVersion> {
  members.iter().map(|m| gav(m)).collect()
}

async fn store_version(t: &TestContext, coordinates: &str, dependencies: &[&str], report: &[&str]) {
  let mut record = ProjectVersionRecord::new(&gav(coordinates));
  record.version_data.dependencies = dependencies.iter().map(|d| gav(d)).collect();
  record.transitive_dependencies_report = TransitiveDependencyReport::valid(set(report));
  t.store.save_version(&record).await.unwrap();
}

#[tokio::test]
async fn test_excluded_version_deep_in_chain_invalidates_closure() {
  let t = TestContext::new(&[]);
  t.repository.add_version("g:b:1.0.0", &["g:c:1.0.0"]);
  t.repository.add_version("g:c:1.0.0", &[]);
  let mut excluded = ProjectVersionRecord::new(&gav("g:c:1.0.0"));
  excluded.exclude("broken build");
  t.store.save_version(&excluded).await.unwrap();

  let report = t
    .dependencies(64)
    .transitive_closure(&[gav("g:b:1.0.0")])
    .await
    .unwrap();

  assert!(!report.valid);
  assert!(report.dependencies.is_empty());
  assert!(report.invalid_reason.unwrap().contains("g:c:1.0.0 is excluded"));
}

#[tokio::test]
async fn test_stored_invalid_report_invalidates_closure() {
  let t = TestContext::new(&[]);
  let mut broken = ProjectVersionRecord::new(&gav("g:b:1.0.0"));
  broken.transitive_dependencies_report = TransitiveDependencyReport::invalid("missing upstream");
  t.store.save_version(&broken).await.unwrap();

  let report = t
    .dependencies(64)
    .transitive_closure(&[gav("g:b:1.0.0")])
    .await
    .unwrap();
  assert!(!report.valid);
}

#[tokio::test]
async fn test_closure_is_order_independent() {
  let t = TestContext::new(&[]);
  t.repository.add_version("g:b:1.0.0", &["g:c:1.0.0", "g:e:1.0.0"]);
  t.repository.add_version("g:c:1.0.0", &["g:e:1.0.0"]);
  t.repository.add_version("g:d:1.0.0", &["g:c:1.0.0"]);
  t.repository.add_version("g:e:1.0.0", &[]);
  let manager = t.dependencies(64);

  let forward = manager
    .transitive_closure(&[gav("g:b:1.0.0"), gav("g:d:1.0.0")])
    .await
    .unwrap();
  let backward = manager
    .transitive_closure(&[gav("g:d:1.0.0"), gav("g:b:1.0.0")])
    .await
    .unwrap();

  assert!(forward.valid);
  assert_eq!(forward, backward);
  assert_eq!(
    forward.dependencies,
    set(&["g:b:1.0.0", "g:c:1.0.0", "g:d:1.0.0", "g:e:1.0.0"])
  );
}

#[tokio::test]
async fn test_excluded_direct_dependency_in_stored_report_invalidates_closure() {
  let t = TestContext::new(&[]);
  store_version(&t, "g:a:1.0.0", &["g:x:1.0.0"], &["g:x:1.0.0"]).await;
  let mut excluded = ProjectVersionRecord::new(&gav("g:x:1.0.0"));
  excluded.exclude("broken build");
  t.store.save_version(&excluded).await.unwrap();
  let manager = t.dependencies(64);

  let forward = manager
    .transitive_closure(&[gav("g:a:1.0.0"), gav("g:x:1.0.0")])
    .await
    .unwrap();
  let backward = manager
    .transitive_closure(&[gav("g:x:1.0.0"), gav("g:a:1.0.0")])
    .await
    .unwrap();

  assert!(!forward.valid);
  assert!(!backward.valid);
}

#[tokio::test]
async fn test_stored_versions_contribute_their_reports() {
  let t = TestContext::new(&[]);
  // Upstream knows nothing: everything must come from the store.
  store_version(&t, "g:b:1.0.0", &["g:c:1.0.0"], &["g:c:1.0.0", "g:e:1.0.0"]).await;

  let report = t
    .dependencies(64)
    .transitive_closure(&[gav("g:b:1.0.0")])
    .await
    .unwrap();

  assert!(report.valid);
  assert_eq!(report.dependencies, set(&["g:b:1.0.0", "g:c:1.0.0", "g:e:1.0.0"]));
}

#[tokio::test]
async fn test_cycle_terminates() {
  let t = TestContext::new(&[]);
  t.repository.add_version("g:a:1.0.0", &["g:b:1.0.0"]);
  t.repository.add_version("g:b:1.0.0", &["g:a:1.0.0"]);

  let report = t
    .dependencies(64)
    .transitive_closure(&[gav("g:b:1.0.0")])
    .await
    .unwrap();

  assert!(report.valid);
  assert_eq!(report.dependencies, set(&["g:a:1.0.0", "g:b:1.0.0"]));
}

#[tokio::test]
async fn test_depth_cap() {
  let t = TestContext::new(&[]);
  t.repository.add_version("g:n1:1.0.0", &["g:n2:1.0.0"]);
  t.repository.add_version("g:n2:1.0.0", &["g:n3:1.0.0"]);
  t.repository.add_version("g:n3:1.0.0", &["g:n4:1.0.0"]);
  t.repository.add_version("g:n4:1.0.0", &[]);

  let direct = [gav("g:n1:1.0.0")];
  assert!(t.dependencies(4).transitive_closure(&direct).await.unwrap().valid);

  let report = t.dependencies(3).transitive_closure(&direct).await.unwrap();
  assert!(!report.valid);
  assert!(report.invalid_reason.unwrap().contains("deeper than 3"));
}

#[tokio::test]
async fn test_dependency_missing_upstream_is_invalid() {
  let t = TestContext::new(&[]);
  let report = t
    .dependencies(64)
    .transitive_closure(&[gav("g:ghost:1.0.0")])
    .await
    .unwrap();

  assert!(!report.valid);
  assert!(report.invalid_reason.unwrap().contains("does not exist upstream"));
}

#[tokio::test]
async fn test_repository_outage_is_an_error() {
  let t = TestContext::new(&[]);
  t.repository.add_version("g:b:1.0.0", &[]);
  t.repository.make_unavailable("g", "b");

  let result = t.dependencies(64).transitive_closure(&[gav("g:b:1.0.0")]).await;
  assert!(matches!(result, Err(DependencyError::Repository(_))));
}

#[tokio::test]
async fn test_update_cascades_through_snapshot_dependents() {
  let t = TestContext::new(&[]);
  store_version(&t, "g:core:1.0.0", &[], &[]).await;
  store_version(&t, "g:lib:master-SNAPSHOT", &["g:core:1.0.0"], &[]).await;
  store_version(&t, "g:mid:master-SNAPSHOT", &["g:lib:master-SNAPSHOT"], &[]).await;
  store_version(&t, "g:app:master-SNAPSHOT", &["g:mid:master-SNAPSHOT"], &[]).await;

  let updated = t
    .dependencies(64)
    .update_transitive_dependencies(&gav("g:lib:master-SNAPSHOT"))
    .await
    .unwrap();

  assert_eq!(
    updated,
    vec![
      gav("g:lib:master-SNAPSHOT"),
      gav("g:mid:master-SNAPSHOT"),
      gav("g:app:master-SNAPSHOT"),
    ]
  );
  let app = t.store.find_version(&gav("g:app:master-SNAPSHOT")).await.unwrap().unwrap();
  assert_eq!(
    app.transitive_dependencies_report.dependencies,
    set(&["g:core:1.0.0", "g:lib:master-SNAPSHOT", "g:mid:master-SNAPSHOT"])
  );
}

#[tokio::test]
async fn test_update_does_not_walk_release_dependents() {
  let t = TestContext::new(&[]);
  store_version(&t, "g:core:1.0.0", &[], &[]).await;
  store_version(&t, "g:lib:2.0.0", &["g:core:1.0.0"], &["g:core:1.0.0"]).await;

  let updated = t
    .dependencies(64)
    .update_transitive_dependencies(&gav("g:core:1.0.0"))
    .await
    .unwrap();

  assert_eq!(updated, vec![gav("g:core:1.0.0")]);
}

#[tokio::test]
async fn test_update_requires_stored_non_excluded_version() {
  let t = TestContext::new(&[]);
  let manager = t.dependencies(64);

  assert!(matches!(
    manager.update_transitive_dependencies(&gav("g:a:1.0.0")).await,
    Err(DependencyError::NotStored(_))
  ));

  let mut record = ProjectVersionRecord::new(&gav("g:a:1.0.0"));
  record.exclude("manual");
  t.store.save_version(&record).await.unwrap();
  assert!(matches!(
    manager.update_transitive_dependencies(&gav("g:a:1.0.0")).await,
    Err(DependencyError::Excluded(_))
  ));
}
