//! Coordinate and version validators.
//!
//! Pure predicates used as input guards before any mutation. Versions come in
//! three shapes:
//!
//! - release: strict `major.minor.patch`, immutable once published
//! - snapshot: anything ending in `-SNAPSHOT`, mutable and branch-associated
//! - alias: `latest` / `head`, resolved against a project record, never stored

use std::{cmp::Ordering, sync::LazyLock};

use regex::Regex;

pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";
pub const DEFAULT_BRANCH: &str = "master";

static GROUP_ID: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("group id pattern"));

static ARTIFACT_ID: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(-[A-Za-z0-9_]+)*$").expect("artifact id pattern"));

static RELEASE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)$").expect("release pattern"));

static BRANCH: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").expect("branch pattern"));

pub fn is_valid_group_id(group_id: &str) -> bool {
  GROUP_ID.is_match(group_id)
}

pub fn is_valid_artifact_id(artifact_id: &str) -> bool {
  ARTIFACT_ID.is_match(artifact_id)
}

/// Any string ending in the snapshot suffix with a non-empty branch part.
pub fn is_snapshot_version(version_id: &str) -> bool {
  version_id.len() > SNAPSHOT_SUFFIX.len() && version_id.ends_with(SNAPSHOT_SUFFIX)
}

/// Strict `N.N.N`, no qualifier.
pub fn is_valid_release_version(version_id: &str) -> bool {
  RELEASE.is_match(version_id)
}

/// `<branch>-SNAPSHOT` where the branch part is a plausible branch name.
pub fn is_branch_snapshot(version_id: &str) -> bool {
  branch_of(version_id).is_some_and(|branch| BRANCH.is_match(branch))
}

/// A release or a recognized branch snapshot.
pub fn is_valid(version_id: &str) -> bool {
  is_valid_release_version(version_id) || is_branch_snapshot(version_id)
}

/// The snapshot version tracking `branch`.
pub fn branch_snapshot(branch: &str) -> String {
  format!("{branch}{SNAPSHOT_SUFFIX}")
}

/// The branch part of a snapshot version.
pub fn branch_of(version_id: &str) -> Option<&str> {
  if !is_snapshot_version(version_id) {
    return None;
  }
  version_id.strip_suffix(SNAPSHOT_SUFFIX)
}

/// Semantic ordering of two release versions. `None` if either is not a release.
pub fn compare_releases(a: &str, b: &str) -> Option<Ordering> {
  if !is_valid_release_version(a) || !is_valid_release_version(b) {
    return None;
  }
  let a = semver::Version::parse(a).ok()?;
  let b = semver::Version::parse(b).ok()?;
  Some(a.cmp(&b))
}

/// Symbolic version names accepted by lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionAlias {
  /// The project's latest release
  Latest,
  /// The default branch snapshot
  Head,
}

impl VersionAlias {
  pub fn parse(value: &str) -> Option<Self> {
    match value {
      "latest" => Some(Self::Latest),
      "head" => Some(Self::Head),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Latest => "latest",
      Self::Head => "head",
    }
  }
}
