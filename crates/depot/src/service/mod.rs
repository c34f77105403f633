//! Refresh pipeline services.
//!
//! - [`refresh`] - Per-event refresh state machine
//! - [`dependency`] - Direct and transitive dependency resolution
//! - [`bulk`] - Bulk orchestration over projects
//! - [`lease`] - Lease acquisition and reaping
//! - [`admin`] - Exclusion, eviction and alias lookup

pub mod admin;
pub mod bulk;
pub mod context;
pub mod dependency;
pub mod lease;
pub mod refresh;
pub mod stats;
pub mod util;
