//! Queue consumers and background tasks.
//!
//! - [`queue`] - Work queue contract and the in-process channel queue
//! - [`worker`] - Refresh workers draining the queue
//! - [`scheduler`] - Lease reaping and store snapshots

pub mod queue;
pub mod scheduler;
pub mod worker;
