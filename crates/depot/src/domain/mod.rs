//! Domain types - core business entities
//!
//! This module contains the canonical domain types used throughout the depot.
//! These types represent the refresh pipeline's data model and are independent
//! of the store, the upstream repository, and the queue.

pub mod config;
pub mod coordinate;
pub mod notification;
pub mod project;
pub mod response;
pub mod version;
