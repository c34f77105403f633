//! Unified error type for service operations.
//!
//! Every layer keeps its own error enum; [`ServiceError`] aggregates them so
//! the refresh handler can turn any failure into a response error at its
//! boundary.

use crate::{
  actor::queue::QueueError, db::StoreError, repository::RepositoryError, service::dependency::DependencyError,
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
  /// Item was not found in the store or upstream.
  #[error("{item_type} not found: {id}")]
  NotFound { item_type: &'static str, id: String },
  /// Input validation failed. Nothing was mutated.
  #[error("Validation error: {0}")]
  Validation(String),
  /// The coordinate is registered under another project id.
  #[error("Conflict: {0}")]
  Conflict(String),
  /// Missing or inconsistent configuration, e.g. an unregistered artifact type.
  #[error("Configuration error: {0}")]
  Config(String),
  #[error("Store error: {0}")]
  Store(#[from] StoreError),
  #[error("Repository error: {0}")]
  Repository(#[from] RepositoryError),
  #[error("Dependency error: {0}")]
  Dependency(#[from] DependencyError),
  #[error("Queue error: {0}")]
  Queue(#[from] QueueError),
}

impl ServiceError {
  pub fn not_found(item_type: &'static str, id: impl Into<String>) -> Self {
    Self::NotFound {
      item_type,
      id: id.into(),
    }
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }

  pub fn conflict(msg: impl Into<String>) -> Self {
    Self::Conflict(msg.into())
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }

  /// Infrastructure failures, as opposed to rejected input.
  pub fn is_infrastructure(&self) -> bool {
    matches!(self, Self::Store(_) | Self::Repository(_) | Self::Queue(_))
  }
}
