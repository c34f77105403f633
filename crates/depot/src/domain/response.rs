//! Structured result of every pipeline operation.

use serde::{Deserialize, Serialize};

/// Informational messages plus failure indicators.
///
/// `has_errors` is the single success check callers make.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
  pub messages: Vec<String>,
  pub errors: Vec<String>,
}

impl RefreshResponse {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_error(error: impl Into<String>) -> Self {
    let mut response = Self::new();
    response.add_error(error);
    response
  }

  pub fn with_message(message: impl Into<String>) -> Self {
    let mut response = Self::new();
    response.add_message(message);
    response
  }

  pub fn add_message(&mut self, message: impl Into<String>) {
    self.messages.push(message.into());
  }

  pub fn add_error(&mut self, error: impl Into<String>) {
    self.errors.push(error.into());
  }

  pub fn has_errors(&self) -> bool {
    !self.errors.is_empty()
  }

  /// Fold another response's messages and errors into this one.
  pub fn merge(&mut self, other: RefreshResponse) {
    self.messages.extend(other.messages);
    self.errors.extend(other.errors);
  }
}

impl FromIterator<RefreshResponse> for RefreshResponse {
  fn from_iter<I: IntoIterator<Item = RefreshResponse>>(iter: I) -> Self {
    let mut combined = Self::new();
    for response in iter {
      combined.merge(response);
    }
    combined
  }
}
