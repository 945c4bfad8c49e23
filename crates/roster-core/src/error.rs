//! Error types for `roster-core`.

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

/// Field-level validation messages keyed by form field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Error)]
pub enum Error {
  /// One or more form fields failed local validation.
  #[error("validation failed: {}", summarize(.0))]
  Validation(FieldErrors),

  #[error("Start date is required")]
  MissingStartDate,

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("invalid date {0:?}; expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("contract status {from} cannot move to {to}")]
  InvalidTransition { from: String, to: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

fn summarize(errors: &FieldErrors) -> String {
  errors.values().cloned().collect::<Vec<_>>().join("; ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
