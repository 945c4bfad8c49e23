//! Error type for `roster-store`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
  /// A local check failed before any request was made.
  #[error(transparent)]
  Core(#[from] roster_core::Error),

  /// The backend rejected or failed the request.
  #[error("{0}")]
  Gateway(Box<dyn std::error::Error + Send + Sync>),

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },
}

impl StoreError {
  pub(crate) fn gateway(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Gateway(Box::new(e))
  }

  /// Whether the backend was contacted.
  pub fn is_remote(&self) -> bool { matches!(self, Self::Gateway(_)) }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
