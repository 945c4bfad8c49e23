//! Error type and axum `IntoResponse` implementation.
//!
//! Every failure is answered with `{"error": "<message>"}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use roster_core::document::ErrorBody;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Invalid action")]
  InvalidAction(String),
  #[error("{0}")]
  BadRequest(String),
  #[error("Unauthorized")]
  Unauthorized,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::InvalidAction(_) | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let body = ErrorBody { error: self.to_string() };
    (self.status(), Json(body)).into_response()
  }
}
