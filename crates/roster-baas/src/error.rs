use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The backend answered with a non-success status.
  #[error("{message}")]
  Api { status: StatusCode, message: String },

  #[error("expected at most one row, got {0}")]
  MultipleRows(usize),

  #[error("failed to decode response: {0}")]
  Decode(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Build an [`Error::Api`] from a failed response body. PostgREST, the auth
  /// server and edge functions each name the message field differently.
  pub fn api(status: StatusCode, body: &str) -> Self {
    let message = serde_json::from_str::<Value>(body)
      .ok()
      .and_then(|v| {
        ["message", "error_description", "msg", "error"]
          .iter()
          .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_owned))
      })
      .or_else(|| Some(body.trim().to_owned()).filter(|b| !b.is_empty()))
      .unwrap_or_else(|| status.to_string());
    Self::Api { status, message }
  }

  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::Api { status, .. } => Some(*status),
      Self::Http(e) => e.status(),
      _ => None,
    }
  }
}
