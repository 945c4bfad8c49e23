//! Stand-in for the hosted document-generation function.
//!
//! Accepts the `generateSourceDocument` action and, after a configurable
//! delay, answers with placeholder document URLs. No template is rendered.
//!
//! | Method    | Path                 | Notes |
//! |-----------|----------------------|-------|
//! | `OPTIONS` | `/generate-document` | CORS preflight, answers `ok` |
//! | `POST`    | `/generate-document` | Body: [`GenerateDocumentRequest`] |

pub mod config;
pub mod error;

pub use config::DocgenConfig;
pub use error::{Error, Result};

use std::{sync::Arc, time::Duration};

use axum::{
  Json, Router,
  extract::{State, rejection::JsonRejection},
  http::{HeaderMap, HeaderName, HeaderValue, Method, header},
  response::IntoResponse,
  routing::post,
};
use roster_core::document::{
  GENERATE_SOURCE_DOCUMENT, GenerateDocumentRequest, GenerateDocumentResponse,
  GeneratedFile,
};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::{info, warn};

pub const GENERATED_FILE_NAME: &str = "Contract.pdf";

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

// ─── Application state ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<DocgenConfig>,
}

impl AppState {
  pub fn new(config: DocgenConfig) -> Self { Self { config: Arc::new(config) } }
}

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::POST, Method::OPTIONS])
    .allow_headers([
      header::AUTHORIZATION,
      header::CONTENT_TYPE,
      HeaderName::from_static("apikey"),
      HeaderName::from_static("x-client-info"),
    ]);

  Router::new()
    .route("/generate-document", post(generate).options(preflight))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn preflight() -> impl IntoResponse {
  (
    [
      (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
      (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS)),
    ],
    "ok",
  )
}

/// `POST /generate-document`
async fn generate(
  State(state): State<AppState>,
  headers: HeaderMap,
  body: Result<Json<GenerateDocumentRequest>, JsonRejection>,
) -> Result<Json<GenerateDocumentResponse>> {
  check_api_key(&headers, state.config.api_key.as_deref())?;

  let Json(request) = body.map_err(|e| Error::BadRequest(e.body_text()))?;
  if request.action != GENERATE_SOURCE_DOCUMENT {
    warn!(action = %request.action, "rejected document request");
    return Err(Error::InvalidAction(request.action));
  }

  info!(user = %request.user_email, "generating source document");
  tokio::time::sleep(Duration::from_millis(state.config.delay_ms)).await;

  let url = state.config.document_url.clone();
  Ok(Json(GenerateDocumentResponse {
    source_document_url: url.clone(),
    files:               vec![GeneratedFile { name: GENERATED_FILE_NAME.to_owned(), url }],
  }))
}

/// Accept the key either as the `apikey` header or as a bearer token.
fn check_api_key(headers: &HeaderMap, expected: Option<&str>) -> Result<()> {
  let Some(expected) = expected else {
    return Ok(());
  };
  let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
  let bearer = header_str("authorization").and_then(|v| v.strip_prefix("Bearer "));

  if header_str("apikey") == Some(expected) || bearer == Some(expected) {
    Ok(())
  } else {
    Err(Error::Unauthorized)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt;

  fn state(api_key: Option<&str>) -> AppState {
    AppState::new(DocgenConfig {
      delay_ms: 0,
      api_key: api_key.map(str::to_owned),
      ..DocgenConfig::default()
    })
  }

  async fn send(
    state: AppState,
    method: &str,
    headers: Vec<(&str, &str)>,
    body: &str,
  ) -> (StatusCode, HeaderMap, String) {
    let mut builder = Request::builder().method(method).uri("/generate-document");
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
  }

  fn request_body(action: &str) -> String {
    json!({
      "action": action,
      "userEmail": "admin@ngo.pl",
      "ctx": { "person": { "firstName": "Jan" }, "contract": { "templateId": "t1" } },
    })
    .to_string()
  }

  const JSON: (&str, &str) = ("content-type", "application/json");

  #[tokio::test]
  async fn options_answers_ok_with_cors_headers() {
    let (status, headers, body) = send(state(None), "OPTIONS", vec![], "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    let allowed = headers.get("access-control-allow-headers").unwrap().to_str().unwrap();
    assert!(allowed.contains("apikey"), "allowed headers: {allowed}");
  }

  #[tokio::test]
  async fn generate_returns_placeholder_document() {
    let (status, _, body) =
      send(state(None), "POST", vec![JSON], &request_body(GENERATE_SOURCE_DOCUMENT)).await;
    assert_eq!(status, StatusCode::OK);

    let resp: GenerateDocumentResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(resp.source_document_url, config::DEFAULT_DOCUMENT_URL);
    assert_eq!(resp.files.len(), 1);
    assert_eq!(resp.files[0].name, "Contract.pdf");
    assert_eq!(resp.files[0].url, resp.source_document_url);
  }

  #[tokio::test]
  async fn unknown_action_is_a_400_with_error_body() {
    let (status, _, body) = send(state(None), "POST", vec![JSON], &request_body("render")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["error"], "Invalid action");
  }

  #[tokio::test]
  async fn malformed_body_is_a_400() {
    let (status, _, body) = send(state(None), "POST", vec![JSON], "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert!(v["error"].is_string());
  }

  #[tokio::test]
  async fn api_key_is_enforced_when_configured() {
    let body = request_body(GENERATE_SOURCE_DOCUMENT);

    let (status, _, _) = send(state(Some("k1")), "POST", vec![JSON], &body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) =
      send(state(Some("k1")), "POST", vec![JSON, ("apikey", "k1")], &body).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) =
      send(state(Some("k1")), "POST", vec![JSON, ("authorization", "Bearer k1")], &body).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn responses_carry_cors_origin() {
    let (_, headers, _) = send(
      state(None),
      "POST",
      vec![JSON, ("origin", "http://localhost:5173")],
      &request_body(GENERATE_SOURCE_DOCUMENT),
    )
    .await;
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
  }
}
