//! Client tests against a mock backend and the document-generation stub,
//! both served on ephemeral ports.

use axum::{
  Json, Router,
  extract::{Path, Query},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use roster_core::{
  document::{DocumentContext, GENERATE_SOURCE_DOCUMENT, GenerateDocumentRequest},
  gateway::{AuthProvider, DocumentGenerator, Filter, Gateway, Select, Table},
  user::AuthEvent,
};
use roster_docgen::{AppState, DocgenConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{BaasConfig, Error, Supabase};

const ANON: &str = "anon-key";
const USER_ID: &str = "5f0c6f3e-8a2b-4c2e-9d1a-0b7c2f4e6a11";

// ─── Mock backend ────────────────────────────────────────────────────────────

type Params = Query<Vec<(String, String)>>;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
  headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

fn bearer(headers: &HeaderMap) -> Option<String> {
  header(headers, "authorization").and_then(|v| v.strip_prefix("Bearer ").map(str::to_owned))
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
  params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn user_json() -> Value {
  json!({ "id": USER_ID, "email": "anna@ngo.pl", "user_metadata": { "full_name": "Anna Nowak" } })
}

fn token_json(access_token: &str, expires_in: i64, refresh_token: &str) -> Value {
  json!({
    "access_token": access_token,
    "token_type": "bearer",
    "expires_in": expires_in,
    "refresh_token": refresh_token,
    "user": user_json(),
  })
}

async fn token(Query(params): Params, headers: HeaderMap, Json(body): Json<Value>) -> Response {
  if header(&headers, "apikey").as_deref() != Some(ANON) {
    let body = json!({ "message": "No API key found in request" });
    return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
  }
  let grant = match param(&params, "grant_type") {
    Some("password") if body["password"] == "secret" => {
      // `stale` sessions expire immediately; `revoked` ones cannot be refreshed.
      match body["email"].as_str() {
        Some("stale@ngo.pl") => Some(token_json("user-token", -10, "r1")),
        Some("revoked@ngo.pl") => Some(token_json("user-token", 30, "r-revoked")),
        _ => Some(token_json("user-token", 3600, "r1")),
      }
    }
    Some("refresh_token") if body["refresh_token"] == "r1" => {
      Some(token_json("refreshed-token", 3600, "r1"))
    }
    _ => None,
  };
  match grant {
    Some(token) => Json(token).into_response(),
    None => {
      let body = json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" });
      (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
  }
}

fn known_token(headers: &HeaderMap) -> bool {
  matches!(bearer(headers).as_deref(), Some("user-token" | "recovery-token"))
}

async fn get_user(headers: HeaderMap) -> Response {
  if known_token(&headers) {
    Json(user_json()).into_response()
  } else {
    (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response()
  }
}

async fn put_user(headers: HeaderMap, Json(body): Json<Value>) -> Response {
  if !known_token(&headers) || !body["password"].is_string() {
    return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response();
  }
  Json(user_json()).into_response()
}

async fn recover(Query(params): Params, Json(body): Json<Value>) -> StatusCode {
  if param(&params, "redirect_to").is_some() && body["email"].is_string() {
    StatusCode::OK
  } else {
    StatusCode::BAD_REQUEST
  }
}

async fn rest_get(Path(table): Path<String>, Query(params): Params, headers: HeaderMap) -> Response {
  match table.as_str() {
    "persons" => Json(json!([{
      "params": params,
      "auth":   bearer(&headers),
      "apikey": header(&headers, "apikey"),
    }]))
    .into_response(),
    "contracts" => Json(json!([{ "id": 1 }, { "id": 2 }])).into_response(),
    "user_roles" => Json(json!([])).into_response(),
    _ => {
      let message = format!("permission denied for table {table}");
      (StatusCode::UNAUTHORIZED, Json(json!({ "code": "42501", "message": message }))).into_response()
    }
  }
}

async fn rest_insert(Query(params): Params, headers: HeaderMap, Json(mut body): Json<Value>) -> Response {
  let prefer = header(&headers, "prefer");
  if prefer.as_deref() != Some("return=representation") || param(&params, "select").is_none() {
    return StatusCode::BAD_REQUEST.into_response();
  }
  body["id"] = json!(Uuid::new_v4());
  body["created_at"] = json!("2026-01-01T00:00:00Z");
  body["updated_at"] = json!("2026-01-01T00:00:00Z");
  (StatusCode::CREATED, Json(body)).into_response()
}

async fn rest_update(Query(params): Params, Json(mut body): Json<Value>) -> Response {
  let Some(id) = param(&params, "id").and_then(|v| v.strip_prefix("eq.")) else {
    return StatusCode::BAD_REQUEST.into_response();
  };
  body["id"] = json!(id);
  Json(body).into_response()
}

async fn rest_delete(Query(params): Params) -> StatusCode {
  if param(&params, "id").is_some_and(|v| v.starts_with("eq.")) {
    StatusCode::NO_CONTENT
  } else {
    StatusCode::BAD_REQUEST
  }
}

fn backend() -> Router {
  Router::new()
    .route("/auth/v1/token", post(token))
    .route("/auth/v1/user", get(get_user).put(put_user))
    .route("/auth/v1/logout", post(|| async { StatusCode::NO_CONTENT }))
    .route("/auth/v1/recover", post(recover))
    .route(
      "/rest/v1/{table}",
      get(rest_get).post(rest_insert).patch(rest_update).delete(rest_delete),
    )
}

async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
  format!("http://{addr}")
}

async fn client() -> Supabase {
  let url = serve(backend()).await;
  Supabase::new(BaasConfig { url, anon_key: ANON.into(), functions_url: None }).unwrap()
}

#[derive(Debug, Deserialize)]
struct Echo {
  params: Vec<(String, String)>,
  auth:   Option<String>,
  apikey: Option<String>,
}

async fn echo(client: &Supabase) -> Echo {
  client.select::<Echo>(Select::from(Table::Persons)).await.unwrap().remove(0)
}

// ─── Table access ────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_sends_postgrest_params() {
  let client = client().await;
  let query = Select::from(Table::Persons).eq("email", "a@b.pl").newest_first().limit(5);
  let echo = client.select::<Echo>(query).await.unwrap().remove(0);

  let params: Vec<(&str, &str)> = echo.params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
  assert_eq!(params, vec![
    ("select", "*"),
    ("email", "eq.a@b.pl"),
    ("order", "created_at.desc"),
    ("limit", "5"),
  ]);
  assert_eq!(echo.apikey.as_deref(), Some(ANON));
}

#[tokio::test]
async fn maybe_single_distinguishes_zero_one_and_many() {
  let client = client().await;

  let none = client.maybe_single::<Value>(Select::from(Table::UserRoles)).await.unwrap();
  assert_eq!(none, None);

  let one = client.maybe_single::<Echo>(Select::from(Table::Persons)).await.unwrap();
  assert!(one.is_some());

  let many = client.maybe_single::<Value>(Select::from(Table::Contracts)).await;
  assert!(matches!(many, Err(Error::MultipleRows(2))));
}

#[tokio::test]
async fn insert_update_delete_round_trip() {
  let client = client().await;

  let inserted: Value = client
    .insert(Table::Persons, &json!({ "firstname": "Jan" }), "*")
    .await
    .unwrap();
  assert_eq!(inserted["firstname"], "Jan");
  let id = inserted["id"].as_str().unwrap().to_owned();

  let updated: Value = client
    .update(Table::Persons, Filter::eq("id", &id), &json!({ "phone": "600" }), "*")
    .await
    .unwrap();
  assert_eq!(updated["id"], id.as_str());
  assert_eq!(updated["phone"], "600");

  client.delete(Table::Persons, Filter::eq("id", &id)).await.unwrap();
}

#[tokio::test]
async fn backend_errors_carry_status_and_message() {
  let client = client().await;
  let err = client
    .select::<Value>(Select::from(Table::DocumentTemplates))
    .await
    .unwrap_err();
  assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
  assert_eq!(err.to_string(), "permission denied for table document_templates");
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_token_replaces_anon_key_while_signed_in() {
  let client = client().await;
  let mut events = client.subscribe();

  assert_eq!(echo(&client).await.auth.as_deref(), Some(ANON));

  let session = client.sign_in_with_password("anna@ngo.pl", "secret").await.unwrap();
  assert_eq!(session.user.id.to_string(), USER_ID);
  assert_eq!(session.user.user_metadata.full_name.as_deref(), Some("Anna Nowak"));
  assert_eq!(events.recv().await, Some(AuthEvent::SignedIn(session.clone())));
  assert_eq!(echo(&client).await.auth.as_deref(), Some("user-token"));
  assert_eq!(client.get_session().await.unwrap(), Some(session));

  client.sign_out().await.unwrap();
  assert_eq!(events.recv().await, Some(AuthEvent::SignedOut));
  assert_eq!(client.get_session().await.unwrap(), None);
  assert_eq!(echo(&client).await.auth.as_deref(), Some(ANON));
}

#[tokio::test]
async fn bad_credentials_leave_no_session() {
  let client = client().await;
  let err = client.sign_in_with_password("anna@ngo.pl", "nope").await.unwrap_err();
  assert_eq!(err.to_string(), "Invalid login credentials");
  assert_eq!(client.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn expired_session_is_refreshed_on_read() {
  let client = client().await;
  client.sign_in_with_password("stale@ngo.pl", "secret").await.unwrap();
  let mut events = client.subscribe();

  let session = client.get_session().await.unwrap().unwrap();
  assert_eq!(session.access_token, "refreshed-token");
  assert!(matches!(events.recv().await, Some(AuthEvent::TokenRefreshed(_))));
}

#[tokio::test]
async fn expired_session_is_refreshed_before_table_requests() {
  let client = client().await;
  client.sign_in_with_password("stale@ngo.pl", "secret").await.unwrap();
  let mut events = client.subscribe();

  assert_eq!(echo(&client).await.auth.as_deref(), Some("refreshed-token"));
  assert!(matches!(events.recv().await, Some(AuthEvent::TokenRefreshed(_))));

  // Now fresh: no second grant.
  assert_eq!(echo(&client).await.auth.as_deref(), Some("refreshed-token"));
  assert_eq!(
    client.get_session().await.unwrap().map(|s| s.access_token).as_deref(),
    Some("refreshed-token")
  );
}

#[tokio::test]
async fn failed_refresh_signs_out() {
  let client = client().await;
  client.sign_in_with_password("revoked@ngo.pl", "secret").await.unwrap();
  let mut events = client.subscribe();

  // Within the refresh margin, so the request tries a grant that is rejected.
  assert_eq!(echo(&client).await.auth.as_deref(), Some(ANON));
  assert_eq!(events.recv().await, Some(AuthEvent::SignedOut));
  assert_eq!(client.get_session().await.unwrap(), None);
}

#[tokio::test]
async fn recovery_flow_uses_the_recovery_token() {
  let client = client().await;
  client
    .reset_password_for_email("anna@ngo.pl", "http://localhost/reset-password")
    .await
    .unwrap();

  let user = client.get_user("recovery-token").await.unwrap();
  assert_eq!(user.email.as_deref(), Some("anna@ngo.pl"));
  let updated = client.update_password("recovery-token", "new-secret").await.unwrap();
  assert_eq!(updated.id, user.id);

  let err = client.get_user("forged").await.unwrap_err();
  assert_eq!(err.to_string(), "invalid JWT");
}

// ─── Document generation ─────────────────────────────────────────────────────

fn sample_request(action: &str) -> GenerateDocumentRequest {
  GenerateDocumentRequest {
    action:     action.to_owned(),
    user_email: "admin@ngo.pl".into(),
    ctx:        DocumentContext {
      person:   json!({ "firstName": "Jan", "lastName": "Kowalski", "email": "jan@ngo.pl" }),
      contract: json!({ "templateId": "t1", "startDate": "2026-01-01", "customFields": {} }),
    },
  }
}

async fn docgen_client() -> Supabase {
  let config = DocgenConfig { delay_ms: 0, ..DocgenConfig::default() };
  let functions_url = serve(roster_docgen::router(AppState::new(config))).await;
  let url = serve(backend()).await;
  Supabase::new(BaasConfig { url, anon_key: ANON.into(), functions_url: Some(functions_url) }).unwrap()
}

#[tokio::test]
async fn generate_document_against_stub() {
  let client = docgen_client().await;
  let resp = client.generate(&sample_request(GENERATE_SOURCE_DOCUMENT)).await.unwrap();
  assert_eq!(resp.source_document_url, "https://example.com/documents/contract.pdf");
  assert_eq!(resp.files[0].name, "Contract.pdf");
}

#[tokio::test]
async fn generate_document_rejection_surfaces_error_message() {
  let client = docgen_client().await;
  let err = client.generate(&sample_request("render")).await.unwrap_err();
  assert_eq!(err.status(), Some(reqwest::StatusCode::BAD_REQUEST));
  assert_eq!(err.to_string(), "Invalid action");
}
