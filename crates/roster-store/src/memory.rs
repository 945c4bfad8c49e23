//! In-memory gateway, auth provider and document generator for tests.
//!
//! Rows are kept as raw JSON exactly as the backend would store them, so the
//! wire mapping is exercised end to end. Every request bumps a counter.
//! Available to other crates with the `testing` feature.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering},
  },
};

use chrono::{Duration, SecondsFormat, Utc};
use roster_core::{
  document::{GenerateDocumentRequest, GenerateDocumentResponse, GeneratedFile},
  gateway::{
    AuthProvider, AuthSubscription, DocumentGenerator, Filter, Gateway, Select, Table,
  },
  user::{AuthEvent, AuthUser, Session, UserMetadata},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MemoryError(pub String);

type Rows = Vec<Map<String, Value>>;

#[derive(Default)]
pub struct MemoryGateway {
  tables:     Mutex<HashMap<Table, Rows>>,
  auth_users: Mutex<HashMap<Uuid, Value>>,
  calls:      AtomicUsize,
  fail:       AtomicBool,
  clock:      AtomicI64,
}

impl MemoryGateway {
  pub fn new() -> Self { Self::default() }

  /// Number of requests made so far.
  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  /// Make every following request fail.
  pub fn fail_requests(&self, fail: bool) { self.fail.store(fail, Ordering::SeqCst); }

  /// Register an auth user for `users:user_id(...)` embeds.
  pub fn add_auth_user(&self, id: Uuid, email: &str, full_name: Option<&str>) {
    let meta = full_name.map(|n| json!({ "full_name": n }));
    self
      .auth_users
      .lock()
      .unwrap()
      .insert(id, json!({ "email": email, "raw_user_meta_data": meta }));
  }

  /// Insert a raw row without counting it as a request.
  pub fn seed(&self, table: Table, row: Value) {
    let Value::Object(row) = row else { panic!("row must be an object") };
    self.tables.lock().unwrap().entry(table).or_default().push(row);
  }

  fn begin(&self) -> Result<(), MemoryError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.fail.load(Ordering::SeqCst) {
      return Err(MemoryError("connection refused".into()));
    }
    Ok(())
  }

  // Strictly increasing timestamps so ordering by creation is deterministic.
  fn now(&self) -> String {
    let tick = self.clock.fetch_add(1, Ordering::SeqCst);
    (Utc::now() + Duration::microseconds(tick)).to_rfc3339_opts(SecondsFormat::Micros, true)
  }

  fn matches(row: &Map<String, Value>, filters: &[Filter]) -> bool {
    filters.iter().all(|Filter::Eq { column, value }| match row.get(*column) {
      Some(Value::String(s)) => s == value,
      Some(other) => other.to_string() == *value,
      None => false,
    })
  }

  fn embed(&self, columns: &str, mut row: Map<String, Value>) -> Value {
    if columns.contains("person:persons") {
      let person = {
        let tables = self.tables.lock().unwrap();
        let persons = tables.get(&Table::Persons);
        row.get("person_id").and_then(|id| {
          persons?.iter().find(|p| p.get("id") == Some(id)).cloned()
        })
      };
      row.insert("person".into(), person.map(Value::Object).unwrap_or(Value::Null));
    }
    if columns.contains("users:user_id") {
      let user_id = row
        .get("user_id")
        .and_then(Value::as_str)
        .and_then(|id| id.parse::<Uuid>().ok());
      let user = {
        let users = self.auth_users.lock().unwrap();
        user_id.and_then(|id| users.get(&id).cloned())
      };
      row.insert("users".into(), user.unwrap_or(Value::Null));
    }
    Value::Object(row)
  }

  fn decode<T: DeserializeOwned>(value: Value) -> Result<T, MemoryError> {
    serde_json::from_value(value).map_err(|e| MemoryError(e.to_string()))
  }

  fn to_object<B: Serialize>(body: &B) -> Result<Map<String, Value>, MemoryError> {
    match serde_json::to_value(body).map_err(|e| MemoryError(e.to_string()))? {
      Value::Object(map) => Ok(map),
      _ => Err(MemoryError("body must be an object".into())),
    }
  }

  fn query(&self, query: &Select) -> Vec<Map<String, Value>> {
    let tables = self.tables.lock().unwrap();
    let mut rows: Rows = tables
      .get(&query.table)
      .map(|rows| {
        rows.iter().filter(|r| Self::matches(r, &query.filters)).cloned().collect()
      })
      .unwrap_or_default();
    if let Some(order) = query.order {
      rows.sort_by(|a, b| {
        let key = |r: &Map<String, Value>| r.get(order.column).map(Value::to_string);
        let ord = key(a).cmp(&key(b));
        if order.ascending { ord } else { ord.reverse() }
      });
    }
    if let Some(limit) = query.limit {
      rows.truncate(limit);
    }
    rows
  }
}

impl Gateway for MemoryGateway {
  type Error = MemoryError;

  async fn select<T>(&self, query: Select) -> Result<Vec<T>, MemoryError>
  where
    T: DeserializeOwned + Send + 'static,
  {
    self.begin()?;
    self
      .query(&query)
      .into_iter()
      .map(|row| Self::decode(self.embed(query.columns, row)))
      .collect()
  }

  async fn maybe_single<T>(&self, query: Select) -> Result<Option<T>, MemoryError>
  where
    T: DeserializeOwned + Send + 'static,
  {
    self.begin()?;
    self
      .query(&query)
      .into_iter()
      .next()
      .map(|row| Self::decode(self.embed(query.columns, row)))
      .transpose()
  }

  async fn insert<B, T>(
    &self,
    table: Table,
    body: &B,
    columns: &'static str,
  ) -> Result<T, MemoryError>
  where
    B: Serialize + Sync,
    T: DeserializeOwned + Send + 'static,
  {
    self.begin()?;
    let mut row = Self::to_object(body)?;
    let now = self.now();
    row.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    row.insert("created_at".into(), Value::String(now.clone()));
    row.insert("updated_at".into(), Value::String(now));
    self.tables.lock().unwrap().entry(table).or_default().push(row.clone());
    Self::decode(self.embed(columns, row))
  }

  async fn update<B, T>(
    &self,
    table: Table,
    filter: Filter,
    body: &B,
    columns: &'static str,
  ) -> Result<T, MemoryError>
  where
    B: Serialize + Sync,
    T: DeserializeOwned + Send + 'static,
  {
    self.begin()?;
    let patch = Self::to_object(body)?;
    let now = self.now();
    let updated = {
      let mut tables = self.tables.lock().unwrap();
      let row = tables
        .get_mut(&table)
        .and_then(|rows| {
          rows.iter_mut().find(|r| Self::matches(r, std::slice::from_ref(&filter)))
        })
        .ok_or_else(|| MemoryError("JSON object requested, multiple (or no) rows returned".into()))?;
      row.extend(patch);
      row.insert("updated_at".into(), Value::String(now));
      row.clone()
    };
    Self::decode(self.embed(columns, updated))
  }

  async fn delete(&self, table: Table, filter: Filter) -> Result<(), MemoryError> {
    self.begin()?;
    if let Some(rows) = self.tables.lock().unwrap().get_mut(&table) {
      rows.retain(|r| !Self::matches(r, std::slice::from_ref(&filter)));
    }
    Ok(())
  }
}

/// Answers like the generation stub: one placeholder PDF.
pub const GENERATED_DOCUMENT_URL: &str = "https://example.com/documents/contract.pdf";

impl DocumentGenerator for MemoryGateway {
  type Error = MemoryError;

  async fn generate(
    &self,
    _request: &GenerateDocumentRequest,
  ) -> Result<GenerateDocumentResponse, MemoryError> {
    self.begin()?;
    Ok(GenerateDocumentResponse {
      source_document_url: GENERATED_DOCUMENT_URL.to_owned(),
      files:               vec![GeneratedFile {
        name: "Contract.pdf".to_owned(),
        url:  GENERATED_DOCUMENT_URL.to_owned(),
      }],
    })
  }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Accepts any registered email with the password `"secret"`.
pub struct MemoryAuth {
  users:   Mutex<HashMap<String, AuthUser>>,
  session: Mutex<Option<Session>>,
  events:  broadcast::Sender<AuthEvent>,
}

impl Default for MemoryAuth {
  fn default() -> Self { Self::new() }
}

impl MemoryAuth {
  pub fn new() -> Self {
    let (events, _) = broadcast::channel(16);
    Self { users: Mutex::default(), session: Mutex::default(), events }
  }

  pub fn register(&self, email: &str, full_name: Option<&str>) -> AuthUser {
    let user = AuthUser {
      id:            Uuid::new_v4(),
      email:         Some(email.to_owned()),
      user_metadata: UserMetadata {
        full_name:  full_name.map(str::to_owned),
        avatar_url: None,
      },
    };
    self.users.lock().unwrap().insert(email.to_owned(), user.clone());
    user
  }

  fn session_for(user: &AuthUser) -> Session {
    Session {
      access_token:  format!("token-{}", user.id),
      refresh_token: None,
      expires_at:    None,
      user:          user.clone(),
    }
  }
}

impl AuthProvider for MemoryAuth {
  type Error = MemoryError;

  async fn get_session(&self) -> Result<Option<Session>, MemoryError> {
    Ok(self.session.lock().unwrap().clone())
  }

  async fn sign_in_with_password(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Session, MemoryError> {
    let user = self
      .users
      .lock()
      .unwrap()
      .get(email)
      .cloned()
      .filter(|_| password == "secret")
      .ok_or_else(|| MemoryError("Invalid login credentials".into()))?;
    let session = Self::session_for(&user);
    *self.session.lock().unwrap() = Some(session.clone());
    let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
    Ok(session)
  }

  async fn sign_out(&self) -> Result<(), MemoryError> {
    *self.session.lock().unwrap() = None;
    let _ = self.events.send(AuthEvent::SignedOut);
    Ok(())
  }

  async fn reset_password_for_email(
    &self,
    _email: &str,
    _redirect_to: &str,
  ) -> Result<(), MemoryError> {
    Ok(())
  }

  async fn update_password(
    &self,
    access_token: &str,
    _password: &str,
  ) -> Result<AuthUser, MemoryError> {
    self.get_user(access_token).await
  }

  async fn get_user(&self, access_token: &str) -> Result<AuthUser, MemoryError> {
    self
      .users
      .lock()
      .unwrap()
      .values()
      .find(|u| format!("token-{}", u.id) == access_token)
      .cloned()
      .ok_or_else(|| MemoryError("invalid token".into()))
  }

  fn subscribe(&self) -> AuthSubscription { AuthSubscription::new(self.events.subscribe()) }
}
