//! The remote backend abstractions: table access, auth and document
//! generation.
//!
//! The traits are implemented over HTTP by `roster-baas`. Stores in
//! `roster-store` depend only on these traits, never on a concrete client, so
//! they can be exercised against an in-memory double.
//!
//! All methods return `Send` futures so the traits can be used from a
//! multi-threaded tokio runtime.

use std::future::Future;

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::broadcast;

use crate::{
  document::{GenerateDocumentRequest, GenerateDocumentResponse},
  user::{AuthEvent, AuthUser, Session},
};

// ─── Tables ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  Persons,
  Contracts,
  DocumentTemplates,
  UserRoles,
}

impl Table {
  pub fn name(self) -> &'static str {
    match self {
      Self::Persons => "persons",
      Self::Contracts => "contracts",
      Self::DocumentTemplates => "document_templates",
      Self::UserRoles => "user_roles",
    }
  }
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// A row filter. Only equality is needed by any caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
  Eq { column: &'static str, value: String },
}

impl Filter {
  pub fn eq(column: &'static str, value: impl ToString) -> Self {
    Self::Eq { column, value: value.to_string() }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
  pub column:    &'static str,
  pub ascending: bool,
}

/// Parameters of a `select`, built fluently:
///
/// ```
/// use roster_core::gateway::{Select, Table};
/// let q = Select::from(Table::Persons).newest_first();
/// assert_eq!(q.columns, "*");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
  pub table:   Table,
  pub columns: &'static str,
  pub filters: Vec<Filter>,
  pub order:   Option<Order>,
  pub limit:   Option<usize>,
}

impl Select {
  pub fn from(table: Table) -> Self {
    Self { table, columns: "*", filters: Vec::new(), order: None, limit: None }
  }

  pub fn columns(mut self, columns: &'static str) -> Self {
    self.columns = columns;
    self
  }

  pub fn eq(mut self, column: &'static str, value: impl ToString) -> Self {
    self.filters.push(Filter::eq(column, value));
    self
  }

  pub fn order(mut self, column: &'static str, ascending: bool) -> Self {
    self.order = Some(Order { column, ascending });
    self
  }

  /// `order by created_at desc`, the default for every list fetch.
  pub fn newest_first(self) -> Self { self.order("created_at", false) }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Table-style access to the hosted database.
///
/// Bodies and rows are wire (snake_case) types from [`crate::wire`]; the
/// gateway never sees domain types.
pub trait Gateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch every row matching `query`.
  fn select<T>(
    &self,
    query: Select,
  ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send
  where
    T: DeserializeOwned + Send + 'static;

  /// Fetch at most one row. `Ok(None)` when nothing matches.
  fn maybe_single<T>(
    &self,
    query: Select,
  ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send
  where
    T: DeserializeOwned + Send + 'static;

  /// Insert one row and return it as stored, selected with `columns`.
  fn insert<B, T>(
    &self,
    table: Table,
    body: &B,
    columns: &'static str,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send
  where
    B: Serialize + Sync,
    T: DeserializeOwned + Send + 'static;

  /// Apply a partial update to the row matching `filter` and return it.
  fn update<B, T>(
    &self,
    table: Table,
    filter: Filter,
    body: &B,
    columns: &'static str,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send
  where
    B: Serialize + Sync,
    T: DeserializeOwned + Send + 'static;

  fn delete(
    &self,
    table: Table,
    filter: Filter,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// The hosted auth provider.
pub trait AuthProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The current session, if one is held.
  fn get_session(
    &self,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send;

  fn sign_in_with_password(
    &self,
    email: &str,
    password: &str,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send;

  fn sign_out(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Send a recovery email whose link lands on `redirect_to`.
  fn reset_password_for_email(
    &self,
    email: &str,
    redirect_to: &str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Change the password of the user identified by `access_token` (a live
  /// session token or a one-time recovery token).
  fn update_password(
    &self,
    access_token: &str,
    password: &str,
  ) -> impl Future<Output = Result<AuthUser, Self::Error>> + Send;

  fn get_user(
    &self,
    access_token: &str,
  ) -> impl Future<Output = Result<AuthUser, Self::Error>> + Send;

  /// Listen for auth state changes.
  fn subscribe(&self) -> AuthSubscription;
}

/// A live auth-state listener. Dropping it (or calling
/// [`unsubscribe`](Self::unsubscribe)) releases the subscription.
#[derive(Debug)]
pub struct AuthSubscription {
  rx: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
  pub fn new(rx: broadcast::Receiver<AuthEvent>) -> Self { Self { rx } }

  /// Wait for the next event. Returns `None` once the provider is gone.
  /// Events missed through lag are skipped.
  pub async fn recv(&mut self) -> Option<AuthEvent> {
    loop {
      match self.rx.recv().await {
        Ok(event) => return Some(event),
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }

  /// Non-blocking poll for use from a UI tick.
  pub fn try_recv(&mut self) -> Option<AuthEvent> {
    loop {
      match self.rx.try_recv() {
        Ok(event) => return Some(event),
        Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
        Err(_) => return None,
      }
    }
  }

  pub fn unsubscribe(self) {}
}

// ─── Document generation ─────────────────────────────────────────────────────

pub trait DocumentGenerator: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn generate(
    &self,
    request: &GenerateDocumentRequest,
  ) -> impl Future<Output = Result<GenerateDocumentResponse, Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::user::UserMetadata;
  use uuid::Uuid;

  #[test]
  fn select_builder_accumulates() {
    let q = Select::from(Table::Contracts)
      .columns("*, person:persons(*)")
      .eq("id", 7)
      .newest_first()
      .limit(1);
    assert_eq!(q.filters, vec![Filter::Eq { column: "id", value: "7".into() }]);
    assert_eq!(q.order, Some(Order { column: "created_at", ascending: false }));
    assert_eq!(q.limit, Some(1));
    assert_eq!(q.table.name(), "contracts");
  }

  #[tokio::test]
  async fn subscription_receives_until_closed() {
    let (tx, rx) = broadcast::channel(4);
    let mut sub = AuthSubscription::new(rx);
    assert_eq!(sub.try_recv(), None);

    tx.send(AuthEvent::SignedOut).unwrap();
    tx.send(AuthEvent::UserUpdated(AuthUser {
      id:            Uuid::nil(),
      email:         None,
      user_metadata: UserMetadata::default(),
    }))
    .unwrap();
    assert_eq!(sub.recv().await, Some(AuthEvent::SignedOut));
    assert!(matches!(sub.try_recv(), Some(AuthEvent::UserUpdated(_))));

    drop(tx);
    assert_eq!(sub.recv().await, None);
  }

  #[test]
  fn dropping_the_subscription_releases_the_receiver() {
    let (tx, rx) = broadcast::channel::<AuthEvent>(4);
    let sub = AuthSubscription::new(rx);
    assert_eq!(tx.receiver_count(), 1);
    sub.unsubscribe();
    assert_eq!(tx.receiver_count(), 0);
  }
}
