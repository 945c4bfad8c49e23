//! Password auth against the hosted auth server.
//!
//! The session lives inside the client; table requests pick up its access
//! token automatically. Every transition is broadcast to subscribers.

use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use roster_core::{
  gateway::{AuthProvider, AuthSubscription},
  user::{AuthEvent, AuthUser, Session},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{Error, Result, Supabase, check};

/// Sessions this close to expiry are refreshed before use.
pub const REFRESH_MARGIN: Duration = Duration::seconds(60);

/// Body of a successful `/token` grant.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token:  String,
  #[serde(default)]
  pub refresh_token: Option<String>,
  #[serde(default)]
  pub expires_in:    Option<i64>,
  /// Unix seconds.
  #[serde(default)]
  pub expires_at:    Option<i64>,
  pub user:          AuthUser,
}

impl TokenResponse {
  pub fn into_session(self, now: DateTime<Utc>) -> Session {
    let expires_at = self
      .expires_at
      .and_then(|secs| DateTime::from_timestamp(secs, 0))
      .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
    Session {
      access_token: self.access_token,
      refresh_token: self.refresh_token,
      expires_at,
      user: self.user,
    }
  }
}

impl Supabase {
  async fn grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
    let resp = self
      .request_as(Method::POST, self.auth_url("/token"), &self.config.anon_key)
      .query(&[("grant_type", grant_type)])
      .json(&body)
      .send()
      .await?;
    let token: TokenResponse = check(resp).await?.json().await?;
    Ok(token.into_session(Utc::now()))
  }

  /// The current session, refreshed first when it expires within
  /// [`REFRESH_MARGIN`]. A failed refresh ends the session.
  pub(crate) async fn fresh_session(&self) -> Result<Option<Session>> {
    let now = Utc::now();
    {
      let current = self.session.read().await;
      match current.as_ref() {
        None => return Ok(None),
        Some(s) if !s.is_expired(now + REFRESH_MARGIN) => return Ok(Some(s.clone())),
        Some(_) => {}
      }
    }

    // Held across the grant so concurrent requests refresh once.
    let mut slot = self.session.write().await;
    let Some(session) = slot.clone() else { return Ok(None) };
    if !session.is_expired(Utc::now() + REFRESH_MARGIN) {
      return Ok(Some(session));
    }
    let Some(refresh_token) = session.refresh_token.clone() else {
      if !session.is_expired(Utc::now()) {
        return Ok(Some(session));
      }
      *slot = None;
      drop(slot);
      info!(user = %session.user.id, "session expired");
      self.emit(AuthEvent::SignedOut);
      return Ok(None);
    };

    match self.grant("refresh_token", json!({ "refresh_token": refresh_token })).await {
      Ok(refreshed) => {
        *slot = Some(refreshed.clone());
        drop(slot);
        debug!(user = %refreshed.user.id, "session refreshed");
        self.emit(AuthEvent::TokenRefreshed(refreshed.clone()));
        Ok(Some(refreshed))
      }
      Err(e) => {
        *slot = None;
        drop(slot);
        warn!(user = %session.user.id, error = %e, "session refresh failed; signing out");
        self.emit(AuthEvent::SignedOut);
        Err(e)
      }
    }
  }
}

impl AuthProvider for Supabase {
  type Error = Error;

  async fn get_session(&self) -> Result<Option<Session>> { self.fresh_session().await }

  async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
    let session = self
      .grant("password", json!({ "email": email, "password": password }))
      .await?;
    info!(user = %session.user.id, "signed in");
    *self.session.write().await = Some(session.clone());
    self.emit(AuthEvent::SignedIn(session.clone()));
    Ok(session)
  }

  /// Ends the session locally even when the server call fails.
  async fn sign_out(&self) -> Result<()> {
    let Some(session) = self.session.write().await.take() else {
      return Ok(());
    };
    self.emit(AuthEvent::SignedOut);
    info!(user = %session.user.id, "signed out");

    let resp = self
      .request_as(Method::POST, self.auth_url("/logout"), &session.access_token)
      .send()
      .await?;
    if let Err(e) = check(resp).await {
      warn!(error = %e, "server-side logout failed");
      return Err(e);
    }
    Ok(())
  }

  async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()> {
    let resp = self
      .request_as(Method::POST, self.auth_url("/recover"), &self.config.anon_key)
      .query(&[("redirect_to", redirect_to)])
      .json(&json!({ "email": email }))
      .send()
      .await?;
    check(resp).await?;
    info!("recovery email requested");
    Ok(())
  }

  async fn update_password(&self, access_token: &str, password: &str) -> Result<AuthUser> {
    let resp = self
      .request_as(Method::PUT, self.auth_url("/user"), access_token)
      .json(&json!({ "password": password }))
      .send()
      .await?;
    let user: AuthUser = check(resp).await?.json().await?;

    let is_current = self
      .session
      .read()
      .await
      .as_ref()
      .is_some_and(|s| s.user.id == user.id);
    if is_current {
      self.emit(AuthEvent::UserUpdated(user.clone()));
    }
    info!(user = %user.id, "password updated");
    Ok(user)
  }

  async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
    let resp = self
      .request_as(Method::GET, self.auth_url("/user"), access_token)
      .send()
      .await?;
    Ok(check(resp).await?.json().await?)
  }

  fn subscribe(&self) -> AuthSubscription { AuthSubscription::new(self.events.subscribe()) }
}

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  fn token(expires_in: Option<i64>, expires_at: Option<i64>) -> TokenResponse {
    serde_json::from_value(json!({
      "access_token": "abc",
      "token_type": "bearer",
      "expires_in": expires_in,
      "expires_at": expires_at,
      "refresh_token": "r1",
      "user": { "id": Uuid::nil(), "email": "a@b.pl" },
    }))
    .unwrap()
  }

  #[test]
  fn absolute_expiry_wins_over_relative() {
    let now = Utc::now();
    let session = token(Some(3600), Some(1_700_000_000)).into_session(now);
    assert_eq!(session.expires_at.unwrap().timestamp(), 1_700_000_000);
  }

  #[test]
  fn relative_expiry_is_anchored_at_now() {
    let now = Utc::now();
    let session = token(Some(3600), None).into_session(now);
    assert_eq!(session.expires_at, Some(now + Duration::seconds(3600)));
    assert_eq!(session.refresh_token.as_deref(), Some("r1"));
    assert_eq!(session.user.user_metadata.full_name, None);
  }
}
