//! HTTP client for the hosted backend.
//!
//! [`Supabase`] implements the three backend traits of `roster-core` over
//! HTTPS: table access through PostgREST (`/rest/v1`), auth through the auth
//! server (`/auth/v1`) and document generation through an edge function
//! (`/functions/v1` unless configured otherwise).
//!
//! Requests carry the project's anon key as `apikey`, and the current
//! session's access token (or the anon key when signed out) as the bearer
//! token, so row-level security sees the signed-in user. A session about to
//! expire is refreshed before the request goes out.

pub mod auth;
pub mod error;
pub mod functions;
pub mod rest;

pub use error::{Error, Result};

use reqwest::{Client, Method, RequestBuilder, Response};
use roster_core::user::{AuthEvent, Session};
use tokio::sync::{RwLock, broadcast};

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct BaasConfig {
  /// Project URL, e.g. `https://xyz.supabase.co`.
  pub url:           String,
  pub anon_key:      String,
  /// Base URL of the edge functions. Defaults to `<url>/functions/v1`.
  pub functions_url: Option<String>,
}

/// Async client for the hosted backend.
pub struct Supabase {
  client:  Client,
  config:  BaasConfig,
  session: RwLock<Option<Session>>,
  events:  broadcast::Sender<AuthEvent>,
}

impl Supabase {
  pub fn new(config: BaasConfig) -> Result<Self> {
    let client = Client::builder()
      .user_agent(concat!("roster/", env!("CARGO_PKG_VERSION")))
      .build()?;
    let (events, _) = broadcast::channel(16);
    Ok(Self { client, config, session: RwLock::new(None), events })
  }

  pub fn config(&self) -> &BaasConfig { &self.config }

  fn base(&self) -> &str { self.config.url.trim_end_matches('/') }

  fn rest_url(&self, table: &str) -> String { format!("{}/rest/v1/{table}", self.base()) }

  fn auth_url(&self, path: &str) -> String { format!("{}/auth/v1{path}", self.base()) }

  fn function_url(&self, name: &str) -> String {
    match &self.config.functions_url {
      Some(url) => format!("{}/{name}", url.trim_end_matches('/')),
      None => format!("{}/functions/v1/{name}", self.base()),
    }
  }

  /// A request authorised as the current session, or anonymously. A
  /// session close to expiry is refreshed first.
  async fn request(&self, method: Method, url: String) -> RequestBuilder {
    let token = match self.fresh_session().await {
      Ok(Some(session)) => session.access_token,
      Ok(None) => self.config.anon_key.clone(),
      Err(e) => {
        tracing::debug!(error = %e, "continuing anonymously");
        self.config.anon_key.clone()
      }
    };
    self.request_as(method, url, &token)
  }

  /// A request authorised with an explicit bearer token.
  fn request_as(&self, method: Method, url: String, token: &str) -> RequestBuilder {
    self
      .client
      .request(method, url)
      .header("apikey", &self.config.anon_key)
      .bearer_auth(token)
  }

  fn emit(&self, event: AuthEvent) {
    // No listeners is fine.
    let _ = self.events.send(event);
  }
}

/// Turn a non-success response into [`Error::Api`].
async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  tracing::warn!(%status, "backend request failed");
  Err(Error::api(status, &body))
}

#[cfg(test)]
mod tests;
