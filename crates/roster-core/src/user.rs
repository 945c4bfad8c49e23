//! Users, roles and auth sessions.

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// Access level, assigned per user in the `user_roles` table.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Accountant,
  /// Used whenever no assignment row exists.
  #[default]
  Guest,
}

impl Role {
  /// Role-gated content check.
  pub fn is_allowed(self, allowed: &[Role]) -> bool { allowed.contains(&self) }
}

/// Profile metadata attached to an auth user by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
  pub full_name:  Option<String>,
  pub avatar_url: Option<String>,
}

/// The user object returned by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
  pub id:            Uuid,
  pub email:         Option<String>,
  #[serde(default)]
  pub user_metadata: UserMetadata,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub access_token:  String,
  pub refresh_token: Option<String>,
  pub expires_at:    Option<DateTime<Utc>>,
  pub user:          AuthUser,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|t| t <= now)
  }
}

/// Externally observable auth transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
  SignedIn(Session),
  SignedOut,
  TokenRefreshed(Session),
  UserUpdated(AuthUser),
  PasswordRecovery,
}

/// The application's view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub id:      Uuid,
  pub email:   String,
  pub name:    String,
  pub picture: String,
  pub role:    Role,
}

impl User {
  /// Map an auth user; the role starts as `guest` until resolved.
  pub fn from_auth_user(user: &AuthUser) -> Self {
    Self::from_profile(user.id, user.email.as_deref(), &user.user_metadata, Role::Guest)
  }

  /// Build the display view from identity fields. Name falls back to the
  /// email local part then "User"; picture falls back to a generated avatar.
  pub fn from_profile(id: Uuid, email: Option<&str>, meta: &UserMetadata, role: Role) -> Self {
    let email = email.unwrap_or_default().to_owned();
    let name = meta
      .full_name
      .clone()
      .filter(|n| !n.is_empty())
      .or_else(|| {
        email
          .split('@')
          .next()
          .filter(|local| !local.is_empty())
          .map(str::to_owned)
      })
      .unwrap_or_else(|| "User".to_owned());
    let picture = meta
      .avatar_url
      .clone()
      .filter(|u| !u.is_empty())
      .unwrap_or_else(|| {
        avatar_fallback(if email.is_empty() { "User" } else { &email })
      });

    Self { id, email, name, picture, role }
  }

  pub fn with_role(self, role: Role) -> Self { Self { role, ..self } }
}

// URI "unreserved" characters stay literal.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// Generated initials avatar for users without a picture.
pub fn avatar_fallback(seed: &str) -> String {
  format!("https://ui-avatars.com/api/?name={}", utf8_percent_encode(seed, COMPONENT))
}
