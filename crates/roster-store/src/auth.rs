//! [`AuthStore`]: session, signed-in user and role resolution.

use std::sync::Arc;

use roster_core::{
  gateway::{AuthProvider, AuthSubscription, Gateway, Select, Table},
  user::{AuthEvent, AuthUser, Role, Session, User, avatar_fallback},
  validate::validate_new_password,
  wire::{ROLE_WITH_USER, RoleRow, UserRoleRow},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Result, Status, StoreError};

pub const DEV_USER_EMAIL: &str = "dev@localhost";
pub const DEV_USER_NAME: &str = "Development User";

/// The fixed identity used when authentication is bypassed in development.
pub fn development_user() -> User {
  User {
    id:      Uuid::nil(),
    email:   DEV_USER_EMAIL.to_owned(),
    name:    DEV_USER_NAME.to_owned(),
    picture: avatar_fallback(DEV_USER_NAME),
    role:    Role::Admin,
  }
}

pub struct AuthStore<A, G> {
  auth:    Arc<A>,
  gateway: Arc<G>,
  session: Option<Session>,
  user:    Option<User>,
  bypass:  bool,
  status:  Status,
}

impl<A: AuthProvider, G: Gateway> AuthStore<A, G> {
  pub fn new(auth: Arc<A>, gateway: Arc<G>) -> Self {
    Self {
      auth,
      gateway,
      session: None,
      user: None,
      bypass: false,
      status: Status::default(),
    }
  }

  /// Start signed in as [`development_user`]; no backend auth is used.
  pub fn bypassed(auth: Arc<A>, gateway: Arc<G>) -> Self {
    Self { user: Some(development_user()), bypass: true, ..Self::new(auth, gateway) }
  }

  pub fn user(&self) -> Option<&User> { self.user.as_ref() }

  pub fn session(&self) -> Option<&Session> { self.session.as_ref() }

  pub fn is_authenticated(&self) -> bool { self.user.is_some() }

  pub fn is_bypassed(&self) -> bool { self.bypass }

  pub fn status(&self) -> &Status { &self.status }

  pub fn subscribe(&self) -> AuthSubscription { self.auth.subscribe() }

  /// Resolve any session already held by the provider.
  pub async fn restore(&mut self) -> Result<Option<Session>> {
    if self.bypass {
      return Ok(None);
    }
    self.status.begin();
    let session = self
      .auth
      .get_session()
      .await
      .map_err(|e| self.status.fail("get session", StoreError::gateway(e)))?;
    if let Some(s) = &session {
      self.user = Some(User::from_auth_user(&s.user));
    }
    self.session = session.clone();
    self.status.done();
    Ok(session)
  }

  /// The role assigned to `user_id`; `guest` when no assignment row exists.
  pub async fn fetch_role(&self, user_id: Uuid) -> Result<Role> {
    let query = Select::from(Table::UserRoles)
      .columns("role_id")
      .eq("user_id", user_id);
    let row = self
      .gateway
      .maybe_single::<RoleRow>(query)
      .await
      .map_err(StoreError::gateway)?;
    let role = row.map(|r| r.role_id).unwrap_or_default();
    debug!(%user_id, %role, "resolved role");
    Ok(role)
  }

  /// Apply a resolved role to the signed-in user, if it is still them.
  pub fn set_role(&mut self, user_id: Uuid, role: Role) {
    if let Some(user) = self.user.as_mut().filter(|u| u.id == user_id) {
      user.role = role;
    }
  }

  pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<User> {
    self.status.begin();
    let session = self
      .auth
      .sign_in_with_password(email, password)
      .await
      .map_err(|e| self.status.fail("sign in", StoreError::gateway(e)))?;

    let user_id = session.user.id;
    let role = match self.fetch_role(user_id).await {
      Ok(role) => role,
      Err(e) => {
        warn!(error = %e, "role lookup failed; continuing as guest");
        Role::Guest
      }
    };
    let user = User::from_auth_user(&session.user).with_role(role);
    info!(id = %user.id, role = %user.role, "signed in");
    self.session = Some(session);
    self.user = Some(user.clone());
    self.status.done();
    Ok(user)
  }

  pub async fn sign_out(&mut self) -> Result<()> {
    self.status.begin();
    if !self.bypass {
      self
        .auth
        .sign_out()
        .await
        .map_err(|e| self.status.fail("sign out", StoreError::gateway(e)))?;
    }
    info!("signed out");
    self.session = None;
    self.user = None;
    self.bypass = false;
    self.status.done();
    Ok(())
  }

  /// Send a recovery email whose link opens the reset-password screen.
  pub async fn request_password_reset(&mut self, email: &str, redirect_to: &str) -> Result<()> {
    self.status.begin();
    self
      .auth
      .reset_password_for_email(email, redirect_to)
      .await
      .map_err(|e| self.status.fail("request password reset", StoreError::gateway(e)))?;
    info!("password reset email requested");
    self.status.done();
    Ok(())
  }

  /// Check that a recovery token still identifies a user.
  pub async fn verify_recovery(&mut self, access_token: &str) -> Result<AuthUser> {
    self.status.begin();
    let user = self
      .auth
      .get_user(access_token)
      .await
      .map_err(|e| self.status.fail("verify recovery token", StoreError::gateway(e)))?;
    self.status.done();
    Ok(user)
  }

  /// Set a new password. Mismatched or short passwords are rejected locally.
  pub async fn update_password(
    &mut self,
    access_token: &str,
    password: &str,
    confirm: &str,
  ) -> Result<()> {
    validate_new_password(password, confirm)
      .map_err(|e| self.status.fail("update password", e.into()))?;

    self.status.begin();
    self
      .auth
      .update_password(access_token, password)
      .await
      .map_err(|e| self.status.fail("update password", StoreError::gateway(e)))?;
    info!("password updated");
    self.status.done();
    Ok(())
  }

  /// Track an external auth-state change. Returns the user whose role
  /// should now be resolved.
  pub fn apply_event(&mut self, event: &AuthEvent) -> Option<Uuid> {
    if self.bypass {
      return None;
    }
    match event {
      AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
        let changed = self.user.as_ref().is_none_or(|u| u.id != session.user.id);
        if changed {
          self.user = Some(User::from_auth_user(&session.user));
        }
        self.session = Some(session.clone());
        changed.then_some(session.user.id)
      }
      AuthEvent::SignedOut => {
        self.session = None;
        self.user = None;
        None
      }
      AuthEvent::UserUpdated(auth_user) => {
        if let Some(user) = self.user.as_mut().filter(|u| u.id == auth_user.id) {
          let role = user.role;
          *user = User::from_auth_user(auth_user).with_role(role);
        }
        None
      }
      AuthEvent::PasswordRecovery => None,
    }
  }

  /// Every role assignment joined to its auth user. Admin only; the backend
  /// enforces this through row-level security.
  pub async fn list_users(&mut self) -> Result<Vec<User>> {
    self.status.begin();
    let rows = self
      .gateway
      .select::<UserRoleRow>(Select::from(Table::UserRoles).columns(ROLE_WITH_USER))
      .await
      .map_err(|e| self.status.fail("list users", StoreError::gateway(e)))?;
    self.status.done();
    Ok(rows.into_iter().map(User::from).collect())
  }
}
