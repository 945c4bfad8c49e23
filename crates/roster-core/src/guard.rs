//! The auth guard state machine.
//!
//! ```text
//!   Loading ──session──▶ Authenticated(user, role=guest) ──role──▶ Authenticated(user, role)
//!      │                        ▲      │
//!      │ no session             │      │ SignedOut
//!      ▼                        │      ▼
//!   Unauthenticated ◀──────── SignedIn ─┘
//! ```
//!
//! The guard only tracks state and answers "what should this route do". The
//! session fetch, the role lookup and the auth subscription are driven by the
//! caller, which feeds their results back in.

use uuid::Uuid;

use crate::{
  route::Route,
  user::{AuthEvent, Role, Session, User},
};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
  /// Resolving the initial session.
  Loading,
  Authenticated(User),
  Unauthenticated,
}

/// What the shell should do with a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
  Render,
  /// Show a spinner until the session resolves.
  Wait,
  /// Send to `/login`, remembering where the user wanted to go.
  RedirectToLogin { from: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Guard {
  state:  AuthState,
  bypass: bool,
}

impl Default for Guard {
  fn default() -> Self { Self::new() }
}

impl Guard {
  pub fn new() -> Self { Self { state: AuthState::Loading, bypass: false } }

  /// Development mode: start authenticated as `user` and ignore every
  /// session and role input.
  pub fn bypass(user: User) -> Self {
    Self { state: AuthState::Authenticated(user), bypass: true }
  }

  pub fn state(&self) -> &AuthState { &self.state }

  pub fn is_bypassed(&self) -> bool { self.bypass }

  pub fn user(&self) -> Option<&User> {
    match &self.state {
      AuthState::Authenticated(user) => Some(user),
      _ => None,
    }
  }

  /// Role-gated content: `false` without a user or outside `allowed`.
  pub fn allows(&self, allowed: &[Role]) -> bool {
    self.user().is_some_and(|u| u.role.is_allowed(allowed))
  }

  /// Feed the result of the initial session fetch. Returns the user id whose
  /// role should now be looked up.
  pub fn on_session(&mut self, session: Option<&Session>) -> Option<Uuid> {
    if self.bypass || self.state != AuthState::Loading {
      return None;
    }
    match session {
      Some(session) => self.sign_in(session),
      None => {
        self.state = AuthState::Unauthenticated;
        None
      }
    }
  }

  /// Feed an auth-state change. Returns the user id whose role should now be
  /// looked up, if the signed-in user changed.
  pub fn on_event(&mut self, event: &AuthEvent) -> Option<Uuid> {
    if self.bypass {
      return None;
    }
    match event {
      AuthEvent::SignedIn(session) => self.sign_in(session),
      AuthEvent::SignedOut => {
        self.state = AuthState::Unauthenticated;
        None
      }
      AuthEvent::TokenRefreshed(_)
      | AuthEvent::UserUpdated(_)
      | AuthEvent::PasswordRecovery => None,
    }
  }

  /// Apply a resolved role. Stale answers for a different user are dropped;
  /// `None` (no assignment row) keeps `guest`.
  pub fn on_role(&mut self, user_id: Uuid, role: Option<Role>) {
    if self.bypass {
      return;
    }
    if let (AuthState::Authenticated(user), Some(role)) = (&mut self.state, role) {
      if user.id == user_id {
        user.role = role;
      }
    }
  }

  pub fn decide(&self, route: &Route) -> Decision {
    if !route.is_guarded() {
      return Decision::Render;
    }
    match self.state {
      AuthState::Loading => Decision::Wait,
      AuthState::Authenticated(_) => Decision::Render,
      AuthState::Unauthenticated => {
        Decision::RedirectToLogin { from: route.path() }
      }
    }
  }

  fn sign_in(&mut self, session: &Session) -> Option<Uuid> {
    let id = session.user.id;
    if matches!(&self.state, AuthState::Authenticated(current) if current.id == id) {
      return None;
    }
    self.state = AuthState::Authenticated(User::from_auth_user(&session.user));
    Some(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::user::{AuthUser, UserMetadata};

  fn session(id: Uuid) -> Session {
    Session {
      access_token:  "t".into(),
      refresh_token: None,
      expires_at:    None,
      user:          AuthUser {
        id,
        email: Some("ann@ngo.pl".into()),
        user_metadata: UserMetadata::default(),
      },
    }
  }

  #[test]
  fn loading_waits_then_redirects_without_session() {
    let mut guard = Guard::new();
    assert_eq!(guard.decide(&Route::Persons), Decision::Wait);
    assert_eq!(guard.on_session(None), None);
    assert_eq!(guard.decide(&Route::Persons), Decision::RedirectToLogin {
      from: "/persons".into(),
    });
  }

  #[test]
  fn reset_password_is_always_reachable() {
    let guard = Guard::new();
    assert_eq!(guard.decide(&Route::ResetPassword), Decision::Render);
    let mut guard = Guard::new();
    guard.on_session(None);
    assert_eq!(guard.decide(&Route::ResetPassword), Decision::Render);
  }

  #[test]
  fn role_defaults_to_guest_until_resolved() {
    let id = Uuid::new_v4();
    let mut guard = Guard::new();
    assert_eq!(guard.on_session(Some(&session(id))), Some(id));
    assert_eq!(guard.user().map(|u| u.role), Some(Role::Guest));
    assert!(!guard.allows(&[Role::Admin]));

    guard.on_role(Uuid::new_v4(), Some(Role::Admin));
    assert_eq!(guard.user().map(|u| u.role), Some(Role::Guest));

    guard.on_role(id, None);
    assert_eq!(guard.user().map(|u| u.role), Some(Role::Guest));

    guard.on_role(id, Some(Role::Admin));
    assert!(guard.allows(&[Role::Admin]));
  }

  #[test]
  fn external_sign_out_and_sign_in_are_tracked() {
    let id = Uuid::new_v4();
    let mut guard = Guard::new();
    guard.on_session(Some(&session(id)));
    guard.on_role(id, Some(Role::Accountant));

    // Same user signing in again keeps the resolved role.
    assert_eq!(guard.on_event(&AuthEvent::SignedIn(session(id))), None);
    assert_eq!(guard.user().map(|u| u.role), Some(Role::Accountant));

    guard.on_event(&AuthEvent::SignedOut);
    assert_eq!(guard.state(), &AuthState::Unauthenticated);

    let other = Uuid::new_v4();
    assert_eq!(guard.on_event(&AuthEvent::SignedIn(session(other))), Some(other));
    assert_eq!(guard.decide(&Route::Dashboard), Decision::Render);
  }

  #[test]
  fn bypass_ignores_inputs() {
    let user = User {
      id:      Uuid::nil(),
      email:   "dev@local".into(),
      name:    "Development User".into(),
      picture: String::new(),
      role:    Role::Admin,
    };
    let mut guard = Guard::bypass(user);
    guard.on_event(&AuthEvent::SignedOut);
    guard.on_role(Uuid::nil(), Some(Role::Guest));
    assert!(guard.allows(&[Role::Admin]));
    assert_eq!(guard.decide(&Route::Settings), Decision::Render);
  }
}
