//! Sign-in and reset-password screens.

use crossterm::event::{KeyCode, KeyEvent};
use roster_core::route::Route;

use super::Command;
use crate::form::{edit_text, is_ctrl, move_focus};

// ─── Sign in ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
  #[default]
  Email,
  Password,
}

#[derive(Debug, Default)]
pub struct LoginPage {
  pub email:    String,
  pub password: String,
  pub focus:    LoginField,
  pub error:    Option<String>,
  /// Confirmation shown after a recovery email was sent.
  pub notice:   Option<String>,
  pub busy:     bool,
}

impl LoginPage {
  pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
    if is_ctrl(key, 'r') {
      if self.email.trim().is_empty() {
        self.error = Some("Enter your email address first".into());
        return None;
      }
      return Some(Command::ForgotPassword { email: self.email.trim().to_owned() });
    }
    if is_ctrl(key, 'p') {
      return Some(Command::Navigate(Route::ResetPassword));
    }

    let mut focus = self.focus as usize;
    if move_focus(&mut focus, 2, key) {
      self.focus = if focus == 0 { LoginField::Email } else { LoginField::Password };
      return None;
    }

    match key.code {
      KeyCode::Enter => {
        if self.email.trim().is_empty() || self.password.is_empty() {
          self.error = Some("Email and password are required".into());
          return None;
        }
        self.error = None;
        Some(Command::SignIn {
          email:    self.email.trim().to_owned(),
          password: self.password.clone(),
        })
      }
      _ => {
        let field = match self.focus {
          LoginField::Email => &mut self.email,
          LoginField::Password => &mut self.password,
        };
        edit_text(field, key);
        None
      }
    }
  }
}

// ─── Reset password ──────────────────────────────────────────────────────────

pub const RESET_FIELDS: [&str; 3] = ["Recovery link", "New password", "Confirm password"];

/// The recovery email link is pasted here; the terminal has no URL bar.
#[derive(Debug, Default)]
pub struct ResetPage {
  pub link:     String,
  pub password: String,
  pub confirm:  String,
  pub focus:    usize,
  pub error:    Option<String>,
}

impl ResetPage {
  pub fn value(&self, index: usize) -> &str {
    match index {
      0 => &self.link,
      1 => &self.password,
      _ => &self.confirm,
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
    if move_focus(&mut self.focus, RESET_FIELDS.len(), key) {
      return None;
    }
    match key.code {
      KeyCode::Esc => Some(Command::Navigate(Route::Login)),
      KeyCode::Enter => {
        self.error = None;
        Some(Command::ResetPassword {
          link:     self.link.trim().to_owned(),
          password: self.password.clone(),
          confirm:  self.confirm.clone(),
        })
      }
      _ => {
        let field = match self.focus {
          0 => &mut self.link,
          1 => &mut self.password,
          _ => &mut self.confirm,
        };
        edit_text(field, key);
        None
      }
    }
  }
}
