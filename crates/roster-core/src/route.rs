//! Client-side route table.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
  Login,
  ResetPassword,
  Dashboard,
  Persons,
  Contracts,
  NewContract,
  EditContract(Uuid),
  Settings,
  Receipts,
  Donations,
  Help,
}

impl Route {
  /// Resolve a path. `/` and every unknown path land on the dashboard.
  /// Query strings and fragments are ignored.
  pub fn parse(path: &str) -> Self {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> =
      path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
      ["login"] => Self::Login,
      ["reset-password"] => Self::ResetPassword,
      ["dashboard"] => Self::Dashboard,
      ["persons"] => Self::Persons,
      ["contracts"] => Self::Contracts,
      ["contracts", "new"] => Self::NewContract,
      ["contracts", id, "edit"] => match id.parse() {
        Ok(id) => Self::EditContract(id),
        Err(_) => Self::Dashboard,
      },
      ["settings"] => Self::Settings,
      ["receipts"] => Self::Receipts,
      ["donations"] => Self::Donations,
      ["help"] => Self::Help,
      _ => Self::Dashboard,
    }
  }

  pub fn path(&self) -> String {
    match self {
      Self::Login => "/login".into(),
      Self::ResetPassword => "/reset-password".into(),
      Self::Dashboard => "/dashboard".into(),
      Self::Persons => "/persons".into(),
      Self::Contracts => "/contracts".into(),
      Self::NewContract => "/contracts/new".into(),
      Self::EditContract(id) => format!("/contracts/{id}/edit"),
      Self::Settings => "/settings".into(),
      Self::Receipts => "/receipts".into(),
      Self::Donations => "/donations".into(),
      Self::Help => "/help".into(),
    }
  }

  /// Whether the route sits behind the auth guard.
  pub fn is_guarded(&self) -> bool {
    !matches!(self, Self::Login | Self::ResetPassword)
  }

  /// Placeholder pages with no content yet.
  pub fn is_stub(&self) -> bool {
    matches!(self, Self::Receipts | Self::Donations | Self::Help)
  }

  pub fn title(&self) -> &'static str {
    match self {
      Self::Login => "Sign in",
      Self::ResetPassword => "Reset Your Password",
      Self::Dashboard => "Dashboard",
      Self::Persons => "Persons",
      Self::Contracts => "Contracts",
      Self::NewContract => "New Contract",
      Self::EditContract(_) => "Edit Contract",
      Self::Settings => "Settings",
      Self::Receipts => "Receipts",
      Self::Donations => "Donations",
      Self::Help => "Help",
    }
  }
}

/// Entries of the navigation sidebar, in display order.
pub const NAVIGATION: [Route; 7] = [
  Route::Dashboard,
  Route::Persons,
  Route::Contracts,
  Route::Receipts,
  Route::Donations,
  Route::Settings,
  Route::Help,
];

/// The parameters a password-recovery email link carries in its fragment:
/// `…/reset-password#access_token=…&type=recovery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryLink {
  pub access_token: String,
}

impl RecoveryLink {
  /// `None` unless the link carries an access token and `type=recovery`.
  pub fn parse(link: &str) -> Option<Self> {
    let (_, fragment) = link.split_once('#')?;
    let mut token = None;
    let mut kind = None;
    for pair in fragment.split('&') {
      match pair.split_once('=') {
        Some(("access_token", v)) if !v.is_empty() => token = Some(v),
        Some(("type", v)) => kind = Some(v),
        _ => {}
      }
    }
    match (token, kind) {
      (Some(t), Some("recovery")) => Some(Self { access_token: t.to_owned() }),
      _ => None,
    }
  }
}
