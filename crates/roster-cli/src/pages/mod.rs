//! Per-screen state and key handling.
//!
//! Key handlers are synchronous and never touch the network: they edit their
//! own state and, when a backend call is needed, hand a [`Command`] back to
//! the [`App`](crate::app::App), which runs it against the stores.

pub mod auth;
pub mod contracts;
pub mod persons;
pub mod settings;
pub mod wizard;

use roster_core::{
  contract::ContractDraft, person::PersonDraft, route::Route, template::TemplateDraft,
  query::SortField, wizard::WizardAction,
};
use uuid::Uuid;

pub use auth::{LoginPage, ResetPage};
pub use contracts::{ContractsPage, EditContractPage};
pub use persons::PersonsPage;
pub use settings::SettingsPage;
pub use wizard::WizardPage;

// ─── Commands ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
  Navigate(Route),
  Quit,
  // Auth
  SignIn { email: String, password: String },
  ForgotPassword { email: String },
  ResetPassword { link: String, password: String, confirm: String },
  // Persons
  SortPersons(SortField),
  SavePerson { id: Option<Uuid>, draft: PersonDraft },
  DeletePerson(Uuid),
  // Contracts
  AdvanceStatus(Uuid),
  SaveContract { id: Uuid, draft: ContractDraft },
  GenerateDocument(Uuid),
  DeleteContract(Uuid),
  Wizard(WizardAction),
  // Templates
  SaveTemplate { id: Option<Uuid>, draft: TemplateDraft },
  ToggleTemplate(Uuid),
  DeleteTemplate(Uuid),
}

// ─── Page ────────────────────────────────────────────────────────────────────

/// State of the screen currently shown. Rebuilt on every navigation.
#[derive(Debug)]
pub enum Page {
  /// The initial session is still resolving.
  Loading,
  Login(LoginPage),
  ResetPassword(ResetPage),
  Dashboard,
  Persons(PersonsPage),
  Contracts(ContractsPage),
  NewContract(Box<WizardPage>),
  EditContract(Box<EditContractPage>),
  Settings(SettingsPage),
  /// Placeholder screens.
  Stub,
}

impl Page {
  /// Whether plain character keys belong to a text field right now. Global
  /// single-key shortcuts are disabled while this holds.
  pub fn captures_text(&self) -> bool {
    match self {
      Page::Login(_) | Page::ResetPassword(_) | Page::NewContract(_) | Page::EditContract(_) => true,
      Page::Persons(p) => p.captures_text(),
      Page::Contracts(p) => p.captures_text(),
      Page::Settings(p) => p.captures_text(),
      Page::Loading | Page::Dashboard | Page::Stub => false,
    }
  }

  /// Status-bar mode label and key hints.
  pub fn hints(&self) -> (&'static str, &'static str) {
    match self {
      Page::Loading => ("LOADING", "Resolving session…"),
      Page::Login(_) => ("SIGN IN", "Tab next field  Enter sign in  ^R forgot password  ^P reset link"),
      Page::ResetPassword(_) => ("RESET", "Tab next field  Enter update password  Esc back to sign in"),
      Page::Dashboard | Page::Stub => ("NORMAL", "1-7 navigate  ^T theme  ^O sign out  q quit"),
      Page::Persons(p) => p.hints(),
      Page::Contracts(p) => p.hints(),
      Page::NewContract(p) => p.hints(),
      Page::EditContract(_) => (
        "EDIT",
        "↑↓ field  ←→ template  ^S save  ^G generate document  ^A send  Esc back",
      ),
      Page::Settings(p) => p.hints(),
    }
  }
}
