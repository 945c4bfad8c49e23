//! Settings: user roles and document templates.

use crossterm::event::{KeyCode, KeyEvent};
use roster_core::{
  Error,
  error::FieldErrors,
  query::filter_users,
  template::{DocumentTemplate, DocumentType, TemplateDraft},
  user::{Role, User},
};
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::Command;
use crate::form::{clamp, cycle, cycle_option, edit_text, is_ctrl, move_cursor, move_focus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettingsTab {
  #[default]
  Users,
  Documents,
}

// ─── Template form ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRow {
  Name,
  Type,
  Url,
  Active,
  NewField,
  CustomField(usize),
}

#[derive(Debug, Clone, Default)]
pub struct TemplateForm {
  pub id:          Option<Uuid>,
  pub draft:       TemplateDraft,
  pub focus:       usize,
  pub field_input: String,
  pub errors:      FieldErrors,
}

impl TemplateForm {
  pub fn edit(template: &DocumentTemplate) -> Self {
    Self { id: Some(template.id), draft: TemplateDraft::from(template), ..Self::default() }
  }

  pub fn rows(&self) -> Vec<TemplateRow> {
    let mut rows = vec![
      TemplateRow::Name,
      TemplateRow::Type,
      TemplateRow::Url,
      TemplateRow::Active,
      TemplateRow::NewField,
    ];
    rows.extend((0..self.draft.custom_fields.len()).map(TemplateRow::CustomField));
    rows
  }

  pub fn submit(&mut self) -> Option<Command> {
    match self.draft.validate() {
      Ok(()) => {
        self.errors.clear();
        Some(Command::SaveTemplate { id: self.id, draft: self.draft.clone() })
      }
      Err(Error::Validation(errors)) => {
        self.errors = errors;
        None
      }
      Err(e) => {
        self.errors = FieldErrors::from([("form", e.to_string())]);
        None
      }
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    let len = self.rows().len();
    if move_focus(&mut self.focus, len, key) {
      return;
    }
    let Some(row) = self.rows().get(self.focus).copied() else { return };
    match row {
      TemplateRow::Name => {
        edit_text(&mut self.draft.name, key);
      }
      TemplateRow::Url => {
        edit_text(&mut self.draft.url, key);
      }
      TemplateRow::Type => {
        let types: Vec<DocumentType> = DocumentType::iter().collect();
        match key.code {
          KeyCode::Right | KeyCode::Char(' ') => {
            self.draft.doc_type = cycle(self.draft.doc_type, &types, true);
          }
          KeyCode::Left => self.draft.doc_type = cycle(self.draft.doc_type, &types, false),
          _ => {}
        }
      }
      TemplateRow::Active => {
        if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
          self.draft.is_active = !self.draft.is_active;
        }
      }
      TemplateRow::NewField => {
        if key.code == KeyCode::Enter {
          if self.draft.add_custom_field(&self.field_input) {
            self.field_input.clear();
          }
        } else {
          edit_text(&mut self.field_input, key);
        }
      }
      TemplateRow::CustomField(i) => {
        if matches!(key.code, KeyCode::Delete | KeyCode::Backspace) {
          if let Some(name) = self.draft.custom_fields.get(i).cloned() {
            self.draft.remove_custom_field(&name);
          }
        }
      }
    }
    let len = self.rows().len();
    clamp(&mut self.focus, len);
  }
}

// ─── Page ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub enum TemplatesMode {
  #[default]
  List,
  Form(Box<TemplateForm>),
  ConfirmDelete(Uuid),
}

#[derive(Debug, Default)]
pub struct SettingsPage {
  pub tab:             SettingsTab,
  // Users tab
  pub user_search:     String,
  pub searching:       bool,
  pub role_filter:     Option<Role>,
  pub user_cursor:     usize,
  // Documents tab
  pub templates_mode:  TemplatesMode,
  pub template_cursor: usize,
}

impl SettingsPage {
  pub fn captures_text(&self) -> bool {
    match self.tab {
      SettingsTab::Users => self.searching,
      SettingsTab::Documents => matches!(self.templates_mode, TemplatesMode::Form(_)),
    }
  }

  pub fn hints(&self) -> (&'static str, &'static str) {
    match (self.tab, &self.templates_mode) {
      (SettingsTab::Users, _) if self.searching => ("SEARCH", "Type to search  Enter done  Esc clear"),
      (SettingsTab::Users, _) => ("USERS", "Tab documents  jk move  / search  r role filter  1-7 nav"),
      (SettingsTab::Documents, TemplatesMode::List) => (
        "DOCUMENTS",
        "Tab users  jk move  n new  e edit  t toggle active  d delete  1-7 nav",
      ),
      (SettingsTab::Documents, TemplatesMode::Form(_)) => (
        "TEMPLATE",
        "↑↓ field  ←→ type  Space toggle  Enter add field  Del remove  ^S save  Esc cancel",
      ),
      (SettingsTab::Documents, TemplatesMode::ConfirmDelete(_)) => {
        ("DELETE", "y confirm  any other key cancels")
      }
    }
  }

  pub fn visible_users<'a>(&self, users: &'a [User]) -> Vec<&'a User> {
    filter_users(users, &self.user_search, self.role_filter)
  }

  /// Close the template form after a successful save.
  pub fn close_form(&mut self) { self.templates_mode = TemplatesMode::List; }

  pub fn handle_key(
    &mut self,
    key: KeyEvent,
    users: &[User],
    templates: &[DocumentTemplate],
  ) -> Option<Command> {
    if key.code == KeyCode::Tab && !self.captures_text() {
      self.tab = match self.tab {
        SettingsTab::Users => SettingsTab::Documents,
        SettingsTab::Documents => SettingsTab::Users,
      };
      return None;
    }
    match self.tab {
      SettingsTab::Users => {
        self.handle_users_key(key, users);
        None
      }
      SettingsTab::Documents => self.handle_templates_key(key, templates),
    }
  }

  fn handle_users_key(&mut self, key: KeyEvent, users: &[User]) {
    if self.searching {
      match key.code {
        KeyCode::Esc => {
          self.user_search.clear();
          self.searching = false;
        }
        KeyCode::Enter => self.searching = false,
        _ => {
          edit_text(&mut self.user_search, key);
        }
      }
      self.user_cursor = 0;
      return;
    }
    let len = self.visible_users(users).len();
    if move_cursor(&mut self.user_cursor, len, key) {
      return;
    }
    match key.code {
      KeyCode::Char('/') => self.searching = true,
      KeyCode::Char('r') => {
        let roles: Vec<Role> = Role::iter().collect();
        self.role_filter = cycle_option(self.role_filter, &roles);
        self.user_cursor = 0;
      }
      _ => {}
    }
  }

  fn handle_templates_key(&mut self, key: KeyEvent, templates: &[DocumentTemplate]) -> Option<Command> {
    match &mut self.templates_mode {
      TemplatesMode::Form(form) => {
        if key.code == KeyCode::Esc {
          self.templates_mode = TemplatesMode::List;
          None
        } else if is_ctrl(key, 's') {
          form.submit()
        } else {
          form.handle_key(key);
          None
        }
      }
      TemplatesMode::ConfirmDelete(id) => {
        let id = *id;
        self.templates_mode = TemplatesMode::List;
        (key.code == KeyCode::Char('y')).then_some(Command::DeleteTemplate(id))
      }
      TemplatesMode::List => {
        if move_cursor(&mut self.template_cursor, templates.len(), key) {
          return None;
        }
        let current = templates.get(self.template_cursor);
        match key.code {
          KeyCode::Char('n') => {
            self.templates_mode = TemplatesMode::Form(Box::default());
            None
          }
          KeyCode::Enter | KeyCode::Char('e') => {
            if let Some(t) = current {
              self.templates_mode = TemplatesMode::Form(Box::new(TemplateForm::edit(t)));
            }
            None
          }
          KeyCode::Char('t') => current.map(|t| Command::ToggleTemplate(t.id)),
          KeyCode::Char('d') => {
            if let Some(t) = current {
              self.templates_mode = TemplatesMode::ConfirmDelete(t.id);
            }
            None
          }
          _ => None,
        }
      }
    }
  }
}
