//! The three-step new-contract wizard screen.

use crossterm::event::{KeyCode, KeyEvent};
use roster_core::{
  person::Person,
  route::Route,
  template::DocumentTemplate,
  wizard::{ContractWizard, REVIEW_FIELDS, WizardAction, WizardStep},
};

use super::{
  Command,
  contracts::{ContractRow, detail_rows, edit_detail},
};
use crate::form::{clamp, edit_text, is_ctrl, move_focus};

#[derive(Debug, Default)]
pub struct WizardPage {
  pub wizard: ContractWizard,
  /// Highlighted search result in step one.
  pub cursor: usize,
  /// Focused form row in steps two and three.
  pub focus:  usize,
  pub notice: Option<String>,
}

impl WizardPage {
  pub fn new() -> Self { Self::default() }

  pub fn hints(&self) -> (&'static str, &'static str) {
    if self.wizard.is_confirming() {
      return ("CONFIRM", "y update profile  s skip  n cancel");
    }
    match self.wizard.step() {
      WizardStep::SelectPerson => ("STEP 1/3", "Type to search  ↑↓ choose  Enter select  Esc cancel"),
      WizardStep::ReviewPerson => ("STEP 2/3", "↑↓ field  Enter next  Esc back"),
      WizardStep::ContractDetails => ("STEP 3/3", "↑↓ field  ←→ template  Enter create  Esc back"),
    }
  }

  pub fn detail_rows(&self, templates: &[DocumentTemplate]) -> Vec<ContractRow> {
    detail_rows(&self.wizard.contract, templates)
  }

  pub fn handle_key(
    &mut self,
    key: KeyEvent,
    persons: &[Person],
    templates: &[DocumentTemplate],
  ) -> Option<Command> {
    if self.wizard.is_busy() {
      return None;
    }
    if self.wizard.is_confirming() {
      return self.handle_prompt(key);
    }
    if key.code == KeyCode::Esc {
      self.notice = None;
      self.focus = 0;
      return match self.wizard.back() {
        WizardAction::Exit => Some(Command::Navigate(Route::Contracts)),
        _ => None,
      };
    }

    match self.wizard.step() {
      WizardStep::SelectPerson => self.handle_search(key, persons),
      WizardStep::ReviewPerson => self.handle_review(key),
      WizardStep::ContractDetails => self.handle_details(key, templates),
    }
  }

  fn handle_search(&mut self, key: KeyEvent, persons: &[Person]) -> Option<Command> {
    let results = self.wizard.results(persons);
    match key.code {
      KeyCode::Down => {
        if self.cursor + 1 < results.len() {
          self.cursor += 1;
        }
      }
      KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
      KeyCode::Enter => {
        let Some(person) = results.get(self.cursor).copied() else {
          self.notice = Some("Please select a person".into());
          return None;
        };
        self.wizard.select(person);
        self.advance();
      }
      _ => {
        let mut query = self.wizard.query.clone();
        if edit_text(&mut query, key) {
          self.wizard.set_query(query);
          self.cursor = 0;
        }
      }
    }
    None
  }

  fn handle_review(&mut self, key: KeyEvent) -> Option<Command> {
    if key.code == KeyCode::Enter || is_ctrl(key, 'n') {
      self.advance();
      return None;
    }
    if !move_focus(&mut self.focus, REVIEW_FIELDS.len(), key) {
      let field = REVIEW_FIELDS[self.focus.min(REVIEW_FIELDS.len() - 1)];
      edit_text(self.wizard.details.field_mut(field), key);
    }
    None
  }

  fn handle_prompt(&mut self, key: KeyEvent) -> Option<Command> {
    match key.code {
      KeyCode::Char('y') => match self.wizard.confirm_update() {
        Ok(action) => Some(Command::Wizard(action)),
        Err(e) => {
          self.notice = Some(e.to_string());
          None
        }
      },
      KeyCode::Char('s') => {
        self.wizard.skip_update();
        self.focus = 0;
        None
      }
      KeyCode::Char('n') | KeyCode::Esc => {
        self.wizard.cancel_prompt();
        None
      }
      _ => None,
    }
  }

  fn handle_details(&mut self, key: KeyEvent, templates: &[DocumentTemplate]) -> Option<Command> {
    if key.code == KeyCode::Enter || is_ctrl(key, 'n') {
      return match self.wizard.next() {
        Ok(action) => Some(Command::Wizard(action)),
        Err(e) => {
          self.notice = Some(e.to_string());
          None
        }
      };
    }
    let rows = self.detail_rows(templates);
    if move_focus(&mut self.focus, rows.len(), key) {
      return None;
    }
    if let Some(row) = rows.get(self.focus) {
      edit_detail(&mut self.wizard.contract, row, key, templates);
    }
    let len = self.detail_rows(templates).len();
    clamp(&mut self.focus, len);
    None
  }

  fn advance(&mut self) {
    match self.wizard.next() {
      Ok(WizardAction::Moved(_)) => {
        self.focus = 0;
        self.notice = None;
      }
      Ok(_) => {}
      Err(e) => self.notice = Some(e.to_string()),
    }
  }
}
