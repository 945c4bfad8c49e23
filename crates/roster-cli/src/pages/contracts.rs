//! Contract list and the edit-contract screen.

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use roster_core::{
  contract::{Contract, ContractDraft, ContractStatus},
  query::{ContractListQuery, PhaseFilter},
  route::Route,
  template::DocumentTemplate,
};
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::Command;
use crate::form::{clamp, cycle, cycle_option, edit_text, is_ctrl, move_cursor, move_focus};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContractsMode {
  #[default]
  List,
  Search,
  ConfirmDelete(Uuid),
}

#[derive(Debug, Default)]
pub struct ContractsPage {
  pub mode:   ContractsMode,
  pub query:  ContractListQuery,
  pub cursor: usize,
}

impl ContractsPage {
  pub fn captures_text(&self) -> bool { self.mode == ContractsMode::Search }

  pub fn hints(&self) -> (&'static str, &'static str) {
    match self.mode {
      ContractsMode::List => (
        "CONTRACTS",
        "jk move  / search  p phase  s status  n new  e edit  a send  d delete  1-7 nav",
      ),
      ContractsMode::Search => ("SEARCH", "Type to search  Enter done  Esc clear"),
      ContractsMode::ConfirmDelete(_) => ("DELETE", "y confirm  any other key cancels"),
    }
  }

  pub fn visible<'a>(&self, contracts: &'a [Contract], today: NaiveDate) -> Vec<&'a Contract> {
    self.query.apply(contracts, today)
  }

  pub fn handle_key(
    &mut self,
    key: KeyEvent,
    contracts: &[Contract],
    today: NaiveDate,
  ) -> Option<Command> {
    match self.mode {
      ContractsMode::Search => {
        match key.code {
          KeyCode::Esc => {
            self.query.text.clear();
            self.mode = ContractsMode::List;
          }
          KeyCode::Enter => self.mode = ContractsMode::List,
          _ => {
            edit_text(&mut self.query.text, key);
          }
        }
        self.cursor = 0;
        None
      }
      ContractsMode::ConfirmDelete(id) => {
        self.mode = ContractsMode::List;
        (key.code == KeyCode::Char('y')).then_some(Command::DeleteContract(id))
      }
      ContractsMode::List => self.handle_list_key(key, contracts, today),
    }
  }

  fn handle_list_key(
    &mut self,
    key: KeyEvent,
    contracts: &[Contract],
    today: NaiveDate,
  ) -> Option<Command> {
    let visible = self.visible(contracts, today);
    if move_cursor(&mut self.cursor, visible.len(), key) {
      return None;
    }
    let current = visible.get(self.cursor).map(|c| c.id);

    match key.code {
      KeyCode::Char('/') => self.mode = ContractsMode::Search,
      KeyCode::Esc => self.query.text.clear(),
      KeyCode::Char('p') => {
        let phases: Vec<PhaseFilter> = PhaseFilter::iter().collect();
        self.query.phase = cycle(self.query.phase, &phases, true);
        self.cursor = 0;
      }
      KeyCode::Char('s') => {
        let statuses: Vec<ContractStatus> = ContractStatus::iter().collect();
        self.query.status = cycle_option(self.query.status, &statuses);
        self.cursor = 0;
      }
      KeyCode::Char('n') => return Some(Command::Navigate(Route::NewContract)),
      KeyCode::Enter | KeyCode::Char('e') => {
        return current.map(|id| Command::Navigate(Route::EditContract(id)));
      }
      KeyCode::Char('a') => return current.map(Command::AdvanceStatus),
      KeyCode::Char('d') => {
        if let Some(id) = current {
          self.mode = ContractsMode::ConfirmDelete(id);
        }
      }
      _ => {}
    }
    None
  }
}

// ─── Details form ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractRow {
  Template,
  StartDate,
  EndDate,
  Description,
  CustomField(String),
}

/// Rows of the contract details form. Custom fields come from the chosen
/// template.
pub fn detail_rows(draft: &ContractDraft, templates: &[DocumentTemplate]) -> Vec<ContractRow> {
  let mut rows = vec![
    ContractRow::Template,
    ContractRow::StartDate,
    ContractRow::EndDate,
    ContractRow::Description,
  ];
  let template = draft.template_id.and_then(|id| templates.iter().find(|t| t.id == id));
  if let Some(t) = template {
    rows.extend(t.custom_fields.iter().cloned().map(ContractRow::CustomField));
  }
  rows
}

/// Apply an editing key to one row. ←→ cycle through active templates.
pub fn edit_detail(
  draft: &mut ContractDraft,
  row: &ContractRow,
  key: KeyEvent,
  templates: &[DocumentTemplate],
) {
  match row {
    ContractRow::Template => {
      let mut active: Vec<Uuid> = templates.iter().filter(|t| t.is_active).map(|t| t.id).collect();
      match key.code {
        KeyCode::Right => draft.template_id = cycle_option(draft.template_id, &active),
        KeyCode::Left => {
          active.reverse();
          draft.template_id = cycle_option(draft.template_id, &active);
        }
        _ => {}
      }
    }
    ContractRow::StartDate => {
      edit_text(&mut draft.start_date, key);
    }
    ContractRow::EndDate => {
      edit_text(&mut draft.end_date, key);
    }
    ContractRow::Description => {
      edit_text(&mut draft.description, key);
    }
    ContractRow::CustomField(name) => {
      edit_text(draft.custom_fields.entry(name.clone()).or_default(), key);
    }
  }
}

// ─── Edit ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct EditContractPage {
  pub contract: Contract,
  pub draft:    ContractDraft,
  pub focus:    usize,
  pub error:    Option<String>,
}

impl EditContractPage {
  pub fn new(contract: Contract) -> Self {
    let draft = ContractDraft::from(&contract);
    Self { contract, draft, focus: 0, error: None }
  }

  /// Replace the contract after a save or status change, keeping the focus.
  pub fn refresh(&mut self, contract: Contract) {
    self.draft = ContractDraft::from(&contract);
    self.contract = contract;
    self.error = None;
  }

  pub fn rows(&self, templates: &[DocumentTemplate]) -> Vec<ContractRow> {
    detail_rows(&self.draft, templates)
  }

  pub fn handle_key(&mut self, key: KeyEvent, templates: &[DocumentTemplate]) -> Option<Command> {
    let id = self.contract.id;
    if key.code == KeyCode::Esc {
      return Some(Command::Navigate(Route::Contracts));
    }
    if is_ctrl(key, 's') {
      return match self.draft.validate() {
        Ok(()) => {
          self.error = None;
          Some(Command::SaveContract { id, draft: self.draft.clone() })
        }
        Err(e) => {
          self.error = Some(e.to_string());
          None
        }
      };
    }
    if is_ctrl(key, 'g') {
      return Some(Command::GenerateDocument(id));
    }
    if is_ctrl(key, 'a') {
      return Some(Command::AdvanceStatus(id));
    }

    let rows = self.rows(templates);
    if move_focus(&mut self.focus, rows.len(), key) {
      return None;
    }
    if let Some(row) = rows.get(self.focus) {
      edit_detail(&mut self.draft, row, key, templates);
    }
    let len = self.rows(templates).len();
    clamp(&mut self.focus, len);
    None
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::Utc;
  use roster_core::{contract::PersonSummary, template::DocumentType};

  use super::*;
  use crate::form::{ctrl, key};

  fn day(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  fn contract(description: &str, end: Option<NaiveDate>, status: ContractStatus) -> Contract {
    Contract {
      id:                  Uuid::new_v4(),
      person_id:           Uuid::new_v4(),
      start_date:          day(2025, 1, 1),
      end_date:            end,
      description:         Some(description.into()),
      status,
      template_id:         None,
      custom_fields:       BTreeMap::new(),
      source_document_url: None,
      created_at:          Utc::now(),
      updated_at:          Utc::now(),
      person:              Some(PersonSummary {
        id:         Uuid::new_v4(),
        first_name: "Jan".into(),
        last_name:  "Kowalski".into(),
        email:      "jan@ngo.pl".into(),
        phone:      "600".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
      }),
    }
  }

  fn template(name: &str, active: bool, fields: &[&str]) -> DocumentTemplate {
    DocumentTemplate {
      id:            Uuid::new_v4(),
      name:          name.into(),
      doc_type:      DocumentType::Contract,
      url:           "https://docs.example.com/d/1/edit".into(),
      is_active:     active,
      custom_fields: fields.iter().map(|f| f.to_string()).collect(),
      created_at:    Utc::now(),
      updated_at:    Utc::now(),
    }
  }

  #[test]
  fn phase_and_status_filters_combine() {
    let today = day(2025, 6, 1);
    let contracts = vec![
      contract("open", None, ContractStatus::InProgress),
      contract("ended", Some(day(2025, 5, 1)), ContractStatus::Signed),
      contract("running", Some(day(2025, 12, 1)), ContractStatus::Signed),
    ];
    let mut page = ContractsPage::default();
    assert_eq!(page.visible(&contracts, today).len(), 3);

    page.handle_key(key(KeyCode::Char('p')), &contracts, today);
    assert_eq!(page.query.phase, PhaseFilter::Active);
    assert_eq!(page.visible(&contracts, today).len(), 2);

    page.handle_key(key(KeyCode::Char('s')), &contracts, today);
    page.handle_key(key(KeyCode::Char('s')), &contracts, today);
    page.handle_key(key(KeyCode::Char('s')), &contracts, today);
    assert_eq!(page.query.status, Some(ContractStatus::Signed));
    let visible = page.visible(&contracts, today);
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].description.as_deref(), Some("running"));
  }

  #[test]
  fn list_keys_emit_commands_for_the_selected_row() {
    let today = day(2025, 6, 1);
    let contracts = vec![contract("a", None, ContractStatus::InProgress)];
    let id = contracts[0].id;
    let mut page = ContractsPage::default();

    assert_eq!(
      page.handle_key(key(KeyCode::Enter), &contracts, today),
      Some(Command::Navigate(Route::EditContract(id)))
    );
    assert_eq!(
      page.handle_key(key(KeyCode::Char('a')), &contracts, today),
      Some(Command::AdvanceStatus(id))
    );
    assert_eq!(
      page.handle_key(key(KeyCode::Char('n')), &contracts, today),
      Some(Command::Navigate(Route::NewContract))
    );
    page.handle_key(key(KeyCode::Char('d')), &contracts, today);
    assert_eq!(
      page.handle_key(key(KeyCode::Char('y')), &contracts, today),
      Some(Command::DeleteContract(id))
    );
  }

  #[test]
  fn search_matches_person_and_description() {
    let today = day(2025, 6, 1);
    let contracts = vec![contract("Workshop", None, ContractStatus::InProgress)];
    let mut page = ContractsPage::default();
    page.handle_key(key(KeyCode::Char('/')), &contracts, today);
    for c in "kowal".chars() {
      page.handle_key(key(KeyCode::Char(c)), &contracts, today);
    }
    assert_eq!(page.visible(&contracts, today).len(), 1);
    page.handle_key(key(KeyCode::Char('x')), &contracts, today);
    assert!(page.visible(&contracts, today).is_empty());
  }

  #[test]
  fn template_choice_drives_custom_field_rows() {
    let inactive = template("Old", false, &[]);
    let active = template("Umowa", true, &["PROJECT"]);
    let templates = vec![inactive, active.clone()];
    let mut page = EditContractPage::new(contract("x", None, ContractStatus::InProgress));
    assert_eq!(page.rows(&templates).len(), 4);

    page.handle_key(key(KeyCode::Right), &templates);
    assert_eq!(page.draft.template_id, Some(active.id));
    let rows = page.rows(&templates);
    assert_eq!(rows.last(), Some(&ContractRow::CustomField("PROJECT".into())));

    page.focus = 4;
    page.handle_key(key(KeyCode::Char('X')), &templates);
    assert_eq!(page.draft.custom_fields.get("PROJECT").map(String::as_str), Some("X"));

    page.focus = 0;
    page.handle_key(key(KeyCode::Right), &templates);
    assert_eq!(page.draft.template_id, None);
  }

  #[test]
  fn save_requires_a_start_date() {
    let mut page = EditContractPage::new(contract("x", None, ContractStatus::InProgress));
    page.draft.start_date.clear();
    assert_eq!(page.handle_key(ctrl('s'), &[]), None);
    assert_eq!(page.error.as_deref(), Some("Start date is required"));

    page.draft.start_date = "2025-02-01".into();
    let id = page.contract.id;
    assert!(matches!(
      page.handle_key(ctrl('s'), &[]),
      Some(Command::SaveContract { id: saved, .. }) if saved == id
    ));
    assert_eq!(page.handle_key(ctrl('g'), &[]), Some(Command::GenerateDocument(id)));
    assert_eq!(page.handle_key(key(KeyCode::Esc), &[]), Some(Command::Navigate(Route::Contracts)));
  }
}
