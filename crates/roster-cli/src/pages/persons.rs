//! Person list and person form.

use crossterm::event::{KeyCode, KeyEvent};
use roster_core::{
  Error,
  completeness::{CompletenessReport, evaluate},
  error::FieldErrors,
  person::{Attachment, Engagement, Person, PersonDraft, PersonField},
  query::{PersonFilter, SortField, SortState, filter_persons, sort_persons},
  validate::validate_person,
};
use strum::IntoEnumIterator;
use uuid::Uuid;

use super::Command;
use crate::form::{clamp, cycle, edit_text, is_ctrl, move_cursor, move_focus};

// ─── Form ────────────────────────────────────────────────────────────────────

const CONTRACTOR_ROWS: [PersonField; 7] = [
  PersonField::BirthDate,
  PersonField::Pesel,
  PersonField::Street,
  PersonField::City,
  PersonField::PostalCode,
  PersonField::Country,
  PersonField::BankAccount,
];

/// One focusable line of the person form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
  Field(PersonField),
  Engagement(Engagement),
  TaxFile,
  VolunteerFile,
  NewBankAccount,
  BankAccount(usize),
  NewEmail,
  DonatorEmail(usize),
}

#[derive(Debug, Clone, Default)]
pub struct PersonForm {
  /// `None` when creating.
  pub id:             Option<Uuid>,
  pub draft:          PersonDraft,
  pub focus:          usize,
  pub bank_input:     String,
  pub email_input:    String,
  /// Attachment references, typed as file names.
  pub tax_file:       String,
  pub volunteer_file: String,
  pub errors:         FieldErrors,
}

impl PersonForm {
  pub fn new() -> Self { Self::default() }

  pub fn edit(person: &Person) -> Self {
    let name = |a: &Option<Attachment>| a.as_ref().map(|a| a.name().to_owned()).unwrap_or_default();
    Self {
      id: Some(person.id),
      draft: PersonDraft::from(person),
      tax_file: name(&person.tax_declaration_file),
      volunteer_file: name(&person.volunteer_contract_file),
      ..Self::default()
    }
  }

  /// Rows for the current engagement; role sections appear only while the
  /// role is selected.
  pub fn rows(&self) -> Vec<FormRow> {
    let d = &self.draft;
    let mut rows: Vec<FormRow> = [
      PersonField::FirstName,
      PersonField::LastName,
      PersonField::Email,
      PersonField::Phone,
    ]
    .into_iter()
    .map(FormRow::Field)
    .collect();
    rows.extend(Engagement::iter().map(FormRow::Engagement));

    if d.has_engagement(Engagement::Contractor) {
      rows.extend(CONTRACTOR_ROWS.into_iter().map(FormRow::Field));
      rows.push(FormRow::TaxFile);
    }
    if d.has_engagement(Engagement::Volunteer) {
      rows.push(FormRow::Field(PersonField::VolunteerStartDate));
      rows.push(FormRow::Field(PersonField::VolunteerEndDate));
      rows.push(FormRow::VolunteerFile);
    }
    if d.has_engagement(Engagement::Donator) {
      rows.push(FormRow::NewBankAccount);
      rows.extend((0..d.donator_bank_accounts.len()).map(FormRow::BankAccount));
      rows.push(FormRow::NewEmail);
      rows.extend((0..d.donator_emails.len()).map(FormRow::DonatorEmail));
    }
    rows
  }

  pub fn focused(&self) -> Option<FormRow> { self.rows().get(self.focus).copied() }

  fn sync_attachments(&mut self) {
    let attach = |s: &str| Some(s.trim()).filter(|s| !s.is_empty()).map(|s| Attachment(s.to_owned()));
    self.draft.tax_declaration_file = attach(&self.tax_file);
    self.draft.volunteer_contract_file = attach(&self.volunteer_file);
  }

  /// Live completeness of the form as currently typed.
  pub fn completeness(&self) -> CompletenessReport {
    let mut form = self.clone();
    form.sync_attachments();
    evaluate(&form.draft)
  }

  /// Local validation; on success the draft is ready to save.
  pub fn submit(&mut self) -> Option<Command> {
    self.sync_attachments();
    match validate_person(&self.draft) {
      Ok(()) => {
        self.errors.clear();
        Some(Command::SavePerson { id: self.id, draft: self.draft.clone() })
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
    let Some(row) = self.focused() else { return };

    match row {
      FormRow::Field(field) => {
        edit_text(self.draft.field_mut(field), key);
      }
      FormRow::Engagement(e) => {
        if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
          self.draft.toggle_engagement(e);
        }
      }
      FormRow::TaxFile => {
        edit_text(&mut self.tax_file, key);
      }
      FormRow::VolunteerFile => {
        edit_text(&mut self.volunteer_file, key);
      }
      FormRow::NewBankAccount => {
        if key.code == KeyCode::Enter {
          if self.draft.add_bank_account(&self.bank_input) {
            self.bank_input.clear();
          }
        } else {
          edit_text(&mut self.bank_input, key);
        }
      }
      FormRow::NewEmail => {
        if key.code == KeyCode::Enter {
          if self.draft.add_email(&self.email_input) {
            self.email_input.clear();
            self.errors.remove("donatorEmails");
          } else if !self.email_input.trim().is_empty() {
            self.errors.insert("donatorEmails", "Please enter a valid email address".into());
          }
        } else {
          edit_text(&mut self.email_input, key);
        }
      }
      FormRow::BankAccount(i) => {
        if matches!(key.code, KeyCode::Delete | KeyCode::Backspace) {
          self.draft.remove_bank_account(i);
        }
      }
      FormRow::DonatorEmail(i) => {
        if matches!(key.code, KeyCode::Delete | KeyCode::Backspace) {
          self.draft.remove_email(i);
        }
      }
    }
    let len = self.rows().len();
    clamp(&mut self.focus, len);
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub enum PersonsMode {
  #[default]
  List,
  Search,
  Form(Box<PersonForm>),
  ConfirmDelete(Uuid),
}

#[derive(Debug, Default)]
pub struct PersonsPage {
  pub mode:   PersonsMode,
  pub search: String,
  pub filter: PersonFilter,
  pub cursor: usize,
}

impl PersonsPage {
  pub fn captures_text(&self) -> bool {
    matches!(self.mode, PersonsMode::Search | PersonsMode::Form(_))
  }

  pub fn hints(&self) -> (&'static str, &'static str) {
    match self.mode {
      PersonsMode::List => (
        "PERSONS",
        "jk move  / search  f filter  N/L/E/P/U sort  n new  e edit  d delete  1-7 nav",
      ),
      PersonsMode::Search => ("SEARCH", "Type to search  Enter done  Esc clear"),
      PersonsMode::Form(_) => ("FORM", "↑↓ field  Space toggle role  Enter add  Del remove  ^S save  Esc cancel"),
      PersonsMode::ConfirmDelete(_) => ("DELETE", "y confirm  any other key cancels"),
    }
  }

  /// Searched, filtered and sorted view of `persons`.
  pub fn visible<'a>(&self, persons: &'a [Person], sort: SortState) -> Vec<&'a Person> {
    let mut list = filter_persons(persons, &self.search, self.filter);
    sort_persons(&mut list, sort);
    list
  }

  pub fn handle_key(&mut self, key: KeyEvent, persons: &[Person], sort: SortState) -> Option<Command> {
    match &mut self.mode {
      PersonsMode::Search => {
        match key.code {
          KeyCode::Esc => {
            self.search.clear();
            self.mode = PersonsMode::List;
          }
          KeyCode::Enter => self.mode = PersonsMode::List,
          _ => {
            edit_text(&mut self.search, key);
          }
        }
        self.cursor = 0;
        None
      }
      PersonsMode::ConfirmDelete(id) => {
        let id = *id;
        self.mode = PersonsMode::List;
        (key.code == KeyCode::Char('y')).then_some(Command::DeletePerson(id))
      }
      PersonsMode::Form(form) => {
        if key.code == KeyCode::Esc {
          self.mode = PersonsMode::List;
          None
        } else if is_ctrl(key, 's') {
          form.submit()
        } else {
          form.handle_key(key);
          None
        }
      }
      PersonsMode::List => self.handle_list_key(key, persons, sort),
    }
  }

  fn handle_list_key(&mut self, key: KeyEvent, persons: &[Person], sort: SortState) -> Option<Command> {
    let visible = self.visible(persons, sort);
    if move_cursor(&mut self.cursor, visible.len(), key) {
      return None;
    }
    let current = visible.get(self.cursor).copied();

    let sort_field = match key.code {
      KeyCode::Char('N') => Some(SortField::FirstName),
      KeyCode::Char('L') => Some(SortField::LastName),
      KeyCode::Char('E') => Some(SortField::Email),
      KeyCode::Char('P') => Some(SortField::Phone),
      KeyCode::Char('U') => Some(SortField::UpdatedAt),
      _ => None,
    };
    if let Some(field) = sort_field {
      return Some(Command::SortPersons(field));
    }

    match key.code {
      KeyCode::Char('/') => self.mode = PersonsMode::Search,
      KeyCode::Esc => self.search.clear(),
      KeyCode::Char('f') => {
        let all: Vec<PersonFilter> = PersonFilter::iter().collect();
        self.filter = cycle(self.filter, &all, true);
        self.cursor = 0;
      }
      KeyCode::Char('n') => self.mode = PersonsMode::Form(Box::new(PersonForm::new())),
      KeyCode::Enter | KeyCode::Char('e') => {
        if let Some(p) = current {
          self.mode = PersonsMode::Form(Box::new(PersonForm::edit(p)));
        }
      }
      KeyCode::Char('d') => {
        if let Some(p) = current {
          self.mode = PersonsMode::ConfirmDelete(p.id);
        }
      }
      _ => {}
    }
    None
  }
}
