//! The contract creation wizard.
//!
//! A three-step state machine:
//!
//! 1. [`WizardStep::SelectPerson`]: search-as-you-type over cached persons.
//! 2. [`WizardStep::ReviewPerson`]: edit the contractor-relevant fields of the
//!    selected person. Moving on is gated: when anything differs from the
//!    stored record, or the person is not yet a contractor, the user must
//!    either confirm a profile update (which adds the contractor role) or
//!    skip it.
//! 3. [`WizardStep::ContractDetails`]: template, dates and custom fields.
//!    Finishing requires a start date and yields the contract to create.
//!
//! The wizard never performs I/O. Transitions that need the backend return a
//! [`WizardAction`] for the caller to execute, and the caller reports the
//! outcome back through [`ContractWizard::profile_updated`],
//! [`ContractWizard::contract_created`] and friends.

use strum::{Display, EnumIter};
use uuid::Uuid;

use crate::{
  Error, Result,
  completeness::evaluate,
  contract::{ContractDraft, NewContract},
  error::FieldErrors,
  person::{Engagement, Person, PersonDraft, PersonField, PersonUpdate},
  query::wizard_search,
};

/// Country preselected when the person has none.
pub const DEFAULT_COUNTRY: &str = "PL";

/// The person fields reviewed in step two, in form order.
pub const REVIEW_FIELDS: [PersonField; 11] = [
  PersonField::FirstName,
  PersonField::LastName,
  PersonField::Email,
  PersonField::Phone,
  PersonField::BirthDate,
  PersonField::Pesel,
  PersonField::Street,
  PersonField::City,
  PersonField::PostalCode,
  PersonField::Country,
  PersonField::BankAccount,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum WizardStep {
  #[strum(to_string = "Select Person")]
  SelectPerson,
  #[strum(to_string = "Person Details")]
  ReviewPerson,
  #[strum(to_string = "Contract Details")]
  ContractDetails,
}

impl WizardStep {
  pub fn index(self) -> usize {
    match self {
      Self::SelectPerson => 0,
      Self::ReviewPerson => 1,
      Self::ContractDetails => 2,
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      Self::SelectPerson => "Choose a person for the contract",
      Self::ReviewPerson => "Review and update person details",
      Self::ContractDetails => "Enter contract details",
    }
  }
}

/// What the caller should do after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
  /// The wizard moved to a new step; just re-render.
  Moved(WizardStep),
  /// Show the update-profile confirmation.
  ConfirmUpdate,
  /// Persist the reviewed profile, then call `profile_updated`.
  UpdatePerson { id: Uuid, update: PersonUpdate },
  /// Create the contract, then call `contract_created`.
  CreateContract(NewContract),
  /// Leave the wizard (back to the contract list).
  Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractWizard {
  step:           WizardStep,
  /// Search box contents.
  pub query:      String,
  selected:       Option<Person>,
  /// Step two form state. Only [`REVIEW_FIELDS`] are edited.
  pub details:    PersonDraft,
  confirm_prompt: bool,
  /// Step three form state.
  pub contract:   ContractDraft,
  error:          Option<String>,
  busy:           bool,
}

impl Default for ContractWizard {
  fn default() -> Self { Self::new() }
}

impl ContractWizard {
  pub fn new() -> Self {
    Self {
      step:           WizardStep::SelectPerson,
      query:          String::new(),
      selected:       None,
      details:        PersonDraft {
        country: DEFAULT_COUNTRY.to_owned(),
        ..Default::default()
      },
      confirm_prompt: false,
      contract:       ContractDraft::default(),
      error:          None,
      busy:           false,
    }
  }

  pub fn step(&self) -> WizardStep { self.step }

  pub fn selected(&self) -> Option<&Person> { self.selected.as_ref() }

  pub fn is_confirming(&self) -> bool { self.confirm_prompt }

  pub fn is_busy(&self) -> bool { self.busy }

  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  // ── Step one ──────────────────────────────────────────────────────────

  pub fn set_query(&mut self, query: impl Into<String>) {
    self.query = query.into();
  }

  pub fn results<'a>(&self, persons: &'a [Person]) -> Vec<&'a Person> {
    wizard_search(persons, &self.query)
  }

  /// Pick a person: the search box shows their name and the review form is
  /// prefilled from their record.
  pub fn select(&mut self, person: &Person) {
    self.query = person.full_name();
    self.details = review_form(person);
    self.selected = Some(person.clone());
    self.error = None;
  }

  // ── Step two ──────────────────────────────────────────────────────────

  /// Whether the reviewed fields would change the stored profile.
  pub fn has_changes(&self) -> bool {
    let Some(person) = &self.selected else {
      return false;
    };
    let stored = PersonDraft::from(person);
    REVIEW_FIELDS
      .iter()
      .any(|f| self.details.field(*f) != stored.field(*f))
  }

  /// Whether leaving step two must go through the confirmation prompt.
  pub fn needs_profile_update(&self) -> bool {
    self.has_changes()
      || self
        .selected
        .as_ref()
        .is_some_and(|p| !p.has_engagement(Engagement::Contractor))
  }

  /// Confirm the profile update: yields the write to perform. The contractor
  /// role is added if absent and the completeness problems are recomputed
  /// against the merged record.
  pub fn confirm_update(&mut self) -> Result<WizardAction> {
    let person = self.selected.as_ref().ok_or_else(no_person)?;

    let mut merged = PersonDraft::from(person);
    for field in REVIEW_FIELDS {
      *merged.field_mut(field) = self.details.field(field).to_owned();
    }
    if !merged.has_engagement(Engagement::Contractor) {
      merged.engagement.push(Engagement::Contractor);
    }
    let report = evaluate(&merged);
    let new = merged.to_new_person(&report)?;

    let update = PersonUpdate {
      first_name: Some(new.first_name),
      last_name: Some(new.last_name),
      email: Some(new.email),
      phone: Some(new.phone),
      engagement: Some(new.engagement),
      birth_date: Some(new.birth_date),
      pesel: Some(new.pesel),
      street: Some(new.street),
      city: Some(new.city),
      postal_code: Some(new.postal_code),
      country: Some(new.country),
      bank_account: Some(new.bank_account),
      completeness_problems: Some(new.completeness_problems),
      ..Default::default()
    };
    self.busy = true;
    Ok(WizardAction::UpdatePerson { id: person.id, update })
  }

  /// The profile write succeeded; continue with the stored result.
  pub fn profile_updated(&mut self, person: Person) {
    self.details = review_form(&person);
    self.selected = Some(person);
    self.confirm_prompt = false;
    self.busy = false;
    self.error = None;
    self.step = WizardStep::ContractDetails;
  }

  /// The profile write failed; the prompt stays open.
  pub fn profile_update_failed(&mut self, message: impl Into<String>) {
    self.busy = false;
    self.error = Some(message.into());
  }

  /// Continue without persisting the reviewed changes.
  pub fn skip_update(&mut self) -> WizardAction {
    self.confirm_prompt = false;
    self.error = None;
    self.step = WizardStep::ContractDetails;
    WizardAction::Moved(self.step)
  }

  /// Dismiss the prompt and stay on step two.
  pub fn cancel_prompt(&mut self) { self.confirm_prompt = false; }

  // ── Navigation ────────────────────────────────────────────────────────

  pub fn next(&mut self) -> Result<WizardAction> {
    match self.step {
      WizardStep::SelectPerson => {
        if self.selected.is_none() {
          return Err(no_person());
        }
        self.step = WizardStep::ReviewPerson;
        Ok(WizardAction::Moved(self.step))
      }
      WizardStep::ReviewPerson => {
        if self.needs_profile_update() {
          self.confirm_prompt = true;
          return Ok(WizardAction::ConfirmUpdate);
        }
        self.step = WizardStep::ContractDetails;
        Ok(WizardAction::Moved(self.step))
      }
      WizardStep::ContractDetails => {
        let person = self.selected.as_ref().ok_or_else(no_person)?;
        match self.contract.to_new_contract(person.id) {
          Ok(new) => {
            self.busy = true;
            self.error = None;
            Ok(WizardAction::CreateContract(new))
          }
          Err(e) => {
            self.error = Some(e.to_string());
            Err(e)
          }
        }
      }
    }
  }

  pub fn back(&mut self) -> WizardAction {
    self.confirm_prompt = false;
    self.error = None;
    self.step = match self.step {
      WizardStep::SelectPerson => return WizardAction::Exit,
      WizardStep::ReviewPerson => WizardStep::SelectPerson,
      WizardStep::ContractDetails => WizardStep::ReviewPerson,
    };
    WizardAction::Moved(self.step)
  }

  // ── Step three ────────────────────────────────────────────────────────

  pub fn contract_created(&mut self) -> WizardAction {
    self.busy = false;
    WizardAction::Exit
  }

  pub fn contract_failed(&mut self, message: impl Into<String>) {
    self.busy = false;
    self.error = Some(message.into());
  }
}

fn review_form(person: &Person) -> PersonDraft {
  let mut draft = PersonDraft::from(person);
  if draft.country.is_empty() {
    draft.country = DEFAULT_COUNTRY.to_owned();
  }
  draft
}

fn no_person() -> Error {
  let mut errors = FieldErrors::new();
  errors.insert("person", "Please select a person".to_owned());
  Error::Validation(errors)
}
