//! Person types: volunteers, contractors and donators.
//!
//! A [`Person`] is the cached, normalised record returned by the backend. The
//! editable form state lives in [`PersonDraft`], which keeps every field as the
//! raw text the user typed so that completeness can be re-evaluated on every
//! keystroke without parsing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Result,
  completeness::CompletenessReport,
  validate::{is_valid_email, parse_date_input},
};

// ─── Engagement ──────────────────────────────────────────────────────────────

/// A role a person holds towards the organisation. A person may hold any
/// combination, including none.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Engagement {
  Volunteer,
  Contractor,
  Donator,
}

// ─── Attachment ──────────────────────────────────────────────────────────────

/// A reference to an uploaded file. Only presence is ever validated; the
/// content lives in external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attachment(pub String);

impl Attachment {
  pub fn name(&self) -> &str { &self.0 }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A person record as cached by the person store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
  pub id:                      Uuid,
  pub first_name:              String,
  pub last_name:               String,
  pub email:                   String,
  pub phone:                   String,
  pub engagement:              Vec<Engagement>,
  // ── Contractor ────────────────────────────────────────────────────────
  pub birth_date:              Option<NaiveDate>,
  /// National identification number (PESEL).
  pub pesel:                   Option<String>,
  pub street:                  Option<String>,
  pub city:                    Option<String>,
  pub postal_code:             Option<String>,
  pub country:                 Option<String>,
  pub bank_account:            Option<String>,
  pub tax_declaration_file:    Option<Attachment>,
  // ── Volunteer ─────────────────────────────────────────────────────────
  pub volunteer_start_date:    Option<NaiveDate>,
  pub volunteer_end_date:      Option<NaiveDate>,
  pub volunteer_contract_file: Option<Attachment>,
  // ── Donator ───────────────────────────────────────────────────────────
  pub donator_bank_accounts:   Vec<String>,
  pub donator_emails:          Vec<String>,
  /// Problems recorded by the last submission-time completeness check.
  pub completeness_problems:   Vec<String>,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              DateTime<Utc>,
}

impl Person {
  pub fn is_complete(&self) -> bool { self.completeness_problems.is_empty() }

  pub fn has_engagement(&self, engagement: Engagement) -> bool {
    self.engagement.contains(&engagement)
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  /// Two-letter avatar initials, e.g. "JD" for John Doe.
  pub fn initials(&self) -> String {
    self
      .first_name
      .chars()
      .take(1)
      .chain(self.last_name.chars().take(1))
      .collect::<String>()
      .to_uppercase()
  }
}

/// Input to `PersonStore::create`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewPerson {
  pub first_name:              String,
  pub last_name:               String,
  pub email:                   String,
  pub phone:                   String,
  pub engagement:              Vec<Engagement>,
  pub birth_date:              Option<NaiveDate>,
  pub pesel:                   Option<String>,
  pub street:                  Option<String>,
  pub city:                    Option<String>,
  pub postal_code:             Option<String>,
  pub country:                 Option<String>,
  pub bank_account:            Option<String>,
  pub tax_declaration_file:    Option<Attachment>,
  pub volunteer_start_date:    Option<NaiveDate>,
  pub volunteer_end_date:      Option<NaiveDate>,
  pub volunteer_contract_file: Option<Attachment>,
  pub donator_bank_accounts:   Vec<String>,
  pub donator_emails:          Vec<String>,
  pub completeness_problems:   Vec<String>,
}

/// A partial update; `None` leaves the stored value untouched. For nullable
/// columns the inner `Option` distinguishes "clear" from "keep".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonUpdate {
  pub first_name:              Option<String>,
  pub last_name:               Option<String>,
  pub email:                   Option<String>,
  pub phone:                   Option<String>,
  pub engagement:              Option<Vec<Engagement>>,
  pub birth_date:              Option<Option<NaiveDate>>,
  pub pesel:                   Option<Option<String>>,
  pub street:                  Option<Option<String>>,
  pub city:                    Option<Option<String>>,
  pub postal_code:             Option<Option<String>>,
  pub country:                 Option<Option<String>>,
  pub bank_account:            Option<Option<String>>,
  pub tax_declaration_file:    Option<Option<Attachment>>,
  pub volunteer_start_date:    Option<Option<NaiveDate>>,
  pub volunteer_end_date:      Option<Option<NaiveDate>>,
  pub volunteer_contract_file: Option<Option<Attachment>>,
  pub donator_bank_accounts:   Option<Vec<String>>,
  pub donator_emails:          Option<Vec<String>>,
  pub completeness_problems:   Option<Vec<String>>,
}

impl From<NewPerson> for PersonUpdate {
  fn from(p: NewPerson) -> Self {
    Self {
      first_name:              Some(p.first_name),
      last_name:               Some(p.last_name),
      email:                   Some(p.email),
      phone:                   Some(p.phone),
      engagement:              Some(p.engagement),
      birth_date:              Some(p.birth_date),
      pesel:                   Some(p.pesel),
      street:                  Some(p.street),
      city:                    Some(p.city),
      postal_code:             Some(p.postal_code),
      country:                 Some(p.country),
      bank_account:            Some(p.bank_account),
      tax_declaration_file:    Some(p.tax_declaration_file),
      volunteer_start_date:    Some(p.volunteer_start_date),
      volunteer_end_date:      Some(p.volunteer_end_date),
      volunteer_contract_file: Some(p.volunteer_contract_file),
      donator_bank_accounts:   Some(p.donator_bank_accounts),
      donator_emails:          Some(p.donator_emails),
      completeness_problems:   Some(p.completeness_problems),
    }
  }
}

// ─── Form fields ─────────────────────────────────────────────────────────────

/// The free-text fields of the person form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum PersonField {
  FirstName,
  LastName,
  Email,
  Phone,
  BirthDate,
  Pesel,
  Street,
  City,
  PostalCode,
  Country,
  BankAccount,
  VolunteerStartDate,
  VolunteerEndDate,
}

impl PersonField {
  /// Human-readable label; also used verbatim in completeness messages.
  pub fn label(self) -> &'static str {
    match self {
      Self::FirstName => "First Name",
      Self::LastName => "Last Name",
      Self::Email => "Email",
      Self::Phone => "Phone Number",
      Self::BirthDate => "Birth Date",
      Self::Pesel => "PESEL",
      Self::Street => "Street Address",
      Self::City => "City",
      Self::PostalCode => "Postal Code",
      Self::Country => "Country",
      Self::BankAccount => "Bank Account",
      Self::VolunteerStartDate => "Volunteer Start Date",
      Self::VolunteerEndDate => "Volunteer End Date",
    }
  }

  /// Form key used for field-level error messages.
  pub fn key(self) -> &'static str {
    match self {
      Self::FirstName => "firstName",
      Self::LastName => "lastName",
      Self::Email => "email",
      Self::Phone => "phone",
      Self::BirthDate => "birthDate",
      Self::Pesel => "pesel",
      Self::Street => "street",
      Self::City => "city",
      Self::PostalCode => "postalCode",
      Self::Country => "country",
      Self::BankAccount => "bankAccount",
      Self::VolunteerStartDate => "volunteerStartDate",
      Self::VolunteerEndDate => "volunteerEndDate",
    }
  }

  /// Which tab of the form the field lives on.
  pub fn section(self) -> Option<Engagement> {
    match self {
      Self::FirstName | Self::LastName | Self::Email | Self::Phone => None,
      Self::VolunteerStartDate | Self::VolunteerEndDate => {
        Some(Engagement::Volunteer)
      }
      _ => Some(Engagement::Contractor),
    }
  }
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// Editable form state for creating or editing a person.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonDraft {
  pub first_name:              String,
  pub last_name:               String,
  pub email:                   String,
  pub phone:                   String,
  pub engagement:              Vec<Engagement>,
  pub birth_date:              String,
  pub pesel:                   String,
  pub street:                  String,
  pub city:                    String,
  pub postal_code:             String,
  pub country:                 String,
  pub bank_account:            String,
  pub tax_declaration_file:    Option<Attachment>,
  pub volunteer_start_date:    String,
  pub volunteer_end_date:      String,
  pub volunteer_contract_file: Option<Attachment>,
  pub donator_bank_accounts:   Vec<String>,
  pub donator_emails:          Vec<String>,
}

impl PersonDraft {
  pub fn field(&self, field: PersonField) -> &str {
    match field {
      PersonField::FirstName => &self.first_name,
      PersonField::LastName => &self.last_name,
      PersonField::Email => &self.email,
      PersonField::Phone => &self.phone,
      PersonField::BirthDate => &self.birth_date,
      PersonField::Pesel => &self.pesel,
      PersonField::Street => &self.street,
      PersonField::City => &self.city,
      PersonField::PostalCode => &self.postal_code,
      PersonField::Country => &self.country,
      PersonField::BankAccount => &self.bank_account,
      PersonField::VolunteerStartDate => &self.volunteer_start_date,
      PersonField::VolunteerEndDate => &self.volunteer_end_date,
    }
  }

  pub fn field_mut(&mut self, field: PersonField) -> &mut String {
    match field {
      PersonField::FirstName => &mut self.first_name,
      PersonField::LastName => &mut self.last_name,
      PersonField::Email => &mut self.email,
      PersonField::Phone => &mut self.phone,
      PersonField::BirthDate => &mut self.birth_date,
      PersonField::Pesel => &mut self.pesel,
      PersonField::Street => &mut self.street,
      PersonField::City => &mut self.city,
      PersonField::PostalCode => &mut self.postal_code,
      PersonField::Country => &mut self.country,
      PersonField::BankAccount => &mut self.bank_account,
      PersonField::VolunteerStartDate => &mut self.volunteer_start_date,
      PersonField::VolunteerEndDate => &mut self.volunteer_end_date,
    }
  }

  pub fn has_engagement(&self, engagement: Engagement) -> bool {
    self.engagement.contains(&engagement)
  }

  /// Add the role if absent, remove it if present.
  pub fn toggle_engagement(&mut self, engagement: Engagement) {
    if let Some(pos) = self.engagement.iter().position(|e| *e == engagement) {
      self.engagement.remove(pos);
    } else {
      self.engagement.push(engagement);
    }
  }

  /// Append a donator bank account; blank input is ignored.
  pub fn add_bank_account(&mut self, input: &str) -> bool {
    let account = input.trim();
    if account.is_empty() {
      return false;
    }
    self.donator_bank_accounts.push(account.to_owned());
    true
  }

  pub fn remove_bank_account(&mut self, index: usize) {
    if index < self.donator_bank_accounts.len() {
      self.donator_bank_accounts.remove(index);
    }
  }

  /// Append a donator alternate email; blank or malformed input is ignored.
  pub fn add_email(&mut self, input: &str) -> bool {
    let email = input.trim();
    if email.is_empty() || !is_valid_email(email) {
      return false;
    }
    self.donator_emails.push(email.to_owned());
    true
  }

  pub fn remove_email(&mut self, index: usize) {
    if index < self.donator_emails.len() {
      self.donator_emails.remove(index);
    }
  }

  /// Build the insert payload. Empty optional text becomes absent and empty
  /// date strings become `None`; malformed dates are rejected.
  pub fn to_new_person(&self, report: &CompletenessReport) -> Result<NewPerson> {
    Ok(NewPerson {
      first_name:              self.first_name.trim().to_owned(),
      last_name:               self.last_name.trim().to_owned(),
      email:                   self.email.trim().to_owned(),
      phone:                   self.phone.trim().to_owned(),
      engagement:              self.engagement.clone(),
      birth_date:              parse_date_input(&self.birth_date)?,
      pesel:                   non_empty(&self.pesel),
      street:                  non_empty(&self.street),
      city:                    non_empty(&self.city),
      postal_code:             non_empty(&self.postal_code),
      country:                 non_empty(&self.country),
      bank_account:            non_empty(&self.bank_account),
      tax_declaration_file:    self.tax_declaration_file.clone(),
      volunteer_start_date:    parse_date_input(&self.volunteer_start_date)?,
      volunteer_end_date:      parse_date_input(&self.volunteer_end_date)?,
      volunteer_contract_file: self.volunteer_contract_file.clone(),
      donator_bank_accounts:   self.donator_bank_accounts.clone(),
      donator_emails:          self.donator_emails.clone(),
      completeness_problems:   report.problems.clone(),
    })
  }
}

impl From<&Person> for PersonDraft {
  fn from(p: &Person) -> Self {
    let date = |d: Option<NaiveDate>| {
      d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
    };
    Self {
      first_name:              p.first_name.clone(),
      last_name:               p.last_name.clone(),
      email:                   p.email.clone(),
      phone:                   p.phone.clone(),
      engagement:              p.engagement.clone(),
      birth_date:              date(p.birth_date),
      pesel:                   p.pesel.clone().unwrap_or_default(),
      street:                  p.street.clone().unwrap_or_default(),
      city:                    p.city.clone().unwrap_or_default(),
      postal_code:             p.postal_code.clone().unwrap_or_default(),
      country:                 p.country.clone().unwrap_or_default(),
      bank_account:            p.bank_account.clone().unwrap_or_default(),
      tax_declaration_file:    p.tax_declaration_file.clone(),
      volunteer_start_date:    date(p.volunteer_start_date),
      volunteer_end_date:      date(p.volunteer_end_date),
      volunteer_contract_file: p.volunteer_contract_file.clone(),
      donator_bank_accounts:   p.donator_bank_accounts.clone(),
      donator_emails:          p.donator_emails.clone(),
    }
  }
}

pub(crate) fn non_empty(s: &str) -> Option<String> {
  let t = s.trim();
  (!t.is_empty()).then(|| t.to_owned())
}
