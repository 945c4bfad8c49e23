//! Contract types, status progression and the active/archive classification.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, person::non_empty, validate::parse_date_input};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a contract is in its signing workflow.
///
/// Progression is linear: `in_progress → waiting_for_signature → signed`.
/// Only single forward steps are allowed; `signed` is terminal.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContractStatus {
  #[default]
  InProgress,
  WaitingForSignature,
  Signed,
}

impl ContractStatus {
  /// Title-cased label, e.g. "Waiting For Signature".
  pub fn label(self) -> &'static str {
    match self {
      Self::InProgress => "In Progress",
      Self::WaitingForSignature => "Waiting For Signature",
      Self::Signed => "Signed",
    }
  }

  pub fn next(self) -> Option<Self> {
    match self {
      Self::InProgress => Some(Self::WaitingForSignature),
      Self::WaitingForSignature => Some(Self::Signed),
      Self::Signed => None,
    }
  }

  /// Validate a requested transition.
  pub fn transition_to(self, to: Self) -> Result<Self> {
    if self.next() == Some(to) {
      Ok(to)
    } else {
      Err(Error::InvalidTransition {
        from: self.to_string(),
        to:   to.to_string(),
      })
    }
  }
}

// ─── Phase ───────────────────────────────────────────────────────────────────

/// Display-time classification; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractPhase {
  /// No end date, or the end date is today or later.
  Active,
  /// The end date has passed.
  Archive,
}

impl ContractPhase {
  pub fn classify(end_date: Option<NaiveDate>, today: NaiveDate) -> Self {
    match end_date {
      Some(end) if end < today => Self::Archive,
      _ => Self::Active,
    }
  }
}

// ─── Contract ────────────────────────────────────────────────────────────────

/// The person fields flattened into a contract for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSummary {
  pub id:         Uuid,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub phone:      String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl PersonSummary {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
  pub id:                  Uuid,
  pub person_id:           Uuid,
  pub start_date:          NaiveDate,
  /// Absent means open-ended.
  pub end_date:            Option<NaiveDate>,
  pub description:         Option<String>,
  pub status:              ContractStatus,
  pub template_id:         Option<Uuid>,
  pub custom_fields:       BTreeMap<String, String>,
  pub source_document_url: Option<String>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
  /// Joined owner, present on every read that embeds `persons`.
  pub person:              Option<PersonSummary>,
}

impl Contract {
  pub fn phase(&self, today: NaiveDate) -> ContractPhase {
    ContractPhase::classify(self.end_date, today)
  }

  pub fn pdf_url(&self) -> Option<String> {
    self.source_document_url.as_deref().map(pdf_export_url)
  }
}

/// Turn an editable document URL (`…/edit#...`) into its PDF export link.
pub fn pdf_export_url(source: &str) -> String {
  match source.find("/edit") {
    Some(pos) => format!("{}/export?format=pdf", &source[..pos]),
    None => source.to_owned(),
  }
}

/// Input to `ContractStore::create`. `start_date` is optional only so that the
/// store can reject its absence before any request is made.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContract {
  pub person_id:           Uuid,
  pub start_date:          Option<NaiveDate>,
  pub end_date:            Option<NaiveDate>,
  pub description:         Option<String>,
  pub status:              ContractStatus,
  pub template_id:         Option<Uuid>,
  pub custom_fields:       BTreeMap<String, String>,
  pub source_document_url: Option<String>,
}

/// A partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractUpdate {
  pub person_id:           Option<Uuid>,
  pub start_date:          Option<NaiveDate>,
  pub end_date:            Option<Option<NaiveDate>>,
  pub description:         Option<Option<String>>,
  pub status:              Option<ContractStatus>,
  pub template_id:         Option<Option<Uuid>>,
  pub custom_fields:       Option<BTreeMap<String, String>>,
  pub source_document_url: Option<Option<String>>,
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// Editable contract-details form state (wizard step 3 and the edit screen).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractDraft {
  pub template_id:   Option<Uuid>,
  pub start_date:    String,
  pub end_date:      String,
  pub description:   String,
  pub custom_fields: BTreeMap<String, String>,
}

impl ContractDraft {
  pub fn set_custom_field(&mut self, name: &str, value: impl Into<String>) {
    self.custom_fields.insert(name.to_owned(), value.into());
  }

  /// Local check performed before any contract write.
  pub fn validate(&self) -> Result<()> {
    if self.start_date.trim().is_empty() {
      return Err(Error::MissingStartDate);
    }
    Ok(())
  }

  pub fn to_new_contract(&self, person_id: Uuid) -> Result<NewContract> {
    self.validate()?;
    Ok(NewContract {
      person_id,
      start_date: parse_date_input(&self.start_date)?,
      end_date: parse_date_input(&self.end_date)?,
      description: non_empty(&self.description),
      status: ContractStatus::InProgress,
      template_id: self.template_id,
      custom_fields: self.custom_fields.clone(),
      source_document_url: None,
    })
  }

  pub fn to_update(&self) -> Result<ContractUpdate> {
    self.validate()?;
    Ok(ContractUpdate {
      start_date: parse_date_input(&self.start_date)?,
      end_date: Some(parse_date_input(&self.end_date)?),
      description: Some(non_empty(&self.description)),
      template_id: Some(self.template_id),
      custom_fields: Some(self.custom_fields.clone()),
      ..Default::default()
    })
  }
}

impl From<&Contract> for ContractDraft {
  fn from(c: &Contract) -> Self {
    Self {
      template_id:   c.template_id,
      start_date:    c.start_date.format("%Y-%m-%d").to_string(),
      end_date:      c
        .end_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default(),
      description:   c.description.clone().unwrap_or_default(),
      custom_fields: c.custom_fields.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn classification_boundaries() {
    let today = day(2025, 6, 15);
    assert_eq!(ContractPhase::classify(None, today), ContractPhase::Active);
    assert_eq!(
      ContractPhase::classify(Some(day(2025, 6, 15)), today),
      ContractPhase::Active
    );
    assert_eq!(
      ContractPhase::classify(Some(day(2025, 6, 16)), today),
      ContractPhase::Active
    );
    assert_eq!(
      ContractPhase::classify(Some(day(2025, 6, 14)), today),
      ContractPhase::Archive
    );
  }

  #[test]
  fn status_moves_forward_one_step() {
    use ContractStatus::*;
    assert_eq!(InProgress.transition_to(WaitingForSignature).unwrap(), WaitingForSignature);
    assert_eq!(WaitingForSignature.transition_to(Signed).unwrap(), Signed);
    assert!(InProgress.transition_to(Signed).is_err());
    assert!(Signed.transition_to(InProgress).is_err());
    assert_eq!(Signed.next(), None);
  }

  #[test]
  fn status_labels_and_wire_names() {
    assert_eq!(ContractStatus::WaitingForSignature.label(), "Waiting For Signature");
    assert_eq!(ContractStatus::WaitingForSignature.to_string(), "waiting_for_signature");
  }

  #[test]
  fn pdf_link_replaces_edit_suffix() {
    assert_eq!(
      pdf_export_url("https://docs.google.com/document/d/XYZ/edit?usp=sharing"),
      "https://docs.google.com/document/d/XYZ/export?format=pdf"
    );
    assert_eq!(pdf_export_url("https://x.org/a.pdf"), "https://x.org/a.pdf");
  }

  #[test]
  fn empty_start_date_is_rejected_and_empty_end_date_is_absent() {
    let draft = ContractDraft { start_date: "  ".into(), ..Default::default() };
    assert!(matches!(
      draft.to_new_contract(Uuid::nil()),
      Err(Error::MissingStartDate)
    ));

    let draft = ContractDraft { start_date: "2025-01-01".into(), ..Default::default() };
    let new = draft.to_new_contract(Uuid::nil()).unwrap();
    assert_eq!(new.start_date, Some(day(2025, 1, 1)));
    assert_eq!(new.end_date, None);
    assert_eq!(new.status, ContractStatus::InProgress);
  }
}
