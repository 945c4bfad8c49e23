//! Profile completeness evaluation.
//!
//! Completeness is a derived status: a person is complete when every field
//! required by each of their engagement roles is filled in. Incomplete
//! persons are legal records; the problems are stored alongside them rather
//! than rejected.
//!
//! Problems are aggregated per group: one message naming all missing fields of
//! a group, plus one message per missing attachment.

use crate::person::{Engagement, Person, PersonDraft, PersonField};

/// Always required, regardless of engagement.
pub const MAIN_FIELDS: [PersonField; 4] = [
  PersonField::FirstName,
  PersonField::LastName,
  PersonField::Email,
  PersonField::Phone,
];

/// Required when the person is engaged as a contractor.
pub const CONTRACTOR_FIELDS: [PersonField; 6] = [
  PersonField::BirthDate,
  PersonField::Pesel,
  PersonField::Street,
  PersonField::City,
  PersonField::PostalCode,
  PersonField::BankAccount,
];

/// Required when the person is engaged as a volunteer.
pub const VOLUNTEER_FIELDS: [PersonField; 2] =
  [PersonField::VolunteerStartDate, PersonField::VolunteerEndDate];

pub const MISSING_TAX_DECLARATION: &str = "Tax declaration file not uploaded";
pub const MISSING_VOLUNTEER_CONTRACT: &str = "Volunteer contract not uploaded";

/// Outcome of a completeness check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletenessReport {
  pub problems: Vec<String>,
}

impl CompletenessReport {
  pub fn is_complete(&self) -> bool { self.problems.is_empty() }
}

/// Evaluate a draft against the required fields of its engagement roles.
pub fn evaluate(draft: &PersonDraft) -> CompletenessReport {
  let mut problems = Vec::new();

  if let Some(msg) = missing_group(draft, &MAIN_FIELDS, "Missing required fields")
  {
    problems.push(msg);
  }

  if draft.has_engagement(Engagement::Contractor) {
    if let Some(msg) =
      missing_group(draft, &CONTRACTOR_FIELDS, "Missing contractor fields")
    {
      problems.push(msg);
    }
    if draft.tax_declaration_file.is_none() {
      problems.push(MISSING_TAX_DECLARATION.to_owned());
    }
  }

  if draft.has_engagement(Engagement::Volunteer) {
    if let Some(msg) =
      missing_group(draft, &VOLUNTEER_FIELDS, "Missing volunteer fields")
    {
      problems.push(msg);
    }
    if draft.volunteer_contract_file.is_none() {
      problems.push(MISSING_VOLUNTEER_CONTRACT.to_owned());
    }
  }

  // Donator has no required fields.

  CompletenessReport { problems }
}

/// Evaluate a stored person, e.g. after an automatic profile update.
pub fn evaluate_person(person: &Person) -> CompletenessReport {
  evaluate(&PersonDraft::from(person))
}

fn missing_group(
  draft: &PersonDraft,
  fields: &[PersonField],
  prefix: &str,
) -> Option<String> {
  let missing: Vec<&str> = fields
    .iter()
    .filter(|f| draft.field(**f).trim().is_empty())
    .map(|f| f.label())
    .collect();
  (!missing.is_empty()).then(|| format!("{prefix}: {}", missing.join(", ")))
}
