//! Derived list views: filtering, searching and sorting of cached records.
//!
//! Everything here is recomputed from store state on every render; nothing is
//! cached.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use strum::{Display, EnumIter, EnumString};

use crate::{
  contract::{Contract, ContractPhase, ContractStatus},
  person::{Engagement, Person},
  user::{Role, User},
};

/// Maximum number of matches shown by the contract wizard's person search.
pub const WIZARD_SEARCH_CAP: usize = 10;

/// Number of persons listed under "recently added" on the dashboard.
pub const RECENT_PERSONS: usize = 5;

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
  haystack.to_lowercase().contains(needle_lower)
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum PersonFilter {
  #[default]
  All,
  Incomplete,
  Volunteer,
  Donator,
  Contractor,
}

impl PersonFilter {
  pub fn matches(self, person: &Person) -> bool {
    match self {
      Self::All => true,
      Self::Incomplete => !person.is_complete(),
      Self::Volunteer => person.has_engagement(Engagement::Volunteer),
      Self::Donator => person.has_engagement(Engagement::Donator),
      Self::Contractor => person.has_engagement(Engagement::Contractor),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum SortField {
  FirstName,
  LastName,
  Email,
  Phone,
  UpdatedAt,
}

impl SortField {
  pub fn label(self) -> &'static str {
    match self {
      Self::FirstName => "Name",
      Self::LastName => "Last Name",
      Self::Email => "Email",
      Self::Phone => "Phone",
      Self::UpdatedAt => "Updated",
    }
  }

  fn compare(self, a: &Person, b: &Person) -> Ordering {
    let ci = |x: &str, y: &str| x.to_lowercase().cmp(&y.to_lowercase());
    match self {
      Self::FirstName => ci(&a.first_name, &b.first_name),
      Self::LastName => ci(&a.last_name, &b.last_name),
      Self::Email => ci(&a.email, &b.email),
      Self::Phone => ci(&a.phone, &b.phone),
      Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
  pub field:     SortField,
  pub direction: SortDirection,
}

impl Default for SortState {
  fn default() -> Self {
    Self { field: SortField::FirstName, direction: SortDirection::Asc }
  }
}

impl SortState {
  /// Clicking the current ascending column flips it to descending; anything
  /// else sorts ascending by `field`.
  pub fn toggled(self, field: SortField) -> Self {
    let direction =
      if self.field == field && self.direction == SortDirection::Asc {
        SortDirection::Desc
      } else {
        SortDirection::Asc
      };
    Self { field, direction }
  }
}

/// Search (first/last name, email, phone) and filter the person list.
pub fn filter_persons<'a>(
  persons: &'a [Person],
  text: &str,
  filter: PersonFilter,
) -> Vec<&'a Person> {
  let needle = text.trim().to_lowercase();
  persons
    .iter()
    .filter(|p| {
      needle.is_empty()
        || contains_ci(&p.first_name, &needle)
        || contains_ci(&p.last_name, &needle)
        || contains_ci(&p.email, &needle)
        || contains_ci(&p.phone, &needle)
    })
    .filter(|p| filter.matches(p))
    .collect()
}

pub fn sort_persons(persons: &mut [&Person], sort: SortState) {
  persons.sort_by(|a, b| {
    let ord = sort.field.compare(a, b);
    match sort.direction {
      SortDirection::Asc => ord,
      SortDirection::Desc => ord.reverse(),
    }
  });
}

/// Search-as-you-type for the contract wizard.
///
/// The query must begin the person's full name ("First Last") or email
/// address, compared case-insensitively. An empty query matches nothing, and
/// at most [`WIZARD_SEARCH_CAP`] persons are returned.
pub fn wizard_search<'a>(persons: &'a [Person], query: &str) -> Vec<&'a Person> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return Vec::new();
  }
  persons
    .iter()
    .filter(|p| {
      p.full_name().to_lowercase().starts_with(&needle)
        || p.email.to_lowercase().starts_with(&needle)
    })
    .take(WIZARD_SEARCH_CAP)
    .collect()
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats<'a> {
  pub total:             usize,
  pub with_email:        usize,
  pub with_phone:        usize,
  pub updated_last_week: usize,
  /// Newest first.
  pub recent:            Vec<&'a Person>,
}

impl<'a> DashboardStats<'a> {
  pub fn compute(persons: &'a [Person], now: DateTime<Utc>) -> Self {
    let week_ago = now - Duration::days(7);
    let mut recent: Vec<&Person> = persons.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(RECENT_PERSONS);

    Self {
      total: persons.len(),
      with_email: persons.iter().filter(|p| !p.email.is_empty()).count(),
      with_phone: persons.iter().filter(|p| !p.phone.is_empty()).count(),
      updated_last_week: persons
        .iter()
        .filter(|p| p.updated_at > week_ago)
        .count(),
      recent,
    }
  }
}

// ─── Contracts ───────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum PhaseFilter {
  #[default]
  All,
  Active,
  Archive,
}

impl PhaseFilter {
  pub fn matches(self, phase: ContractPhase) -> bool {
    match self {
      Self::All => true,
      Self::Active => phase == ContractPhase::Active,
      Self::Archive => phase == ContractPhase::Archive,
    }
  }
}

/// Contract list view state. Phase, status and text filters all apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractListQuery {
  pub phase:  PhaseFilter,
  /// `None` shows every status.
  pub status: Option<ContractStatus>,
  pub text:   String,
}

impl ContractListQuery {
  pub fn matches(&self, contract: &Contract, today: NaiveDate) -> bool {
    if !self.phase.matches(contract.phase(today)) {
      return false;
    }
    if self.status.is_some_and(|s| s != contract.status) {
      return false;
    }
    let needle = self.text.trim().to_lowercase();
    if needle.is_empty() {
      return true;
    }
    let person_hit = contract.person.as_ref().is_some_and(|p| {
      contains_ci(&p.first_name, &needle)
        || contains_ci(&p.last_name, &needle)
        || contains_ci(&p.email, &needle)
    });
    person_hit
      || contract
        .description
        .as_deref()
        .is_some_and(|d| contains_ci(d, &needle))
  }

  pub fn apply<'a>(
    &self,
    contracts: &'a [Contract],
    today: NaiveDate,
  ) -> Vec<&'a Contract> {
    contracts.iter().filter(|c| self.matches(c, today)).collect()
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// Settings "Users" tab: text over name/email plus an optional role.
pub fn filter_users<'a>(
  users: &'a [User],
  text: &str,
  role: Option<Role>,
) -> Vec<&'a User> {
  let needle = text.trim().to_lowercase();
  users
    .iter()
    .filter(|u| {
      needle.is_empty()
        || contains_ci(&u.name, &needle)
        || contains_ci(&u.email, &needle)
    })
    .filter(|u| role.is_none_or(|r| r == u.role))
    .collect()
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use uuid::Uuid;

  use super::*;
  use crate::contract::PersonSummary;

  fn at(days_ago: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-15T12:00:00Z")
      .unwrap()
      .with_timezone(&Utc)
      - Duration::days(days_ago)
  }

  fn person(first: &str, last: &str, email: &str) -> Person {
    Person {
      id:                      Uuid::new_v4(),
      first_name:              first.into(),
      last_name:               last.into(),
      email:                   email.into(),
      phone:                   String::new(),
      engagement:              Vec::new(),
      birth_date:              None,
      pesel:                   None,
      street:                  None,
      city:                    None,
      postal_code:             None,
      country:                 None,
      bank_account:            None,
      tax_declaration_file:    None,
      volunteer_start_date:    None,
      volunteer_end_date:      None,
      volunteer_contract_file: None,
      donator_bank_accounts:   Vec::new(),
      donator_emails:          Vec::new(),
      completeness_problems:   Vec::new(),
      created_at:              at(30),
      updated_at:              at(30),
    }
  }

  #[test]
  fn wizard_search_matches_names_and_caps_results() {
    let persons = vec![
      person("John", "Doe", "john.doe@example.org"),
      person("Joanna", "Smith", "joanna@example.org"),
      person("Mark", "Jones", "mark@example.org"),
    ];
    let names: Vec<String> =
      wizard_search(&persons, "jo").iter().map(|p| p.full_name()).collect();
    assert_eq!(names, vec!["John Doe", "Joanna Smith"]);
    assert!(wizard_search(&persons, "JOHN D").len() == 1);
    assert!(wizard_search(&persons, "").is_empty());

    let many: Vec<Person> = (0..25)
      .map(|i| person("Jo", &format!("N{i}"), &format!("jo{i}@x.org")))
      .collect();
    assert_eq!(wizard_search(&many, "jo").len(), WIZARD_SEARCH_CAP);
  }

  #[test]
  fn person_list_search_filter_and_sort() {
    let mut ann = person("ann", "Lee", "ann@x.org");
    ann.engagement = vec![Engagement::Volunteer];
    ann.completeness_problems = vec!["Volunteer contract not uploaded".into()];
    let mut bob = person("Bob", "Ray", "bob@x.org");
    bob.phone = "+48 600".into();
    let persons = vec![bob, ann];

    assert_eq!(filter_persons(&persons, "600", PersonFilter::All).len(), 1);
    assert_eq!(filter_persons(&persons, "", PersonFilter::Incomplete).len(), 1);
    assert_eq!(filter_persons(&persons, "", PersonFilter::Contractor).len(), 0);

    let mut list = filter_persons(&persons, "", PersonFilter::All);
    sort_persons(&mut list, SortState::default());
    assert_eq!(list[0].first_name, "ann");

    let sort = SortState::default().toggled(SortField::FirstName);
    assert_eq!(sort.direction, SortDirection::Desc);
    sort_persons(&mut list, sort);
    assert_eq!(list[0].first_name, "Bob");
    assert_eq!(sort.toggled(SortField::Email).direction, SortDirection::Asc);
  }

  #[test]
  fn dashboard_counts() {
    let mut a = person("A", "A", "a@x.org");
    a.updated_at = at(1);
    a.created_at = at(1);
    let b = person("B", "B", "");
    let persons = [b, a];
    let stats = DashboardStats::compute(&persons, at(0));
    assert_eq!(stats.total, 2);
    assert_eq!(stats.with_email, 1);
    assert_eq!(stats.with_phone, 0);
    assert_eq!(stats.updated_last_week, 1);
    assert_eq!(stats.recent[0].first_name, "A");
  }

  #[test]
  fn contract_query_combines_filters() {
    let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
    let contract = |end: Option<NaiveDate>, status, desc: &str| Contract {
      id: Uuid::new_v4(),
      person_id: Uuid::nil(),
      start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
      end_date: end,
      description: Some(desc.into()),
      status,
      template_id: None,
      custom_fields: BTreeMap::new(),
      source_document_url: None,
      created_at: at(10),
      updated_at: at(10),
      person: Some(PersonSummary {
        id:         Uuid::nil(),
        first_name: "Ann".into(),
        last_name:  "Lee".into(),
        email:      "ann@x.org".into(),
        phone:      String::new(),
        created_at: at(10),
        updated_at: at(10),
      }),
    };
    let contracts = vec![
      contract(None, ContractStatus::InProgress, "camp"),
      contract(Some(today), ContractStatus::Signed, "workshop"),
      contract(today.pred_opt(), ContractStatus::Signed, "camp"),
    ];

    let q = ContractListQuery::default();
    assert_eq!(q.apply(&contracts, today).len(), 3);

    let q = ContractListQuery { phase: PhaseFilter::Active, ..Default::default() };
    assert_eq!(q.apply(&contracts, today).len(), 2);

    let q = ContractListQuery {
      phase: PhaseFilter::All,
      status: Some(ContractStatus::Signed),
      text: "CAMP".into(),
    };
    let hits = q.apply(&contracts, today);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].phase(today), ContractPhase::Archive);

    let q = ContractListQuery { text: "lee".into(), ..Default::default() };
    assert_eq!(q.apply(&contracts, today).len(), 3);
  }

  #[test]
  fn users_filter_by_text_and_role() {
    let user = |name: &str, role| User {
      id: Uuid::new_v4(),
      email: format!("{}@ngo.pl", name.to_lowercase()),
      name: name.into(),
      picture: String::new(),
      role,
    };
    let users = vec![user("Kasia", Role::Accountant), user("Tomek", Role::Admin)];
    assert_eq!(filter_users(&users, "kas", None).len(), 1);
    assert_eq!(filter_users(&users, "", Some(Role::Admin))[0].name, "Tomek");
    assert!(filter_users(&users, "kas", Some(Role::Admin)).is_empty());
  }
}
