//! Row types exchanged with the backend and their mapping to domain types.
//!
//! Column names on the wire are snake_case (and `firstname`/`lastname` for
//! historical reasons). Every translation lives here, in both directions, so
//! that no other layer ever sees a column name.
//!
//! Patch bodies skip `None` fields entirely; a present `Some(None)` serialises
//! as JSON `null` and clears the column.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  contract::{Contract, ContractStatus, ContractUpdate, NewContract, PersonSummary},
  person::{Attachment, Engagement, NewPerson, Person, PersonUpdate},
  template::{DocumentTemplate, DocumentType, NewDocumentTemplate, TemplateUpdate},
  user::{Role, User, UserMetadata},
};

// ─── Column selections ───────────────────────────────────────────────────────

/// Column selection for contract reads: every contract column plus the owning
/// person embedded under `person`.
pub const CONTRACT_WITH_PERSON: &str = "*, person:persons(*)";

/// Column selection for the users listing: role rows with the auth user.
pub const ROLE_WITH_USER: &str = "user_id, role_id, users:user_id(email, raw_user_meta_data)";

// ─── Persons ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PersonRow {
  pub id:                      Uuid,
  pub firstname:               String,
  pub lastname:                String,
  #[serde(default)]
  pub email:                   Option<String>,
  #[serde(default)]
  pub phone:                   Option<String>,
  #[serde(default)]
  pub engagement:              Option<Vec<Engagement>>,
  #[serde(default)]
  pub birth_date:              Option<NaiveDate>,
  #[serde(default)]
  pub pesel:                   Option<String>,
  #[serde(default)]
  pub street:                  Option<String>,
  #[serde(default)]
  pub city:                    Option<String>,
  #[serde(default)]
  pub postal_code:             Option<String>,
  #[serde(default)]
  pub country:                 Option<String>,
  #[serde(default)]
  pub bank_account:            Option<String>,
  #[serde(default)]
  pub tax_declaration_file:    Option<String>,
  #[serde(default)]
  pub volunteer_start_date:    Option<NaiveDate>,
  #[serde(default)]
  pub volunteer_end_date:      Option<NaiveDate>,
  #[serde(default)]
  pub volunteer_contract_file: Option<String>,
  #[serde(default)]
  pub donator_bank_accounts:   Option<Vec<String>>,
  #[serde(default)]
  pub donator_emails:          Option<Vec<String>>,
  #[serde(default)]
  pub completeness_problems:   Option<Vec<String>>,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              DateTime<Utc>,
}

impl From<PersonRow> for Person {
  fn from(r: PersonRow) -> Self {
    Self {
      id:                      r.id,
      first_name:              r.firstname,
      last_name:               r.lastname,
      email:                   r.email.unwrap_or_default(),
      phone:                   r.phone.unwrap_or_default(),
      engagement:              r.engagement.unwrap_or_default(),
      birth_date:              r.birth_date,
      pesel:                   r.pesel,
      street:                  r.street,
      city:                    r.city,
      postal_code:             r.postal_code,
      country:                 r.country,
      bank_account:            r.bank_account,
      tax_declaration_file:    r.tax_declaration_file.map(Attachment),
      volunteer_start_date:    r.volunteer_start_date,
      volunteer_end_date:      r.volunteer_end_date,
      volunteer_contract_file: r.volunteer_contract_file.map(Attachment),
      donator_bank_accounts:   r.donator_bank_accounts.unwrap_or_default(),
      donator_emails:          r.donator_emails.unwrap_or_default(),
      completeness_problems:   r.completeness_problems.unwrap_or_default(),
      created_at:              r.created_at,
      updated_at:              r.updated_at,
    }
  }
}

impl From<PersonRow> for PersonSummary {
  fn from(r: PersonRow) -> Self {
    Self {
      id:         r.id,
      first_name: r.firstname,
      last_name:  r.lastname,
      email:      r.email.unwrap_or_default(),
      phone:      r.phone.unwrap_or_default(),
      created_at: r.created_at,
      updated_at: r.updated_at,
    }
  }
}

/// Body of `insert into persons`.
#[derive(Debug, Clone, Serialize)]
pub struct PersonInsert {
  pub firstname:               String,
  pub lastname:                String,
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
  pub tax_declaration_file:    Option<String>,
  pub volunteer_start_date:    Option<NaiveDate>,
  pub volunteer_end_date:      Option<NaiveDate>,
  pub volunteer_contract_file: Option<String>,
  pub donator_bank_accounts:   Vec<String>,
  pub donator_emails:          Vec<String>,
  pub completeness_problems:   Vec<String>,
}

impl From<&NewPerson> for PersonInsert {
  fn from(p: &NewPerson) -> Self {
    Self {
      firstname:               p.first_name.clone(),
      lastname:                p.last_name.clone(),
      email:                   p.email.clone(),
      phone:                   p.phone.clone(),
      engagement:              p.engagement.clone(),
      birth_date:              p.birth_date,
      pesel:                   p.pesel.clone(),
      street:                  p.street.clone(),
      city:                    p.city.clone(),
      postal_code:             p.postal_code.clone(),
      country:                 p.country.clone(),
      bank_account:            p.bank_account.clone(),
      tax_declaration_file:    p.tax_declaration_file.as_ref().map(|a| a.0.clone()),
      volunteer_start_date:    p.volunteer_start_date,
      volunteer_end_date:      p.volunteer_end_date,
      volunteer_contract_file: p.volunteer_contract_file.as_ref().map(|a| a.0.clone()),
      donator_bank_accounts:   p.donator_bank_accounts.clone(),
      donator_emails:          p.donator_emails.clone(),
      completeness_problems:   p.completeness_problems.clone(),
    }
  }
}

/// Body of `update persons`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub firstname:               Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub lastname:                Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email:                   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone:                   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub engagement:              Option<Vec<Engagement>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub birth_date:              Option<Option<NaiveDate>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pesel:                   Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub street:                  Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city:                    Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub postal_code:             Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country:                 Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_account:            Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tax_declaration_file:    Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub volunteer_start_date:    Option<Option<NaiveDate>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub volunteer_end_date:      Option<Option<NaiveDate>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub volunteer_contract_file: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub donator_bank_accounts:   Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub donator_emails:          Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completeness_problems:   Option<Vec<String>>,
}

fn attachment_name(a: &Option<Option<Attachment>>) -> Option<Option<String>> {
  a.as_ref().map(|inner| inner.as_ref().map(|a| a.0.clone()))
}

impl From<&PersonUpdate> for PersonPatch {
  fn from(u: &PersonUpdate) -> Self {
    Self {
      firstname:               u.first_name.clone(),
      lastname:                u.last_name.clone(),
      email:                   u.email.clone(),
      phone:                   u.phone.clone(),
      engagement:              u.engagement.clone(),
      birth_date:              u.birth_date,
      pesel:                   u.pesel.clone(),
      street:                  u.street.clone(),
      city:                    u.city.clone(),
      postal_code:             u.postal_code.clone(),
      country:                 u.country.clone(),
      bank_account:            u.bank_account.clone(),
      tax_declaration_file:    attachment_name(&u.tax_declaration_file),
      volunteer_start_date:    u.volunteer_start_date,
      volunteer_end_date:      u.volunteer_end_date,
      volunteer_contract_file: attachment_name(&u.volunteer_contract_file),
      donator_bank_accounts:   u.donator_bank_accounts.clone(),
      donator_emails:          u.donator_emails.clone(),
      completeness_problems:   u.completeness_problems.clone(),
    }
  }
}

// ─── Contracts ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ContractRow {
  pub id:                  Uuid,
  pub person_id:           Uuid,
  pub start_date:          NaiveDate,
  #[serde(default)]
  pub end_date:            Option<NaiveDate>,
  #[serde(default)]
  pub description:         Option<String>,
  pub status:              ContractStatus,
  #[serde(default)]
  pub template_id:         Option<Uuid>,
  #[serde(default)]
  pub custom_fields:       Option<BTreeMap<String, String>>,
  #[serde(default)]
  pub source_document_url: Option<String>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
  #[serde(default)]
  pub person:              Option<PersonRow>,
}

impl From<ContractRow> for Contract {
  fn from(r: ContractRow) -> Self {
    Self {
      id:                  r.id,
      person_id:           r.person_id,
      start_date:          r.start_date,
      end_date:            r.end_date,
      description:         r.description,
      status:              r.status,
      template_id:         r.template_id,
      custom_fields:       r.custom_fields.unwrap_or_default(),
      source_document_url: r.source_document_url,
      created_at:          r.created_at,
      updated_at:          r.updated_at,
      person:              r.person.map(PersonSummary::from),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractInsert {
  pub person_id:           Uuid,
  pub start_date:          NaiveDate,
  pub end_date:            Option<NaiveDate>,
  pub description:         Option<String>,
  pub status:              ContractStatus,
  pub template_id:         Option<Uuid>,
  pub custom_fields:       BTreeMap<String, String>,
  pub source_document_url: Option<String>,
}

impl ContractInsert {
  /// `None` when the contract has no start date.
  pub fn from_new(c: &NewContract) -> Option<Self> {
    Some(Self {
      person_id:           c.person_id,
      start_date:          c.start_date?,
      end_date:            c.end_date,
      description:         c.description.clone(),
      status:              c.status,
      template_id:         c.template_id,
      custom_fields:       c.custom_fields.clone(),
      source_document_url: c.source_document_url.clone(),
    })
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContractPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub person_id:           Option<Uuid>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub start_date:          Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date:            Option<Option<NaiveDate>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description:         Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:              Option<ContractStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub template_id:         Option<Option<Uuid>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub custom_fields:       Option<BTreeMap<String, String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub source_document_url: Option<Option<String>>,
}

impl From<&ContractUpdate> for ContractPatch {
  fn from(u: &ContractUpdate) -> Self {
    Self {
      person_id:           u.person_id,
      start_date:          u.start_date,
      end_date:            u.end_date,
      description:         u.description.clone(),
      status:              u.status,
      template_id:         u.template_id,
      custom_fields:       u.custom_fields.clone(),
      source_document_url: u.source_document_url.clone(),
    }
  }
}

// ─── Document templates ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRow {
  pub id:            Uuid,
  pub name:          String,
  #[serde(rename = "type")]
  pub doc_type:      DocumentType,
  pub url:           String,
  pub is_active:     bool,
  #[serde(default)]
  pub custom_fields: Option<Vec<String>>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl From<TemplateRow> for DocumentTemplate {
  fn from(r: TemplateRow) -> Self {
    Self {
      id:            r.id,
      name:          r.name,
      doc_type:      r.doc_type,
      url:           r.url,
      is_active:     r.is_active,
      custom_fields: r.custom_fields.unwrap_or_default(),
      created_at:    r.created_at,
      updated_at:    r.updated_at,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInsert {
  pub name:          String,
  #[serde(rename = "type")]
  pub doc_type:      DocumentType,
  pub url:           String,
  pub is_active:     bool,
  pub custom_fields: Vec<String>,
}

impl From<&NewDocumentTemplate> for TemplateInsert {
  fn from(t: &NewDocumentTemplate) -> Self {
    Self {
      name:          t.name.clone(),
      doc_type:      t.doc_type,
      url:           t.url.clone(),
      is_active:     t.is_active,
      custom_fields: t.custom_fields.clone(),
    }
  }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplatePatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name:          Option<String>,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub doc_type:      Option<DocumentType>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:           Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active:     Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub custom_fields: Option<Vec<String>>,
}

impl From<&TemplateUpdate> for TemplatePatch {
  fn from(u: &TemplateUpdate) -> Self {
    Self {
      name:          u.name.clone(),
      doc_type:      u.doc_type,
      url:           u.url.clone(),
      is_active:     u.is_active,
      custom_fields: u.custom_fields.clone(),
    }
  }
}

// ─── User roles ──────────────────────────────────────────────────────────────

/// `select role_id from user_roles where user_id = ?`
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRow {
  pub role_id: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinedAuthUser {
  pub email:              Option<String>,
  #[serde(default)]
  pub raw_user_meta_data: Option<UserMetadata>,
}

/// A role assignment joined to its auth user (admin users listing).
#[derive(Debug, Clone, Deserialize)]
pub struct UserRoleRow {
  pub user_id: Uuid,
  pub role_id: Role,
  #[serde(default)]
  pub users:   Option<JoinedAuthUser>,
}

impl From<UserRoleRow> for User {
  fn from(r: UserRoleRow) -> Self {
    let (email, meta) = match r.users {
      Some(u) => (u.email, u.raw_user_meta_data.unwrap_or_default()),
      None => (None, UserMetadata::default()),
    };
    User::from_profile(r.user_id, email.as_deref(), &meta, r.role_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::user::{AuthUser, avatar_fallback};
  use serde_json::json;

  #[test]
  fn person_row_maps_wire_names_and_defaults() {
    let row: PersonRow = serde_json::from_value(json!({
      "id": "6f1c2d4e-8a9b-4c3d-9e8f-7a6b5c4d3e2f",
      "firstname": "John",
      "lastname": "Doe",
      "email": "john@example.org",
      "phone": "123",
      "engagement": null,
      "birth_date": "1990-05-04",
      "postal_code": "00-950",
      "completeness_problems": null,
      "created_at": "2024-01-01T10:00:00Z",
      "updated_at": "2024-01-02T10:00:00Z"
    }))
    .unwrap();
    let p = Person::from(row);
    assert_eq!(p.first_name, "John");
    assert!(p.engagement.is_empty());
    assert_eq!(p.postal_code.as_deref(), Some("00-950"));
    assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(1990, 5, 4));
    assert!(p.completeness_problems.is_empty());
  }

  #[test]
  fn person_row_tolerates_null_contact_columns() {
    let row: PersonRow = serde_json::from_value(json!({
      "id": "6f1c2d4e-8a9b-4c3d-9e8f-7a6b5c4d3e2f",
      "firstname": "John",
      "lastname": "Doe",
      "email": null,
      "phone": null,
      "created_at": "2024-01-01T10:00:00Z",
      "updated_at": "2024-01-02T10:00:00Z"
    }))
    .unwrap();
    let summary = PersonSummary::from(row.clone());
    assert_eq!(summary.phone, "");
    let p = Person::from(row);
    assert_eq!(p.email, "");
    assert_eq!(p.phone, "");
  }

  #[test]
  fn person_patch_skips_untouched_and_nulls_cleared() {
    let update = PersonUpdate {
      first_name: Some("Jane".into()),
      birth_date: Some(None),
      ..Default::default()
    };
    let body = serde_json::to_value(PersonPatch::from(&update)).unwrap();
    assert_eq!(body, json!({ "firstname": "Jane", "birth_date": null }));
  }

  #[test]
  fn contract_row_flattens_joined_person() {
    let row: ContractRow = serde_json::from_value(json!({
      "id": "11111111-1111-4111-8111-111111111111",
      "person_id": "22222222-2222-4222-8222-222222222222",
      "start_date": "2025-01-01",
      "end_date": null,
      "status": "waiting_for_signature",
      "template_id": null,
      "custom_fields": { "PROJECT_NAME": "Summer camp" },
      "created_at": "2025-01-01T00:00:00Z",
      "updated_at": "2025-01-01T00:00:00Z",
      "person": {
        "id": "22222222-2222-4222-8222-222222222222",
        "firstname": "Ann",
        "lastname": "Lee",
        "email": "ann@x.org",
        "phone": "1",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
      }
    }))
    .unwrap();
    let c = Contract::from(row);
    assert_eq!(c.status, ContractStatus::WaitingForSignature);
    assert_eq!(c.person.unwrap().full_name(), "Ann Lee");
    assert_eq!(c.custom_fields["PROJECT_NAME"], "Summer camp");
  }

  #[test]
  fn template_type_column_is_renamed() {
    let body = serde_json::to_value(TemplatePatch {
      doc_type: Some(DocumentType::Receipt),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(body, json!({ "type": "receipt" }));
  }

  #[test]
  fn user_role_row_defaults_display_fields() {
    let row: UserRoleRow = serde_json::from_value(json!({
      "user_id": "33333333-3333-4333-8333-333333333333",
      "role_id": "accountant",
      "users": { "email": "kasia@ngo.pl", "raw_user_meta_data": null }
    }))
    .unwrap();
    let user = User::from(row);
    assert_eq!(user.name, "kasia");
    assert_eq!(user.role, Role::Accountant);
    assert_eq!(user.picture, avatar_fallback("kasia@ngo.pl"));
  }

  #[test]
  fn user_role_row_maps_like_auth_user() {
    let row: UserRoleRow = serde_json::from_value(json!({
      "user_id": "33333333-3333-4333-8333-333333333333",
      "role_id": "admin",
      "users": { "email": "ola@ngo.pl", "raw_user_meta_data": { "full_name": "Ola K" } }
    }))
    .unwrap();
    let auth = AuthUser {
      id:            row.user_id,
      email:         Some("ola@ngo.pl".into()),
      user_metadata: UserMetadata { full_name: Some("Ola K".into()), avatar_url: None },
    };
    assert_eq!(User::from(row), User::from_auth_user(&auth).with_role(Role::Admin));

    let bare: UserRoleRow = serde_json::from_value(json!({
      "user_id": "33333333-3333-4333-8333-333333333333",
      "role_id": "guest"
    }))
    .unwrap();
    assert_eq!(User::from(bare).name, "User");
  }
}
