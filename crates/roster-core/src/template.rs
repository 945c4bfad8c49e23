//! Document templates: externally hosted documents with named placeholders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, error::FieldErrors, validate::is_valid_url};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentType {
  #[default]
  Contract,
  Receipt,
}

const PERSON_FIELDS: [&str; 11] = [
  "FIRST_NAME",
  "LAST_NAME",
  "EMAIL",
  "PHONE",
  "BIRTH_DATE",
  "PESEL",
  "STREET",
  "CITY",
  "POSTAL_CODE",
  "COUNTRY",
  "BANK_ACCOUNT",
];

const RECEIPT_EXTRA_FIELDS: [&str; 4] =
  ["CONTRACT_NUMBER", "CONTRACT_DATE", "RECEIPT_NUMBER", "RECEIPT_DATE"];

impl DocumentType {
  /// Placeholders every template of this type can use. Display only.
  pub fn built_in_fields(self) -> Vec<&'static str> {
    match self {
      Self::Contract => PERSON_FIELDS.to_vec(),
      Self::Receipt => PERSON_FIELDS
        .iter()
        .chain(RECEIPT_EXTRA_FIELDS.iter())
        .copied()
        .collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTemplate {
  pub id:            Uuid,
  pub name:          String,
  pub doc_type:      DocumentType,
  pub url:           String,
  pub is_active:     bool,
  pub custom_fields: Vec<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDocumentTemplate {
  pub name:          String,
  pub doc_type:      DocumentType,
  pub url:           String,
  pub is_active:     bool,
  pub custom_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateUpdate {
  pub name:          Option<String>,
  pub doc_type:      Option<DocumentType>,
  pub url:           Option<String>,
  pub is_active:     Option<bool>,
  pub custom_fields: Option<Vec<String>>,
}

impl From<NewDocumentTemplate> for TemplateUpdate {
  fn from(t: NewDocumentTemplate) -> Self {
    Self {
      name:          Some(t.name),
      doc_type:      Some(t.doc_type),
      url:           Some(t.url),
      is_active:     Some(t.is_active),
      custom_fields: Some(t.custom_fields),
    }
  }
}

/// Normalise a custom field name: trimmed and upper-cased.
pub fn normalize_field_name(input: &str) -> Option<String> {
  let name = input.trim();
  (!name.is_empty()).then(|| name.to_uppercase())
}

/// Editable template form state.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDraft {
  pub name:          String,
  pub doc_type:      DocumentType,
  pub url:           String,
  pub is_active:     bool,
  pub custom_fields: Vec<String>,
}

impl Default for TemplateDraft {
  fn default() -> Self {
    Self {
      name:          String::new(),
      doc_type:      DocumentType::Contract,
      url:           String::new(),
      is_active:     true,
      custom_fields: Vec::new(),
    }
  }
}

impl TemplateDraft {
  /// Add a custom field; returns `false` for blank input or a duplicate
  /// (compared after upper-casing).
  pub fn add_custom_field(&mut self, input: &str) -> bool {
    let Some(name) = normalize_field_name(input) else {
      return false;
    };
    if self.custom_fields.contains(&name) {
      return false;
    }
    self.custom_fields.push(name);
    true
  }

  pub fn remove_custom_field(&mut self, name: &str) {
    self.custom_fields.retain(|f| f != name);
  }

  pub fn validate(&self) -> Result<()> {
    let mut errors = FieldErrors::new();
    if self.name.trim().is_empty() {
      errors.insert("name", "Name is required".into());
    }
    if self.url.trim().is_empty() {
      errors.insert("url", "URL is required".into());
    } else if !is_valid_url(&self.url) {
      errors.insert("url", "Please enter a valid URL".into());
    }
    if errors.is_empty() { Ok(()) } else { Err(Error::Validation(errors)) }
  }

  pub fn to_new_template(&self) -> Result<NewDocumentTemplate> {
    self.validate()?;
    Ok(NewDocumentTemplate {
      name:          self.name.trim().to_owned(),
      doc_type:      self.doc_type,
      url:           self.url.trim().to_owned(),
      is_active:     self.is_active,
      custom_fields: self.custom_fields.clone(),
    })
  }
}

impl From<&DocumentTemplate> for TemplateDraft {
  fn from(t: &DocumentTemplate) -> Self {
    Self {
      name:          t.name.clone(),
      doc_type:      t.doc_type,
      url:           t.url.clone(),
      is_active:     t.is_active,
      custom_fields: t.custom_fields.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn custom_fields_are_uppercased_and_deduplicated() {
    let mut d = TemplateDraft::default();
    assert!(d.add_custom_field("project_name"));
    assert!(!d.add_custom_field("project_name"));
    assert!(!d.add_custom_field("  PROJECT_NAME "));
    assert!(!d.add_custom_field("   "));
    assert_eq!(d.custom_fields, vec!["PROJECT_NAME"]);

    d.remove_custom_field("PROJECT_NAME");
    assert!(d.custom_fields.is_empty());
  }

  #[test]
  fn receipt_has_extra_built_in_fields() {
    assert_eq!(DocumentType::Contract.built_in_fields().len(), 11);
    let receipt = DocumentType::Receipt.built_in_fields();
    assert_eq!(receipt.len(), 15);
    assert_eq!(receipt.last(), Some(&"RECEIPT_DATE"));
  }

  #[test]
  fn validation_requires_name_and_absolute_url() {
    let d = TemplateDraft { url: "example.com/doc".into(), ..Default::default() };
    let Err(Error::Validation(errors)) = d.validate() else {
      panic!("expected errors");
    };
    assert_eq!(errors["name"], "Name is required");
    assert_eq!(errors["url"], "Please enter a valid URL");

    let d = TemplateDraft {
      name: "Umowa".into(),
      url: "https://docs.google.com/document/d/1/edit".into(),
      ..Default::default()
    };
    assert!(d.to_new_template().unwrap().is_active);
  }
}
