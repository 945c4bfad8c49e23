//! Request and response shapes of the document-generation function.
//!
//! The function is an external collaborator; these types fix its JSON
//! contract (camelCase keys) on both the client and the stub server.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, contract::Contract, person::Person};

/// The only action the function understands.
pub const GENERATE_SOURCE_DOCUMENT: &str = "generateSourceDocument";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentRequest {
  pub action:     String,
  pub user_email: String,
  pub ctx:        DocumentContext,
}

/// Context passed through to the template renderer. Kept as raw JSON so the
/// server never has to agree with the client on the full record shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContext {
  #[serde(default)]
  pub person:   serde_json::Value,
  #[serde(default)]
  pub contract: serde_json::Value,
}

/// The person fields a template can reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonContext<'a> {
  pub first_name:   &'a str,
  pub last_name:    &'a str,
  pub email:        &'a str,
  pub phone:        &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub birth_date:   Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pesel:        Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub street:       Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city:         Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub postal_code:  Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country:      Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bank_account: Option<&'a str>,
}

impl<'a> From<&'a Person> for PersonContext<'a> {
  fn from(p: &'a Person) -> Self {
    Self {
      first_name:   &p.first_name,
      last_name:    &p.last_name,
      email:        &p.email,
      phone:        &p.phone,
      birth_date:   p.birth_date,
      pesel:        p.pesel.as_deref(),
      street:       p.street.as_deref(),
      city:         p.city.as_deref(),
      postal_code:  p.postal_code.as_deref(),
      country:      p.country.as_deref(),
      bank_account: p.bank_account.as_deref(),
    }
  }
}

/// The contract fields a template can reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractContext<'a> {
  pub template_id:   Option<Uuid>,
  pub start_date:    NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub end_date:      Option<NaiveDate>,
  pub custom_fields: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a Contract> for ContractContext<'a> {
  fn from(c: &'a Contract) -> Self {
    Self {
      template_id:   c.template_id,
      start_date:    c.start_date,
      end_date:      c.end_date,
      custom_fields: &c.custom_fields,
    }
  }
}

impl GenerateDocumentRequest {
  pub fn new(user_email: &str, person: &Person, contract: &Contract) -> Result<Self> {
    Ok(Self {
      action:     GENERATE_SOURCE_DOCUMENT.to_owned(),
      user_email: user_email.to_owned(),
      ctx:        DocumentContext {
        person:   serde_json::to_value(PersonContext::from(person))?,
        contract: serde_json::to_value(ContractContext::from(contract))?,
      },
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedFile {
  pub name: String,
  pub url:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentResponse {
  pub source_document_url: String,
  pub files:               Vec<GeneratedFile>,
}

/// Failure body: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
  pub error: String,
}
