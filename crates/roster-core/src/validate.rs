//! Local, synchronous validation. Nothing here touches the network; a failed
//! check blocks submission before any request is made.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::{
  Error, Result,
  error::FieldErrors,
  person::{PersonDraft, PersonField},
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex")
});

// scheme "://" authority, then anything without whitespace
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("url regex")
});

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(s: &str) -> bool { EMAIL_RE.is_match(s) }

pub fn is_valid_url(s: &str) -> bool { URL_RE.is_match(s.trim()) }

/// Parse a `YYYY-MM-DD` form value; empty or whitespace input is `None`.
pub fn parse_date_input(s: &str) -> Result<Option<NaiveDate>> {
  let s = s.trim();
  if s.is_empty() {
    return Ok(None);
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map(Some)
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}

/// Required-field and email-shape checks for the person form.
pub fn validate_person(draft: &PersonDraft) -> Result<()> {
  let mut errors = FieldErrors::new();

  if draft.first_name.trim().is_empty() {
    errors.insert(PersonField::FirstName.key(), "First name is required".into());
  }
  if draft.last_name.trim().is_empty() {
    errors.insert(PersonField::LastName.key(), "Last name is required".into());
  }
  if draft.email.trim().is_empty() {
    errors.insert(PersonField::Email.key(), "Email is required".into());
  } else if !is_valid_email(draft.email.trim()) {
    errors.insert(PersonField::Email.key(), "Email is invalid".into());
  }
  if draft.phone.trim().is_empty() {
    errors.insert(PersonField::Phone.key(), "Phone number is required".into());
  }

  for field in [
    PersonField::BirthDate,
    PersonField::VolunteerStartDate,
    PersonField::VolunteerEndDate,
  ] {
    if parse_date_input(draft.field(field)).is_err() {
      errors.insert(field.key(), format!("{} must be YYYY-MM-DD", field.label()));
    }
  }

  if errors.is_empty() { Ok(()) } else { Err(Error::Validation(errors)) }
}

/// Checks for the reset-password form.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<()> {
  let mut errors = FieldErrors::new();
  if password != confirm {
    errors.insert("password", "Passwords do not match".into());
  } else if password.chars().count() < MIN_PASSWORD_LEN {
    errors.insert(
      "password",
      format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
    );
  }
  if errors.is_empty() { Ok(()) } else { Err(Error::Validation(errors)) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn email_shape() {
    assert!(is_valid_email("a@b.co"));
    assert!(!is_valid_email("a@b"));
    assert!(!is_valid_email("a b@c.de"));
    assert!(!is_valid_email("@c.de"));
  }

  #[test]
  fn url_shape() {
    assert!(is_valid_url("https://docs.google.com/document/d/abc/edit"));
    assert!(is_valid_url("http://localhost:8080"));
    assert!(!is_valid_url("docs.google.com/document"));
    assert!(!is_valid_url("https://"));
    assert!(!is_valid_url(""));
  }

  #[test]
  fn person_form_reports_each_field() {
    let draft = PersonDraft { email: "nope".into(), ..Default::default() };
    let Err(Error::Validation(errors)) = validate_person(&draft) else {
      panic!("expected validation errors");
    };
    assert_eq!(errors["firstName"], "First name is required");
    assert_eq!(errors["email"], "Email is invalid");
    assert_eq!(errors.len(), 4);
  }

  #[test]
  fn password_rules() {
    assert!(validate_new_password("secret1", "secret1").is_ok());
    assert!(validate_new_password("abc", "abc").is_err());
    let Err(Error::Validation(errors)) = validate_new_password("abcdef", "abcdeg")
    else {
      panic!("expected mismatch");
    };
    assert_eq!(errors["password"], "Passwords do not match");
  }
}
