//! App tests against the in-memory backend doubles.

use std::sync::Arc;

use crossterm::event::KeyCode;
use roster_core::{
  completeness::evaluate,
  contract::NewContract,
  gateway::{AuthProvider, Table},
  person::{Engagement, PersonDraft},
  query::{SortDirection, SortField},
  route::Route,
  theme::ThemeMode,
  user::Role,
  wizard::WizardStep,
};
use roster_store::{
  DEV_USER_EMAIL,
  memory::{GENERATED_DOCUMENT_URL, MemoryAuth, MemoryGateway},
};
use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::form::{ctrl, key};

type TestApp = App<MemoryAuth, MemoryGateway>;

fn backend() -> (Arc<MemoryAuth>, Arc<MemoryGateway>) {
  (Arc::new(MemoryAuth::new()), Arc::new(MemoryGateway::new()))
}

fn options(bypass_auth: bool) -> AppOptions {
  AppOptions { app_url: "http://localhost:5173".into(), bypass_auth, ..Default::default() }
}

async fn bypassed_app() -> (TestApp, Arc<MemoryGateway>) {
  let (auth, gw) = backend();
  let mut app = App::new(auth, gw.clone(), options(true));
  app.start(Route::Dashboard).await;
  (app, gw)
}

async fn press(app: &mut TestApp, code: KeyCode) -> bool {
  app.handle_key(key(code)).await.unwrap()
}

async fn type_str(app: &mut TestApp, s: &str) {
  for c in s.chars() {
    press(app, KeyCode::Char(c)).await;
  }
}

async fn add_contractor(app: &mut TestApp) -> Uuid {
  let draft = PersonDraft {
    first_name: "Joanna".into(),
    last_name: "Smith".into(),
    email: "joanna@example.org".into(),
    phone: "600 100 200".into(),
    engagement: vec![Engagement::Contractor],
    birth_date: "1991-02-03".into(),
    pesel: "91020312345".into(),
    street: "Prosta 1".into(),
    city: "Łódź".into(),
    postal_code: "90-001".into(),
    country: "PL".into(),
    bank_account: "PL61109010140000071219812874".into(),
    ..Default::default()
  };
  let new = draft.to_new_person(&evaluate(&draft)).unwrap();
  app.persons.create(&new).await.unwrap().id
}

fn toast(app: &TestApp) -> Option<&str> { app.toast.as_ref().map(|t| t.message.as_str()) }

// ─── Auth flow ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn guarded_route_redirects_to_login_and_back() {
  let (auth, gw) = backend();
  auth.register("ann@ngo.pl", Some("Ann Nowak"));
  let mut app = App::new(auth, gw, options(false));

  app.start(Route::Persons).await;
  assert_eq!(app.route, Route::Login);

  type_str(&mut app, "ann@ngo.pl").await;
  press(&mut app, KeyCode::Tab).await;
  type_str(&mut app, "wrong").await;
  press(&mut app, KeyCode::Enter).await;
  let Page::Login(page) = &app.page else { panic!("left the login page") };
  assert_eq!(page.error.as_deref(), Some("Invalid login credentials"));

  for _ in 0..5 {
    press(&mut app, KeyCode::Backspace).await;
  }
  type_str(&mut app, "secret").await;
  press(&mut app, KeyCode::Enter).await;

  assert_eq!(app.route, Route::Persons);
  let user = app.guard.user().unwrap();
  assert_eq!(user.name, "Ann Nowak");
  assert_eq!(user.role, Role::Guest);
}

#[tokio::test]
async fn role_is_resolved_on_sign_in() {
  let (auth, gw) = backend();
  let user = auth.register("boss@ngo.pl", None);
  gw.add_auth_user(user.id, "boss@ngo.pl", None);
  gw.seed(Table::UserRoles, json!({ "user_id": user.id.to_string(), "role_id": "admin" }));
  let mut app = App::new(auth, gw, options(false));
  app.start(Route::Dashboard).await;

  type_str(&mut app, "boss@ngo.pl").await;
  press(&mut app, KeyCode::Tab).await;
  type_str(&mut app, "secret").await;
  press(&mut app, KeyCode::Enter).await;
  assert!(app.guard.allows(&[Role::Admin]));

  app.navigate(Route::Settings).await;
  assert_eq!(app.users.len(), 1);
  assert_eq!(app.users[0].name, "boss");
}

#[tokio::test]
async fn sign_out_elsewhere_returns_to_login() {
  let (auth, gw) = backend();
  auth.register("ann@ngo.pl", None);
  auth.sign_in_with_password("ann@ngo.pl", "secret").await.unwrap();
  let mut app = App::new(auth.clone(), gw, options(false));
  app.start(Route::Contracts).await;
  assert_eq!(app.route, Route::Contracts);

  auth.sign_out().await.unwrap();
  app.tick().await;
  assert_eq!(app.route, Route::Login);
  assert!(app.guard.user().is_none());
}

#[tokio::test]
async fn bypass_starts_as_the_development_user() {
  let (app, gw) = bypassed_app().await;
  assert_eq!(app.route, Route::Dashboard);
  let user = app.guard.user().unwrap();
  assert_eq!(user.email, DEV_USER_EMAIL);
  assert_eq!(user.role, Role::Admin);
  // only the dashboard's person fetch
  assert_eq!(gw.calls(), 1);
}

#[tokio::test]
async fn reset_password_is_validated_before_any_request() {
  let (auth, gw) = backend();
  let mut app = App::new(auth, gw, options(false));
  app.start(Route::ResetPassword).await;
  assert_eq!(app.route, Route::ResetPassword);

  type_str(&mut app, "http://localhost:5173/reset-password#access_token=t&type=recovery").await;
  press(&mut app, KeyCode::Tab).await;
  type_str(&mut app, "abcdef").await;
  press(&mut app, KeyCode::Tab).await;
  type_str(&mut app, "abcdeg").await;
  press(&mut app, KeyCode::Enter).await;

  let Page::ResetPassword(page) = &app.page else { panic!("left the reset page") };
  assert_eq!(page.error.as_deref(), Some("Passwords do not match"));
}

// ─── Navigation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn digits_navigate_and_q_quits() {
  let (mut app, _) = bypassed_app().await;
  press(&mut app, KeyCode::Char('2')).await;
  assert_eq!(app.route, Route::Persons);
  press(&mut app, KeyCode::Char('4')).await;
  assert_eq!(app.route, Route::Receipts);
  assert!(matches!(app.page, Page::Stub));
  assert!(!press(&mut app, KeyCode::Char('q')).await);
}

#[tokio::test]
async fn missing_contract_redirects_to_list() {
  let (mut app, _) = bypassed_app().await;
  app.navigate(Route::EditContract(Uuid::new_v4())).await;
  assert_eq!(app.route, Route::Contracts);
  assert_eq!(toast(&app), Some("Contract not found"));
}

#[tokio::test]
async fn contract_load_failure_is_not_reported_as_missing() {
  let (mut app, gw) = bypassed_app().await;
  gw.fail_requests(true);

  let entered = app.enter(Route::EditContract(Uuid::new_v4())).await;
  assert!(matches!(entered, Err(Route::Contracts)));
  assert_eq!(toast(&app), Some("Failed to load contract: connection refused"));
  assert_eq!(app.contracts.status().error(), Some("connection refused"));

  app.navigate(Route::EditContract(Uuid::new_v4())).await;
  assert_eq!(app.route, Route::Contracts);
}

#[tokio::test]
async fn theme_toggles_from_system_to_dark() {
  let (mut app, _) = bypassed_app().await;
  assert_eq!(app.theme.mode(), ThemeMode::System);
  app.handle_key(ctrl('t')).await.unwrap();
  assert_eq!(app.theme.mode(), ThemeMode::Dark);
  assert!(app.is_dark());
}

// ─── Persons ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_person_form_makes_no_request() {
  let (mut app, gw) = bypassed_app().await;
  app.navigate(Route::Persons).await;
  press(&mut app, KeyCode::Char('n')).await;
  let calls = gw.calls();

  app.handle_key(ctrl('s')).await.unwrap();
  assert_eq!(gw.calls(), calls);
  let Page::Persons(page) = &app.page else { panic!("left the persons page") };
  let PersonsMode::Form(form) = &page.mode else { panic!("form closed") };
  assert_eq!(form.errors.len(), 4);
}

#[tokio::test]
async fn person_form_saves_and_closes() {
  let (mut app, _) = bypassed_app().await;
  app.navigate(Route::Persons).await;
  press(&mut app, KeyCode::Char('n')).await;
  type_str(&mut app, "Ewa").await;
  press(&mut app, KeyCode::Down).await;
  type_str(&mut app, "Lis").await;
  press(&mut app, KeyCode::Down).await;
  type_str(&mut app, "ewa@ngo.pl").await;
  press(&mut app, KeyCode::Down).await;
  type_str(&mut app, "500").await;
  app.handle_key(ctrl('s')).await.unwrap();

  assert_eq!(app.persons.persons().len(), 1);
  assert_eq!(toast(&app), Some("Ewa Lis saved"));
  let Page::Persons(page) = &app.page else { panic!("left the persons page") };
  assert!(matches!(page.mode, PersonsMode::List));
}

#[tokio::test]
async fn sort_key_toggles_direction() {
  let (mut app, _) = bypassed_app().await;
  app.navigate(Route::Persons).await;
  press(&mut app, KeyCode::Char('N')).await;
  assert_eq!(app.persons.sort.field, SortField::FirstName);
  assert_eq!(app.persons.sort.direction, SortDirection::Desc);
  press(&mut app, KeyCode::Char('E')).await;
  assert_eq!(app.persons.sort.field, SortField::Email);
  assert_eq!(app.persons.sort.direction, SortDirection::Asc);
}

// ─── Contracts ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn wizard_creates_a_contract() {
  let (mut app, _) = bypassed_app().await;
  let person_id = add_contractor(&mut app).await;
  app.navigate(Route::NewContract).await;

  type_str(&mut app, "jo").await;
  press(&mut app, KeyCode::Enter).await;
  press(&mut app, KeyCode::Enter).await;
  let Page::NewContract(page) = &app.page else { panic!("left the wizard") };
  assert_eq!(page.wizard.step(), WizardStep::ContractDetails);

  press(&mut app, KeyCode::Down).await;
  type_str(&mut app, "2025-07-01").await;
  press(&mut app, KeyCode::Enter).await;

  assert_eq!(app.route, Route::Contracts);
  assert_eq!(toast(&app), Some("Contract created"));
  assert_eq!(app.contracts.contracts().len(), 1);
  assert_eq!(app.contracts.contracts()[0].person_id, person_id);
}

#[tokio::test]
async fn wizard_without_start_date_makes_no_request() {
  let (mut app, gw) = bypassed_app().await;
  add_contractor(&mut app).await;
  app.navigate(Route::NewContract).await;
  type_str(&mut app, "joanna").await;
  press(&mut app, KeyCode::Enter).await;
  press(&mut app, KeyCode::Enter).await;

  let calls = gw.calls();
  press(&mut app, KeyCode::Enter).await;
  assert_eq!(gw.calls(), calls);
  let Page::NewContract(page) = &app.page else { panic!("left the wizard") };
  assert_eq!(page.notice.as_deref(), Some("Start date is required"));
}

#[tokio::test]
async fn generate_document_attaches_source_url() {
  let (mut app, _) = bypassed_app().await;
  let person_id = add_contractor(&mut app).await;
  let new = NewContract {
    person_id,
    start_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1),
    ..Default::default()
  };
  let id = app.contracts.create(&new).await.unwrap().id;

  app.navigate(Route::EditContract(id)).await;
  app.handle_key(ctrl('g')).await.unwrap();

  assert_eq!(toast(&app), Some("Document generated"));
  let stored = app.contracts.cached(id).unwrap();
  assert_eq!(stored.source_document_url.as_deref(), Some(GENERATED_DOCUMENT_URL));
  let Page::EditContract(page) = &app.page else { panic!("left the edit page") };
  assert_eq!(page.contract.source_document_url.as_deref(), Some(GENERATED_DOCUMENT_URL));

  app.handle_key(ctrl('a')).await.unwrap();
  assert_eq!(toast(&app), Some("Status: Waiting For Signature"));
}
