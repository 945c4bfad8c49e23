//! Application state machine and command dispatcher.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use anyhow::{Context, bail};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use roster_core::{
  Error as CoreError,
  completeness::evaluate,
  contract::{Contract, ContractDraft},
  document::GenerateDocumentRequest,
  gateway::{AuthProvider, AuthSubscription, DocumentGenerator, Gateway},
  guard::{Decision, Guard},
  person::{PersonDraft, PersonUpdate},
  route::{NAVIGATION, RecoveryLink, Route},
  template::{DocumentTemplate, TemplateDraft, TemplateUpdate},
  theme::ThemeMode,
  user::{AuthEvent, Role, User},
  validate::validate_new_password,
  wizard::WizardAction,
};
use roster_store::{
  AuthStore, ContractStore, PersonStore, StoreError, TemplateStore, ThemeStore,
  development_user,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  form::is_ctrl,
  pages::{
    Command, ContractsPage, EditContractPage, LoginPage, Page, PersonsPage, ResetPage,
    SettingsPage, WizardPage, persons::PersonsMode,
  },
};

const TOAST_TTL: Duration = Duration::from_secs(4);

/// The table gateway doubles as the document generator: both live on the
/// same hosted project.
pub trait Backend: Gateway + DocumentGenerator {}

impl<T: Gateway + DocumentGenerator> Backend for T {}

// ─── Toast ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
  Info,
  Error,
}

/// A transient notification shown in the status bar.
#[derive(Debug, Clone)]
pub struct Toast {
  pub message: String,
  pub kind:    ToastKind,
  pub expires: Instant,
}

// ─── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
  /// Origin used to build password-recovery links.
  pub app_url:          String,
  pub google_client_id: Option<String>,
  pub bypass_auth:      bool,
  pub theme:            ThemeMode,
  pub system_dark:      bool,
}

// ─── App ─────────────────────────────────────────────────────────────────────

pub struct App<A, G> {
  pub route:            Route,
  pub page:             Page,
  pub guard:            Guard,
  pub auth:             AuthStore<A, G>,
  pub persons:          PersonStore<G>,
  pub contracts:        ContractStore<G>,
  pub templates:        TemplateStore<G>,
  pub theme:            ThemeStore,
  /// Rows of the settings "Users" tab.
  pub users:            Vec<User>,
  pub toast:            Option<Toast>,
  pub system_dark:      bool,
  pub google_client_id: Option<String>,
  app_url:              String,
  /// Where to go once signed in, remembered by the guard redirect.
  redirect:             Option<Route>,
  generator:            Arc<G>,
  events:               AuthSubscription,
}

impl<A: AuthProvider, G: Backend> App<A, G> {
  pub fn new(auth: Arc<A>, backend: Arc<G>, options: AppOptions) -> Self {
    let (auth_store, guard) = if options.bypass_auth {
      warn!("authentication bypassed; acting as the development user");
      (AuthStore::bypassed(auth, backend.clone()), Guard::bypass(development_user()))
    } else {
      (AuthStore::new(auth, backend.clone()), Guard::new())
    };
    let events = auth_store.subscribe();

    Self {
      route: Route::Dashboard,
      page: Page::Loading,
      guard,
      auth: auth_store,
      persons: PersonStore::new(backend.clone()),
      contracts: ContractStore::new(backend.clone()),
      templates: TemplateStore::new(backend.clone()),
      theme: ThemeStore::new(options.theme),
      users: Vec::new(),
      toast: None,
      system_dark: options.system_dark,
      google_client_id: options.google_client_id,
      app_url: options.app_url,
      redirect: None,
      generator: backend,
      events,
    }
  }

  pub fn is_dark(&self) -> bool { self.theme.is_dark(self.system_dark) }

  /// `<app origin>/reset-password`, the landing page of recovery emails.
  pub fn reset_redirect(&self) -> String {
    format!("{}{}", self.app_url.trim_end_matches('/'), Route::ResetPassword.path())
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  fn notify(&mut self, kind: ToastKind, message: impl Into<String>) {
    self.toast = Some(Toast { message: message.into(), kind, expires: Instant::now() + TOAST_TTL });
  }

  fn info(&mut self, message: impl Into<String>) { self.notify(ToastKind::Info, message) }

  fn error(&mut self, message: impl Into<String>) { self.notify(ToastKind::Error, message) }

  // ── Session ───────────────────────────────────────────────────────────────

  /// Resolve the initial session, then show `initial`.
  pub async fn start(&mut self, initial: Route) {
    if !self.guard.is_bypassed() {
      match self.auth.restore().await {
        Ok(session) => {
          if let Some(user_id) = self.guard.on_session(session.as_ref()) {
            self.resolve_role(user_id).await;
          }
        }
        Err(e) => {
          self.error(format!("Could not restore session: {e}"));
          self.guard.on_session(None);
        }
      }
      self.drain_events();
    }
    self.navigate(initial).await;
  }

  /// Look up a role and apply it to the guard and the auth store. A failed
  /// lookup leaves the user as guest.
  async fn resolve_role(&mut self, user_id: Uuid) {
    match self.auth.fetch_role(user_id).await {
      Ok(role) => {
        self.guard.on_role(user_id, Some(role));
        self.auth.set_role(user_id, role);
      }
      Err(e) => warn!(%user_id, error = %e, "role lookup failed"),
    }
  }

  /// Feed pending auth events to the guard and the auth store. Returns the
  /// users whose role must be resolved and whether a sign-out was seen.
  fn drain_events(&mut self) -> (Vec<Uuid>, bool) {
    let mut pending = Vec::new();
    let mut signed_out = false;
    while let Some(event) = self.events.try_recv() {
      debug!(?event, "auth event");
      let from_guard = self.guard.on_event(&event);
      let from_store = self.auth.apply_event(&event);
      if let Some(id) = from_guard.or(from_store) {
        if !pending.contains(&id) {
          pending.push(id);
        }
      }
      signed_out |= event == AuthEvent::SignedOut;
    }
    (pending, signed_out)
  }

  /// Periodic housekeeping: expire the toast and react to auth changes made
  /// outside the current screen (token refresh, sign-out elsewhere).
  pub async fn tick(&mut self) {
    if self.toast.as_ref().is_some_and(|t| t.expires <= Instant::now()) {
      self.toast = None;
    }
    let (pending, signed_out) = self.drain_events();
    for user_id in pending {
      self.resolve_role(user_id).await;
    }
    if signed_out && self.route.is_guarded() {
      info!("session ended");
      self.navigate(self.route).await;
    }
  }

  // ── Navigation ────────────────────────────────────────────────────────────

  pub async fn navigate(&mut self, mut route: Route) {
    loop {
      match self.guard.decide(&route) {
        Decision::Wait => {
          self.route = route;
          self.page = Page::Loading;
          return;
        }
        Decision::RedirectToLogin { from } => {
          debug!(%from, "redirecting to sign in");
          self.redirect = Some(Route::parse(&from));
          route = Route::Login;
        }
        Decision::Render => {}
      }
      if route == Route::Login && self.guard.user().is_some() {
        route = self.redirect.take().unwrap_or(Route::Dashboard);
        continue;
      }
      match self.enter(route).await {
        Ok(page) => {
          debug!(route = %route.path(), "navigated");
          self.route = route;
          self.page = page;
          return;
        }
        Err(redirect) => route = redirect,
      }
    }
  }

  /// Build the page for `route`, loading what it shows. `Err` redirects.
  async fn enter(&mut self, route: Route) -> Result<Page, Route> {
    let page = match route {
      Route::Login => Page::Login(LoginPage::default()),
      Route::ResetPassword => Page::ResetPassword(ResetPage::default()),
      Route::Dashboard => {
        self.load_persons().await;
        Page::Dashboard
      }
      Route::Persons => {
        self.load_persons().await;
        Page::Persons(PersonsPage::default())
      }
      Route::Contracts => {
        self.load_contracts().await;
        Page::Contracts(ContractsPage::default())
      }
      Route::NewContract => {
        self.load_persons().await;
        self.load_templates().await;
        Page::NewContract(Box::new(WizardPage::new()))
      }
      Route::EditContract(id) => {
        self.load_templates().await;
        match self.contracts.get_by_id(id).await {
          Ok(Some(contract)) => Page::EditContract(Box::new(EditContractPage::new(contract))),
          Ok(None) => {
            self.error("Contract not found");
            return Err(Route::Contracts);
          }
          Err(e) => {
            self.error(format!("Failed to load contract: {e}"));
            return Err(Route::Contracts);
          }
        }
      }
      Route::Settings => {
        self.load_users().await;
        self.load_templates().await;
        Page::Settings(SettingsPage::default())
      }
      Route::Receipts | Route::Donations | Route::Help => Page::Stub,
    };
    Ok(page)
  }

  async fn load_persons(&mut self) {
    if let Err(e) = self.persons.fetch_all().await {
      self.error(format!("Failed to load persons: {e}"));
    }
  }

  async fn load_contracts(&mut self) {
    if let Err(e) = self.contracts.fetch_all().await {
      self.error(format!("Failed to load contracts: {e}"));
    }
  }

  async fn load_templates(&mut self) {
    if let Err(e) = self.templates.fetch_all().await {
      self.error(format!("Failed to load templates: {e}"));
    }
  }

  /// Admins see every role assignment; everyone else only themselves.
  async fn load_users(&mut self) {
    if !self.guard.allows(&[Role::Admin]) {
      self.users = self.guard.user().cloned().into_iter().collect();
      return;
    }
    if self.auth.is_bypassed() {
      self.users = vec![development_user()];
      return;
    }
    match self.auth.list_users().await {
      Ok(users) => self.users = users,
      Err(e) => self.error(format!("Failed to load users: {e}")),
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    if is_ctrl(key, 'c') {
      return Ok(false);
    }
    if is_ctrl(key, 't') {
      let mode = self.theme.toggle();
      self.info(format!("Theme: {mode}"));
      return Ok(true);
    }
    if is_ctrl(key, 'o') && self.guard.user().is_some() {
      self.sign_out().await;
      return Ok(true);
    }

    if !self.page.captures_text() {
      match key.code {
        KeyCode::Char('q') => return Ok(false),
        KeyCode::Char(c @ '1'..='7') if self.guard.user().is_some() => {
          let index = c as usize - '1' as usize;
          self.navigate(NAVIGATION[index]).await;
          return Ok(true);
        }
        _ => {}
      }
    }

    let today = Local::now().date_naive();
    let command = match &mut self.page {
      Page::Login(page) => page.handle_key(key),
      Page::ResetPassword(page) => page.handle_key(key),
      Page::Persons(page) => page.handle_key(key, self.persons.persons(), self.persons.sort),
      Page::Contracts(page) => page.handle_key(key, self.contracts.contracts(), today),
      Page::NewContract(page) => {
        let active: Vec<DocumentTemplate> = self.templates.active().cloned().collect();
        page.handle_key(key, self.persons.persons(), &active)
      }
      Page::EditContract(page) => page.handle_key(key, self.templates.templates()),
      Page::Settings(page) => page.handle_key(key, &self.users, self.templates.templates()),
      Page::Loading | Page::Dashboard | Page::Stub => None,
    };

    match command {
      Some(Command::Quit) => Ok(false),
      Some(command) => {
        self.run(command).await;
        Ok(true)
      }
      None => Ok(true),
    }
  }

  // ── Commands ──────────────────────────────────────────────────────────────

  async fn run(&mut self, command: Command) {
    match command {
      Command::Navigate(route) => self.navigate(route).await,
      Command::Quit => {}
      Command::SignIn { email, password } => self.sign_in(&email, &password).await,
      Command::ForgotPassword { email } => self.forgot_password(&email).await,
      Command::ResetPassword { link, password, confirm } => {
        match self.reset_password(&link, &password, &confirm).await {
          Ok(()) => {
            self.info("Password updated successfully");
            self.navigate(Route::Login).await;
          }
          Err(e) => {
            if let Page::ResetPassword(page) = &mut self.page {
              page.error = Some(describe(&e));
            }
          }
        }
      }
      Command::SortPersons(field) => self.persons.sort = self.persons.sort.toggled(field),
      Command::SavePerson { id, draft } => self.save_person(id, draft).await,
      Command::DeletePerson(id) => match self.persons.delete(id).await {
        Ok(()) => self.info("Person deleted"),
        Err(e) => self.error(format!("Failed to delete person: {e}")),
      },
      Command::AdvanceStatus(id) => match self.contracts.advance_status(id).await {
        Ok(contract) => {
          self.info(format!("Status: {}", contract.status.label()));
          self.refresh_edit_page(contract);
        }
        Err(e) => self.error(format!("Failed to update status: {e}")),
      },
      Command::SaveContract { id, draft } => match self.save_contract(id, &draft).await {
        Ok(contract) => {
          self.info("Contract saved");
          self.refresh_edit_page(contract);
        }
        Err(e) => self.error(format!("Failed to save contract: {}", describe(&e))),
      },
      Command::GenerateDocument(id) => match self.generate_document(id).await {
        Ok(contract) => {
          self.info("Document generated");
          self.refresh_edit_page(contract);
        }
        Err(e) => self.error(format!("Failed to generate document: {e}")),
      },
      Command::DeleteContract(id) => match self.contracts.delete(id).await {
        Ok(()) => self.info("Contract deleted"),
        Err(e) => self.error(format!("Failed to delete contract: {e}")),
      },
      Command::Wizard(action) => self.run_wizard(action).await,
      Command::SaveTemplate { id, draft } => match self.save_template(id, &draft).await {
        Ok(template) => {
          self.info(format!("Template \"{}\" saved", template.name));
          if let Page::Settings(page) = &mut self.page {
            page.close_form();
          }
        }
        Err(e) => self.error(format!("Failed to save template: {}", describe(&e))),
      },
      Command::ToggleTemplate(id) => match self.templates.toggle_status(id).await {
        Ok(t) => self.info(format!("{} is now {}", t.name, if t.is_active { "active" } else { "inactive" })),
        Err(e) => self.error(format!("Failed to update template: {e}")),
      },
      Command::DeleteTemplate(id) => match self.templates.delete(id).await {
        Ok(()) => self.info("Template deleted"),
        Err(e) => self.error(format!("Failed to delete template: {e}")),
      },
    }
  }

  async fn sign_in(&mut self, email: &str, password: &str) {
    if let Page::Login(page) = &mut self.page {
      page.busy = true;
    }
    match self.auth.sign_in(email, password).await {
      Ok(user) => {
        self.drain_events();
        self.guard.on_role(user.id, Some(user.role));
        self.info(format!("Signed in as {}", user.name));
        let target = self.redirect.take().unwrap_or(Route::Dashboard);
        self.navigate(target).await;
      }
      Err(e) => {
        if let Page::Login(page) = &mut self.page {
          page.busy = false;
          page.error = Some(e.to_string());
        }
      }
    }
  }

  async fn sign_out(&mut self) {
    if let Err(e) = self.auth.sign_out().await {
      self.error(format!("Sign out failed: {e}"));
      return;
    }
    if self.guard.is_bypassed() {
      self.guard = Guard::new();
      self.guard.on_session(None);
    }
    self.drain_events();
    self.redirect = None;
    self.users.clear();
    self.navigate(Route::Login).await;
  }

  async fn forgot_password(&mut self, email: &str) {
    let redirect = self.reset_redirect();
    let result = self.auth.request_password_reset(email, &redirect).await;
    if let Page::Login(page) = &mut self.page {
      match result {
        Ok(()) => {
          page.error = None;
          page.notice = Some("Check your email for the password reset link".into());
        }
        Err(e) => page.error = Some(e.to_string()),
      }
    }
  }

  async fn reset_password(&mut self, link: &str, password: &str, confirm: &str) -> anyhow::Result<()> {
    validate_new_password(password, confirm)?;
    let Some(link) = RecoveryLink::parse(link) else {
      bail!("Invalid or expired password reset link");
    };
    self.auth.verify_recovery(&link.access_token).await?;
    self.auth.update_password(&link.access_token, password, confirm).await?;
    Ok(())
  }

  async fn save_person(&mut self, id: Option<Uuid>, draft: PersonDraft) {
    let report = evaluate(&draft);
    let new = match draft.to_new_person(&report) {
      Ok(new) => new,
      Err(e) => {
        self.error(e.to_string());
        return;
      }
    };
    let result = match id {
      Some(id) => self.persons.update(id, &PersonUpdate::from(new)).await,
      None => self.persons.create(&new).await,
    };
    match result {
      Ok(person) => {
        if person.is_complete() {
          self.info(format!("{} saved", person.full_name()));
        } else {
          self.info(format!("{} saved with an incomplete profile", person.full_name()));
        }
        if let Page::Persons(page) = &mut self.page {
          page.mode = PersonsMode::List;
        }
      }
      Err(e) => self.error(format!("Failed to save person: {e}")),
    }
  }

  async fn save_contract(&mut self, id: Uuid, draft: &ContractDraft) -> anyhow::Result<Contract> {
    let update = draft.to_update()?;
    Ok(self.contracts.update(id, &update).await?)
  }

  /// Ask the generation function for a source document and record its URL
  /// on the contract.
  async fn generate_document(&mut self, id: Uuid) -> anyhow::Result<Contract> {
    let contract = self.contracts.cached(id).cloned().context("Contract not found")?;
    let person = match self.persons.cached(contract.person_id).cloned() {
      Some(person) => person,
      None => self
        .persons
        .get_by_id(contract.person_id)
        .await?
        .context("Person not found")?,
    };
    let user_email = self.guard.user().map(|u| u.email.clone()).unwrap_or_default();
    let request = GenerateDocumentRequest::new(&user_email, &person, &contract)?;

    info!(contract = %id, "generating document");
    let response = self.generator.generate(&request).await?;
    Ok(self.contracts.attach_document(id, response.source_document_url).await?)
  }

  async fn save_template(
    &mut self,
    id: Option<Uuid>,
    draft: &TemplateDraft,
  ) -> anyhow::Result<DocumentTemplate> {
    let new = draft.to_new_template()?;
    let template = match id {
      Some(id) => self.templates.update(id, &TemplateUpdate::from(new)).await?,
      None => self.templates.create(&new).await?,
    };
    Ok(template)
  }

  async fn run_wizard(&mut self, action: WizardAction) {
    match action {
      WizardAction::UpdatePerson { id, update } => {
        let result = self.persons.update(id, &update).await;
        if let Page::NewContract(page) = &mut self.page {
          match result {
            Ok(person) => page.wizard.profile_updated(person),
            Err(e) => page.wizard.profile_update_failed(e.to_string()),
          }
        }
      }
      WizardAction::CreateContract(new) => match self.contracts.create(&new).await {
        Ok(_) => {
          if let Page::NewContract(page) = &mut self.page {
            page.wizard.contract_created();
          }
          self.info("Contract created");
          self.navigate(Route::Contracts).await;
        }
        Err(e) => {
          if let Page::NewContract(page) = &mut self.page {
            page.wizard.contract_failed(e.to_string());
          }
        }
      },
      WizardAction::Exit => self.navigate(Route::Contracts).await,
      WizardAction::Moved(_) | WizardAction::ConfirmUpdate => {}
    }
  }

  fn refresh_edit_page(&mut self, contract: Contract) {
    if let Page::EditContract(page) = &mut self.page {
      if page.contract.id == contract.id {
        page.refresh(contract);
      }
    }
  }
}

/// User-facing text for an error; validation failures show only their
/// field messages.
fn describe(e: &anyhow::Error) -> String {
  let core = e.downcast_ref::<CoreError>().or_else(|| match e.downcast_ref::<StoreError>() {
    Some(StoreError::Core(core)) => Some(core),
    _ => None,
  });
  match core {
    Some(CoreError::Validation(errors)) => {
      errors.values().cloned().collect::<Vec<_>>().join("; ")
    }
    _ => e.to_string(),
  }
}

#[cfg(test)]
mod tests;
