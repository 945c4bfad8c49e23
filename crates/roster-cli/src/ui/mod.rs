//! TUI rendering. Orchestrates the header, sidebar, screen body and status
//! bar.

pub mod contracts;
pub mod dashboard;
pub mod login;
pub mod persons;
pub mod settings;
pub mod theme;
pub mod wizard;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};
use roster_core::{
  gateway::AuthProvider,
  route::{NAVIGATION, Route},
  user::Role,
};

use crate::{
  app::{App, Backend, ToastKind},
  pages::Page,
};
use theme::Palette;

// ─── Root draw ───────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<A: AuthProvider, G: Backend>(f: &mut Frame, app: &App<A, G>) {
  let palette = Palette::new(app.is_dark());
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0], app, &palette);

  let signed_in = app.guard.user().is_some();
  let body = if signed_in && !matches!(app.page, Page::Login(_) | Page::ResetPassword(_)) {
    let cols = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Length(18), Constraint::Min(0)])
      .split(rows[1]);
    draw_sidebar(f, cols[0], app.route, &palette);
    cols[1]
  } else {
    rows[1]
  };
  draw_body(f, body, app, &palette);
  draw_status(f, rows[2], app, &palette);
}

// ─── Header ──────────────────────────────────────────────────────────────────

fn draw_header<A: AuthProvider, G: Backend>(f: &mut Frame, area: Rect, app: &App<A, G>, p: &Palette) {
  let left = Span::styled(
    format!(" Roster │ {}", app.route.title()),
    Style::default().fg(p.fg).add_modifier(Modifier::BOLD),
  );
  let who = match app.guard.user() {
    Some(user) => format!("{} ({})", user.name, user.role),
    None => "not signed in".to_owned(),
  };
  let right = Span::styled(
    format!("{who}  theme: {}  {} ", app.theme.mode(), Local::now().format("%Y-%m-%d")),
    p.dim(),
  );

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(p.bar)), area);
}

// ─── Sidebar ─────────────────────────────────────────────────────────────────

fn draw_sidebar(f: &mut Frame, area: Rect, current: Route, p: &Palette) {
  // The wizard and the edit screen live under Contracts.
  let section = match current {
    Route::NewContract | Route::EditContract(_) => Route::Contracts,
    other => other,
  };
  let lines: Vec<Line> = NAVIGATION
    .iter()
    .enumerate()
    .map(|(i, route)| {
      let style = if *route == section { p.cursor() } else { p.text() };
      Line::styled(format!(" {} {:<12}", i + 1, route.title()), style)
    })
    .collect();

  let block = Block::default().borders(Borders::RIGHT).border_style(p.dim());
  f.render_widget(Paragraph::new(lines).block(block), area);
}

// ─── Body ────────────────────────────────────────────────────────────────────

fn draw_body<A: AuthProvider, G: Backend>(f: &mut Frame, area: Rect, app: &App<A, G>, p: &Palette) {
  match &app.page {
    Page::Loading => {
      let msg = Paragraph::new(Line::styled("Loading…", p.dim()));
      f.render_widget(msg, area);
    }
    Page::Login(page) => login::draw_login(f, area, page, app.google_client_id.as_deref(), p),
    Page::ResetPassword(page) => login::draw_reset(f, area, page, p),
    Page::Dashboard => dashboard::draw(f, area, app.persons.persons(), p),
    Page::Persons(page) => persons::draw(f, area, page, app.persons.persons(), app.persons.sort, p),
    Page::Contracts(page) => contracts::draw_list(f, area, page, app.contracts.contracts(), p),
    Page::NewContract(page) => {
      let active: Vec<_> = app.templates.active().cloned().collect();
      wizard::draw(f, area, page, app.persons.persons(), &active, p);
    }
    Page::EditContract(page) => contracts::draw_edit(f, area, page, app.templates.templates(), p),
    Page::Settings(page) => settings::draw(
      f,
      area,
      page,
      &app.users,
      app.templates.templates(),
      app.guard.allows(&[Role::Admin]),
      p,
    ),
    Page::Stub => {
      let block = framed(app.route.title(), p);
      let msg = Paragraph::new(Line::styled("Coming soon.", p.dim())).block(block);
      f.render_widget(msg, area);
    }
  }
}

// ─── Status bar ──────────────────────────────────────────────────────────────

fn draw_status<A: AuthProvider, G: Backend>(f: &mut Frame, area: Rect, app: &App<A, G>, p: &Palette) {
  let (mode, hints) = app.page.hints();
  let (text, style) = match &app.toast {
    Some(toast) => {
      let color = match toast.kind {
        ToastKind::Info => p.success,
        ToastKind::Error => p.error,
      };
      (toast.message.clone(), Style::default().fg(color).add_modifier(Modifier::BOLD))
    }
    None => (hints.to_owned(), p.dim()),
  };

  let line = Line::from(vec![
    Span::styled(
      format!(" {mode} "),
      Style::default().fg(p.bar).bg(p.accent).add_modifier(Modifier::BOLD),
    ),
    Span::styled(format!("  {text}"), style),
  ]);
  f.render_widget(Paragraph::new(line).style(Style::default().bg(p.bar)), area);
}

// ─── Shared widgets ──────────────────────────────────────────────────────────

/// A bordered block with a title.
pub(crate) fn framed<'a>(title: &str, p: &Palette) -> Block<'a> {
  Block::default()
    .title(Span::styled(format!(" {title} "), p.title()))
    .borders(Borders::ALL)
    .border_style(p.dim())
}

/// One labelled form row, plus its error message if any.
pub(crate) fn field_lines<'a>(
  label: &str,
  value: &str,
  focused: bool,
  error: Option<&str>,
  p: &Palette,
) -> Vec<Line<'a>> {
  let marker = if focused { "›" } else { " " };
  let cursor = if focused { "_" } else { "" };
  let value_style = if focused { p.cursor() } else { p.text() };
  let mut lines = vec![Line::from(vec![
    Span::styled(format!("{marker} {label:<22}"), p.dim()),
    Span::styled(format!("{value}{cursor}"), value_style),
  ])];
  if let Some(e) = error {
    lines.push(Line::styled(format!("  {:<22}{e}", ""), Style::default().fg(p.error)));
  }
  lines
}

/// Render `lines` in `area`, scrolled so that line `focus` stays visible.
pub(crate) fn scrolled(lines: Vec<Line<'_>>, focus: usize, block: Block<'_>, area: Rect, f: &mut Frame) {
  let height = block.inner(area).height as usize;
  let offset = focus.saturating_sub(height.saturating_sub(1));
  f.render_widget(Paragraph::new(lines).block(block).scroll((offset as u16, 0)), area);
}
