//! Settings: users and document templates, one tab each.

use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::Style,
  text::{Line, Span},
  widgets::{Paragraph, Row, Table, Wrap},
};
use roster_core::{template::DocumentTemplate, user::User};

use super::{field_lines, framed, scrolled, theme::Palette};
use crate::pages::settings::{SettingsPage, SettingsTab, TemplateForm, TemplateRow, TemplatesMode};

pub fn draw(
  f: &mut Frame,
  area: Rect,
  page: &SettingsPage,
  users: &[User],
  templates: &[DocumentTemplate],
  is_admin: bool,
  p: &Palette,
) {
  let [tabs, body] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

  let tab = |label: &'static str, active: bool| {
    Span::styled(format!(" {label} "), if active { p.cursor() } else { p.dim() })
  };
  let line = Line::from(vec![
    tab("Users", page.tab == SettingsTab::Users),
    Span::raw(" "),
    tab("Documents", page.tab == SettingsTab::Documents),
  ]);
  f.render_widget(Paragraph::new(line), tabs);

  match page.tab {
    SettingsTab::Users => draw_users(f, body, page, users, is_admin, p),
    SettingsTab::Documents => match &page.templates_mode {
      TemplatesMode::Form(form) => draw_template_form(f, body, form, p),
      _ => draw_templates(f, body, page, templates, p),
    },
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

fn draw_users(f: &mut Frame, area: Rect, page: &SettingsPage, users: &[User], is_admin: bool, p: &Palette) {
  let [bar, table_area, note] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(0),
    Constraint::Length(if is_admin { 0 } else { 2 }),
  ])
  .areas(area);

  let search_style = if page.searching { p.cursor() } else { p.text() };
  let role = page.role_filter.map(|r| r.to_string()).unwrap_or_else(|| "all".to_owned());
  let line = Line::from(vec![
    Span::styled(" / ", p.dim()),
    Span::styled(format!("{:<24}", page.user_search), search_style),
    Span::styled("  role: ", p.dim()),
    Span::styled(role, p.title()),
  ]);
  f.render_widget(Paragraph::new(line), bar);

  let visible = page.visible_users(users);
  let rows = visible.iter().enumerate().map(|(i, u)| {
    let style = if i == page.user_cursor { p.cursor() } else { p.text() };
    Row::new(vec![u.name.clone(), u.email.clone(), u.role.to_string()]).style(style)
  });
  let table = Table::new(rows, [
    Constraint::Percentage(35),
    Constraint::Percentage(45),
    Constraint::Percentage(20),
  ])
  .header(Row::new(vec!["Name", "Email", "Role"]).style(p.title()))
  .block(framed(&format!("Users ({})", visible.len()), p));
  f.render_widget(table, table_area);

  if !is_admin {
    let text = "Only administrators can see every user. Roles are assigned in the backend console.";
    f.render_widget(Paragraph::new(Line::styled(text, p.dim())).wrap(Wrap { trim: true }), note);
  }
}

// ─── Templates ───────────────────────────────────────────────────────────────

fn draw_templates(f: &mut Frame, area: Rect, page: &SettingsPage, templates: &[DocumentTemplate], p: &Palette) {
  let [table_area, footer] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

  let rows = templates.iter().enumerate().map(|(i, t)| {
    let style = if i == page.template_cursor { p.cursor() } else { p.text() };
    let active = if t.is_active { "active" } else { "inactive" };
    Row::new(vec![
      t.name.clone(),
      t.doc_type.to_string(),
      active.to_owned(),
      t.custom_fields.len().to_string(),
      t.url.clone(),
    ])
    .style(style)
  });
  let table = Table::new(rows, [
    Constraint::Percentage(25),
    Constraint::Length(10),
    Constraint::Length(10),
    Constraint::Length(8),
    Constraint::Min(10),
  ])
  .header(Row::new(vec!["Name", "Type", "Status", "Fields", "URL"]).style(p.title()))
  .block(framed(&format!("Document templates ({})", templates.len()), p));
  f.render_widget(table, table_area);

  if let TemplatesMode::ConfirmDelete(_) = page.templates_mode {
    let line = Line::styled(" Delete this template? y/n", Style::default().fg(p.warning));
    f.render_widget(Paragraph::new(line), footer);
  }
}

fn draw_template_form(f: &mut Frame, area: Rect, form: &TemplateForm, p: &Palette) {
  let [fields, builtins] =
    Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)]).areas(area);
  let draft = &form.draft;
  let error = |key: &str| form.errors.get(key).map(String::as_str);

  let mut lines: Vec<Line> = Vec::new();
  let mut focus_line = 0;
  for (i, row) in form.rows().into_iter().enumerate() {
    let focused = i == form.focus;
    if focused {
      focus_line = lines.len();
    }
    match row {
      TemplateRow::Name => lines.extend(field_lines("Name *", &draft.name, focused, error("name"), p)),
      TemplateRow::Type => {
        let value = format!("◂ {} ▸", draft.doc_type);
        lines.extend(field_lines("Type", &value, focused, None, p));
      }
      TemplateRow::Url => lines.extend(field_lines("URL *", &draft.url, focused, error("url"), p)),
      TemplateRow::Active => {
        let mark = if draft.is_active { "[x]" } else { "[ ]" };
        lines.extend(field_lines("Active", mark, focused, None, p));
      }
      TemplateRow::NewField => {
        lines.extend(field_lines("Add custom field", &form.field_input, focused, None, p));
      }
      TemplateRow::CustomField(idx) => {
        let name = draft.custom_fields.get(idx).map(String::as_str).unwrap_or_default();
        lines.extend(field_lines("  field", name, focused, None, p));
      }
    }
  }
  if let Some(e) = error("form") {
    lines.push(Line::styled(e.to_owned(), Style::default().fg(p.error)));
  }
  let title = if form.id.is_some() { "Edit template" } else { "New template" };
  scrolled(lines, focus_line, framed(title, p), fields, f);

  let builtin: Vec<Line> = draft
    .doc_type
    .built_in_fields()
    .into_iter()
    .map(|name| Line::styled(format!("{{{{{name}}}}}"), p.dim()))
    .collect();
  f.render_widget(Paragraph::new(builtin).block(framed("Built-in fields", p)), builtins);
}
