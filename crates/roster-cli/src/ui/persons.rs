//! Person list and the create/edit form.

use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::Style,
  text::{Line, Span},
  widgets::{Paragraph, Row, Table},
};
use roster_core::{
  person::Person,
  query::{PersonFilter, SortDirection, SortField, SortState},
};
use strum::IntoEnumIterator;

use super::{field_lines, framed, scrolled, theme::Palette};
use crate::pages::persons::{FormRow, PersonForm, PersonsMode, PersonsPage};

pub fn draw(f: &mut Frame, area: Rect, page: &PersonsPage, persons: &[Person], sort: SortState, p: &Palette) {
  match &page.mode {
    PersonsMode::Form(form) => draw_form(f, area, form, p),
    _ => draw_list(f, area, page, persons, sort, p),
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

fn header_cell(field: SortField, sort: SortState) -> String {
  if field != sort.field {
    return field.label().to_owned();
  }
  let arrow = match sort.direction {
    SortDirection::Asc => "▲",
    SortDirection::Desc => "▼",
  };
  format!("{} {arrow}", field.label())
}

fn draw_list(f: &mut Frame, area: Rect, page: &PersonsPage, persons: &[Person], sort: SortState, p: &Palette) {
  let visible = page.visible(persons, sort);
  let [bar, table_area] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

  // Search and filter line.
  let search_style = if matches!(page.mode, PersonsMode::Search) { p.cursor() } else { p.text() };
  let mut spans = vec![
    Span::styled(" / ", p.dim()),
    Span::styled(format!("{:<24}", page.search), search_style),
    Span::styled("  filter: ", p.dim()),
  ];
  for filter in PersonFilter::iter() {
    let style = if filter == page.filter { p.title() } else { p.dim() };
    spans.push(Span::styled(format!("{filter} "), style));
  }
  f.render_widget(Paragraph::new(Line::from(spans)), bar);

  let rows = visible.iter().enumerate().map(|(i, person)| {
    let flag = if person.is_complete() { " " } else { "!" };
    let style = if i == page.cursor { p.cursor() } else { p.text() };
    Row::new(vec![
      format!("{flag} {}", person.first_name),
      person.last_name.clone(),
      person.email.clone(),
      person.phone.clone(),
      person.updated_at.format("%Y-%m-%d").to_string(),
    ])
    .style(style)
  });
  let header = Row::new(SortField::iter().map(|field| header_cell(field, sort)).collect::<Vec<_>>())
    .style(p.title());

  let title = format!("People ({}/{})", visible.len(), persons.len());
  let table = Table::new(rows, [
    Constraint::Percentage(18),
    Constraint::Percentage(20),
    Constraint::Percentage(30),
    Constraint::Percentage(17),
    Constraint::Percentage(15),
  ])
  .header(header)
  .block(framed(&title, p));
  f.render_widget(table, table_area);

  // Selected person's completeness problems, or the delete prompt.
  if let PersonsMode::ConfirmDelete(_) = page.mode {
    draw_footer(f, table_area, Line::styled("Delete this person? y/n", Style::default().fg(p.warning)));
  } else if let Some(person) = visible.get(page.cursor).filter(|x| !x.is_complete()) {
    let text = format!("Incomplete: {}", person.completeness_problems.join("; "));
    draw_footer(f, table_area, Line::styled(text, Style::default().fg(p.warning)));
  }
}

fn draw_footer(f: &mut Frame, area: Rect, line: Line<'_>) {
  if area.height < 3 {
    return;
  }
  let footer = Rect { x: area.x + 1, y: area.y + area.height - 2, width: area.width.saturating_sub(2), height: 1 };
  f.render_widget(Paragraph::new(line), footer);
}

// ─── Form ────────────────────────────────────────────────────────────────────

fn draw_form(f: &mut Frame, area: Rect, form: &PersonForm, p: &Palette) {
  let draft = &form.draft;
  let mut lines: Vec<Line> = Vec::new();
  let mut focus_line = 0;

  for (i, row) in form.rows().into_iter().enumerate() {
    let focused = i == form.focus;
    if focused {
      focus_line = lines.len();
    }
    match row {
      FormRow::Field(field) => {
        let error = form.errors.get(field.key()).map(String::as_str);
        lines.extend(field_lines(field.label(), draft.field(field), focused, error, p));
      }
      FormRow::Engagement(e) => {
        let mark = if draft.has_engagement(e) { "[x]" } else { "[ ]" };
        lines.extend(field_lines(&format!("{e}"), mark, focused, None, p));
      }
      FormRow::TaxFile => {
        lines.extend(field_lines("Tax declaration file", &form.tax_file, focused, None, p));
      }
      FormRow::VolunteerFile => {
        lines.extend(field_lines("Volunteer contract", &form.volunteer_file, focused, None, p));
      }
      FormRow::NewBankAccount => {
        lines.extend(field_lines("Add bank account", &form.bank_input, focused, None, p));
      }
      FormRow::BankAccount(idx) => {
        let value = draft.donator_bank_accounts.get(idx).map(String::as_str).unwrap_or_default();
        lines.extend(field_lines("  account", value, focused, None, p));
      }
      FormRow::NewEmail => {
        let error = form.errors.get("donatorEmails").map(String::as_str);
        lines.extend(field_lines("Add email", &form.email_input, focused, error, p));
      }
      FormRow::DonatorEmail(idx) => {
        let value = draft.donator_emails.get(idx).map(String::as_str).unwrap_or_default();
        lines.extend(field_lines("  email", value, focused, None, p));
      }
    }
  }
  if let Some(e) = form.errors.get("form") {
    lines.push(Line::styled(e.clone(), Style::default().fg(p.error)));
  }

  let report = form.completeness();
  lines.push(Line::raw(""));
  if report.is_complete() {
    lines.push(Line::styled("Profile complete", Style::default().fg(p.success)));
  }
  for problem in report.problems {
    lines.push(Line::styled(format!("! {problem}"), Style::default().fg(p.warning)));
  }

  let title = if form.id.is_some() { "Edit person" } else { "New person" };
  scrolled(lines, focus_line, framed(title, p), area, f);
}
