//! Contract list and the edit screen.

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Paragraph, Row, Table},
};
use roster_core::{
  contract::{Contract, ContractDraft, ContractPhase, ContractStatus},
  query::PhaseFilter,
  template::DocumentTemplate,
};
use strum::IntoEnumIterator;

use super::{field_lines, framed, scrolled, theme::Palette};
use crate::pages::contracts::{ContractRow, ContractsMode, ContractsPage, EditContractPage};

fn status_style(status: ContractStatus, p: &Palette) -> Style {
  let color = match status {
    ContractStatus::InProgress => p.muted,
    ContractStatus::WaitingForSignature => p.warning,
    ContractStatus::Signed => p.success,
  };
  Style::default().fg(color)
}

fn date_or_dash(date: Option<chrono::NaiveDate>) -> String {
  date.map(|d| d.to_string()).unwrap_or_else(|| "—".to_owned())
}

// ─── List ────────────────────────────────────────────────────────────────────

pub fn draw_list(f: &mut Frame, area: Rect, page: &ContractsPage, contracts: &[Contract], p: &Palette) {
  let today = Local::now().date_naive();
  let visible = page.visible(contracts, today);
  let [bar, table_area, footer] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(0),
    Constraint::Length(1),
  ])
  .areas(area);

  let search_style = if page.mode == ContractsMode::Search { p.cursor() } else { p.text() };
  let mut spans = vec![
    Span::styled(" / ", p.dim()),
    Span::styled(format!("{:<24}", page.query.text), search_style),
    Span::styled("  phase: ", p.dim()),
  ];
  for phase in PhaseFilter::iter() {
    let style = if phase == page.query.phase { p.title() } else { p.dim() };
    spans.push(Span::styled(format!("{phase} "), style));
  }
  spans.push(Span::styled(" status: ", p.dim()));
  let status = page.query.status.map(ContractStatus::label).unwrap_or("all");
  spans.push(Span::styled(status, p.title()));
  f.render_widget(Paragraph::new(Line::from(spans)), bar);

  let rows = visible.iter().enumerate().map(|(i, c)| {
    let person = c.person.as_ref().map(|s| s.full_name()).unwrap_or_else(|| "—".to_owned());
    let mut row_style = if i == page.cursor { p.cursor() } else { p.text() };
    if c.phase(today) == ContractPhase::Archive && i != page.cursor {
      row_style = row_style.add_modifier(Modifier::DIM);
    }
    Row::new(vec![
      Line::raw(person),
      Line::raw(c.start_date.to_string()),
      Line::raw(date_or_dash(c.end_date)),
      Line::styled(c.status.label(), status_style(c.status, p)),
      Line::raw(c.description.clone().unwrap_or_default()),
      Line::raw(if c.source_document_url.is_some() { "PDF" } else { "" }),
    ])
    .style(row_style)
  });
  let title = format!("Contracts ({}/{})", visible.len(), contracts.len());
  let table = Table::new(rows, [
    Constraint::Percentage(20),
    Constraint::Length(11),
    Constraint::Length(11),
    Constraint::Length(22),
    Constraint::Min(10),
    Constraint::Length(4),
  ])
  .header(Row::new(vec!["Person", "Start", "End", "Status", "Description", ""]).style(p.title()))
  .block(framed(&title, p));
  f.render_widget(table, table_area);

  let line = match page.mode {
    ContractsMode::ConfirmDelete(_) => {
      Line::styled(" Delete this contract? y/n", Style::default().fg(p.warning))
    }
    _ => match visible.get(page.cursor).and_then(|c| c.pdf_url()) {
      Some(url) => Line::from(vec![Span::styled(" PDF: ", p.dim()), Span::styled(url, p.text())]),
      None => Line::raw(""),
    },
  };
  f.render_widget(Paragraph::new(line), footer);
}

// ─── Details form ────────────────────────────────────────────────────────────

/// Lines for the contract details rows plus the index of the focused line.
pub(crate) fn detail_lines<'a>(
  draft: &ContractDraft,
  rows: &[ContractRow],
  focus: usize,
  templates: &[DocumentTemplate],
  p: &Palette,
) -> (Vec<Line<'a>>, usize) {
  let mut lines = Vec::new();
  let mut focus_line = 0;
  for (i, row) in rows.iter().enumerate() {
    let focused = i == focus;
    if focused {
      focus_line = lines.len();
    }
    match row {
      ContractRow::Template => {
        let name = draft
          .template_id
          .and_then(|id| templates.iter().find(|t| t.id == id))
          .map(|t| t.name.as_str())
          .unwrap_or("(none)");
        lines.extend(field_lines("Template", &format!("◂ {name} ▸"), focused, None, p));
      }
      ContractRow::StartDate => {
        lines.extend(field_lines("Start date *", &draft.start_date, focused, None, p));
      }
      ContractRow::EndDate => {
        lines.extend(field_lines("End date", &draft.end_date, focused, None, p));
      }
      ContractRow::Description => {
        lines.extend(field_lines("Description", &draft.description, focused, None, p));
      }
      ContractRow::CustomField(name) => {
        let value = draft.custom_fields.get(name).map(String::as_str).unwrap_or_default();
        lines.extend(field_lines(name, value, focused, None, p));
      }
    }
  }
  (lines, focus_line)
}

// ─── Edit ────────────────────────────────────────────────────────────────────

pub fn draw_edit(
  f: &mut Frame,
  area: Rect,
  page: &EditContractPage,
  templates: &[DocumentTemplate],
  p: &Palette,
) {
  let c = &page.contract;
  let [info, form] = Layout::vertical([Constraint::Length(6), Constraint::Min(0)]).areas(area);

  let person = c
    .person
    .as_ref()
    .map(|s| format!("{} <{}>", s.full_name(), s.email))
    .unwrap_or_else(|| c.person_id.to_string());
  let pdf = c.pdf_url().unwrap_or_else(|| "not generated yet".to_owned());
  let info_lines = vec![
    Line::from(vec![Span::styled("Person   ", p.dim()), Span::styled(person, p.text())]),
    Line::from(vec![
      Span::styled("Status   ", p.dim()),
      Span::styled(c.status.label(), status_style(c.status, p)),
    ]),
    Line::from(vec![Span::styled("Document ", p.dim()), Span::styled(pdf, p.text())]),
    Line::from(vec![
      Span::styled("Updated  ", p.dim()),
      Span::styled(c.updated_at.format("%Y-%m-%d %H:%M").to_string(), p.text()),
    ]),
  ];
  f.render_widget(Paragraph::new(info_lines).block(framed("Contract", p)), info);

  let rows = page.rows(templates);
  let (mut lines, focus_line) = detail_lines(&page.draft, &rows, page.focus, templates, p);
  if let Some(e) = &page.error {
    lines.push(Line::raw(""));
    lines.push(Line::styled(e.clone(), Style::default().fg(p.error)));
  }
  scrolled(lines, focus_line, framed("Details", p), form, f);
}
