//! New-contract wizard: step indicator plus the current step's body.

use ratatui::{
  Frame,
  layout::{Constraint, Flex, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Clear, Paragraph},
};
use roster_core::{
  person::Person,
  template::DocumentTemplate,
  wizard::{REVIEW_FIELDS, WizardStep},
};
use strum::IntoEnumIterator;

use super::{contracts::detail_lines, field_lines, framed, scrolled, theme::Palette};
use crate::pages::WizardPage;

pub fn draw(
  f: &mut Frame,
  area: Rect,
  page: &WizardPage,
  persons: &[Person],
  templates: &[DocumentTemplate],
  p: &Palette,
) {
  let wizard = &page.wizard;
  let [steps, body, notice] = Layout::vertical([
    Constraint::Length(2),
    Constraint::Min(0),
    Constraint::Length(1),
  ])
  .areas(area);

  // Step indicator.
  let current = wizard.step();
  let mut spans = Vec::new();
  for step in WizardStep::iter() {
    let style = if step == current {
      p.title()
    } else if step.index() < current.index() {
      Style::default().fg(p.success)
    } else {
      p.dim()
    };
    spans.push(Span::styled(format!(" {}. {step} ", step.index() + 1), style));
  }
  let indicator = vec![Line::from(spans), Line::styled(format!(" {}", current.description()), p.dim())];
  f.render_widget(Paragraph::new(indicator), steps);

  match current {
    WizardStep::SelectPerson => draw_search(f, body, page, persons, p),
    WizardStep::ReviewPerson => {
      let mut lines = Vec::new();
      if let Some(person) = wizard.selected() {
        lines.push(Line::styled(format!("Reviewing {}", person.full_name()), p.dim()));
        lines.push(Line::raw(""));
      }
      let offset = lines.len();
      for (i, field) in REVIEW_FIELDS.iter().enumerate() {
        lines.extend(field_lines(field.label(), wizard.details.field(*field), i == page.focus, None, p));
      }
      scrolled(lines, offset + page.focus, framed("Person details", p), body, f);
    }
    WizardStep::ContractDetails => {
      let rows = page.detail_rows(templates);
      let (lines, focus_line) = detail_lines(&wizard.contract, &rows, page.focus, templates, p);
      scrolled(lines, focus_line, framed("Contract details", p), body, f);
    }
  }

  let message = page.notice.as_deref().or(wizard.error());
  let line = match message {
    Some(m) => Line::styled(format!(" {m}"), Style::default().fg(p.error)),
    None if wizard.is_busy() => Line::styled(" Saving…", p.dim()),
    None => Line::raw(""),
  };
  f.render_widget(Paragraph::new(line), notice);

  if wizard.is_confirming() {
    draw_prompt(f, area, p);
  }
}

fn draw_search(f: &mut Frame, area: Rect, page: &WizardPage, persons: &[Person], p: &Palette) {
  let wizard = &page.wizard;
  let mut lines = field_lines("Search", &wizard.query, true, None, p);
  lines.push(Line::raw(""));

  let results = wizard.results(persons);
  if results.is_empty() && !wizard.query.trim().is_empty() {
    lines.push(Line::styled("  No matching people", p.dim()));
  }
  for (i, person) in results.iter().enumerate() {
    let style = if i == page.cursor { p.cursor() } else { p.text() };
    lines.push(Line::from(vec![
      Span::styled(format!("  {:<28}", person.full_name()), style),
      Span::styled(format!(" {}", person.email), p.dim()),
    ]));
  }
  f.render_widget(Paragraph::new(lines).block(framed("Select person", p)), area);
}

fn draw_prompt(f: &mut Frame, area: Rect, p: &Palette) {
  let [row] = Layout::vertical([Constraint::Length(6)]).flex(Flex::Center).areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(60)]).flex(Flex::Center).areas(row);
  let lines = vec![
    Line::styled("Update the person's profile?", p.text().add_modifier(Modifier::BOLD)),
    Line::styled("Changes will be saved and the contractor role added.", p.dim()),
    Line::raw(""),
    Line::styled("y update   s skip   n cancel", p.title()),
  ];
  f.render_widget(Clear, cell);
  f.render_widget(Paragraph::new(lines).block(framed("Confirm", p)), cell);
}
