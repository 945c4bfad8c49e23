//! Summary counts and the most recently added people.

use chrono::Utc;
use ratatui::{
  Frame,
  layout::{Constraint, Layout, Rect},
  style::Modifier,
  text::{Line, Span},
  widgets::{Paragraph, Row, Table},
};
use roster_core::{person::Person, query::DashboardStats};

use super::{framed, theme::Palette};

pub fn draw(f: &mut Frame, area: Rect, persons: &[Person], p: &Palette) {
  let stats = DashboardStats::compute(persons, Utc::now());
  let [cards, recent] =
    Layout::vertical([Constraint::Length(4), Constraint::Min(0)]).areas(area);

  let counts = [
    ("People", stats.total),
    ("With email", stats.with_email),
    ("With phone", stats.with_phone),
    ("Updated this week", stats.updated_last_week),
  ];
  let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(cards);
  for ((label, count), cell) in counts.iter().zip(columns.iter()) {
    let text = Line::from(Span::styled(count.to_string(), p.title().add_modifier(Modifier::BOLD)));
    f.render_widget(Paragraph::new(text).block(framed(label, p)), *cell);
  }

  let rows = stats.recent.iter().map(|person| {
    Row::new(vec![
      person.full_name(),
      person.email.clone(),
      person.created_at.format("%Y-%m-%d").to_string(),
    ])
    .style(p.text())
  });
  let table = Table::new(rows, [
    Constraint::Percentage(40),
    Constraint::Percentage(40),
    Constraint::Percentage(20),
  ])
  .header(Row::new(vec!["Name", "Email", "Added"]).style(p.dim()))
  .block(framed("Recently added", p));
  f.render_widget(table, recent);
}
