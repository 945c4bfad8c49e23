//! Sign-in and reset-password screens.

use ratatui::{
  Frame,
  layout::{Constraint, Flex, Layout, Rect},
  style::Style,
  text::Line,
  widgets::Paragraph,
};

use super::{field_lines, framed, theme::Palette};
use crate::{
  form::mask,
  pages::auth::{LoginField, LoginPage, RESET_FIELDS, ResetPage},
};

/// A centred box of the given size.
fn centred(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center).areas(row);
  cell
}

pub fn draw_login(
  f: &mut Frame,
  area: Rect,
  page: &LoginPage,
  google_client_id: Option<&str>,
  p: &Palette,
) {
  let mut lines = vec![Line::styled("Sign in to manage your organisation.", p.dim()), Line::raw("")];
  lines.extend(field_lines("Email", &page.email, page.focus == LoginField::Email, None, p));
  lines.extend(field_lines(
    "Password",
    &mask(&page.password),
    page.focus == LoginField::Password,
    None,
    p,
  ));
  lines.push(Line::raw(""));

  if let Some(error) = &page.error {
    lines.push(Line::styled(error.clone(), Style::default().fg(p.error)));
  }
  if let Some(notice) = &page.notice {
    lines.push(Line::styled(notice.clone(), Style::default().fg(p.success)));
  }
  if page.busy {
    lines.push(Line::styled("Signing in…", p.dim()));
  }
  if let Some(id) = google_client_id {
    lines.push(Line::raw(""));
    lines.push(Line::styled(format!("Google sign-in is configured ({id})."), p.dim()));
    lines.push(Line::styled("Use the web client to sign in with Google.", p.dim()));
  }

  let block = framed("Sign in", p);
  let height = lines.len() as u16 + 2;
  f.render_widget(Paragraph::new(lines).block(block), centred(area, 64, height));
}

pub fn draw_reset(f: &mut Frame, area: Rect, page: &ResetPage, p: &Palette) {
  let mut lines = vec![
    Line::styled("Paste the link from the recovery email, then choose a new password.", p.dim()),
    Line::raw(""),
  ];
  for (i, label) in RESET_FIELDS.iter().enumerate() {
    let value = if i == 0 { page.value(i).to_owned() } else { mask(page.value(i)) };
    lines.extend(field_lines(label, &value, page.focus == i, None, p));
  }
  if let Some(error) = &page.error {
    lines.push(Line::raw(""));
    lines.push(Line::styled(error.clone(), Style::default().fg(p.error)));
  }

  let block = framed("Reset password", p);
  let height = lines.len() as u16 + 2;
  f.render_widget(Paragraph::new(lines).block(block), centred(area, 80, height));
}
