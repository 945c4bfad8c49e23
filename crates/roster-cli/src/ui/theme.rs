//! Light and dark palettes.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub fg:        Color,
  pub muted:     Color,
  pub bar:       Color,
  pub accent:    Color,
  pub cursor_bg: Color,
  pub cursor_fg: Color,
  pub error:     Color,
  pub success:   Color,
  pub warning:   Color,
}

impl Palette {
  pub fn new(dark: bool) -> Self {
    if dark {
      Self {
        fg:        Color::White,
        muted:     Color::DarkGray,
        bar:       Color::Black,
        accent:    Color::Cyan,
        cursor_bg: Color::Blue,
        cursor_fg: Color::White,
        error:     Color::LightRed,
        success:   Color::LightGreen,
        warning:   Color::Yellow,
      }
    } else {
      Self {
        fg:        Color::Black,
        muted:     Color::Gray,
        bar:       Color::White,
        accent:    Color::Blue,
        cursor_bg: Color::LightBlue,
        cursor_fg: Color::Black,
        error:     Color::Red,
        success:   Color::Green,
        warning:   Color::Magenta,
      }
    }
  }

  pub fn text(&self) -> Style { Style::default().fg(self.fg) }

  pub fn dim(&self) -> Style { Style::default().fg(self.muted) }

  pub fn title(&self) -> Style { Style::default().fg(self.accent).add_modifier(Modifier::BOLD) }

  pub fn cursor(&self) -> Style {
    Style::default().bg(self.cursor_bg).fg(self.cursor_fg).add_modifier(Modifier::BOLD)
  }
}

/// Whether the terminal background is dark, from `COLORFGBG` (`"fg;bg"`).
/// Terminals that do not say are assumed dark.
pub fn system_prefers_dark() -> bool {
  std::env::var("COLORFGBG").ok().and_then(|v| background_is_dark(&v)).unwrap_or(true)
}

fn background_is_dark(colorfgbg: &str) -> Option<bool> {
  let bg: u8 = colorfgbg.rsplit(';').next()?.trim().parse().ok()?;
  Some(bg < 7 || bg == 8)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn colorfgbg_background() {
    assert_eq!(background_is_dark("15;0"), Some(true));
    assert_eq!(background_is_dark("0;15"), Some(false));
    assert_eq!(background_is_dark("12;default;8"), Some(true));
    assert_eq!(background_is_dark("garbage"), None);
  }
}
