//! Small helpers shared by every form: line editing, focus movement and
//! masking.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Apply a line-editing key to `value`. Returns `true` when the key was
/// consumed. Editing always happens at the end of the line.
pub fn edit_text(value: &mut String, key: KeyEvent) -> bool {
  if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
    return false;
  }
  match key.code {
    KeyCode::Char(c) => {
      value.push(c);
      true
    }
    KeyCode::Backspace => {
      value.pop();
      true
    }
    _ => false,
  }
}

/// Move a focus index through `len` rows with Up/Down/Tab/BackTab, wrapping
/// at both ends. Returns `true` when the key was consumed.
pub fn move_focus(focus: &mut usize, len: usize, key: KeyEvent) -> bool {
  if len == 0 {
    return false;
  }
  match key.code {
    KeyCode::Down | KeyCode::Tab => {
      *focus = (*focus + 1) % len;
      true
    }
    KeyCode::Up | KeyCode::BackTab => {
      *focus = (*focus + len - 1) % len;
      true
    }
    _ => false,
  }
}

/// Move a list cursor without wrapping.
pub fn move_cursor(cursor: &mut usize, len: usize, key: KeyEvent) -> bool {
  match key.code {
    KeyCode::Down | KeyCode::Char('j') => {
      if *cursor + 1 < len {
        *cursor += 1;
      }
      true
    }
    KeyCode::Up | KeyCode::Char('k') => {
      *cursor = cursor.saturating_sub(1);
      true
    }
    KeyCode::Home | KeyCode::Char('g') => {
      *cursor = 0;
      true
    }
    KeyCode::End | KeyCode::Char('G') => {
      *cursor = len.saturating_sub(1);
      true
    }
    _ => false,
  }
}

/// Keep a cursor inside a list that may have shrunk.
pub fn clamp(cursor: &mut usize, len: usize) { *cursor = (*cursor).min(len.saturating_sub(1)); }

pub fn mask(value: &str) -> String { "•".repeat(value.chars().count()) }

pub fn is_ctrl(key: KeyEvent, c: char) -> bool {
  key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

/// Cycle through `items` starting after `current`; `None` is a valid stop.
pub fn cycle_option<T: Copy + PartialEq>(current: Option<T>, items: &[T]) -> Option<T> {
  match current {
    None => items.first().copied(),
    Some(cur) => {
      let pos = items.iter().position(|i| *i == cur);
      pos.and_then(|p| items.get(p + 1)).copied()
    }
  }
}

/// Cycle through `items` forever.
pub fn cycle<T: Copy + PartialEq>(current: T, items: &[T], forward: bool) -> T {
  let Some(pos) = items.iter().position(|i| *i == current) else {
    return items.first().copied().unwrap_or(current);
  };
  let len = items.len();
  let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
  items[next]
}

#[cfg(test)]
pub(crate) fn key(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

#[cfg(test)]
pub(crate) fn ctrl(c: char) -> KeyEvent { KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn edit_text_appends_and_deletes() {
    let mut s = String::from("Jo");
    assert!(edit_text(&mut s, key(KeyCode::Char('ó'))));
    assert_eq!(s, "Joó");
    assert!(edit_text(&mut s, key(KeyCode::Backspace)));
    assert_eq!(s, "Jo");
    assert!(!edit_text(&mut s, ctrl('s')));
    assert!(!edit_text(&mut s, key(KeyCode::Enter)));
    assert_eq!(s, "Jo");
  }

  #[test]
  fn focus_wraps_both_ways() {
    let mut f = 0;
    move_focus(&mut f, 3, key(KeyCode::Up));
    assert_eq!(f, 2);
    move_focus(&mut f, 3, key(KeyCode::Tab));
    assert_eq!(f, 0);
  }

  #[test]
  fn cursor_stops_at_edges() {
    let mut c = 0;
    move_cursor(&mut c, 2, key(KeyCode::Char('k')));
    assert_eq!(c, 0);
    move_cursor(&mut c, 2, key(KeyCode::Char('j')));
    move_cursor(&mut c, 2, key(KeyCode::Char('j')));
    assert_eq!(c, 1);
    clamp(&mut c, 0);
    assert_eq!(c, 0);
  }

  #[test]
  fn optional_cycle_passes_through_none() {
    let items = [1, 2];
    assert_eq!(cycle_option(None, &items), Some(1));
    assert_eq!(cycle_option(Some(1), &items), Some(2));
    assert_eq!(cycle_option(Some(2), &items), None);
    assert_eq!(cycle(2, &items, true), 1);
    assert_eq!(cycle(1, &items, false), 2);
  }

  #[test]
  fn mask_counts_characters() {
    assert_eq!(mask("pąss"), "••••");
  }
}
