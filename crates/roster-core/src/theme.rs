//! Colour theme selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThemeMode {
  Light,
  Dark,
  /// Follow the terminal / OS preference.
  #[default]
  System,
}

impl ThemeMode {
  /// Dark goes to light; light and system both go to dark.
  pub fn toggled(self) -> Self {
    match self {
      Self::Dark => Self::Light,
      _ => Self::Dark,
    }
  }

  pub fn is_dark(self, system_prefers_dark: bool) -> bool {
    match self {
      Self::Dark => true,
      Self::Light => false,
      Self::System => system_prefers_dark,
    }
  }
}
