use roster_core::theme::ThemeMode;
use tracing::debug;

/// Holds the selected colour theme.
#[derive(Debug, Clone, Default)]
pub struct ThemeStore {
  mode: ThemeMode,
}

impl ThemeStore {
  pub fn new(mode: ThemeMode) -> Self { Self { mode } }

  pub fn mode(&self) -> ThemeMode { self.mode }

  pub fn set_mode(&mut self, mode: ThemeMode) {
    debug!(%mode, "theme changed");
    self.mode = mode;
  }

  pub fn toggle(&mut self) -> ThemeMode {
    self.set_mode(self.mode.toggled());
    self.mode
  }

  /// Resolve the effective palette given the environment's preference.
  pub fn is_dark(&self, system_prefers_dark: bool) -> bool {
    self.mode.is_dark(system_prefers_dark)
  }
}
