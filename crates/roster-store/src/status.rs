use crate::StoreError;

/// The loading/error flags every store exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
  loading: bool,
  error:   Option<String>,
}

impl Status {
  pub fn is_loading(&self) -> bool { self.loading }

  pub fn error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn clear_error(&mut self) { self.error = None; }

  pub(crate) fn begin(&mut self) {
    self.loading = true;
    self.error = None;
  }

  pub(crate) fn done(&mut self) { self.loading = false; }

  /// Record a failure of `op` and hand the error back for propagation.
  pub(crate) fn fail(&mut self, op: &str, e: StoreError) -> StoreError {
    tracing::error!(op, error = %e, "store operation failed");
    self.loading = false;
    self.error = Some(e.to_string());
    e
  }
}
