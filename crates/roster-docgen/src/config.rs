//! Server configuration: an optional TOML file overlaid by `DOCGEN_*`
//! environment variables.

use std::path::Path;

use serde::Deserialize;

pub const DEFAULT_DOCUMENT_URL: &str = "https://example.com/documents/contract.pdf";

#[derive(Debug, Clone, Deserialize)]
pub struct DocgenConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  /// Simulated generation time.
  #[serde(default = "default_delay_ms")]
  pub delay_ms:     u64,
  /// Placeholder returned as both the source document and the single file.
  #[serde(default = "default_document_url")]
  pub document_url: String,
  /// When set, requests must present it as `apikey` or a bearer token.
  #[serde(default)]
  pub api_key:      Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 54321 }
fn default_delay_ms() -> u64 { 2000 }
fn default_document_url() -> String { DEFAULT_DOCUMENT_URL.to_owned() }

impl Default for DocgenConfig {
  fn default() -> Self {
    Self {
      host:         default_host(),
      port:         default_port(),
      delay_ms:     default_delay_ms(),
      document_url: default_document_url(),
      api_key:      None,
    }
  }
}

impl DocgenConfig {
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DOCGEN"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = DocgenConfig::load(Path::new("does-not-exist.toml")).unwrap();
    assert_eq!(cfg.delay_ms, 2000);
    assert_eq!(cfg.document_url, DEFAULT_DOCUMENT_URL);
    assert!(cfg.api_key.is_none());
  }

  #[test]
  fn partial_toml_keeps_other_defaults() {
    let cfg: DocgenConfig = toml_from("port = 9000\ndelay_ms = 0");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.delay_ms, 0);
    assert_eq!(cfg.host, "127.0.0.1");
  }

  fn toml_from(s: &str) -> DocgenConfig {
    config::Config::builder()
      .add_source(config::File::from_str(s, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }
}
