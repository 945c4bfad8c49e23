//! Command-line flags, the optional TOML config file and their resolution.
//!
//! Precedence: flags (and their environment variables) over the config file
//! over built-in defaults. `.env` is loaded before flags are parsed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use roster_baas::BaasConfig;
use roster_core::theme::ThemeMode;
use serde::Deserialize;

pub const DEFAULT_APP_URL: &str = "http://localhost:5173";
pub const DEFAULT_LOG_FILE: &str = "roster.log";

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Terminal client for the Roster NGO back office")]
pub struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Project URL of the hosted backend.
  #[arg(long, env = "ROSTER_SUPABASE_URL")]
  pub supabase_url: Option<String>,

  /// Public (anon) API key of the hosted backend.
  #[arg(long, env = "ROSTER_SUPABASE_ANON_KEY")]
  pub anon_key: Option<String>,

  /// Base URL of the edge functions (default: <supabase-url>/functions/v1).
  #[arg(long, env = "ROSTER_FUNCTIONS_URL")]
  pub functions_url: Option<String>,

  /// Origin used in password-recovery links.
  #[arg(long, env = "ROSTER_APP_URL")]
  pub app_url: Option<String>,

  /// OAuth client id, shown on the sign-in screen.
  #[arg(long, env = "ROSTER_GOOGLE_CLIENT_ID")]
  pub google_client_id: Option<String>,

  /// Skip sign-in and act as the development user (debug builds only).
  #[arg(long, env = "ROSTER_BYPASS_AUTH")]
  pub bypass_auth: bool,

  /// Colour theme: light, dark or system.
  #[arg(long, env = "ROSTER_THEME")]
  pub theme: Option<ThemeMode>,

  /// Where to write logs; the terminal is owned by the UI.
  #[arg(long, env = "ROSTER_LOG_FILE")]
  pub log_file: Option<PathBuf>,
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct ConfigFile {
  pub supabase_url:     Option<String>,
  pub anon_key:         Option<String>,
  pub functions_url:    Option<String>,
  pub app_url:          Option<String>,
  pub google_client_id: Option<String>,
  pub bypass_auth:      Option<bool>,
  pub theme:            Option<ThemeMode>,
  pub log_file:         Option<PathBuf>,
}

impl ConfigFile {
  pub fn load(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")
  }
}

// ─── Resolved settings ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Settings {
  pub baas:             BaasConfig,
  pub app_url:          String,
  pub google_client_id: Option<String>,
  pub bypass_auth:      bool,
  /// Bypass was requested but this build does not allow it. Reported once
  /// logging is up.
  pub bypass_ignored:   bool,
  pub theme:            ThemeMode,
  pub log_file:         PathBuf,
}

impl Settings {
  pub fn resolve(args: Args, file: ConfigFile) -> Result<Self> {
    let Some(url) = args.supabase_url.or(file.supabase_url).filter(|u| !u.is_empty()) else {
      bail!("backend URL is not configured; set ROSTER_SUPABASE_URL or `supabase_url`");
    };
    let anon_key = args.anon_key.or(file.anon_key).unwrap_or_default();

    let bypass_requested = args.bypass_auth || file.bypass_auth.unwrap_or(false);
    let bypass_auth = bypass_requested && cfg!(debug_assertions);

    Ok(Self {
      baas: BaasConfig {
        url,
        anon_key,
        functions_url: args.functions_url.or(file.functions_url),
      },
      app_url: args
        .app_url
        .or(file.app_url)
        .unwrap_or_else(|| DEFAULT_APP_URL.to_owned()),
      google_client_id: args.google_client_id.or(file.google_client_id),
      bypass_auth,
      bypass_ignored: bypass_requested && !bypass_auth,
      theme: args.theme.or(file.theme).unwrap_or_default(),
      log_file: args
        .log_file
        .or(file.log_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(extra: &[&str]) -> Args {
    let mut argv = vec!["roster"];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
  }

  #[test]
  fn flags_override_file_values() {
    let file: ConfigFile = toml::from_str(
      r#"
        supabase_url = "https://file.supabase.co"
        anon_key     = "file-key"
        theme        = "light"
      "#,
    )
    .unwrap();
    let settings =
      Settings::resolve(args(&["--supabase-url", "https://flag.supabase.co"]), file).unwrap();

    assert_eq!(settings.baas.url, "https://flag.supabase.co");
    assert_eq!(settings.baas.anon_key, "file-key");
    assert_eq!(settings.theme, ThemeMode::Light);
    assert_eq!(settings.log_file, PathBuf::from(DEFAULT_LOG_FILE));
  }

  #[test]
  fn missing_backend_url_is_an_error() {
    let result = Settings::resolve(args(&[]), ConfigFile::default());
    if std::env::var_os("ROSTER_SUPABASE_URL").is_none() {
      assert!(result.is_err());
    }
  }

  #[test]
  fn app_url_defaults_and_flag_override() {
    let settings =
      Settings::resolve(args(&["--supabase-url", "https://x.supabase.co"]), ConfigFile::default())
        .unwrap();
    if std::env::var_os("ROSTER_APP_URL").is_none() {
      assert_eq!(settings.app_url, DEFAULT_APP_URL);
    }
    let settings = Settings::resolve(
      args(&["--supabase-url", "https://x.supabase.co", "--app-url", "https://app.ngo.pl/"]),
      ConfigFile::default(),
    )
    .unwrap();
    assert_eq!(settings.app_url, "https://app.ngo.pl/");
  }

  #[test]
  fn bypass_is_honoured_in_debug_builds() {
    let settings = Settings::resolve(
      args(&["--supabase-url", "https://x.supabase.co", "--bypass-auth"]),
      ConfigFile::default(),
    )
    .unwrap();
    assert_eq!(settings.bypass_auth, cfg!(debug_assertions));
    assert_eq!(settings.bypass_ignored, !cfg!(debug_assertions));
  }

  #[test]
  fn bypass_from_file_is_reported_when_ignored() {
    let file = ConfigFile { bypass_auth: Some(true), ..ConfigFile::default() };
    let settings =
      Settings::resolve(args(&["--supabase-url", "https://x.supabase.co"]), file).unwrap();
    assert_ne!(settings.bypass_auth, settings.bypass_ignored);

    let settings =
      Settings::resolve(args(&["--supabase-url", "https://x.supabase.co"]), ConfigFile::default())
        .unwrap();
    if std::env::var_os("ROSTER_BYPASS_AUTH").is_none() {
      assert!(!settings.bypass_auth && !settings.bypass_ignored);
    }
  }
}
