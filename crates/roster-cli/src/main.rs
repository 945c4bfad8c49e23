//! `roster` — terminal client for the Roster NGO back office.
//!
//! # Usage
//!
//! ```
//! roster --supabase-url https://xyz.supabase.co --anon-key <key>
//! roster --config ~/.config/roster/config.toml
//! ```

mod app;
mod config;
mod form;
mod pages;
mod ui;

use std::{
  fs::OpenOptions,
  io,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result};
use app::{App, AppOptions, Backend};
use clap::Parser;
use config::{Args, ConfigFile, Settings};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use roster_baas::Supabase;
use roster_core::{gateway::AuthProvider, route::Route};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  dotenvy::dotenv().ok();
  let args = Args::parse();

  let file = match &args.config {
    Some(path) => ConfigFile::load(path)?,
    None => ConfigFile::default(),
  };
  let settings = Settings::resolve(args, file)?;

  // The terminal belongs to the UI, so logs go to a file.
  let log = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&settings.log_file)
    .with_context(|| format!("opening log file {}", settings.log_file.display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(log))
    .init();
  if settings.bypass_ignored {
    tracing::warn!("auth bypass is only available in debug builds; ignoring");
  }

  let backend = Arc::new(Supabase::new(settings.baas.clone())?);
  let options = AppOptions {
    app_url:          settings.app_url.clone(),
    google_client_id: settings.google_client_id.clone(),
    bypass_auth:      settings.bypass_auth,
    theme:            settings.theme,
    system_dark:      ui::theme::system_prefers_dark(),
  };
  let mut app = App::new(backend.clone(), backend, options);
  tracing::info!(bypass = settings.bypass_auth, "starting");

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")?;

  // Run the event loop; restore the terminal even on error.
  let result = run_event_loop(&mut terminal, &mut app).await;

  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  result
}

// ─── Event loop ──────────────────────────────────────────────────────────────

async fn run_event_loop<A: AuthProvider, G: Backend>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<A, G>,
) -> Result<()> {
  // Draw the loading screen while the session resolves.
  terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;
  app.start(Route::Dashboard).await;

  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event {
      if key.kind == KeyEventKind::Press && !app.handle_key(key).await? {
        break;
      }
    }

    // Auth changes from elsewhere and toast expiry.
    app.tick().await;
  }

  Ok(())
}
