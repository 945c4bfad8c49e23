//! Document-generation stub server.
//!
//! Reads `docgen.toml` (or the path given with `--config`), overlays
//! `DOCGEN_*` environment variables and serves the generation endpoint.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use roster_docgen::{AppState, DocgenConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster document-generation stub")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "docgen.toml")]
  config: PathBuf,

  /// Override the listening port.
  #[arg(short, long)]
  port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut config = DocgenConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;
  if let Some(port) = cli.port {
    config.port = port;
  }

  let address = config.address();
  let app = roster_docgen::router(AppState::new(config));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
