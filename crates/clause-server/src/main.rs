//! clause server binary.
//!
//! Loads [`ServerConfig`] from `--config` and the environment, opens the
//! SQLite store and serves the JSON API until interrupted.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use clause_server::ServerConfig;
use clause_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Clause policy revision server")]
struct Cli {
  /// TOML configuration file; `CLAUSE_*` variables override its keys.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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
  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  let store_path = cfg.resolved_store_path();
  if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let address = format!("{}:{}", cfg.host, cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(%address, store = ?store_path, "serving clause API");

  axum::serve(listener, clause_server::app(store))
    .await
    .context("server error")
}
