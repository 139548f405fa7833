//! tally server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! ledger, and either serves the JSON API or prints a single report.
//!
//! ```text
//! tally serve
//! tally report --business <UUID> --user owner@example.com --kind cash-flow
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand};
use axum::Router;
use tally_api::{AppState, api_router};
use tally_core::{
  analytics::Analytics,
  report::{ReportKind, ReportParams, ReportRequest},
  store::LedgerStore,
};
use tally_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Tally bookkeeping analytics server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API (the default).
  Serve,

  /// Compute one report and print it as JSON.
  Report {
    /// Business to report on.
    #[arg(long)]
    business: Uuid,

    /// Email of the user the report is run for; must own the business.
    #[arg(long)]
    user: String,

    /// Report name, e.g. `summary` or `cash-flow`.
    #[arg(long)]
    kind: String,

    #[arg(long)]
    year: Option<i32>,

    #[arg(long)]
    days: Option<i64>,

    #[arg(long)]
    limit: Option<usize>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,
    Command::Report { business, user, kind, year, days, limit } => {
      let params = ReportParams { year, days, limit };
      report(cfg, store, business, &user, &kind, params).await
    }
  }
}

/// The API router with request tracing, plus a permissive CORS layer when
/// `cors` is enabled.
fn app(cfg: &ServerConfig, store: SqliteStore) -> Router {
  let router = api_router(AppState::new(Arc::new(store), cfg.labels.clone()))
    .layer(TraceLayer::new_for_http());
  if cfg.cors { router.layer(CorsLayer::permissive()) } else { router }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let address = cfg.address();
  let app = app(&cfg, store);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn report(
  cfg: ServerConfig,
  store: SqliteStore,
  business_id: Uuid,
  email: &str,
  kind: &str,
  params: ReportParams,
) -> anyhow::Result<()> {
  let kind = ReportKind::parse(kind)?;
  let params = params.checked()?;
  let user = store
    .find_user_by_email(email)
    .await?
    .with_context(|| format!("no user registered as {email}"))?;

  let engine = Analytics::new(&store, business_id, user.id, cfg.labels).await?;
  let request = ReportRequest::new(kind, params, Utc::now().date_naive());
  let report = engine.run(request).await?;

  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}
