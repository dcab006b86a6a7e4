//! Incident registry server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `INCIDENTS_*` environment variables, opens the SQLite store, seeds the
//! bootstrap account, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `bootstrap_password_hash`:
//!
//! ```text
//! cargo run -p incidents-server -- hash-password
//! ```

mod bootstrap;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Duration;
use clap::{Parser, Subcommand};
use incidents_api::{AppState, AuthConfig, auth::hash_password, cors_layer};
use incidents_core::{AsDomain, Error as CoreError, store::IncidentStore};
use incidents_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  bootstrap::{Seeded, seed_user},
  settings::ServerConfig,
};

#[derive(Parser)]
#[command(author, version, about = "Incident registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
  /// Create a staff account; the password is read from stdin.
  AddUser {
    username: String,
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
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      println!("{}", hash(&password)?);
      Ok(())
    }
    Command::AddUser { username } => {
      let cfg = ServerConfig::load(&cli.config)?;
      add_user(&cfg, username).await
    }
    Command::Serve => {
      let cfg = ServerConfig::load(&cli.config)?;
      serve(cfg).await
    }
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  cfg.validate_for_serving()?;

  let store = open_store(&cfg).await?;

  match cfg.bootstrap_user() {
    Some((username, password_hash)) => {
      let seeded = seed_user(&store, username, password_hash)
        .await
        .context("failed to seed bootstrap user")?;
      if seeded == Seeded::AlreadyPresent {
        tracing::info!(username, "bootstrap user already present");
      }
    }
    None => tracing::info!("no bootstrap user configured"),
  }

  let auth = AuthConfig::new(
    cfg.jwt_secret.as_bytes(),
    Duration::minutes(cfg.token_lifetime_minutes),
  );
  let cors = cors_layer(&cfg.cors_origins).context("invalid entry in cors_origins")?;
  let app = incidents_api::router(AppState::new(store, auth), cors);

  let address = format!("{}:{}", cfg.host, cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn add_user(cfg: &ServerConfig, username: String) -> anyhow::Result<()> {
  let store = open_store(cfg).await?;
  let password = read_password()?;
  if password.is_empty() {
    anyhow::bail!("password must not be empty");
  }

  match store.add_user(username.clone(), hash(&password)?).await {
    Ok(user) => {
      println!("created user {} ({})", user.username, user.id);
      Ok(())
    }
    Err(e) if matches!(e.as_domain(), Some(CoreError::Conflict(_))) => {
      anyhow::bail!("user {username:?} already exists")
    }
    Err(e) => Err(e).context("failed to create user"),
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(&cfg.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))
}

fn hash(password: &str) -> anyhow::Result<String> {
  hash_password(password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))
}

/// Read one line from stdin as the password. The prompt goes to stderr.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
