//! Runtime configuration: an optional TOML file layered under `INCIDENTS_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "INCIDENTS";

/// Longest accepted `token_lifetime_minutes`: one week.
pub const MAX_TOKEN_LIFETIME_MINUTES: i64 = 7 * 24 * 60;

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                    String,
  #[serde(default = "default_port")]
  pub port:                    u16,
  #[serde(default = "default_database_path")]
  pub database_path:           PathBuf,
  /// HS256 signing secret. Only `serve` needs it.
  #[serde(default)]
  pub jwt_secret:              String,
  #[serde(default = "default_token_lifetime")]
  pub token_lifetime_minutes:  i64,
  #[serde(default = "default_cors_origins")]
  pub cors_origins:            Vec<String>,
  /// Seeded at startup if absent. Both must be set for seeding to happen.
  #[serde(default)]
  pub bootstrap_username:      Option<String>,
  /// Argon2 PHC string, as printed by `hash-password`.
  #[serde(default)]
  pub bootstrap_password_hash: Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8000 }
fn default_database_path() -> PathBuf { PathBuf::from("incidents.db") }
fn default_token_lifetime() -> i64 { 30 }

fn default_cors_origins() -> Vec<String> {
  vec!["http://localhost:3000".to_owned(), "http://localhost:5173".to_owned()]
}

impl ServerConfig {
  /// Read `path` (if it exists) and overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix(ENV_PREFIX)
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .build()
      .context("failed to read configuration")?;

    let cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    Ok(cfg.with_expanded_paths())
  }

  /// Checks that only matter when serving HTTP.
  pub fn validate_for_serving(&self) -> anyhow::Result<()> {
    if self.jwt_secret.trim().is_empty() {
      bail!("jwt_secret is required (set it in the config file or {ENV_PREFIX}_JWT_SECRET)");
    }
    if !(1..=MAX_TOKEN_LIFETIME_MINUTES).contains(&self.token_lifetime_minutes) {
      bail!(
        "token_lifetime_minutes must be between 1 and {MAX_TOKEN_LIFETIME_MINUTES}, got {}",
        self.token_lifetime_minutes
      );
    }
    Ok(())
  }

  /// The bootstrap account, if both halves are configured.
  pub fn bootstrap_user(&self) -> Option<(&str, &str)> {
    match (&self.bootstrap_username, &self.bootstrap_password_hash) {
      (Some(user), Some(hash)) if !user.trim().is_empty() && !hash.trim().is_empty() => {
        Some((user.trim(), hash.trim()))
      }
      _ => None,
    }
  }

  fn with_expanded_paths(mut self) -> Self {
    self.database_path = expand_tilde(&self.database_path);
    self
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
