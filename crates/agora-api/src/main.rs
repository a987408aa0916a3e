//! Agora API server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered with
//! `AGORA_*` environment variables, opens the SQLite store, and serves the API
//! over HTTP.
//!
//! # First admin
//!
//! Promotion needs an existing admin. Configure `[seed_admin]` and run once:
//!
//! ```
//! cargo run -p agora-api --bin server -- --seed-admin
//! ```

use std::{
  net::SocketAddr,
  path::{Path, PathBuf},
  sync::Arc,
};

use agora_api::{AppState, ServerConfig, mailer::LogMailer, password::hash_password};
use agora_core::{
  store::ContentStore,
  user::{NewUser, Role},
  validate,
};
use agora_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Agora API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create the configured `seed_admin` account if no admin exists, then exit.
  #[arg(long)]
  seed_admin: bool,
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

  // Nested keys use a double underscore: AGORA_ADMIN_RATE_LIMIT__WINDOW_SECONDS.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("AGORA")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.seed_admin {
    return seed_admin(&store, &server_cfg).await;
  }

  let mailer = Arc::new(LogMailer { from: server_cfg.mail_from.clone() });
  let state = AppState::new(store, server_cfg.clone(), mailer);

  let app = agora_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
    .await
    .context("server error")?;

  Ok(())
}

/// Create a verified admin from `seed_admin`, or promote the account that
/// already holds that email. Does nothing once any admin exists.
async fn seed_admin(store: &SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  let seed = cfg
    .seed_admin
    .as_ref()
    .context("--seed-admin needs a [seed_admin] section in the config")?;

  if store.has_admin().await? {
    info!("an admin already exists; nothing to seed");
    return Ok(());
  }

  validate::email(&seed.email)?;
  validate::password(&seed.password)?;

  if let Some(current) = store.find_user_by_email(&seed.email).await? {
    let mut user = current.clone();
    user.promote();
    user.verified = true;
    user.verification_code.clear();
    store
      .save_user(&current, &user)
      .await?
      .context("seed admin changed while being promoted; run again")?;
    info!(user_id = %user.id, email = %user.email, "existing user promoted to admin");
    return Ok(());
  }

  let password_hash = hash_password(&seed.password)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;

  let user = store
    .insert_user(NewUser {
      name: "Admin".into(),
      first_name: "Admin".into(),
      email: seed.email.clone(),
      country: String::new(),
      password_hash,
      verified: true,
      verification_code: String::new(),
      role: Role::Admin,
    })
    .await?;

  info!(user_id = %user.id, email = %user.email, "admin seeded");
  Ok(())
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
