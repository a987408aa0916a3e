//! HTTP layer for Agora.
//!
//! Exposes an axum [`Router`] over any [`ContentStore`]: account lifecycle,
//! posts, comments and admin promotion, behind bearer-token authentication.

pub mod auth;
pub mod error;
pub mod etag;
pub mod handlers;
pub mod mailer;
pub mod password;
pub mod ratelimit;
pub mod token;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use agora_core::store::ContentStore;
use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::{
  compression::CompressionLayer,
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use handlers::{account, admin, comments, posts};
use mailer::Mailer;
use ratelimit::{RateLimitConfig, RateLimitLayer};
use token::TokenService;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `AGORA_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// HMAC key for issued tokens.
  pub jwt_secret:       String,
  pub mail_from:        String,
  #[serde(default)]
  pub admin_rate_limit: RateLimitConfig,
  #[serde(default)]
  pub seed_admin:       Option<SeedAdmin>,
}

/// The account `server --seed-admin` creates when no admin exists.
#[derive(Deserialize, Clone)]
pub struct SeedAdmin {
  pub email:    String,
  pub password: String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: ContentStore> {
  pub store:  Arc<S>,
  pub tokens: Arc<TokenService>,
  pub mailer: Arc<dyn Mailer>,
  pub config: Arc<ServerConfig>,
}

impl<S: ContentStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig, mailer: Arc<dyn Mailer>) -> Self {
    Self {
      store: Arc::new(store),
      tokens: Arc::new(TokenService::new(config.jwt_secret.as_bytes())),
      mailer,
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let admin_routes = Router::new()
    .route("/admin/create-admin", post(admin::create_admin::<S>))
    .route_layer(RateLimitLayer::new(state.config.admin_rate_limit.clone()));

  Router::new()
    .route("/",                 get(handlers::welcome))
    .route("/signup",           post(account::signup::<S>))
    .route("/verify",           post(account::verify::<S>))
    .route("/login",            post(account::login::<S>))
    .route("/profile",          get(account::profile))
    .route("/post",             get(posts::list::<S>))
    .route("/post/create",      post(posts::create::<S>))
    .route(
      "/post/{id}",
      get(posts::get_one::<S>).put(posts::update::<S>).delete(posts::delete::<S>),
    )
    .route("/comment",          post(comments::create::<S>))
    .route("/comment/all",      get(comments::list_all::<S>))
    .route("/comment/by/{id}",  get(comments::get_one::<S>))
    .route(
      "/comment/{id}",
      get(comments::list_for_post::<S>)
        .put(comments::update::<S>)
        .delete(comments::delete::<S>),
    )
    .merge(admin_routes)
    .layer(CompressionLayer::new())
    .layer(TraceLayer::new_for_http())
    // Bearer tokens travel in a header, so any origin may call the API.
    .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
