//! Account lifecycle: signup, email verification, login, profile.

use agora_core::{
  access::{AuthContext, authorize_role},
  store::{ContentStore, StoreError as _},
  user::{NewUser, Role, UserSummary},
  validate,
};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  response::Response,
};
use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  handlers::{created, json_body, ok},
  mailer::Mail,
  password::{hash_password, verify_password},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignupBody {
  pub name:       String,
  #[serde(alias = "first_name")]
  pub first_name: String,
  pub email:      String,
  pub country:    String,
  pub password:   String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyBody {
  pub email:             String,
  #[serde(alias = "verification_code")]
  pub verification_code: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       UserSummary,
}

/// Six decimal digits, zero padded.
fn verification_code() -> String {
  format!("{:06}", OsRng.next_u32() % 1_000_000)
}

async fn hash_blocking(password: String) -> Result<String, ApiError> {
  tokio::task::spawn_blocking(move || hash_password(&password))
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, ApiError> {
  tokio::task::spawn_blocking(move || verify_password(&password, &hash))
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))?
    .map_err(|e| ApiError::Internal(format!("stored password hash is unreadable: {e}")))
}

// ─── Signup ──────────────────────────────────────────────────────────────────

pub async fn signup<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<SignupBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let body = json_body(payload)?;
  validate::required("name", &body.name)?;
  validate::required("firstName", &body.first_name)?;
  validate::email(&body.email)?;
  validate::required("country", &body.country)?;
  validate::password(&body.password)?;

  let existing = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict("user already exists".into()));
  }

  let password_hash = hash_blocking(body.password).await?;
  let code = verification_code();

  let user = state
    .store
    .insert_user(NewUser {
      name: body.name,
      first_name: body.first_name,
      email: body.email,
      country: body.country,
      password_hash,
      verified: false,
      verification_code: code.clone(),
      role: Role::User,
    })
    .await
    .map_err(|e| {
      // A concurrent signup with the same email got past the check above.
      if e.is_duplicate() {
        ApiError::Conflict("user already exists".into())
      } else {
        ApiError::store(e)
      }
    })?;

  state
    .mailer
    .send(Mail {
      to:      user.email.clone(),
      subject: "Email Verification".into(),
      body:    format!("Your verification code is: {code}"),
    })
    .await
    .map_err(|e| {
      warn!(user_id = %user.id, error = %e, "verification mail not sent");
      ApiError::Internal(e.to_string())
    })?;

  info!(user_id = %user.id, "user signed up");
  Ok(created("User created successfully. Please verify your email.", user.summary()))
}

// ─── Verify ──────────────────────────────────────────────────────────────────

pub async fn verify<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<VerifyBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let body = json_body(payload)?;
  validate::email(&body.email)?;
  validate::verification_code(&body.verification_code)?;

  let current = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("user"))?;

  let mut user = current.clone();
  if !user.verify(&body.verification_code) {
    return Err(ApiError::InvalidState("invalid verification code".into()));
  }

  // None: another request consumed the code after our read.
  let user = state
    .store
    .save_user(&current, &user)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::InvalidState("invalid verification code".into()))?;

  info!(user_id = %user.id, "email verified");
  Ok(ok("Email verified successfully.", user.summary()))
}

// ─── Login ───────────────────────────────────────────────────────────────────

pub async fn login<S>(
  State(state): State<AppState<S>>,
  payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let body = json_body(payload)?;
  validate::email(&body.email)?;
  validate::required("password", &body.password)?;

  let user = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("user"))?;

  if !verify_blocking(body.password, user.password_hash.clone()).await? {
    info!(user_id = %user.id, "login refused");
    return Err(ApiError::InvalidCredentials);
  }

  let issued = state
    .tokens
    .issue(user.id, user.role)
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

  info!(user_id = %user.id, role = %user.role, "token issued");
  Ok(ok("Login successful.", LoginData {
    token:      issued.token,
    expires_at: issued.expires_at,
    user:       user.summary(),
  }))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// Reachable by the `user` role only; admins are refused here.
pub async fn profile(Authenticated(ctx): Authenticated) -> Result<Response, ApiError> {
  authorize_role(&ctx, &[Role::User])?;
  Ok(ok::<AuthContext>("You have access to this route.", ctx))
}
