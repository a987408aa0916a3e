//! Admin promotion.

use agora_core::{access::authorize_role, store::ContentStore, user::Role};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  response::Response,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  handlers::{json_body, ok, parse_id},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromoteBody {
  #[serde(alias = "user_id")]
  pub user_id: Option<String>,
}

/// Promote an existing user to `admin`. Every attempt and its outcome is
/// logged with the acting admin.
pub async fn create_admin<S>(
  State(state): State<AppState<S>>,
  Authenticated(ctx): Authenticated,
  payload: Result<Json<PromoteBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  authorize_role(&ctx, &[Role::Admin])?;
  let body = json_body(payload)?;
  info!(actor = %ctx.subject_id, target = ?body.user_id, "promotion requested");

  let Some(raw) = body.user_id.filter(|id| !id.trim().is_empty()) else {
    warn!(actor = %ctx.subject_id, "promotion without a user id");
    return Err(ApiError::InvalidInput("userId is required".into()));
  };
  let user_id = parse_id(&raw, "userId")?;

  let Some(current) = state.store.get_user(user_id).await.map_err(ApiError::store)? else {
    warn!(%user_id, "promotion target not found");
    return Err(ApiError::not_found("user"));
  };

  let mut user = current.clone();
  if !user.promote() {
    info!(%user_id, email = %user.email, "promotion target is already an admin");
    return Err(ApiError::InvalidState("user is already an admin".into()));
  }

  let Some(user) = state
    .store
    .save_user(&current, &user)
    .await
    .map_err(ApiError::store)?
  else {
    info!(%user_id, "promotion lost to a concurrent update");
    return Err(ApiError::InvalidState("user is already an admin".into()));
  };

  info!(
    %user_id,
    email = %user.email,
    actor = %ctx.subject_id,
    "user promoted to admin",
  );
  Ok(ok("User role updated to admin successfully.", user.summary()))
}
