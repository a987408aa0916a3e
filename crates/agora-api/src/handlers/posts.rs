//! Post CRUD.
//!
//! Reads are public. Create needs a token; update and delete also need the
//! caller to own the post. Updates honour `If-Match` and never overwrite a
//! concurrent write.

use agora_core::{
  access::authorize_ownership,
  content::{NewPost, Post},
  store::{ContentStore, StoreError as _},
  validate,
};
use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::HeaderMap,
  response::Response,
};
use serde::Deserialize;
use tracing::info;

use crate::{
  AppState,
  auth::Authenticated,
  error::ApiError,
  etag::{check_if_match, compute_etag},
  handlers::{created, done, json_body, ok, parse_id, with_etag},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostBody {
  pub content: String,
}

fn etag_of(post: &Post) -> String { compute_etag(post.id, post.version) }

async fn load<S>(state: &AppState<S>, raw_id: &str) -> Result<Post, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let id = parse_id(raw_id, "post id")?;
  state
    .store
    .get_post(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("post"))
}

pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authenticated(ctx): Authenticated,
  payload: Result<Json<PostBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let body = json_body(payload)?;
  validate::required("content", &body.content)?;

  let post = state
    .store
    .insert_post(NewPost { owner_id: ctx.subject_id, content: body.content })
    .await
    .map_err(|e| {
      // A valid token whose subject no longer has a user row.
      if e.is_missing_reference() { ApiError::Unauthenticated } else { ApiError::store(e) }
    })?;

  info!(post_id = %post.id, owner_id = %post.owner_id, "post created");
  let etag = etag_of(&post);
  Ok(with_etag(created("Post created successfully.", post), &etag))
}

pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let posts = state.store.list_posts().await.map_err(ApiError::store)?;
  Ok(ok("Posts fetched successfully.", posts))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(raw_id): Path<String>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let id = parse_id(&raw_id, "post id")?;
  let view = state
    .store
    .get_post_view(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("post"))?;

  let etag = etag_of(&view.post);
  Ok(with_etag(ok("Post fetched successfully.", view), &etag))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  Authenticated(ctx): Authenticated,
  Path(raw_id): Path<String>,
  headers: HeaderMap,
  payload: Result<Json<PostBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let mut post = load(&state, &raw_id).await?;
  authorize_ownership(&ctx, &post)?;
  check_if_match(&headers, &etag_of(&post))?;

  let body = json_body(payload)?;
  validate::required("content", &body.content)?;
  post.content = body.content;

  let updated = state
    .store
    .update_post(&post)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::PreconditionFailed)?;

  info!(post_id = %updated.id, version = updated.version, "post updated");
  let etag = etag_of(&updated);
  Ok(with_etag(ok("Post updated successfully.", updated), &etag))
}

pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Authenticated(ctx): Authenticated,
  Path(raw_id): Path<String>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let post = load(&state, &raw_id).await?;
  authorize_ownership(&ctx, &post)?;
  check_if_match(&headers, &etag_of(&post))?;

  if !state.store.delete_post(post.id).await.map_err(ApiError::store)? {
    return Err(ApiError::not_found("post"));
  }

  info!(post_id = %post.id, "post deleted");
  Ok(done("Post deleted successfully."))
}
