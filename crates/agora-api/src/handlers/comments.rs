//! Comment CRUD.

use agora_core::{
  access::authorize_ownership,
  content::{Comment, NewComment},
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
#[serde(default, rename_all = "camelCase")]
pub struct NewCommentBody {
  #[serde(alias = "post_id")]
  pub post_id: Option<String>,
  pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentBody {
  pub content: String,
}

fn etag_of(comment: &Comment) -> String { compute_etag(comment.id, comment.version) }

async fn load<S>(state: &AppState<S>, raw_id: &str) -> Result<Comment, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let id = parse_id(raw_id, "comment id")?;
  state
    .store
    .get_comment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("comment"))
}

pub async fn create<S>(
  State(state): State<AppState<S>>,
  Authenticated(ctx): Authenticated,
  payload: Result<Json<NewCommentBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let body = json_body(payload)?;
  let raw_post_id = body
    .post_id
    .filter(|id| !id.trim().is_empty())
    .ok_or_else(|| ApiError::InvalidInput("postId is required".into()))?;
  let post_id = parse_id(&raw_post_id, "postId")?;
  validate::required("content", &body.content)?;

  if state.store.get_post(post_id).await.map_err(ApiError::store)?.is_none() {
    return Err(ApiError::not_found("post"));
  }

  let comment = state
    .store
    .insert_comment(NewComment { owner_id: ctx.subject_id, post_id, content: body.content })
    .await;
  let comment = match comment {
    Ok(comment) => comment,
    Err(e) if e.is_missing_reference() => {
      // Either the post was deleted after the check above or the token's
      // subject has no user row.
      let post = state.store.get_post(post_id).await.map_err(ApiError::store)?;
      return Err(match post {
        None => ApiError::not_found("post"),
        Some(_) => ApiError::Unauthenticated,
      });
    }
    Err(e) => return Err(ApiError::store(e)),
  };

  info!(comment_id = %comment.id, %post_id, owner_id = %comment.owner_id, "comment created");
  let etag = etag_of(&comment);
  Ok(with_etag(created("Comment created successfully.", comment), &etag))
}

pub async fn list_all<S>(
  State(state): State<AppState<S>>,
  Authenticated(_ctx): Authenticated,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let comments = state.store.list_comments().await.map_err(ApiError::store)?;
  Ok(ok("Comments retrieved successfully.", comments))
}

/// Comments on one post, newest first. An unknown post has no comments.
pub async fn list_for_post<S>(
  State(state): State<AppState<S>>,
  Path(raw_post_id): Path<String>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let post_id = parse_id(&raw_post_id, "post id")?;
  let comments = state
    .store
    .list_comments_for_post(post_id)
    .await
    .map_err(ApiError::store)?;
  Ok(ok("Comments retrieved successfully.", comments))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(_ctx): Authenticated,
  Path(raw_id): Path<String>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let comment = load(&state, &raw_id).await?;
  let etag = etag_of(&comment);
  Ok(with_etag(ok("Comment retrieved successfully.", comment), &etag))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  Authenticated(ctx): Authenticated,
  Path(raw_id): Path<String>,
  headers: HeaderMap,
  payload: Result<Json<CommentBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  let mut comment = load(&state, &raw_id).await?;
  authorize_ownership(&ctx, &comment)?;
  check_if_match(&headers, &etag_of(&comment))?;

  let body = json_body(payload)?;
  validate::required("content", &body.content)?;
  comment.content = body.content;

  let updated = state
    .store
    .update_comment(&comment)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::PreconditionFailed)?;

  info!(comment_id = %updated.id, version = updated.version, "comment updated");
  let etag = etag_of(&updated);
  Ok(with_etag(ok("Comment updated successfully.", updated), &etag))
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
  let comment = load(&state, &raw_id).await?;
  authorize_ownership(&ctx, &comment)?;
  check_if_match(&headers, &etag_of(&comment))?;

  if !state.store.delete_comment(comment.id).await.map_err(ApiError::store)? {
    return Err(ApiError::not_found("comment"));
  }

  info!(comment_id = %comment.id, "comment deleted");
  Ok(done("Comment deleted successfully."))
}
