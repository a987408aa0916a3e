//! The `ContentStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `agora-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  content::{Comment, NewComment, NewPost, Post, PostView},
  user::{NewUser, User},
};

/// Failures the HTTP layer reports as client errors rather than a 500.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// A uniqueness constraint (the user email) refused the write.
  fn is_duplicate(&self) -> bool;

  /// The write named a user or post that does not exist.
  fn is_missing_reference(&self) -> bool;
}

/// Abstraction over an Agora storage backend.
///
/// Updates are compare-and-swap on the resource `version`: the write applies
/// only if the stored version still equals the one the caller read, and
/// returns `None` otherwise. Last-write-wins is never silent.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ContentStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with an error whose
  /// [`StoreError::is_duplicate`] holds if the email is already taken.
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Exact, case-sensitive lookup.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Write back the mutable fields (`verified`, `verification_code`, `role`)
  /// of `updated` and refresh `updated_at`, provided the stored row still
  /// holds the values in `current`. Returns `None` if the user is gone or
  /// another write changed those fields first.
  fn save_user<'a>(
    &'a self,
    current: &'a User,
    updated: &'a User,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Whether at least one admin exists.
  fn has_admin(
    &self,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Fails with [`StoreError::is_missing_reference`] if the owner is gone.
  fn insert_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// A post joined with its owner's public details.
  fn get_post_view(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PostView>, Self::Error>> + Send + '_;

  /// All posts, newest first.
  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<PostView>, Self::Error>> + Send + '_;

  /// Replace `content` if the stored version still equals `post.version`.
  fn update_post<'a>(
    &'a self,
    post: &'a Post,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + 'a;

  /// Delete a post and its comments. Returns `false` if it did not exist.
  fn delete_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Fails with [`StoreError::is_missing_reference`] if the owner or the
  /// post is gone.
  fn insert_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// All comments, newest first.
  fn list_comments(
    &self,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Comments attached to `post_id`, newest first.
  fn list_comments_for_post(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Replace `content` if the stored version still equals `comment.version`.
  fn update_comment<'a>(
    &'a self,
    comment: &'a Comment,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + 'a;

  fn delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
