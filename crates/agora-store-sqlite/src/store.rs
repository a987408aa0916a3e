//! [`SqliteStore`], the SQLite implementation of [`ContentStore`].

use std::path::Path;

use agora_core::{
  content::{Comment, NewComment, NewPost, Post, PostView},
  store::ContentStore,
  user::{NewUser, Role, User},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  encode::{
    COMMENT_COLUMNS, POST_COLUMNS, RawComment, RawPost, RawPostView, RawUser,
    USER_COLUMNS, encode_dt, encode_role, encode_uuid, now,
  },
  error::{Violation, violation},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Agora content store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn post_views(&self, id: Option<Uuid>) -> Result<Vec<PostView>> {
    let id_str = id.map(encode_uuid);

    let raws: Vec<RawPostView> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {POST_COLUMNS}, u.email, u.role
           FROM posts p
           JOIN users u ON u.id = p.owner_id
           WHERE ?1 IS NULL OR p.id = ?1
           ORDER BY p.created_at DESC, p.rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPostView::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPostView::into_view).collect()
  }

  async fn comments_where(&self, post_id: Option<Uuid>) -> Result<Vec<Comment>> {
    let post_id_str = post_id.map(encode_uuid);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {COMMENT_COLUMNS}
           FROM comments
           WHERE ?1 IS NULL OR post_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![post_id_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  /// Delete one row by primary key; `table` is always a literal.
  async fn delete_row(&self, table: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE id = ?1"),
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── ContentStore impl ───────────────────────────────────────────────────────

impl ContentStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, input: NewUser) -> Result<User> {
    let created_at = now();
    let user = User {
      id:                Uuid::new_v4(),
      name:              input.name,
      first_name:        input.first_name,
      email:             input.email,
      country:           input.country,
      password_hash:     input.password_hash,
      verified:          input.verified,
      verification_code: input.verification_code,
      role:              input.role,
      created_at,
      updated_at:        created_at,
    };

    let id_str    = encode_uuid(user.id);
    let name      = user.name.clone();
    let first     = user.first_name.clone();
    let email     = user.email.clone();
    let country   = user.country.clone();
    let hash      = user.password_hash.clone();
    let verified  = user.verified;
    let code      = user.verification_code.clone();
    let role_str  = encode_role(user.role);
    let at_str    = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             id, name, first_name, email, country, password_hash,
             verified, verification_code, role, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            id_str, name, first, email, country, hash, verified, code,
            role_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| match violation(&e) {
        Some(Violation::UniqueEmail) => Error::DuplicateEmail(user.email.clone()),
        _ => Error::Database(e),
      })?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn save_user(&self, current: &User, updated: &User) -> Result<Option<User>> {
    let updated_at   = now();
    let id_str       = encode_uuid(updated.id);
    let verified     = updated.verified;
    let code         = updated.verification_code.clone();
    let role_str     = encode_role(updated.role);
    let at_str       = encode_dt(updated_at);
    let was_verified = current.verified;
    let was_code     = current.verification_code.clone();
    let was_role     = encode_role(current.role);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users
           SET verified = ?1, verification_code = ?2, role = ?3, updated_at = ?4
           WHERE id = ?5 AND verified = ?6 AND verification_code = ?7 AND role = ?8",
          rusqlite::params![
            verified, code, role_str, at_str, id_str, was_verified, was_code, was_role,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    Ok(Some(User { updated_at, ..updated.clone() }))
  }

  async fn has_admin(&self) -> Result<bool> {
    let admin = encode_role(Role::Admin);

    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM users WHERE role = ?1 LIMIT 1",
            rusqlite::params![admin],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;

    Ok(found)
  }

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn insert_post(&self, input: NewPost) -> Result<Post> {
    let created_at = now();
    let post = Post {
      id:         Uuid::new_v4(),
      owner_id:   input.owner_id,
      content:    input.content,
      version:    1,
      created_at,
      updated_at: created_at,
    };

    let id_str    = encode_uuid(post.id);
    let owner_str = encode_uuid(post.owner_id);
    let content   = post.content.clone();
    let at_str    = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (id, owner_id, content, version, created_at, updated_at)
           VALUES (?1, ?2, ?3, 1, ?4, ?4)",
          rusqlite::params![id_str, owner_str, content, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| match violation(&e) {
        Some(Violation::ForeignKey) => Error::MissingReference("owner"),
        _ => Error::Database(e),
      })?;

    Ok(post)
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
            rusqlite::params![id_str],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn get_post_view(&self, id: Uuid) -> Result<Option<PostView>> {
    Ok(self.post_views(Some(id)).await?.into_iter().next())
  }

  async fn list_posts(&self) -> Result<Vec<PostView>> {
    self.post_views(None).await
  }

  async fn update_post(&self, post: &Post) -> Result<Option<Post>> {
    let updated_at = now();
    let id_str     = encode_uuid(post.id);
    let content    = post.content.clone();
    let expected   = post.version;
    let at_str     = encode_dt(updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE posts
           SET content = ?1, version = version + 1, updated_at = ?2
           WHERE id = ?3 AND version = ?4",
          rusqlite::params![content, at_str, id_str, expected],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    Ok(Some(Post {
      version: expected + 1,
      updated_at,
      ..post.clone()
    }))
  }

  async fn delete_post(&self, id: Uuid) -> Result<bool> {
    self.delete_row("posts", id).await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn insert_comment(&self, input: NewComment) -> Result<Comment> {
    let created_at = now();
    let comment = Comment {
      id:         Uuid::new_v4(),
      owner_id:   input.owner_id,
      post_id:    input.post_id,
      content:    input.content,
      version:    1,
      created_at,
      updated_at: created_at,
    };

    let id_str    = encode_uuid(comment.id);
    let owner_str = encode_uuid(comment.owner_id);
    let post_str  = encode_uuid(comment.post_id);
    let content   = comment.content.clone();
    let at_str    = encode_dt(created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (id, owner_id, post_id, content, version, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
          rusqlite::params![id_str, owner_str, post_str, content, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| match violation(&e) {
        Some(Violation::ForeignKey) => Error::MissingReference("owner or post"),
        _ => Error::Database(e),
      })?;

    Ok(comment)
  }

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
            rusqlite::params![id_str],
            RawComment::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_comments(&self) -> Result<Vec<Comment>> {
    self.comments_where(None).await
  }

  async fn list_comments_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>> {
    self.comments_where(Some(post_id)).await
  }

  async fn update_comment(&self, comment: &Comment) -> Result<Option<Comment>> {
    let updated_at = now();
    let id_str     = encode_uuid(comment.id);
    let content    = comment.content.clone();
    let expected   = comment.version;
    let at_str     = encode_dt(updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE comments
           SET content = ?1, version = version + 1, updated_at = ?2
           WHERE id = ?3 AND version = ?4",
          rusqlite::params![content, at_str, id_str, expected],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    Ok(Some(Comment {
      version: expected + 1,
      updated_at,
      ..comment.clone()
    }))
  }

  async fn delete_comment(&self, id: Uuid) -> Result<bool> {
    self.delete_row("comments", id).await
  }
}
