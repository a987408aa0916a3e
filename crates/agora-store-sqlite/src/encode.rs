//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use agora_core::{
  content::{Comment, OwnerSummary, Post, PostView},
  user::{Role, User},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// The current time, truncated to the precision the database keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str { role.into() }

pub fn decode_role(s: &str) -> Result<Role> { Ok(Role::parse(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "id, name, first_name, email, country, password_hash, \
   verified, verification_code, role, created_at, updated_at";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:                String,
  pub name:              String,
  pub first_name:        String,
  pub email:             String,
  pub country:           String,
  pub password_hash:     String,
  pub verified:          bool,
  pub verification_code: String,
  pub role:              String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawUser {
  /// Map a row selected with [`USER_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      name:              row.get(1)?,
      first_name:        row.get(2)?,
      email:             row.get(3)?,
      country:           row.get(4)?,
      password_hash:     row.get(5)?,
      verified:          row.get(6)?,
      verification_code: row.get(7)?,
      role:              row.get(8)?,
      created_at:        row.get(9)?,
      updated_at:        row.get(10)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:                decode_uuid(&self.id)?,
      name:              self.name,
      first_name:        self.first_name,
      email:             self.email,
      country:           self.country,
      password_hash:     self.password_hash,
      verified:          self.verified,
      verification_code: self.verification_code,
      role:              decode_role(&self.role)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

pub const POST_COLUMNS: &str =
  "p.id, p.owner_id, p.content, p.version, p.created_at, p.updated_at";

/// Raw values read directly from a `posts` row.
pub struct RawPost {
  pub id:         String,
  pub owner_id:   String,
  pub content:    String,
  pub version:    i64,
  pub created_at: String,
  pub updated_at: String,
}

impl RawPost {
  /// Map a row selected with [`POST_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      owner_id:   row.get(1)?,
      content:    row.get(2)?,
      version:    row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:         decode_uuid(&self.id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      content:    self.content,
      version:    self.version,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A `posts` row joined with the owner's `email` and `role`.
pub struct RawPostView {
  pub post:        RawPost,
  pub owner_email: String,
  pub owner_role:  String,
}

impl RawPostView {
  /// Map a row selected with [`POST_COLUMNS`] followed by `u.email, u.role`.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post:        RawPost::from_row(row)?,
      owner_email: row.get(6)?,
      owner_role:  row.get(7)?,
    })
  }

  pub fn into_view(self) -> Result<PostView> {
    let post = self.post.into_post()?;
    let owner = OwnerSummary {
      id:    post.owner_id,
      email: self.owner_email,
      role:  decode_role(&self.owner_role)?,
    };
    Ok(PostView { post, owner })
  }
}

pub const COMMENT_COLUMNS: &str =
  "id, owner_id, post_id, content, version, created_at, updated_at";

/// Raw values read directly from a `comments` row.
pub struct RawComment {
  pub id:         String,
  pub owner_id:   String,
  pub post_id:    String,
  pub content:    String,
  pub version:    i64,
  pub created_at: String,
  pub updated_at: String,
}

impl RawComment {
  /// Map a row selected with [`COMMENT_COLUMNS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      owner_id:   row.get(1)?,
      post_id:    row.get(2)?,
      content:    row.get(3)?,
      version:    row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         decode_uuid(&self.id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      post_id:    decode_uuid(&self.post_id)?,
      content:    self.content,
      version:    self.version,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
