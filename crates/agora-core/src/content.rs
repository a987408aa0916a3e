//! Owned content: posts and the comments attached to them.
//!
//! Every resource records the identity that created it. That reference never
//! changes; the ownership gate compares it against the caller on mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::Role;

/// Anything with a recorded owner.
pub trait Owned {
  fn owner_id(&self) -> Uuid;
}

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub id:         Uuid,
  pub owner_id:   Uuid,
  pub content:    String,
  /// Starts at 1; bumped by every successful update.
  pub version:    i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Owned for Post {
  fn owner_id(&self) -> Uuid { self.owner_id }
}

#[derive(Debug, Clone)]
pub struct NewPost {
  pub owner_id: Uuid,
  pub content:  String,
}

// ─── Comment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         Uuid,
  pub owner_id:   Uuid,
  pub post_id:    Uuid,
  pub content:    String,
  pub version:    i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Owned for Comment {
  fn owner_id(&self) -> Uuid { self.owner_id }
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub owner_id: Uuid,
  pub post_id:  Uuid,
  pub content:  String,
}

// ─── Read projections ────────────────────────────────────────────────────────

/// The public face of a resource owner, joined in on reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
  pub id:    Uuid,
  pub email: String,
  pub role:  Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
  #[serde(flatten)]
  pub post:  Post,
  pub owner: OwnerSummary,
}
