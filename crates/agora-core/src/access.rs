//! Role and ownership gates.
//!
//! Both gates consume an [`AuthContext`], which only the authentication layer
//! constructs from a verified token. A handler that reaches a gate without a
//! context has a wiring bug; the types make that unrepresentable.
//!
//! The role claim is trusted for the lifetime of the token it came from. A
//! promotion takes effect for the promoted user on their next login.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{content::Owned, user::Role};

/// The identity behind the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
  pub subject_id: Uuid,
  pub role:       Role,
}

/// Why a gate refused the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
  #[error("role {actual} is not permitted here")]
  Role { actual: Role },

  #[error("not the owner of this resource")]
  NotOwner,
}

/// Allow iff `ctx.role` is one of `required`.
///
/// No hierarchy: an admin does not satisfy a `[Role::User]` gate.
pub fn authorize_role(
  ctx: &AuthContext,
  required: &[Role],
) -> Result<(), AccessDenied> {
  if required.contains(&ctx.role) {
    Ok(())
  } else {
    Err(AccessDenied::Role { actual: ctx.role })
  }
}

/// Allow iff the caller is the recorded owner of `resource`.
///
/// Callers load the resource first, so a missing resource surfaces as not
/// found before ownership is evaluated.
pub fn authorize_ownership<R: Owned + ?Sized>(
  ctx: &AuthContext,
  resource: &R,
) -> Result<(), AccessDenied> {
  if resource.owner_id() == ctx.subject_id {
    Ok(())
  } else {
    Err(AccessDenied::NotOwner)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::content::{Comment, Post};

  fn ctx(role: Role) -> AuthContext {
    AuthContext { subject_id: Uuid::new_v4(), role }
  }

  fn post_owned_by(owner_id: Uuid) -> Post {
    let now = Utc::now();
    Post {
      id: Uuid::new_v4(),
      owner_id,
      content: "hello".into(),
      version: 1,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn role_gate_matches_literally() {
    let user = ctx(Role::User);
    let admin = ctx(Role::Admin);

    assert!(authorize_role(&user, &[Role::User]).is_ok());
    assert!(authorize_role(&admin, &[Role::Admin]).is_ok());
    assert!(authorize_role(&admin, &[Role::User, Role::Admin]).is_ok());

    assert_eq!(
      authorize_role(&admin, &[Role::User]),
      Err(AccessDenied::Role { actual: Role::Admin })
    );
    assert_eq!(
      authorize_role(&user, &[Role::Admin]),
      Err(AccessDenied::Role { actual: Role::User })
    );
    assert!(authorize_role(&user, &[]).is_err());
  }

  #[test]
  fn owner_may_mutate() {
    let caller = ctx(Role::User);
    let post = post_owned_by(caller.subject_id);
    assert!(authorize_ownership(&caller, &post).is_ok());
  }

  #[test]
  fn admin_gets_no_ownership_bypass() {
    let owner = ctx(Role::User);
    let admin = ctx(Role::Admin);
    let post = post_owned_by(owner.subject_id);
    assert_eq!(
      authorize_ownership(&admin, &post),
      Err(AccessDenied::NotOwner)
    );
  }

  #[test]
  fn comment_ownership_ignores_post_owner() {
    let post_owner = ctx(Role::User);
    let commenter = ctx(Role::User);
    let now = Utc::now();
    let comment = Comment {
      id:         Uuid::new_v4(),
      owner_id:   commenter.subject_id,
      post_id:    Uuid::new_v4(),
      content:    "nice".into(),
      version:    1,
      created_at: now,
      updated_at: now,
    };
    assert!(authorize_ownership(&commenter, &comment).is_ok());
    assert!(authorize_ownership(&post_owner, &comment).is_err());
  }
}
