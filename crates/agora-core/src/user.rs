//! Users: the identities that authenticate, author content, and hold a role.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The single role an identity holds at any moment.
///
/// Roles are flat: `Admin` does not imply `User`. Gates match role sets
/// literally.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
}

impl Role {
  /// Parse the lowercase form stored in the database and embedded in tokens.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownRole(s.to_owned()))
  }
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A registered account as persisted by the store.
///
/// Never serialised directly into a response: the password hash and the
/// pending verification code stay server-side. Use [`UserSummary`] instead.
#[derive(Debug, Clone)]
pub struct User {
  pub id:                Uuid,
  pub name:              String,
  pub first_name:        String,
  /// Unique; compared exactly as stored.
  pub email:             String,
  pub country:           String,
  /// argon2 PHC string.
  pub password_hash:     String,
  pub verified:          bool,
  /// Empty once the account is verified.
  pub verification_code: String,
  pub role:              Role,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl User {
  /// Transition `unverified → verified` if `code` matches the pending code.
  ///
  /// Returns `false` and leaves the user untouched on mismatch. An already
  /// verified user has an empty code, which no valid submission can match.
  pub fn verify(&mut self, code: &str) -> bool {
    if self.verification_code.is_empty() || self.verification_code != code {
      return false;
    }
    self.verified = true;
    self.verification_code.clear();
    true
  }

  /// Transition `user → admin`. Returns `false` if already an admin.
  pub fn promote(&mut self) -> bool {
    if self.role == Role::Admin {
      return false;
    }
    self.role = Role::Admin;
    true
  }

  pub fn summary(&self) -> UserSummary {
    UserSummary {
      id:       self.id,
      email:    self.email.clone(),
      role:     self.role,
      verified: self.verified,
    }
  }
}

/// Public projection of a [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
  pub id:       Uuid,
  pub email:    String,
  pub role:     Role,
  pub verified: bool,
}

// ─── NewUser ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContentStore::insert_user`].
/// `id` and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:              String,
  pub first_name:        String,
  pub email:             String,
  pub country:           String,
  pub password_hash:     String,
  pub verified:          bool,
  pub verification_code: String,
  pub role:              Role,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user(code: &str) -> User {
    let now = Utc::now();
    User {
      id:                Uuid::new_v4(),
      name:              "A".into(),
      first_name:        "A".into(),
      email:             "a@x.com".into(),
      country:           "US".into(),
      password_hash:     String::new(),
      verified:          false,
      verification_code: code.into(),
      role:              Role::User,
      created_at:        now,
      updated_at:        now,
    }
  }

  #[test]
  fn role_round_trips_lowercase() {
    assert_eq!(Role::Admin.to_string(), "admin");
    assert_eq!(Role::parse("user").unwrap(), Role::User);
    assert!(matches!(Role::parse("Admin"), Err(Error::UnknownRole(_))));
  }

  #[test]
  fn verify_clears_code_and_is_not_reusable() {
    let mut u = user("123456");
    assert!(!u.verify("654321"));
    assert!(!u.verified);

    assert!(u.verify("123456"));
    assert!(u.verified);
    assert!(u.verification_code.is_empty());

    assert!(!u.verify("123456"));
    assert!(!u.verify(""));
  }

  #[test]
  fn promote_is_one_way() {
    let mut u = user("");
    assert!(u.promote());
    assert_eq!(u.role, Role::Admin);
    assert!(!u.promote());
  }
}
