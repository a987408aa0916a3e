//! Error type for `agora-store-sqlite`.

use agora_core::store::StoreError;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] agora_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// The `users.email` UNIQUE constraint rejected an insert.
  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  /// A foreign key named a row that does not exist.
  #[error("referenced {0} does not exist")]
  MissingReference(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl StoreError for Error {
  fn is_duplicate(&self) -> bool { matches!(self, Self::DuplicateEmail(_)) }

  fn is_missing_reference(&self) -> bool { matches!(self, Self::MissingReference(_)) }
}

/// The constraint violations callers can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
  UniqueEmail,
  ForeignKey,
}

/// Pick out a violation by extended result code. Other constraint failures
/// (primary key, NOT NULL) stay plain database errors.
pub(crate) fn violation(e: &tokio_rusqlite::Error) -> Option<Violation> {
  let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(failure, message)) = e
  else {
    return None;
  };

  match failure.extended_code {
    ffi::SQLITE_CONSTRAINT_UNIQUE
      if message.as_deref().is_some_and(|m| m.contains("users.email")) =>
    {
      Some(Violation::UniqueEmail)
    }
    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::ForeignKey),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn failure(extended_code: i32, message: &str) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      ffi::Error::new(extended_code),
      Some(message.to_owned()),
    ))
  }

  #[test]
  fn unique_email_is_recognised() {
    let e = failure(ffi::SQLITE_CONSTRAINT_UNIQUE, "UNIQUE constraint failed: users.email");
    assert_eq!(violation(&e), Some(Violation::UniqueEmail));
  }

  #[test]
  fn other_constraints_are_not_duplicates() {
    let pk = failure(ffi::SQLITE_CONSTRAINT_PRIMARYKEY, "UNIQUE constraint failed: users.id");
    let not_null = failure(ffi::SQLITE_CONSTRAINT_NOTNULL, "NOT NULL constraint failed: users.name");
    let other_unique = failure(ffi::SQLITE_CONSTRAINT_UNIQUE, "UNIQUE constraint failed: posts.id");

    assert_eq!(violation(&pk), None);
    assert_eq!(violation(&not_null), None);
    assert_eq!(violation(&other_unique), None);
  }

  #[test]
  fn foreign_key_is_recognised() {
    let e = failure(ffi::SQLITE_CONSTRAINT_FOREIGNKEY, "FOREIGN KEY constraint failed");
    assert_eq!(violation(&e), Some(Violation::ForeignKey));
  }

  #[test]
  fn classification_flags() {
    assert!(Error::DuplicateEmail("a@x.com".into()).is_duplicate());
    assert!(!Error::DuplicateEmail("a@x.com".into()).is_missing_reference());
    assert!(Error::MissingReference("post").is_missing_reference());
    assert!(!Error::DateParse("x".into()).is_duplicate());
  }
}
