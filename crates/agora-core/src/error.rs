//! Error types for `agora-core`.

use thiserror::Error;

use crate::access::AccessDenied;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error(transparent)]
  AccessDenied(#[from] AccessDenied),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

impl Error {
  pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
