//! Error types and axum `IntoResponse` implementation.

use agora_core::access::AccessDenied;
use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every way a request can fail. Gate failures end the request before any
/// write; the body never carries more than a message.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing, malformed, forged, or expired bearer token.
  #[error("unauthorized")]
  Unauthenticated,
  #[error("invalid credentials")]
  InvalidCredentials,
  #[error("forbidden: {0}")]
  Forbidden(String),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("invalid input: {0}")]
  InvalidInput(String),
  #[error("invalid state: {0}")]
  InvalidState(String),
  #[error("conflict: {0}")]
  Conflict(String),
  /// `If-Match` did not match, or a concurrent write won the race.
  #[error("precondition failed")]
  PreconditionFailed,
  #[error("internal error: {0}")]
  Internal(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{what} not found")) }

  pub fn status_code(&self) -> StatusCode {
    match self {
      Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::InvalidInput(_) | Self::InvalidState(_) => StatusCode::BAD_REQUEST,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
      Self::Internal(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<AccessDenied> for ApiError {
  fn from(e: AccessDenied) -> Self { Self::Forbidden(e.to_string()) }
}

impl From<agora_core::Error> for ApiError {
  fn from(e: agora_core::Error) -> Self {
    match e {
      agora_core::Error::Validation { .. } => Self::InvalidInput(e.to_string()),
      agora_core::Error::AccessDenied(denied) => denied.into(),
      agora_core::Error::UnknownRole(_) => Self::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let message = match &self {
      // Store internals stay in the log.
      Self::Store(_) => "internal error".to_string(),
      other => other.to_string(),
    };
    let mut res =
      (status, Json(json!({ "message": message, "status": "error" }))).into_response();

    if matches!(self, Self::Unauthenticated) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"agora\""),
      );
    }
    res
  }
}
