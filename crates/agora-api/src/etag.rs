//! ETag computation and `If-Match` handling for posts and comments.
//!
//! An ETag is a SHA-256 over the resource id and its version, so it changes
//! exactly when a write lands.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ApiError;

pub fn compute_etag(id: Uuid, version: i64) -> String {
  let mut hasher = Sha256::new();
  hasher.update(id.as_bytes());
  hasher.update(version.to_le_bytes());
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Fail with [`ApiError::PreconditionFailed`] unless `If-Match` is absent,
/// `*`, or lists `current`.
pub fn check_if_match(headers: &HeaderMap, current: &str) -> Result<(), ApiError> {
  let Some(value) = headers.get(header::IF_MATCH) else {
    return Ok(());
  };
  let value = value.to_str().map_err(|_| ApiError::PreconditionFailed)?;

  let matched = value
    .split(',')
    .map(str::trim)
    .any(|tag| tag == "*" || strip_etag_quotes(tag) == strip_etag_quotes(current));

  if matched { Ok(()) } else { Err(ApiError::PreconditionFailed) }
}

/// Strip a weak prefix and surrounding double-quotes from an ETag value.
///
/// Clients send `If-Match` with or without the quotes required by RFC 7232.
fn strip_etag_quotes(s: &str) -> &str {
  s.trim_start_matches("W/").trim_matches('"')
}
