//! Bearer-token extractor and standalone verifier.
//!
//! The role and subject are taken from the token itself; the store is never
//! consulted here.

use agora_core::{access::AuthContext, store::ContentStore};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};

use crate::{AppState, error::ApiError, token::TokenService};

/// Proof that the request carried a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub AuthContext);

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// Any other scheme, an empty token, or a non-ASCII header is rejected before
/// the token service sees it.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthenticated)?;

  let token = header_val
    .strip_prefix("Bearer ")
    .map(str::trim)
    .ok_or(ApiError::Unauthenticated)?;

  if token.is_empty() {
    return Err(ApiError::Unauthenticated);
  }
  Ok(token)
}

/// Verify the bearer token directly from headers.
pub fn verify_auth(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthContext, ApiError> {
  let token = bearer_token(headers)?;
  tokens.verify(token).map_err(|_| ApiError::Unauthenticated)
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: ContentStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let ctx = verify_auth(&parts.headers, &state.tokens)?;
    Ok(Authenticated(ctx))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use agora_core::user::Role;
  use axum::http::{HeaderValue, Request};
  use uuid::Uuid;

  const SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn valid_bearer_token() {
    let tokens = TokenService::new(SECRET);
    let id = Uuid::new_v4();
    let issued = tokens.issue(id, Role::User).unwrap();

    let ctx = verify_auth(&headers(&format!("Bearer {}", issued.token)), &tokens).unwrap();
    assert_eq!(ctx.subject_id, id);
    assert_eq!(ctx.role, Role::User);
  }

  #[test]
  fn missing_header() {
    let tokens = TokenService::new(SECRET);
    let req = Request::builder().body(()).unwrap();
    assert!(matches!(
      verify_auth(req.headers(), &tokens),
      Err(ApiError::Unauthenticated)
    ));
  }

  #[test]
  fn wrong_scheme() {
    let tokens = TokenService::new(SECRET);
    let issued = tokens.issue(Uuid::new_v4(), Role::User).unwrap();

    for value in [
      format!("Basic {}", issued.token),
      format!("bearer {}", issued.token),
      issued.token.clone(),
    ] {
      assert!(
        matches!(verify_auth(&headers(&value), &tokens), Err(ApiError::Unauthenticated)),
        "accepted {value:?}"
      );
    }
  }

  #[test]
  fn empty_token() {
    assert!(matches!(bearer_token(&headers("Bearer ")), Err(ApiError::Unauthenticated)));
    assert!(matches!(bearer_token(&headers("Bearer    ")), Err(ApiError::Unauthenticated)));
  }

  #[test]
  fn invalid_token() {
    let tokens = TokenService::new(SECRET);
    assert!(matches!(
      verify_auth(&headers("Bearer not-a-token"), &tokens),
      Err(ApiError::Unauthenticated)
    ));
  }
}
