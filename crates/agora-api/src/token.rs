//! Token service: issues and verifies signed identity assertions.
//!
//! Tokens are HS256 JWTs carrying the subject id and role, valid for one hour
//! from issuance. There is no revocation list; a role change is only seen by
//! tokens issued after it.

use agora_core::{access::AuthContext, user::Role};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Lifetime of an issued token.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// The JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
  /// Subject (user id).
  sub:  String,
  role: String,
  /// Issued at (Unix timestamp).
  iat:  i64,
  /// Expiration time (Unix timestamp).
  exp:  i64,
}

/// A token handed to a client at login.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
}

/// The only failure callers see. Whether the signature, the encoding, or the
/// expiry was at fault is logged at `debug` and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid token")]
pub struct InvalidToken;

/// Signs and verifies tokens with a secret injected at construction.
pub struct TokenService {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl std::fmt::Debug for TokenService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenService")
      .field("algorithm", &"HS256")
      .field("ttl_secs", &TOKEN_TTL_SECS)
      .finish()
  }
}

impl TokenService {
  pub fn new(secret: &[u8]) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
    }
  }

  /// Issue a token for `subject_id` valid for [`TOKEN_TTL_SECS`] from now.
  pub fn issue(
    &self,
    subject_id: Uuid,
    role: Role,
  ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
    self.issue_at(subject_id, role, Utc::now())
  }

  /// Issue a token as if the current time were `issued_at`.
  pub fn issue_at(
    &self,
    subject_id: Uuid,
    role: Role,
    issued_at: DateTime<Utc>,
  ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
    let expires_at = issued_at + Duration::seconds(TOKEN_TTL_SECS);
    let claims = Claims {
      sub:  subject_id.to_string(),
      role: role.to_string(),
      iat:  issued_at.timestamp(),
      exp:  expires_at.timestamp(),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
    Ok(IssuedToken { token, expires_at })
  }

  /// Check the signature and expiry and recover the identity.
  pub fn verify(&self, token: &str) -> Result<AuthContext, InvalidToken> {
    let data = decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| {
        debug!(kind = ?e.kind(), "token rejected");
        InvalidToken
      })?;

    let subject_id = Uuid::parse_str(&data.claims.sub).map_err(|_| {
      debug!("token subject is not a uuid");
      InvalidToken
    })?;
    let role = Role::parse(&data.claims.role).map_err(|_| {
      debug!(role = %data.claims.role, "token role is unknown");
      InvalidToken
    })?;

    Ok(AuthContext { subject_id, role })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &[u8] = b"test-secret-key-32-bytes-long!!!";

  #[test]
  fn issued_token_verifies_to_same_identity() {
    let svc = TokenService::new(SECRET);
    let id = Uuid::new_v4();

    let issued = svc.issue(id, Role::Admin).unwrap();
    let ctx = svc.verify(&issued.token).unwrap();

    assert_eq!(ctx.subject_id, id);
    assert_eq!(ctx.role, Role::Admin);
  }

  #[test]
  fn expiry_is_one_hour_after_issue() {
    let svc = TokenService::new(SECRET);
    let now = Utc::now();
    let issued = svc.issue_at(Uuid::new_v4(), Role::User, now).unwrap();
    assert_eq!(issued.expires_at - now, Duration::hours(1));
  }

  #[test]
  fn expired_token_is_invalid() {
    let svc = TokenService::new(SECRET);
    let two_hours_ago = Utc::now() - Duration::hours(2);
    let issued = svc.issue_at(Uuid::new_v4(), Role::User, two_hours_ago).unwrap();

    assert_eq!(svc.verify(&issued.token), Err(InvalidToken));
  }

  #[test]
  fn token_from_other_secret_is_invalid() {
    let ours = TokenService::new(SECRET);
    let theirs = TokenService::new(b"different-secret-key-32-bytes!!!");
    let issued = theirs.issue(Uuid::new_v4(), Role::Admin).unwrap();

    assert_eq!(ours.verify(&issued.token), Err(InvalidToken));
  }

  #[test]
  fn tampered_payload_is_invalid() {
    let svc = TokenService::new(SECRET);
    let issued = svc.issue(Uuid::new_v4(), Role::User).unwrap();

    let mut parts: Vec<String> = issued.token.split('.').map(str::to_owned).collect();
    let forged = svc.issue(Uuid::new_v4(), Role::Admin).unwrap();
    parts[1] = forged.token.split('.').nth(1).unwrap().to_owned();

    assert_eq!(svc.verify(&parts.join(".")), Err(InvalidToken));
  }

  #[test]
  fn garbage_is_invalid() {
    let svc = TokenService::new(SECRET);
    assert_eq!(svc.verify(""), Err(InvalidToken));
    assert_eq!(svc.verify("not.a.jwt"), Err(InvalidToken));
  }

  #[test]
  fn unknown_role_claim_is_invalid() {
    let svc = TokenService::new(SECRET);
    let now = Utc::now().timestamp();
    let claims = Claims {
      sub:  Uuid::new_v4().to_string(),
      role: "superuser".into(),
      iat:  now,
      exp:  now + 60,
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap();

    assert_eq!(svc.verify(&token), Err(InvalidToken));
  }
}
