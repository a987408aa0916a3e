//! Password hashing and verification (argon2id, PHC strings).

use argon2::{
  Argon2,
  password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;

/// Hash a password into a PHC string: `$argon2id$v=19$m=...,t=...,p=...$salt$hash`.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// `Ok(false)` on a wrong password; `Err` only if `hash` is not a usable PHC
/// string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, password_hash::Error> {
  let parsed_hash = PasswordHash::new(hash)?;

  match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(password_hash::Error::Password) => Ok(false),
    Err(e) => Err(e),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify() {
    let hash = hash_password("secret1").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(verify_password("secret1", &hash).unwrap());
    assert!(!verify_password("secret2", &hash).unwrap());
  }

  #[test]
  fn salts_differ() {
    assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
  }

  #[test]
  fn invalid_hash_is_an_error() {
    assert!(verify_password("secret1", "not_a_phc_string").is_err());
  }
}
