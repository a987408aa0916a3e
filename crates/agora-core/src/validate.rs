//! Request payload validation, run before any store call.

use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const VERIFICATION_CODE_LEN: usize = 6;

/// A non-empty (after trimming) required string field.
pub fn required(field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(field, "must not be empty"));
  }
  Ok(())
}

/// A single `local@domain.tld` address with no whitespace.
pub fn email(value: &str) -> Result<()> {
  let invalid = || Error::validation("email", format!("{value:?} is not an email address"));

  if value.chars().any(char::is_whitespace) {
    return Err(invalid());
  }
  let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
  if local.is_empty() || domain.contains('@') {
    return Err(invalid());
  }
  match domain.rsplit_once('.') {
    Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
    _ => Err(invalid()),
  }
}

pub fn password(value: &str) -> Result<()> {
  if value.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::validation(
      "password",
      format!("must be at least {MIN_PASSWORD_LEN} characters"),
    ));
  }
  Ok(())
}

pub fn verification_code(value: &str) -> Result<()> {
  if value.chars().count() != VERIFICATION_CODE_LEN {
    return Err(Error::validation(
      "verification_code",
      format!("must be exactly {VERIFICATION_CODE_LEN} characters"),
    ));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_plain_addresses() {
    assert!(email("a@x.com").is_ok());
    assert!(email("first.last+tag@mail.example.org").is_ok());
  }

  #[test]
  fn rejects_malformed_addresses() {
    for bad in ["", "a", "a@", "@x.com", "a@x", "a@.com", "a@x.", "a b@x.com", "a@b@x.com"] {
      assert!(email(bad).is_err(), "accepted {bad:?}");
    }
  }

  #[test]
  fn password_length() {
    assert!(password("12345").is_err());
    assert!(password("secret1").is_ok());
  }

  #[test]
  fn code_length_is_exact() {
    assert!(verification_code("12345").is_err());
    assert!(verification_code("1234567").is_err());
    assert!(verification_code("123456").is_ok());
  }

  #[test]
  fn required_trims() {
    assert!(required("name", "   ").is_err());
    assert!(required("name", "A").is_ok());
  }
}
