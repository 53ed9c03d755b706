//! Users: the identity every song, vote and badge hangs off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MIN_DISPLAY_NAME_LEN: usize = 3;

/// A registered account. The credential hash never leaves the process in
/// serialised form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub email:         String,
  pub display_name:  String,
  /// argon2 PHC string.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::Engine::register`]. Hashing happens before this point.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub display_name:  String,
  pub password_hash: String,
}

impl NewUser {
  /// Trim whitespace and lowercase the email; emails are unique without
  /// regard to case.
  pub fn normalized(self) -> Self {
    Self {
      email:         self.email.trim().to_lowercase(),
      display_name:  self.display_name.trim().to_owned(),
      password_hash: self.password_hash,
    }
  }

  pub fn validate(&self) -> Result<()> {
    let valid_email = self
      .email
      .split_once('@')
      .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid_email {
      return Err(Error::Validation(format!(
        "invalid email address: {:?}",
        self.email
      )));
    }
    if self.display_name.chars().count() < MIN_DISPLAY_NAME_LEN {
      return Err(Error::Validation(format!(
        "display name must be at least {MIN_DISPLAY_NAME_LEN} characters"
      )));
    }
    if self.password_hash.is_empty() {
      return Err(Error::Validation("missing credential hash".into()));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(email: &str, name: &str) -> NewUser {
    NewUser {
      email:         email.into(),
      display_name:  name.into(),
      password_hash: "$argon2id$stub".into(),
    }
  }

  #[test]
  fn normalizes_email_case_and_whitespace() {
    let u = input("  Alice@Example.COM ", " alice ").normalized();
    assert_eq!(u.email, "alice@example.com");
    assert_eq!(u.display_name, "alice");
    assert!(u.validate().is_ok());
  }

  #[test]
  fn rejects_malformed_email() {
    for bad in ["", "alice", "@example.com", "alice@"] {
      let err = input(bad, "alice").validate().unwrap_err();
      assert!(matches!(err, Error::Validation(_)), "{bad:?}");
    }
  }

  #[test]
  fn rejects_short_display_name() {
    let err = input("a@b.c", "al").validate().unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
  }

  #[test]
  fn password_hash_is_not_serialised() {
    let user = User {
      user_id:       Uuid::new_v4(),
      email:         "a@b.c".into(),
      display_name:  "alice".into(),
      password_hash: "secret-hash".into(),
      created_at:    Utc::now(),
    };
    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("secret-hash"));
  }
}
