//! HTTP Basic-auth extractor and password hashing.
//!
//! Credentials are `email:password`. Every failure mode (missing header, bad
//! encoding, unknown email, wrong password) is reported as the same
//! [`ApiError::Unauthorized`].

use argon2::{
  Argon2,
  PasswordHash,
  PasswordHasher,
  PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chordik_core::{Engine, store::SongStore, user::User};
use rand_core::OsRng;

use crate::error::ApiError;

/// The authenticated caller.
pub struct AuthUser(pub User);

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(e.to_string().into()))
}

/// Pull `(email, password)` out of an `Authorization: Basic` header.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Look up `email` and check `password` against the stored hash.
pub async fn verify_credentials<S: SongStore>(
  engine: &Engine<S>,
  email: &str,
  password: &str,
) -> Result<User, ApiError> {
  let user = engine
    .user_by_email(email)
    .await?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&user.password_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(user)
}

impl<S> FromRequestParts<Engine<S>> for AuthUser
where
  S: SongStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    engine: &Engine<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;
    let user = verify_credentials(engine, &email, &password).await?;
    Ok(AuthUser(user))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{HeaderValue, header};

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn decodes_basic_credentials() {
    let value = format!("Basic {}", B64.encode("a@b.c:pass:word"));
    let (email, password) = basic_credentials(&headers(&value)).unwrap();
    assert_eq!(email, "a@b.c");
    assert_eq!(password, "pass:word");
  }

  #[test]
  fn rejects_malformed_headers() {
    assert!(matches!(
      basic_credentials(&HeaderMap::new()),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      basic_credentials(&headers("Bearer abc")),
      Err(ApiError::Unauthorized)
    ));
    assert!(matches!(
      basic_credentials(&headers("Basic !!!not-base64!!!")),
      Err(ApiError::Unauthorized)
    ));
    let no_colon = format!("Basic {}", B64.encode("nocolon"));
    assert!(matches!(
      basic_credentials(&headers(&no_colon)),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn hashes_verify() {
    let hash = hash_password("correct horse").unwrap();
    let parsed = PasswordHash::new(&hash).unwrap();
    assert!(Argon2::default().verify_password(b"correct horse", &parsed).is_ok());
    assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
  }
}
