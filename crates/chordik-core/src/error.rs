//! Error types for `chordik-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("song not found: {0}")]
  SongNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  /// A badge code with no row in the badge table. Indicates a catalog that
  /// was never seeded, not a user mistake.
  #[error("badge not found: {0:?}")]
  BadgeNotFound(String),

  #[error("user {user_id} does not own song {song_id}")]
  PermissionDenied { user_id: Uuid, song_id: Uuid },

  #[error("invalid vote value: {0} (expected 1, -1 or 0)")]
  InvalidVote(i64),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("email or display name already taken")]
  UserExists,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
