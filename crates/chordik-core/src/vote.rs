//! Votes: one signed opinion per user per song.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The magnitude of a vote. `Remove` is never stored; casting it deletes the
/// caller's existing vote, so "no opinion" and "never voted" are the same
/// state.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
  Dislike = -1,
  #[default]
  Remove  = 0,
  Like    = 1,
}

impl VoteValue {
  pub fn as_i64(self) -> i64 { self as i64 }

  pub fn is_remove(self) -> bool { matches!(self, Self::Remove) }
}

impl TryFrom<i64> for VoteValue {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    match value {
      1 => Ok(Self::Like),
      -1 => Ok(Self::Dislike),
      0 => Ok(Self::Remove),
      other => Err(Error::InvalidVote(other)),
    }
  }
}

impl From<VoteValue> for i64 {
  fn from(value: VoteValue) -> Self { value.as_i64() }
}

/// A song's aggregate score together with one user's own vote on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
  pub score:     i64,
  pub user_vote: VoteValue,
}
