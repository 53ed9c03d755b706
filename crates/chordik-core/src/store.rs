//! The `SongStore` trait, the ledger seam between the engine and storage.
//!
//! Backends own the uniqueness invariants: one vote per `(user, song)`, one
//! award per `(user, badge)`, unique badge codes, unique user email and
//! display name. The engine never writes vote or award rows except through
//! these methods.

use std::future::Future;

use uuid::Uuid;

use crate::{
  badge::{Badge, HeldBadge, UserBadge},
  catalog::BadgeDefinition,
  song::{Song, SongPage, SongQuery},
  user::User,
  vote::VoteValue,
};

// ─── Insert outcome ──────────────────────────────────────────────────────────

/// Result of an insert guarded by a uniqueness constraint. A duplicate is a
/// normal outcome, not an error; callers decide whether it matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insert<T> {
  Created(T),
  Duplicate,
}

impl<T> Insert<T> {
  pub fn is_created(&self) -> bool { matches!(self, Self::Created(_)) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Chordik storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SongStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Cheap reachability check.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist `user`; [`Insert::Duplicate`] if the email or display name is
  /// already taken.
  fn create_user(
    &self,
    user: User,
  ) -> impl Future<Output = Result<Insert<User>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup.
  fn user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Songs ─────────────────────────────────────────────────────────────

  fn insert_song(
    &self,
    song: Song,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_song(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Song>, Self::Error>> + Send + '_;

  /// Overwrite the editable fields and `updated_at` of an existing song.
  /// Returns `false` if no such song exists.
  fn update_song(
    &self,
    song: Song,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete a song and every vote cast on it. Returns `false` if no such
  /// song exists.
  fn delete_song(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Newest first, filtered and paginated per `query`.
  fn list_songs<'a>(
    &'a self,
    query: &'a SongQuery,
  ) -> impl Future<Output = Result<SongPage, Self::Error>> + Send + 'a;

  /// Number of songs currently owned by `owner_id`.
  fn count_songs_by(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Vote ledger ───────────────────────────────────────────────────────

  /// Atomically apply `value` to the `(user_id, song_id)` vote and return the
  /// song's new aggregate score.
  ///
  /// - no vote and `Remove`: nothing is written;
  /// - no vote and `Like`/`Dislike`: a row is inserted;
  /// - a vote and `Remove`: the row is deleted;
  /// - a vote and `Like`/`Dislike`: the row is updated in place.
  ///
  /// Returns `None`, without writing anything, if the song does not exist.
  fn cast_vote(
    &self,
    user_id: Uuid,
    song_id: Uuid,
    value: VoteValue,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// The user's stored vote, or [`VoteValue::Remove`] if there is none.
  fn vote_of(
    &self,
    user_id: Uuid,
    song_id: Uuid,
  ) -> impl Future<Output = Result<VoteValue, Self::Error>> + Send + '_;

  /// Sum of all stored vote values for the song; 0 when there are none.
  fn score_of(
    &self,
    song_id: Uuid,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  // ── Badge ledger ──────────────────────────────────────────────────────

  /// Insert each definition whose code is not present yet. Existing rows are
  /// left untouched. Returns the number of rows inserted.
  fn seed_badges<'a>(
    &'a self,
    definitions: &'a [BadgeDefinition],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  fn badge_by_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Badge>, Self::Error>> + Send + 'a;

  /// Record an award; [`Insert::Duplicate`] if the user already holds the
  /// badge, including when a concurrent insert won the race.
  fn insert_award(
    &self,
    user_id: Uuid,
    badge_id: Uuid,
  ) -> impl Future<Output = Result<Insert<UserBadge>, Self::Error>> + Send + '_;

  fn has_award(
    &self,
    user_id: Uuid,
    badge_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Badges held by the user, oldest award first.
  fn awards_for(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<HeldBadge>, Self::Error>> + Send + '_;
}
