//! [`Engine`]: the evaluation orchestrator.
//!
//! Each user action is a mutation on one of the ledgers followed by a badge
//! evaluation:
//!
//! | Action  | Ledger write            | Aggregate recomputed      | Badge recipient |
//! |---------|-------------------------|---------------------------|-----------------|
//! | login   | none                    | login occurred            | the user        |
//! | publish | song row                | songs owned by the user   | the user        |
//! | vote    | vote row                | song score                | the song owner  |
//!
//! Awards are idempotent, so every step is safe to retry. Ledger failures
//! abort the step and are returned unchanged.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  badge::HeldBadge,
  catalog::{Aggregates, BadgeCatalog},
  song::{Song, SongDraft, SongPage, SongQuery},
  store::{Insert, SongStore},
  user::{NewUser, User},
  vote::{VoteTally, VoteValue},
};

pub struct Engine<S> {
  store:   Arc<S>,
  catalog: Arc<BadgeCatalog>,
}

impl<S> Clone for Engine<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), catalog: Arc::clone(&self.catalog) }
  }
}

impl<S: SongStore> Engine<S> {
  pub fn new(store: Arc<S>, catalog: BadgeCatalog) -> Self {
    Self { store, catalog: Arc::new(catalog) }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn catalog(&self) -> &BadgeCatalog { &self.catalog }

  /// Seed the catalog's badges into the store. Call once at startup.
  pub async fn ensure_seeded(&self) -> Result<usize> {
    self.catalog.ensure_seeded(self.store.as_ref()).await
  }

  pub async fn ping(&self) -> Result<()> {
    self.store.ping().await.map_err(Error::store)
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  pub async fn register(&self, input: NewUser) -> Result<User> {
    let input = input.normalized();
    input.validate()?;

    let user = User {
      user_id:       Uuid::new_v4(),
      email:         input.email,
      display_name:  input.display_name,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    match self.store.create_user(user).await.map_err(Error::store)? {
      Insert::Created(user) => {
        tracing::info!(user_id = %user.user_id, "user registered");
        Ok(user)
      }
      Insert::Duplicate => Err(Error::UserExists),
    }
  }

  pub async fn user(&self, user_id: Uuid) -> Result<User> {
    self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::UserNotFound(user_id))
  }

  pub async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    self.store.user_by_email(&email).await.map_err(Error::store)
  }

  /// Record a successful login. Credential checks happen before this call.
  pub async fn login(&self, user_id: Uuid) -> Result<()> {
    self.user(user_id).await?;
    self.on_login(user_id).await?;
    Ok(())
  }

  // ── Songs ─────────────────────────────────────────────────────────────────

  pub async fn publish(&self, owner_id: Uuid, draft: SongDraft) -> Result<Song> {
    draft.validate()?;
    self.user(owner_id).await?;

    let now = Utc::now();
    let song = Song {
      song_id: Uuid::new_v4(),
      owner_id,
      key: draft.normalized_key(),
      title: draft.title,
      artist: draft.artist,
      body: draft.body,
      created_at: now,
      updated_at: now,
    };

    self.store.insert_song(song.clone()).await.map_err(Error::store)?;
    tracing::info!(song_id = %song.song_id, %owner_id, "song published");

    self.on_publish(owner_id).await?;
    Ok(song)
  }

  pub async fn song(&self, song_id: Uuid) -> Result<Song> {
    self
      .store
      .get_song(song_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SongNotFound(song_id))
  }

  /// Fetch a song and check that `user_id` owns it.
  async fn owned_song(&self, user_id: Uuid, song_id: Uuid) -> Result<Song> {
    let song = self.song(song_id).await?;
    if song.owner_id != user_id {
      return Err(Error::PermissionDenied { user_id, song_id });
    }
    Ok(song)
  }

  pub async fn update_song(
    &self,
    user_id: Uuid,
    song_id: Uuid,
    draft: SongDraft,
  ) -> Result<Song> {
    let existing = self.owned_song(user_id, song_id).await?;
    draft.validate()?;

    let song = Song {
      key: draft.normalized_key(),
      title: draft.title,
      artist: draft.artist,
      body: draft.body,
      updated_at: Utc::now(),
      ..existing
    };

    if !self.store.update_song(song.clone()).await.map_err(Error::store)? {
      return Err(Error::SongNotFound(song_id));
    }
    Ok(song)
  }

  /// Delete an owned song and its votes. Badges already earned through it
  /// are kept.
  pub async fn delete_song(&self, user_id: Uuid, song_id: Uuid) -> Result<()> {
    self.owned_song(user_id, song_id).await?;
    if !self.store.delete_song(song_id).await.map_err(Error::store)? {
      return Err(Error::SongNotFound(song_id));
    }
    tracing::info!(%song_id, %user_id, "song deleted");
    Ok(())
  }

  pub async fn list_songs(&self, query: &SongQuery) -> Result<SongPage> {
    self.store.list_songs(query).await.map_err(Error::store)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  /// Apply a vote and return the song's new score. May award the song's
  /// owner a popularity badge.
  pub async fn vote(
    &self,
    user_id: Uuid,
    song_id: Uuid,
    value: VoteValue,
  ) -> Result<i64> {
    self.user(user_id).await?;
    let score = self
      .store
      .cast_vote(user_id, song_id, value)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SongNotFound(song_id))?;
    tracing::debug!(%user_id, %song_id, value = value.as_i64(), score, "vote applied");

    self.on_vote_change(song_id, score).await?;
    Ok(score)
  }

  /// The song's score and the user's own vote. A missing vote reads as
  /// [`VoteValue::Remove`].
  pub async fn get_vote(&self, user_id: Uuid, song_id: Uuid) -> Result<VoteTally> {
    let user_vote = self.vote_of(user_id, song_id).await?;
    let score = self.score_of(song_id).await?;
    Ok(VoteTally { score, user_vote })
  }

  pub async fn vote_of(&self, user_id: Uuid, song_id: Uuid) -> Result<VoteValue> {
    self.store.vote_of(user_id, song_id).await.map_err(Error::store)
  }

  pub async fn score_of(&self, song_id: Uuid) -> Result<i64> {
    self.store.score_of(song_id).await.map_err(Error::store)
  }

  // ── Badge ledger ──────────────────────────────────────────────────────────

  /// Award `code` to `user_id`. Returns `true` if this call created the
  /// award and `false` if the user already held it.
  pub async fn award(&self, user_id: Uuid, code: &str) -> Result<bool> {
    let badge = self
      .store
      .badge_by_code(code)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::BadgeNotFound(code.to_owned()))?;

    if self
      .store
      .has_award(user_id, badge.badge_id)
      .await
      .map_err(Error::store)?
    {
      tracing::debug!(%user_id, badge = code, "badge already held");
      return Ok(false);
    }

    match self
      .store
      .insert_award(user_id, badge.badge_id)
      .await
      .map_err(Error::store)?
    {
      Insert::Created(_) => {
        tracing::info!(%user_id, badge = code, "badge awarded");
        Ok(true)
      }
      Insert::Duplicate => {
        tracing::debug!(%user_id, badge = code, "lost award race; already held");
        Ok(false)
      }
    }
  }

  pub async fn has_award(&self, user_id: Uuid, code: &str) -> Result<bool> {
    let badge = self
      .store
      .badge_by_code(code)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::BadgeNotFound(code.to_owned()))?;
    self
      .store
      .has_award(user_id, badge.badge_id)
      .await
      .map_err(Error::store)
  }

  pub async fn badges_of(&self, user_id: Uuid) -> Result<Vec<HeldBadge>> {
    self.store.awards_for(user_id).await.map_err(Error::store)
  }

  // ── Orchestration ─────────────────────────────────────────────────────────

  /// Award every catalog badge satisfied by `state` to `user_id`. Returns
  /// the codes newly awarded by this call.
  async fn award_satisfied(
    &self,
    user_id: Uuid,
    state: Aggregates,
  ) -> Result<Vec<String>> {
    let mut awarded = Vec::new();
    for def in self.catalog.satisfied_by(&state) {
      if self.award(user_id, &def.code).await? {
        awarded.push(def.code.clone());
      }
    }
    Ok(awarded)
  }

  /// Safe to call on every login, not only the first.
  pub async fn on_login(&self, user_id: Uuid) -> Result<Vec<String>> {
    self.award_satisfied(user_id, Aggregates::login()).await
  }

  /// Evaluate publish tiers against the user's current song count. Every
  /// tier at or below the count is awarded, not just the highest.
  pub async fn on_publish(&self, user_id: Uuid) -> Result<Vec<String>> {
    let published = self
      .store
      .count_songs_by(user_id)
      .await
      .map_err(Error::store)?;
    self.award_satisfied(user_id, Aggregates::published(published)).await
  }

  /// Evaluate popularity rules against `score`, awarding the song's owner.
  /// Badges are never revoked when a score later falls back.
  pub async fn on_vote_change(&self, song_id: Uuid, score: i64) -> Result<Vec<String>> {
    let state = Aggregates::song_score(score);
    if self.catalog.satisfied_by(&state).next().is_none() {
      return Ok(Vec::new());
    }
    let song = self.song(song_id).await?;
    self.award_satisfied(song.owner_id, state).await
  }
}
