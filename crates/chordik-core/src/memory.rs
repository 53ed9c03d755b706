//! [`MemoryStore`]: an in-process [`SongStore`] behind a single mutex.
//!
//! Every operation takes the lock once and finishes before releasing it, so
//! each vote or award is applied by a single writer. Used by tests and by
//! embedders that do not need persistence.

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard},
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  badge::{Badge, HeldBadge, UserBadge},
  catalog::BadgeDefinition,
  song::{Song, SongPage, SongQuery},
  store::{Insert, SongStore},
  user::User,
  vote::VoteValue,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("memory store lock poisoned")]
  Poisoned,
}

#[derive(Default)]
struct Inner {
  users:  HashMap<Uuid, User>,
  songs:  HashMap<Uuid, Song>,
  /// Keyed by `(song_id, user_id)`; values are never `Remove`.
  votes:  HashMap<(Uuid, Uuid), VoteValue>,
  badges: Vec<Badge>,
  /// Keyed by `(user_id, badge_id)`.
  awards: HashMap<(Uuid, Uuid), UserBadge>,
}

impl Inner {
  fn score_of(&self, song_id: Uuid) -> i64 {
    self
      .votes
      .iter()
      .filter(|((s, _), _)| *s == song_id)
      .map(|(_, v)| v.as_i64())
      .sum()
  }
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  fn lock(&self) -> Result<MutexGuard<'_, Inner>, MemoryError> {
    self.inner.lock().map_err(|_| MemoryError::Poisoned)
  }

  /// Number of stored vote rows for `(user_id, song_id)`; 0 or 1.
  pub fn vote_rows(&self, user_id: Uuid, song_id: Uuid) -> Result<usize, MemoryError> {
    Ok(usize::from(self.lock()?.votes.contains_key(&(song_id, user_id))))
  }

  /// Total number of award rows across all users.
  pub fn award_rows(&self) -> Result<usize, MemoryError> {
    Ok(self.lock()?.awards.len())
  }
}

impl SongStore for MemoryStore {
  type Error = MemoryError;

  async fn ping(&self) -> Result<(), MemoryError> {
    self.lock().map(|_| ())
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, user: User) -> Result<Insert<User>, MemoryError> {
    let mut inner = self.lock()?;
    let taken = inner.users.values().any(|u| {
      u.email.eq_ignore_ascii_case(&user.email)
        || u.display_name == user.display_name
    });
    if taken || inner.users.contains_key(&user.user_id) {
      return Ok(Insert::Duplicate);
    }
    inner.users.insert(user.user_id, user.clone());
    Ok(Insert::Created(user))
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>, MemoryError> {
    Ok(self.lock()?.users.get(&id).cloned())
  }

  async fn user_by_email(&self, email: &str) -> Result<Option<User>, MemoryError> {
    Ok(
      self
        .lock()?
        .users
        .values()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .cloned(),
    )
  }

  // ── Songs ─────────────────────────────────────────────────────────────────

  async fn insert_song(&self, song: Song) -> Result<(), MemoryError> {
    self.lock()?.songs.insert(song.song_id, song);
    Ok(())
  }

  async fn get_song(&self, id: Uuid) -> Result<Option<Song>, MemoryError> {
    Ok(self.lock()?.songs.get(&id).cloned())
  }

  async fn update_song(&self, song: Song) -> Result<bool, MemoryError> {
    let mut inner = self.lock()?;
    match inner.songs.get_mut(&song.song_id) {
      Some(existing) => {
        existing.title = song.title;
        existing.artist = song.artist;
        existing.body = song.body;
        existing.key = song.key;
        existing.updated_at = song.updated_at;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn delete_song(&self, id: Uuid) -> Result<bool, MemoryError> {
    let mut inner = self.lock()?;
    if inner.songs.remove(&id).is_none() {
      return Ok(false);
    }
    inner.votes.retain(|(song_id, _), _| *song_id != id);
    Ok(true)
  }

  async fn list_songs(&self, query: &SongQuery) -> Result<SongPage, MemoryError> {
    let inner = self.lock()?;
    let needle = query.search_term().map(str::to_lowercase);

    let mut matches: Vec<&Song> = inner
      .songs
      .values()
      .filter(|s| match &needle {
        Some(n) => {
          s.title.to_lowercase().contains(n) || s.artist.to_lowercase().contains(n)
        }
        None => true,
      })
      .collect();
    matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total = matches.len() as u64;
    let songs = matches
      .into_iter()
      .skip(query.offset)
      .take(query.effective_limit())
      .cloned()
      .collect();

    Ok(SongPage { songs, total })
  }

  async fn count_songs_by(&self, owner_id: Uuid) -> Result<u64, MemoryError> {
    Ok(
      self
        .lock()?
        .songs
        .values()
        .filter(|s| s.owner_id == owner_id)
        .count() as u64,
    )
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn cast_vote(
    &self,
    user_id: Uuid,
    song_id: Uuid,
    value: VoteValue,
  ) -> Result<Option<i64>, MemoryError> {
    let mut inner = self.lock()?;
    if !inner.songs.contains_key(&song_id) {
      return Ok(None);
    }

    let key = (song_id, user_id);
    if value.is_remove() {
      inner.votes.remove(&key);
    } else {
      inner.votes.insert(key, value);
    }

    Ok(Some(inner.score_of(song_id)))
  }

  async fn vote_of(&self, user_id: Uuid, song_id: Uuid) -> Result<VoteValue, MemoryError> {
    Ok(
      self
        .lock()?
        .votes
        .get(&(song_id, user_id))
        .copied()
        .unwrap_or_default(),
    )
  }

  async fn score_of(&self, song_id: Uuid) -> Result<i64, MemoryError> {
    Ok(self.lock()?.score_of(song_id))
  }

  // ── Badge ledger ──────────────────────────────────────────────────────────

  async fn seed_badges(
    &self,
    definitions: &[BadgeDefinition],
  ) -> Result<usize, MemoryError> {
    let mut inner = self.lock()?;
    let mut inserted = 0;
    for def in definitions {
      if inner.badges.iter().any(|b| b.code == def.code) {
        continue;
      }
      inner.badges.push(Badge {
        badge_id:    Uuid::new_v4(),
        code:        def.code.clone(),
        name:        def.name.clone(),
        description: def.description.clone(),
      });
      inserted += 1;
    }
    Ok(inserted)
  }

  async fn badge_by_code(&self, code: &str) -> Result<Option<Badge>, MemoryError> {
    Ok(self.lock()?.badges.iter().find(|b| b.code == code).cloned())
  }

  async fn insert_award(
    &self,
    user_id: Uuid,
    badge_id: Uuid,
  ) -> Result<Insert<UserBadge>, MemoryError> {
    let mut inner = self.lock()?;
    if inner.awards.contains_key(&(user_id, badge_id)) {
      return Ok(Insert::Duplicate);
    }
    let award = UserBadge {
      user_badge_id: Uuid::new_v4(),
      user_id,
      badge_id,
      awarded_at: Utc::now(),
    };
    inner.awards.insert((user_id, badge_id), award.clone());
    Ok(Insert::Created(award))
  }

  async fn has_award(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool, MemoryError> {
    Ok(self.lock()?.awards.contains_key(&(user_id, badge_id)))
  }

  async fn awards_for(&self, user_id: Uuid) -> Result<Vec<HeldBadge>, MemoryError> {
    let inner = self.lock()?;
    let mut held: Vec<HeldBadge> = inner
      .awards
      .values()
      .filter(|a| a.user_id == user_id)
      .filter_map(|a| {
        inner.badges.iter().find(|b| b.badge_id == a.badge_id).map(|b| {
          HeldBadge {
            code:        b.code.clone(),
            name:        b.name.clone(),
            description: b.description.clone(),
            awarded_at:  a.awarded_at,
          }
        })
      })
      .collect();
    held.sort_by(|a, b| a.awarded_at.cmp(&b.awarded_at));
    Ok(held)
  }
}
