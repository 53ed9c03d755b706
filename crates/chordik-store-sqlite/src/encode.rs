//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 UTC strings with fixed microsecond precision, so
//! lexical order matches chronological order. UUIDs are hyphenated lowercase
//! strings. Vote values are integers.

use chrono::{DateTime, SecondsFormat, Utc};
use chordik_core::{
  badge::{Badge, HeldBadge},
  song::Song,
  user::User,
  vote::VoteValue,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── VoteValue ────────────────────────────────────────────────────────────────

pub fn decode_vote(v: i64) -> Result<VoteValue> { Ok(VoteValue::try_from(v)?) }

// ─── LIKE patterns ────────────────────────────────────────────────────────────

/// `%term%` with LIKE metacharacters escaped by `\`.
pub fn like_pattern(term: &str) -> String {
  let mut out = String::with_capacity(term.len() + 2);
  out.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Raw row types ────────────────────────────────────────────────────────────

/// Raw `users` row as read from SQLite.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub display_name:  String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub const COLUMNS: &'static str =
    "user_id, email, display_name, password_hash, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      display_name:  row.get(2)?,
      password_hash: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      display_name:  self.display_name,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw `songs` row as read from SQLite.
pub struct RawSong {
  pub song_id:    String,
  pub owner_id:   String,
  pub title:      String,
  pub artist:     String,
  pub body:       String,
  pub key:        Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawSong {
  pub const COLUMNS: &'static str =
    "song_id, owner_id, title, artist, body, key, created_at, updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      song_id:    row.get(0)?,
      owner_id:   row.get(1)?,
      title:      row.get(2)?,
      artist:     row.get(3)?,
      body:       row.get(4)?,
      key:        row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_song(self) -> Result<Song> {
    Ok(Song {
      song_id:    decode_uuid(&self.song_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      title:      self.title,
      artist:     self.artist,
      body:       self.body,
      key:        self.key,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw `badges` row as read from SQLite.
pub struct RawBadge {
  pub badge_id:    String,
  pub code:        String,
  pub name:        String,
  pub description: String,
}

impl RawBadge {
  pub fn into_badge(self) -> Result<Badge> {
    Ok(Badge {
      badge_id:    decode_uuid(&self.badge_id)?,
      code:        self.code,
      name:        self.name,
      description: self.description,
    })
  }
}

/// A `user_badges` row joined with its `badges` row.
pub struct RawHeldBadge {
  pub code:        String,
  pub name:        String,
  pub description: String,
  pub awarded_at:  String,
}

impl RawHeldBadge {
  pub fn into_held(self) -> Result<HeldBadge> {
    Ok(HeldBadge {
      code:        self.code,
      name:        self.name,
      description: self.description,
      awarded_at:  decode_dt(&self.awarded_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_have_fixed_width() {
    let a = encode_dt("2024-01-01T00:00:00Z".parse().unwrap());
    let b = encode_dt("2024-01-01T00:00:00.5Z".parse().unwrap());
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), "2024-01-01T00:00:00.5Z".parse::<DateTime<Utc>>().unwrap());
  }

  #[test]
  fn like_pattern_escapes_metacharacters() {
    assert_eq!(like_pattern("abc"), "%abc%");
    assert_eq!(like_pattern("100%_x\\"), "%100\\%\\_x\\\\%");
  }
}
