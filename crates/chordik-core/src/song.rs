//! Songs: chord charts published and owned by a single user.
//!
//! A song carries no score of its own. Its popularity is always derived from
//! the vote ledger on read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Bodies must be strictly shorter than this many bytes.
pub const MAX_BODY_LEN: usize = 65_536;

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
  pub song_id:    Uuid,
  pub owner_id:   Uuid,
  pub title:      String,
  pub artist:     String,
  /// Chord chart in ChordPro notation.
  pub body:       String,
  /// Musical key, e.g. "G" or "Em".
  pub key:        Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// The caller-editable part of a song, used for both publish and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongDraft {
  pub title:  String,
  pub artist: String,
  pub body:   String,
  #[serde(default)]
  pub key:    Option<String>,
}

impl SongDraft {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("title must not be empty".into()));
    }
    if self.artist.trim().is_empty() {
      return Err(Error::Validation("artist must not be empty".into()));
    }
    if self.body.is_empty() {
      return Err(Error::Validation("song body must not be empty".into()));
    }
    if self.body.len() >= MAX_BODY_LEN {
      return Err(Error::Validation(format!(
        "song body must be shorter than {MAX_BODY_LEN} bytes"
      )));
    }
    Ok(())
  }

  /// A blank key is the same as no key.
  pub fn normalized_key(&self) -> Option<String> {
    self
      .key
      .as_deref()
      .map(str::trim)
      .filter(|k| !k.is_empty())
      .map(str::to_owned)
  }
}

/// Parameters for [`crate::store::SongStore::list_songs`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongQuery {
  /// Case-insensitive substring match over title and artist.
  pub search: Option<String>,
  #[serde(default)]
  pub offset: usize,
  pub limit:  Option<usize>,
}

impl SongQuery {
  pub fn effective_limit(&self) -> usize {
    self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
  }

  /// The search term, if any, with blank input treated as absent.
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }
}

/// One page of songs, newest first, plus the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongPage {
  pub songs: Vec<Song>,
  pub total: u64,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft(body: &str) -> SongDraft {
    SongDraft {
      title:  "Wonderwall".into(),
      artist: "Oasis".into(),
      body:   body.into(),
      key:    None,
    }
  }

  #[test]
  fn accepts_ordinary_body() {
    assert!(draft("[Em7]Today is [G]gonna be the day").validate().is_ok());
  }

  #[test]
  fn rejects_empty_body() {
    assert!(matches!(draft("").validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn body_length_bound_is_exclusive() {
    let just_under = "a".repeat(MAX_BODY_LEN - 1);
    assert!(draft(&just_under).validate().is_ok());

    let at_limit = "a".repeat(MAX_BODY_LEN);
    assert!(matches!(draft(&at_limit).validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn rejects_blank_title_and_artist() {
    let mut d = draft("x");
    d.title = "   ".into();
    assert!(d.validate().is_err());

    let mut d = draft("x");
    d.artist = String::new();
    assert!(d.validate().is_err());
  }

  #[test]
  fn blank_key_normalizes_to_none() {
    let mut d = draft("x");
    d.key = Some("  ".into());
    assert_eq!(d.normalized_key(), None);
    d.key = Some(" Em ".into());
    assert_eq!(d.normalized_key().as_deref(), Some("Em"));
  }

  #[test]
  fn page_limit_is_clamped() {
    let q = SongQuery::default();
    assert_eq!(q.effective_limit(), DEFAULT_PAGE_LIMIT);

    let q = SongQuery { limit: Some(10_000), ..Default::default() };
    assert_eq!(q.effective_limit(), MAX_PAGE_LIMIT);

    let q = SongQuery { limit: Some(0), ..Default::default() };
    assert_eq!(q.effective_limit(), 1);
  }
}
