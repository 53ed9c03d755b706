//! [`SqliteStore`]: the SQLite implementation of [`SongStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{
  OptionalExtension as _,
  TransactionBehavior,
  functions::FunctionFlags,
};
use uuid::Uuid;

use chordik_core::{
  badge::{Badge, HeldBadge, UserBadge},
  catalog::BadgeDefinition,
  song::{Song, SongPage, SongQuery},
  store::{Insert, SongStore},
  user::User,
  vote::VoteValue,
};

use crate::{
  Result,
  encode::{
    RawBadge, RawHeldBadge, RawSong, RawUser, decode_vote, encode_dt,
    encode_uuid, like_pattern,
  },
  schema::SCHEMA,
};

/// Name of the SQL function that lowercases with full Unicode case folding.
/// SQLite's built-in `lower()` and `LIKE` only fold ASCII.
const UNICODE_LOWER: &str = "unicode_lower";

/// Register [`UNICODE_LOWER`] on `conn`.
fn register_functions(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.create_scalar_function(
    UNICODE_LOWER,
    1,
    FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
    |ctx| {
      let text: Option<String> = ctx.get(0)?;
      Ok(text.map(|t| t.to_lowercase()))
    },
  )
}

/// COUNT results are never negative.
fn count(n: i64) -> u64 { u64::try_from(n).unwrap_or_default() }

/// True for UNIQUE and PRIMARY KEY violations. Foreign-key and CHECK
/// failures are genuine errors and stay that way.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
        && (f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
          || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Chordik store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised onto one connection thread, and each ledger mutation runs
/// inside a single transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        register_functions(conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of stored vote rows for `(user_id, song_id)`; 0 or 1.
  pub async fn vote_rows(&self, user_id: Uuid, song_id: Uuid) -> Result<u64> {
    let user_str = encode_uuid(user_id);
    let song_str = encode_uuid(song_id);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM votes WHERE song_id = ?1 AND user_id = ?2",
          rusqlite::params![song_str, user_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count(n))
  }

  /// Number of award rows for `(user_id, code)`; 0 or 1.
  pub async fn award_rows(&self, user_id: Uuid, code: &str) -> Result<u64> {
    let user_str = encode_uuid(user_id);
    let code = code.to_owned();

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM user_badges ub
           JOIN badges b ON b.badge_id = ub.badge_id
           WHERE ub.user_id = ?1 AND b.code = ?2",
          rusqlite::params![user_str, code],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(count(n))
  }
}

// ─── SongStore impl ──────────────────────────────────────────────────────────

impl SongStore for SqliteStore {
  type Error = crate::Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, user: User) -> Result<Insert<User>> {
    let id_str     = encode_uuid(user.user_id);
    let email      = user.email.clone();
    let name       = user.display_name.clone();
    let hash       = user.password_hash.clone();
    let created_at = encode_dt(user.created_at);

    let created: bool = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO users (user_id, email, display_name, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, name, hash, created_at],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if created { Insert::Created(user) } else { Insert::Duplicate })
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM users WHERE user_id = ?1", RawUser::COLUMNS),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", RawUser::COLUMNS),
            rusqlite::params![email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Songs ─────────────────────────────────────────────────────────────────

  async fn insert_song(&self, song: Song) -> Result<()> {
    let id_str     = encode_uuid(song.song_id);
    let owner_str  = encode_uuid(song.owner_id);
    let created_at = encode_dt(song.created_at);
    let updated_at = encode_dt(song.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO songs (
             song_id, owner_id, title, artist, body, key, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            owner_str,
            song.title,
            song.artist,
            song.body,
            song.key,
            created_at,
            updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_song(&self, id: Uuid) -> Result<Option<Song>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSong> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM songs WHERE song_id = ?1", RawSong::COLUMNS),
            rusqlite::params![id_str],
            RawSong::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSong::into_song).transpose()
  }

  async fn update_song(&self, song: Song) -> Result<bool> {
    let id_str     = encode_uuid(song.song_id);
    let updated_at = encode_dt(song.updated_at);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE songs
           SET title = ?2, artist = ?3, body = ?4, key = ?5, updated_at = ?6
           WHERE song_id = ?1",
          rusqlite::params![
            id_str,
            song.title,
            song.artist,
            song.body,
            song.key,
            updated_at,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_song(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM votes WHERE song_id = ?1", rusqlite::params![id_str])?;
        let n = tx.execute("DELETE FROM songs WHERE song_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    Ok(deleted > 0)
  }

  async fn list_songs(&self, query: &SongQuery) -> Result<SongPage> {
    let pattern = query
      .search_term()
      .map(|term| like_pattern(&term.to_lowercase()));
    let limit_val  = i64::try_from(query.effective_limit()).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(query.offset).unwrap_or(i64::MAX);

    let (total, raws): (i64, Vec<RawSong>) = self
      .conn
      .call(move |conn| {
        let where_clause = if pattern.is_some() {
          format!(
            "WHERE {UNICODE_LOWER}(title) LIKE ?1 ESCAPE '\\'
                OR {UNICODE_LOWER}(artist) LIKE ?1 ESCAPE '\\'"
          )
        } else {
          "WHERE ?1 IS NULL".to_string()
        };

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM songs {where_clause}"),
          rusqlite::params![pattern.as_deref()],
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT {} FROM songs {where_clause}
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?2 OFFSET ?3",
          RawSong::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![pattern.as_deref(), limit_val, offset_val],
            RawSong::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let songs = raws
      .into_iter()
      .map(RawSong::into_song)
      .collect::<Result<_>>()?;

    Ok(SongPage { songs, total: count(total) })
  }

  async fn count_songs_by(&self, owner_id: Uuid) -> Result<u64> {
    let owner_str = encode_uuid(owner_id);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM songs WHERE owner_id = ?1",
          rusqlite::params![owner_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count(n))
  }

  // ── Vote ledger ───────────────────────────────────────────────────────────

  async fn cast_vote(
    &self,
    user_id: Uuid,
    song_id: Uuid,
    value:   VoteValue,
  ) -> Result<Option<i64>> {
    let user_str = encode_uuid(user_id);
    let song_str = encode_uuid(song_id);
    let vote_id  = encode_uuid(Uuid::new_v4());
    let now      = encode_dt(Utc::now());
    let value    = value.as_i64();

    let score: Option<i64> = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front, so the read of the existing
        // vote and the write that follows see the same state.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let song_exists = tx
          .query_row(
            "SELECT 1 FROM songs WHERE song_id = ?1",
            rusqlite::params![song_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !song_exists {
          return Ok(None);
        }

        let existing: Option<i64> = tx
          .query_row(
            "SELECT value FROM votes WHERE song_id = ?1 AND user_id = ?2",
            rusqlite::params![song_str, user_str],
            |r| r.get(0),
          )
          .optional()?;

        match (existing, value) {
          (None, 0) => {}
          (None, v) => {
            // Another connection may have inserted since the read; the
            // conflict clause turns that into an in-place update.
            tx.execute(
              "INSERT INTO votes (vote_id, song_id, user_id, value, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT (song_id, user_id) DO UPDATE SET value = excluded.value",
              rusqlite::params![vote_id, song_str, user_str, v, now],
            )?;
          }
          (Some(_), 0) => {
            tx.execute(
              "DELETE FROM votes WHERE song_id = ?1 AND user_id = ?2",
              rusqlite::params![song_str, user_str],
            )?;
          }
          (Some(old), v) if old != v => {
            tx.execute(
              "UPDATE votes SET value = ?3 WHERE song_id = ?1 AND user_id = ?2",
              rusqlite::params![song_str, user_str, v],
            )?;
          }
          (Some(_), _) => {}
        }

        let score: i64 = tx.query_row(
          "SELECT COALESCE(SUM(value), 0) FROM votes WHERE song_id = ?1",
          rusqlite::params![song_str],
          |r| r.get(0),
        )?;

        tx.commit()?;
        Ok(Some(score))
      })
      .await?;

    Ok(score)
  }

  async fn vote_of(&self, user_id: Uuid, song_id: Uuid) -> Result<VoteValue> {
    let user_str = encode_uuid(user_id);
    let song_str = encode_uuid(song_id);

    let raw: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT value FROM votes WHERE song_id = ?1 AND user_id = ?2",
            rusqlite::params![song_str, user_str],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    raw.map(decode_vote).transpose().map(Option::unwrap_or_default)
  }

  async fn score_of(&self, song_id: Uuid) -> Result<i64> {
    let song_str = encode_uuid(song_id);

    let score: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(SUM(value), 0) FROM votes WHERE song_id = ?1",
          rusqlite::params![song_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(score)
  }

  // ── Badge ledger ──────────────────────────────────────────────────────────

  async fn seed_badges(&self, definitions: &[BadgeDefinition]) -> Result<usize> {
    let rows: Vec<(String, String, String, String)> = definitions
      .iter()
      .map(|d| {
        (
          encode_uuid(Uuid::new_v4()),
          d.code.clone(),
          d.name.clone(),
          d.description.clone(),
        )
      })
      .collect();

    let inserted: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO badges (badge_id, code, name, description)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (code) DO NOTHING",
          )?;
          for (id, code, name, description) in &rows {
            inserted += stmt.execute(rusqlite::params![id, code, name, description])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  async fn badge_by_code(&self, code: &str) -> Result<Option<Badge>> {
    let code = code.to_owned();

    let raw: Option<RawBadge> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT badge_id, code, name, description FROM badges WHERE code = ?1",
            rusqlite::params![code],
            |row| {
              Ok(RawBadge {
                badge_id:    row.get(0)?,
                code:        row.get(1)?,
                name:        row.get(2)?,
                description: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBadge::into_badge).transpose()
  }

  async fn insert_award(&self, user_id: Uuid, badge_id: Uuid) -> Result<Insert<UserBadge>> {
    let award = UserBadge {
      user_badge_id: Uuid::new_v4(),
      user_id,
      badge_id,
      awarded_at: Utc::now(),
    };

    let id_str    = encode_uuid(award.user_badge_id);
    let user_str  = encode_uuid(user_id);
    let badge_str = encode_uuid(badge_id);
    let at_str    = encode_dt(award.awarded_at);

    let created: bool = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO user_badges (user_badge_id, user_id, badge_id, awarded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, user_str, badge_str, at_str],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(if created { Insert::Created(award) } else { Insert::Duplicate })
  }

  async fn has_award(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool> {
    let user_str  = encode_uuid(user_id);
    let badge_str = encode_uuid(badge_id);

    let held: bool = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM user_badges WHERE user_id = ?1 AND badge_id = ?2",
            rusqlite::params![user_str, badge_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;

    Ok(held)
  }

  async fn awards_for(&self, user_id: Uuid) -> Result<Vec<HeldBadge>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawHeldBadge> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.code, b.name, b.description, ub.awarded_at
           FROM user_badges ub
           JOIN badges b ON b.badge_id = ub.badge_id
           WHERE ub.user_id = ?1
           ORDER BY ub.awarded_at ASC, ub.rowid ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], |row| {
            Ok(RawHeldBadge {
              code:        row.get(0)?,
              name:        row.get(1)?,
              description: row.get(2)?,
              awarded_at:  row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHeldBadge::into_held).collect()
  }
}
