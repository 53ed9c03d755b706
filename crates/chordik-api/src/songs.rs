//! Handlers for `/songs` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/songs` | Optional `?search=&offset=&limit=` |
//! | `POST`   | `/songs` | Body: `{"title","artist","body","key"?}`; evaluates contributor badges |
//! | `GET`    | `/songs/{id}` | 404 if not found |
//! | `PUT`    | `/songs/{id}` | Owner only |
//! | `DELETE` | `/songs/{id}` | Owner only; 204 |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chordik_core::{
  Engine,
  song::{Song, SongDraft, SongPage, SongQuery},
  store::SongStore,
};
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /songs`
pub async fn list<S>(
  State(engine): State<Engine<S>>,
  _user: AuthUser,
  Query(query): Query<SongQuery>,
) -> Result<Json<SongPage>, ApiError>
where
  S: SongStore,
{
  Ok(Json(engine.list_songs(&query).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /songs`
pub async fn create<S>(
  State(engine): State<Engine<S>>,
  AuthUser(user): AuthUser,
  draft: Result<Json<SongDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SongStore,
{
  let Json(draft) = draft?;
  let song = engine.publish(user.user_id, draft).await?;
  Ok((StatusCode::CREATED, Json(song)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /songs/{id}`
pub async fn get_one<S>(
  State(engine): State<Engine<S>>,
  _user: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Song>, ApiError>
where
  S: SongStore,
{
  Ok(Json(engine.song(id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /songs/{id}`
pub async fn update<S>(
  State(engine): State<Engine<S>>,
  AuthUser(user): AuthUser,
  Path(id): Path<Uuid>,
  draft: Result<Json<SongDraft>, JsonRejection>,
) -> Result<Json<Song>, ApiError>
where
  S: SongStore,
{
  let Json(draft) = draft?;
  Ok(Json(engine.update_song(user.user_id, id, draft).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /songs/{id}`
pub async fn delete<S>(
  State(engine): State<Engine<S>>,
  AuthUser(user): AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: SongStore,
{
  engine.delete_song(user.user_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
