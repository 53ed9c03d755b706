//! Handlers for `/songs/{id}/vote`.
//!
//! The vote body carries a bare integer; out-of-range values are reported as
//! an invalid vote.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use chordik_core::{
  Engine,
  store::SongStore,
  vote::{VoteTally, VoteValue},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub value: i64,
}

/// `GET /songs/{id}/vote`
pub async fn get_one<S>(
  State(engine): State<Engine<S>>,
  AuthUser(user): AuthUser,
  Path(song_id): Path<Uuid>,
) -> Result<Json<VoteTally>, ApiError>
where
  S: SongStore,
{
  Ok(Json(engine.get_vote(user.user_id, song_id).await?))
}

/// `POST /songs/{id}/vote` with `{"value": 1 | -1 | 0}`
pub async fn cast<S>(
  State(engine): State<Engine<S>>,
  AuthUser(user): AuthUser,
  Path(song_id): Path<Uuid>,
  body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<VoteTally>, ApiError>
where
  S: SongStore,
{
  let Json(body) = body?;
  let value = VoteValue::try_from(body.value)?;
  let score = engine.vote(user.user_id, song_id, value).await?;
  Ok(Json(VoteTally { score, user_vote: value }))
}
