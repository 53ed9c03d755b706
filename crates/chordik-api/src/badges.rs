//! Handlers for badge display.

use axum::{
  Json,
  extract::{Path, State},
};
use chordik_core::{
  Engine,
  badge::HeldBadge,
  catalog::BadgeDefinition,
  store::SongStore,
};
use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError};

/// `GET /badges`: every badge that can be earned, with its rule.
pub async fn catalog<S>(
  State(engine): State<Engine<S>>,
) -> Json<Vec<BadgeDefinition>>
where
  S: SongStore,
{
  Json(engine.catalog().definitions().to_vec())
}

/// `GET /users/{id}/badges`: badges held by a user, oldest award first.
pub async fn held<S>(
  State(engine): State<Engine<S>>,
  _caller: AuthUser,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<HeldBadge>>, ApiError>
where
  S: SongStore,
{
  engine.user(user_id).await?;
  Ok(Json(engine.badges_of(user_id).await?))
}
