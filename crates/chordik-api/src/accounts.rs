//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | Body: `{"email","display_name","password"}` |
//! | `POST` | `/auth/login` | Body: `{"email","password"}`; evaluates login badges |
//! | `GET`  | `/auth/me` | Basic auth |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use chordik_core::{Engine, store::SongStore, user::{NewUser, User}};
use serde::Deserialize;
use serde_json::json;

use crate::{
  auth::{AuthUser, hash_password, verify_credentials},
  error::ApiError,
};

pub const MIN_PASSWORD_LEN: usize = 8;

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:        String,
  pub display_name: String,
  pub password:     String,
}

/// `POST /auth/register`
pub async fn register<S>(
  State(engine): State<Engine<S>>,
  body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SongStore,
{
  let Json(body) = body?;
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let user = engine
    .register(NewUser {
      email:         body.email,
      display_name:  body.display_name,
      password_hash: hash_password(&body.password)?,
    })
    .await?;

  Ok((StatusCode::CREATED, Json(json!({ "id": user.user_id }))))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(engine): State<Engine<S>>,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<User>, ApiError>
where
  S: SongStore,
{
  let Json(body) = body?;
  let user = verify_credentials(&engine, &body.email, &body.password).await?;
  engine.login(user.user_id).await?;
  Ok(Json(user))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

/// `GET /auth/me`
pub async fn me(AuthUser(user): AuthUser) -> Json<User> { Json(user) }
