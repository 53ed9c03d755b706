//! `GET /health`

use axum::{
  Json,
  extract::State,
  http::StatusCode,
};
use chordik_core::{Engine, store::SongStore};
use serde_json::{Value, json};

pub async fn handler<S>(State(engine): State<Engine<S>>) -> (StatusCode, Json<Value>)
where
  S: SongStore,
{
  match engine.ping().await {
    Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
    Err(e) => {
      tracing::warn!(error = %e, "health check failed");
      (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "status": "unavailable" })),
      )
    }
  }
}
