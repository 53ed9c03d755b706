//! JSON REST API for Chordik.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`SongStore`]. Every route except `/health`, `/auth/register`,
//! `/auth/login` and `/badges` requires HTTP Basic credentials
//! (`email:password`).
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = chordik_api::api_router(engine);
//! axum::serve(listener, app).await?;
//! ```

pub mod accounts;
pub mod auth;
pub mod badges;
pub mod error;
pub mod health;
pub mod songs;
pub mod votes;

use axum::{
  Router,
  routing::get,
  routing::post,
};
use chordik_core::{Engine, store::SongStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build the API router for `engine`.
pub fn api_router<S>(engine: Engine<S>) -> Router<()>
where
  S: SongStore + 'static,
{
  Router::new()
    .route("/health", get(health::handler::<S>))
    // Accounts
    .route("/auth/register", post(accounts::register::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .route("/auth/me", get(accounts::me))
    // Badges
    .route("/badges", get(badges::catalog::<S>))
    .route("/users/{id}/badges", get(badges::held::<S>))
    // Songs
    .route("/songs", get(songs::list::<S>).post(songs::create::<S>))
    .route(
      "/songs/{id}",
      get(songs::get_one::<S>)
        .put(songs::update::<S>)
        .delete(songs::delete::<S>),
    )
    // Votes
    .route("/songs/{id}/vote", get(votes::get_one::<S>).post(votes::cast::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(engine)
}
