//! Core types and the vote/badge engine for Chordik.
//!
//! This crate is free of HTTP and database dependencies. Storage backends
//! implement [`store::SongStore`]; the [`engine::Engine`] sequences the vote
//! and badge ledgers around user actions.

// Native `async fn` in traits; `Send` bounds are spelled out on the trait.
#![allow(async_fn_in_trait)]

pub mod badge;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod memory;
pub mod song;
pub mod store;
pub mod user;
pub mod vote;

pub use engine::Engine;
pub use error::{Error, Result};
