//! Badge rows and award records.
//!
//! The award *rules* live in [`crate::catalog`]; these are only the persisted
//! shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A seeded badge definition as stored. Never mutated by user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
  pub badge_id:    Uuid,
  pub code:        String,
  pub name:        String,
  pub description: String,
}

/// A single award. At most one exists per `(user_id, badge_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
  pub user_badge_id: Uuid,
  pub user_id:       Uuid,
  pub badge_id:      Uuid,
  pub awarded_at:    DateTime<Utc>,
}

/// A badge as held by a user, joined for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldBadge {
  pub code:        String,
  pub name:        String,
  pub description: String,
  pub awarded_at:  DateTime<Utc>,
}
