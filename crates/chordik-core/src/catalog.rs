//! The badge catalog: which badges exist and what earns each one.
//!
//! Rules are plain data evaluated against an [`Aggregates`] snapshot, so a
//! new tier is a new catalog entry rather than a new branch in the engine.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, store::SongStore};

pub const NEWCOMER: &str = "NEWCOMER";
pub const CONTRIBUTOR_I: &str = "CONTRIBUTOR_I";
pub const CONTRIBUTOR_V: &str = "CONTRIBUTOR_V";
pub const POPULAR_100: &str = "POPULAR_100";

// ─── Rules ───────────────────────────────────────────────────────────────────

/// The condition under which a badge is awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "threshold", rename_all = "snake_case")]
pub enum Rule {
  /// The user has logged in.
  Login,
  /// The user owns at least this many songs.
  PublishedAtLeast(u64),
  /// One of the user's songs has a net score of at least this magnitude, in
  /// either direction.
  PopularityAtLeast(u64),
}

impl Rule {
  pub fn is_satisfied(&self, state: &Aggregates) -> bool {
    match *self {
      Self::Login => state.logged_in,
      Self::PublishedAtLeast(n) => state.published.is_some_and(|c| c >= n),
      Self::PopularityAtLeast(n) => {
        state.song_score.is_some_and(|s| s.unsigned_abs() >= n)
      }
    }
  }
}

/// The aggregate state a rule is evaluated against. Fields left unset were
/// not recomputed by the triggering event, and rules reading them do not
/// fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregates {
  pub logged_in:  bool,
  pub published:  Option<u64>,
  pub song_score: Option<i64>,
}

impl Aggregates {
  pub fn login() -> Self { Self { logged_in: true, ..Self::default() } }

  pub fn published(count: u64) -> Self {
    Self { published: Some(count), ..Self::default() }
  }

  pub fn song_score(score: i64) -> Self {
    Self { song_score: Some(score), ..Self::default() }
  }
}

// ─── Definitions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
  pub code:        String,
  pub name:        String,
  pub description: String,
  pub rule:        Rule,
}

impl BadgeDefinition {
  pub fn new(
    code: impl Into<String>,
    name: impl Into<String>,
    description: impl Into<String>,
    rule: Rule,
  ) -> Self {
    Self {
      code: code.into(),
      name: name.into(),
      description: description.into(),
      rule,
    }
  }
}

/// An immutable set of badge definitions with unique codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeCatalog {
  definitions: Vec<BadgeDefinition>,
}

impl BadgeCatalog {
  /// Build a catalog, rejecting duplicate codes.
  pub fn new(definitions: Vec<BadgeDefinition>) -> Result<Self> {
    for (i, def) in definitions.iter().enumerate() {
      if definitions[..i].iter().any(|d| d.code == def.code) {
        return Err(Error::Validation(format!(
          "duplicate badge code in catalog: {:?}",
          def.code
        )));
      }
    }
    Ok(Self { definitions })
  }

  /// The four badges the service ships with.
  pub fn reference() -> Self {
    Self {
      definitions: vec![
        BadgeDefinition::new(
          NEWCOMER,
          "Newcomer",
          "Awarded on first login",
          Rule::Login,
        ),
        BadgeDefinition::new(
          CONTRIBUTOR_I,
          "Contributor I",
          "Awarded for 1 published song",
          Rule::PublishedAtLeast(1),
        ),
        BadgeDefinition::new(
          CONTRIBUTOR_V,
          "Contributor V",
          "Awarded for 5 published songs",
          Rule::PublishedAtLeast(5),
        ),
        BadgeDefinition::new(
          POPULAR_100,
          "Popular",
          "Awarded for a song with 100+ net votes",
          Rule::PopularityAtLeast(100),
        ),
      ],
    }
  }

  pub fn definitions(&self) -> &[BadgeDefinition] { &self.definitions }

  pub fn get(&self, code: &str) -> Option<&BadgeDefinition> {
    self.definitions.iter().find(|d| d.code == code)
  }

  pub fn predicate_for(&self, code: &str) -> Option<Rule> {
    self.get(code).map(|d| d.rule)
  }

  /// Every definition whose rule holds for `state`, in catalog order.
  pub fn satisfied_by<'a>(
    &'a self,
    state: &'a Aggregates,
  ) -> impl Iterator<Item = &'a BadgeDefinition> + 'a {
    self.definitions.iter().filter(|d| d.rule.is_satisfied(state))
  }

  /// Insert any definitions missing from `store`. Safe to call on every
  /// start; existing rows are never rewritten.
  pub async fn ensure_seeded<S: SongStore>(&self, store: &S) -> Result<usize> {
    let inserted = store
      .seed_badges(&self.definitions)
      .await
      .map_err(Error::store)?;
    tracing::info!(
      inserted,
      total = self.definitions.len(),
      "badge catalog seeded"
    );
    Ok(inserted)
  }
}

impl Default for BadgeCatalog {
  fn default() -> Self { Self::reference() }
}
