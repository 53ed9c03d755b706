//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chordik_core::{
  Engine,
  catalog::{BadgeCatalog, BadgeDefinition, CONTRIBUTOR_I, CONTRIBUTOR_V, NEWCOMER, POPULAR_100, Rule},
  song::{SongDraft, SongQuery},
  store::{Insert, SongStore},
  user::NewUser,
  vote::VoteValue,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn engine() -> Engine<SqliteStore> {
  let engine = Engine::new(Arc::new(store().await), BadgeCatalog::reference());
  engine.ensure_seeded().await.expect("seed catalog");
  engine
}

async fn user(engine: &Engine<SqliteStore>, name: &str) -> Uuid {
  engine
    .register(NewUser {
      email:         format!("{name}@example.com"),
      display_name:  name.into(),
      password_hash: "$argon2id$stub".into(),
    })
    .await
    .unwrap()
    .user_id
}

fn draft(title: &str) -> SongDraft {
  SongDraft {
    title:  title.into(),
    artist: "Traditional".into(),
    body:   "{title: Amazing Grace}\n[G]Amazing [C]grace".into(),
    key:    None,
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_lookup_by_email() {
  let e = engine().await;
  let id = user(&e, "alice").await;

  let by_email = e.user_by_email("ALICE@example.com").await.unwrap().unwrap();
  assert_eq!(by_email.user_id, id);
  assert_eq!(by_email.display_name, "alice");
  assert_eq!(by_email.password_hash, "$argon2id$stub");

  assert!(e.user_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_or_display_name_is_a_duplicate() {
  let e = engine().await;
  user(&e, "alice").await;

  let same_email = e
    .register(NewUser {
      email:         "alice@example.com".into(),
      display_name:  "alice2".into(),
      password_hash: "h".into(),
    })
    .await;
  assert!(matches!(same_email, Err(chordik_core::Error::UserExists)));

  let same_name = e
    .register(NewUser {
      email:         "other@example.com".into(),
      display_name:  "alice".into(),
      password_hash: "h".into(),
    })
    .await;
  assert!(matches!(same_name, Err(chordik_core::Error::UserExists)));
}

// ─── Badge catalog ───────────────────────────────────────────────────────────

#[tokio::test]
async fn seeding_twice_inserts_once() {
  let s = store().await;
  let catalog = BadgeCatalog::reference();

  assert_eq!(catalog.ensure_seeded(&s).await.unwrap(), 4);
  assert_eq!(catalog.ensure_seeded(&s).await.unwrap(), 0);

  let badge = s.badge_by_code(POPULAR_100).await.unwrap().unwrap();
  assert_eq!(badge.name, "Popular");
}

#[tokio::test]
async fn seeding_never_rewrites_existing_rows() {
  let s = store().await;
  BadgeCatalog::reference().ensure_seeded(&s).await.unwrap();
  let before = s.badge_by_code(NEWCOMER).await.unwrap().unwrap();

  let changed = BadgeCatalog::new(vec![BadgeDefinition::new(
    NEWCOMER,
    "Renamed",
    "Changed description",
    Rule::Login,
  )])
  .unwrap();
  assert_eq!(changed.ensure_seeded(&s).await.unwrap(), 0);

  let after = s.badge_by_code(NEWCOMER).await.unwrap().unwrap();
  assert_eq!(before, after);
}

#[tokio::test]
async fn duplicate_award_insert_is_swallowed() {
  let e = engine().await;
  let alice = user(&e, "alice").await;
  let badge = e.store().badge_by_code(NEWCOMER).await.unwrap().unwrap();

  let first = e.store().insert_award(alice, badge.badge_id).await.unwrap();
  assert!(first.is_created());
  let second = e.store().insert_award(alice, badge.badge_id).await.unwrap();
  assert_eq!(second, Insert::Duplicate);

  assert_eq!(e.store().award_rows(alice, NEWCOMER).await.unwrap(), 1);
}

#[tokio::test]
async fn award_for_unknown_user_is_an_error_not_a_duplicate() {
  let e = engine().await;
  let badge = e.store().badge_by_code(NEWCOMER).await.unwrap().unwrap();
  let result = e.store().insert_award(Uuid::new_v4(), badge.badge_id).await;
  assert!(result.is_err());
}

#[tokio::test]
async fn awards_are_listed_oldest_first() {
  let e = engine().await;
  let alice = user(&e, "alice").await;

  e.login(alice).await.unwrap();
  e.publish(alice, draft("first")).await.unwrap();

  let held = e.badges_of(alice).await.unwrap();
  let codes: Vec<_> = held.iter().map(|b| b.code.as_str()).collect();
  assert_eq!(codes, vec![NEWCOMER, CONTRIBUTOR_I]);
}

// ─── Songs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn publish_get_update_delete() {
  let e = engine().await;
  let alice = user(&e, "alice").await;

  let mut d = draft("Amazing Grace");
  d.key = Some("G".into());
  let song = e.publish(alice, d).await.unwrap();

  let fetched = e.song(song.song_id).await.unwrap();
  assert_eq!(fetched.title, "Amazing Grace");
  assert_eq!(fetched.key.as_deref(), Some("G"));
  assert_eq!(fetched.owner_id, alice);

  e.update_song(alice, song.song_id, draft("Amazing Grace (live)")).await.unwrap();
  let fetched = e.song(song.song_id).await.unwrap();
  assert_eq!(fetched.title, "Amazing Grace (live)");
  assert_eq!(fetched.key, None);

  e.delete_song(alice, song.song_id).await.unwrap();
  assert!(e.store().get_song(song.song_id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_song_deletes_its_votes() {
  let e = engine().await;
  let alice = user(&e, "alice").await;
  let bob = user(&e, "bob").await;
  let s = e.publish(alice, draft("S")).await.unwrap().song_id;

  e.vote(bob, s, VoteValue::Like).await.unwrap();
  e.delete_song(alice, s).await.unwrap();

  assert_eq!(e.store().vote_rows(bob, s).await.unwrap(), 0);
  assert_eq!(e.score_of(s).await.unwrap(), 0);
}

#[tokio::test]
async fn list_is_newest_first_and_searchable() {
  let e = engine().await;
  let alice = user(&e, "alice").await;
  for title in ["Blackbird", "Yesterday", "Black Hole Sun"] {
    e.publish(alice, draft(title)).await.unwrap();
  }

  let page = e.list_songs(&SongQuery::default()).await.unwrap();
  assert_eq!(page.total, 3);
  let titles: Vec<_> = page.songs.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, vec!["Black Hole Sun", "Yesterday", "Blackbird"]);

  let q = SongQuery { search: Some("BLACK".into()), ..Default::default() };
  let page = e.list_songs(&q).await.unwrap();
  assert_eq!(page.total, 2);

  let q = SongQuery { search: Some("traditional".into()), ..Default::default() };
  assert_eq!(e.list_songs(&q).await.unwrap().total, 3);

  let q = SongQuery { offset: 2, limit: Some(5), ..Default::default() };
  let page = e.list_songs(&q).await.unwrap();
  assert_eq!(page.total, 3);
  assert_eq!(page.songs.len(), 1);
  assert_eq!(page.songs[0].title, "Blackbird");
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let e = engine().await;
  let alice = user(&e, "alice").await;
  e.publish(alice, draft("100% Pure Love")).await.unwrap();
  e.publish(alice, draft("1000 Miles")).await.unwrap();

  let q = SongQuery { search: Some("100%".into()), ..Default::default() };
  let page = e.list_songs(&q).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.songs[0].title, "100% Pure Love");
}

#[tokio::test]
async fn search_folds_case_beyond_ascii() {
  let e = engine().await;
  let alice = user(&e, "alice").await;
  e.publish(alice, draft("Звезда по имени Солнце")).await.unwrap();
  e.publish(alice, draft("Été indien")).await.unwrap();

  for (term, title) in [
    ("звезда", "Звезда по имени Солнце"),
    ("ЗВЕЗДА", "Звезда по имени Солнце"),
    ("СОЛНЦЕ", "Звезда по имени Солнце"),
    ("été", "Été indien"),
    ("ÉTÉ", "Été indien"),
  ] {
    let q = SongQuery { search: Some(term.into()), ..Default::default() };
    let page = e.list_songs(&q).await.unwrap();
    assert_eq!(page.total, 1, "search {term:?}");
    assert_eq!(page.songs[0].title, title);
  }
}

#[tokio::test]
async fn offset_past_the_end_is_an_empty_page() {
  let e = engine().await;
  let alice = user(&e, "alice").await;
  e.publish(alice, draft("Only")).await.unwrap();

  for offset in [1, usize::MAX] {
    let q = SongQuery { offset, ..Default::default() };
    let page = e.list_songs(&q).await.unwrap();
    assert_eq!(page.total, 1);
    assert!(page.songs.is_empty(), "offset {offset}");
  }
}

// ─── Vote ledger ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cast_vote_on_missing_song_writes_nothing() {
  let s = store().await;
  let result = s
    .cast_vote(Uuid::new_v4(), Uuid::new_v4(), VoteValue::Like)
    .await
    .unwrap();
  assert_eq!(result, None);
}

#[tokio::test]
async fn voting_scenario() {
  let e = engine().await;
  let a = user(&e, "alice").await;
  let b = user(&e, "bob").await;
  let c = user(&e, "carol").await;
  let s = e.publish(a, draft("S")).await.unwrap().song_id;

  assert_eq!(e.score_of(s).await.unwrap(), 0);
  assert_eq!(e.vote(b, s, VoteValue::Like).await.unwrap(), 1);
  assert_eq!(e.vote(c, s, VoteValue::Like).await.unwrap(), 2);
  assert_eq!(e.vote(b, s, VoteValue::Dislike).await.unwrap(), 0);
  assert_eq!(e.store().vote_rows(b, s).await.unwrap(), 1);
  assert_eq!(e.vote_of(b, s).await.unwrap(), VoteValue::Dislike);

  assert_eq!(e.vote(c, s, VoteValue::Remove).await.unwrap(), -1);
  assert_eq!(e.store().vote_rows(c, s).await.unwrap(), 0);
  assert_eq!(e.vote_of(c, s).await.unwrap(), VoteValue::Remove);
}

#[tokio::test]
async fn unknown_user_is_not_found_rather_than_a_store_error() {
  let e = engine().await;
  let a = user(&e, "alice").await;
  let s = e.publish(a, draft("S")).await.unwrap().song_id;
  let ghost = Uuid::new_v4();

  let err = e.vote(ghost, s, VoteValue::Like).await.unwrap_err();
  assert!(matches!(err, chordik_core::Error::UserNotFound(id) if id == ghost));
  let err = e.publish(ghost, draft("T")).await.unwrap_err();
  assert!(matches!(err, chordik_core::Error::UserNotFound(id) if id == ghost));
}

#[tokio::test]
async fn repeating_the_same_vote_is_stable() {
  let e = engine().await;
  let a = user(&e, "alice").await;
  let b = user(&e, "bob").await;
  let s = e.publish(a, draft("S")).await.unwrap().song_id;

  for _ in 0..3 {
    assert_eq!(e.vote(b, s, VoteValue::Like).await.unwrap(), 1);
  }
  assert_eq!(e.store().vote_rows(b, s).await.unwrap(), 1);

  assert_eq!(e.vote(b, s, VoteValue::Remove).await.unwrap(), 0);
  assert_eq!(e.vote(b, s, VoteValue::Remove).await.unwrap(), 0);
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fifth_song_holds_both_contributor_badges() {
  let e = engine().await;
  let a = user(&e, "alice").await;
  for i in 0..5 {
    e.publish(a, draft(&format!("song {i}"))).await.unwrap();
  }
  assert!(e.has_award(a, CONTRIBUTOR_I).await.unwrap());
  assert!(e.has_award(a, CONTRIBUTOR_V).await.unwrap());
  assert_eq!(e.store().award_rows(a, CONTRIBUTOR_I).await.unwrap(), 1);
}

#[tokio::test]
async fn hundred_concurrent_likes_award_the_creator_once() {
  let e = engine().await;
  let a = user(&e, "alice").await;
  let s = e.publish(a, draft("S")).await.unwrap().song_id;

  let mut voters = Vec::new();
  for i in 0..100 {
    voters.push(user(&e, &format!("voter{i:03}")).await);
  }

  let mut tasks = Vec::new();
  for v in voters {
    let e = e.clone();
    tasks.push(tokio::spawn(async move { e.vote(v, s, VoteValue::Like).await }));
  }
  for t in tasks {
    t.await.unwrap().unwrap();
  }

  assert_eq!(e.score_of(s).await.unwrap(), 100);
  assert!(e.has_award(a, POPULAR_100).await.unwrap());
  assert_eq!(e.store().award_rows(a, POPULAR_100).await.unwrap(), 1);
}

#[tokio::test]
async fn ninety_nine_likes_do_not_award() {
  let e = engine().await;
  let a = user(&e, "alice").await;
  let s = e.publish(a, draft("S")).await.unwrap().song_id;

  for i in 0..99 {
    let v = user(&e, &format!("voter{i:03}")).await;
    e.vote(v, s, VoteValue::Like).await.unwrap();
  }

  assert_eq!(e.score_of(s).await.unwrap(), 99);
  assert!(!e.has_award(a, POPULAR_100).await.unwrap());
}
