// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use rstest::{fixture, rstest};

use super::{MemoryStore, WriteDurability};
use crate::model::{ExerciseId, SessionStatus, WorkoutId};
use crate::store::{read_snapshot, NewSet, SessionPatch, SetUpdate, Store, StoreError};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("liftsync-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).expect("date")
}

fn new_set(weight: f64, reps: u32) -> NewSet {
    NewSet { weight, reps, rpe: None, notes: None }
}

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

#[rstest]
#[tokio::test]
async fn add_sets_numbers_after_existing(store: MemoryStore) {
    let session = store.create_session(day(1), None).await.expect("session");
    let bench = store.get_or_create_exercise("Bench Press").await.expect("exercise");

    let first = store
        .add_sets(session.backend_id(), bench.backend_id(), &new_set(80.0, 8), 2)
        .await
        .expect("first");
    let second = store
        .add_sets(session.backend_id(), bench.backend_id(), &new_set(82.5, 6), 1)
        .await
        .expect("second");

    let indexes: Vec<_> = first.iter().chain(&second).map(|set| set.set_index()).collect();
    assert_eq!(indexes, vec![1, 2, 3]);
}

#[rstest]
#[tokio::test]
async fn exercise_lookup_is_case_insensitive(store: MemoryStore) {
    let a = store.get_or_create_exercise("Squat").await.expect("a");
    let b = store.get_or_create_exercise("  squat ").await.expect("b");
    assert_eq!(a, b);
    assert!(matches!(
        store.get_or_create_exercise("   ").await,
        Err(StoreError::InvalidInput { .. })
    ));
}

#[rstest]
#[tokio::test]
async fn delete_set_renumbers_contiguously(store: MemoryStore) {
    let session = store.create_session(day(1), None).await.expect("session");
    let bench = store.get_or_create_exercise("Bench").await.expect("exercise");
    let sets = store
        .add_sets(session.backend_id(), bench.backend_id(), &new_set(80.0, 8), 3)
        .await
        .expect("sets");

    store.delete_set(sets[0].backend_id()).await.expect("delete");

    let remaining = store.session_sets(session.backend_id()).await.expect("remaining");
    let labels: Vec<_> =
        remaining.iter().map(|set| (set.backend_id(), set.set_index())).collect();
    assert_eq!(labels, vec![(sets[1].backend_id(), 1), (sets[2].backend_id(), 2)]);
}

#[rstest]
#[tokio::test]
async fn foreign_keys_are_enforced(store: MemoryStore) {
    let session = store.create_session(day(1), None).await.expect("session");

    let err = store
        .add_sets(session.backend_id(), ExerciseId::new(42), &new_set(1.0, 1), 1)
        .await
        .expect_err("missing exercise");
    assert!(matches!(err, StoreError::ForeignKey { id: 42, .. }));

    let bench = store.get_or_create_exercise("Bench").await.expect("exercise");
    let err = store
        .add_sets(WorkoutId::new(99), bench.backend_id(), &new_set(1.0, 1), 1)
        .await
        .expect_err("missing session");
    assert!(matches!(err, StoreError::ForeignKey { id: 99, .. }));
}

#[rstest]
#[tokio::test]
async fn deleting_session_cascades_to_sets(store: MemoryStore) {
    let session = store.create_session(day(1), None).await.expect("session");
    let bench = store.get_or_create_exercise("Bench").await.expect("exercise");
    let sets = store
        .add_sets(session.backend_id(), bench.backend_id(), &new_set(80.0, 8), 2)
        .await
        .expect("sets");

    store.delete_session(session.backend_id()).await.expect("delete");

    assert!(store.session(session.backend_id()).await.expect_err("gone").is_not_found());
    assert!(store.delete_set(sets[0].backend_id()).await.expect_err("cascaded").is_not_found());
}

#[rstest]
#[tokio::test]
async fn moving_set_renumbers_both_exercises(store: MemoryStore) {
    let session = store.create_session(day(1), None).await.expect("session");
    let bench = store.get_or_create_exercise("Bench").await.expect("bench");
    let incline = store.get_or_create_exercise("Incline Bench").await.expect("incline");
    let sets = store
        .add_sets(session.backend_id(), bench.backend_id(), &new_set(80.0, 8), 2)
        .await
        .expect("sets");

    let moved = store
        .update_set(
            sets[0].backend_id(),
            &SetUpdate { exercise: Some(incline.backend_id()), reps: Some(10), ..SetUpdate::default() },
        )
        .await
        .expect("move");

    assert_eq!(moved.exercise_backend_id(), incline.backend_id());
    assert_eq!(moved.set_index(), 1);
    assert_eq!(moved.reps(), 10);
    assert_eq!(moved.weight(), 80.0);
    let rest = store.session_sets(session.backend_id()).await.expect("sets");
    let other = rest.iter().find(|set| set.backend_id() == sets[1].backend_id()).expect("other");
    assert_eq!(other.set_index(), 1);
}

#[rstest]
#[tokio::test]
async fn in_progress_lookup_skips_completed(store: MemoryStore) {
    let older = store.create_session(day(1), None).await.expect("older");
    let newer = store.create_session(day(2), None).await.expect("newer");
    store.complete_session(newer.backend_id()).await.expect("complete");

    let found = store.in_progress_session().await.expect("lookup").expect("some");
    assert_eq!(found.backend_id(), older.backend_id());

    store.complete_session(older.backend_id()).await.expect("complete");
    assert!(store.in_progress_session().await.expect("lookup").is_none());
    assert_eq!(
        store.session(older.backend_id()).await.expect("older").status(),
        SessionStatus::Completed
    );
}

#[rstest]
#[tokio::test]
async fn history_is_most_recent_first(store: MemoryStore) {
    let bench = store.get_or_create_exercise("Bench").await.expect("exercise");
    let monday = store.create_session(day(2), None).await.expect("monday");
    let friday = store.create_session(day(6), None).await.expect("friday");
    store
        .add_sets(monday.backend_id(), bench.backend_id(), &new_set(80.0, 8), 1)
        .await
        .expect("monday sets");
    store
        .add_sets(friday.backend_id(), bench.backend_id(), &new_set(82.5, 8), 2)
        .await
        .expect("friday sets");

    let history = store.exercise_history(bench.backend_id(), Some(2)).await.expect("history");

    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|entry| entry.date == day(6)));
    assert!(history[0].set.backend_id() > history[1].set.backend_id());
}

#[rstest]
#[tokio::test]
async fn intention_patch_trims_and_clears(store: MemoryStore) {
    let session = store.create_session(day(1), None).await.expect("session");
    let id = session.backend_id();

    let updated = store
        .update_session(id, &SessionPatch { intention: Some("  heavy day ".into()), ..SessionPatch::default() })
        .await
        .expect("set");
    assert_eq!(updated.intention(), Some("heavy day"));

    let cleared = store
        .update_session(id, &SessionPatch { intention: Some(String::new()), ..SessionPatch::default() })
        .await
        .expect("clear");
    assert_eq!(cleared.intention(), None);
}

#[tokio::test]
async fn persisted_store_reloads_and_reset_restarts_ids() {
    let tmp = TempDir::new("persist");
    let path = tmp.path().join("nested").join("store.json");

    let set_id = {
        let store = MemoryStore::open(&path, WriteDurability::Durable).expect("open");
        let session = store.create_session(day(1), Some("push".into())).await.expect("session");
        let bench = store.get_or_create_exercise("Bench").await.expect("exercise");
        store
            .add_sets(session.backend_id(), bench.backend_id(), &new_set(80.0, 8), 1)
            .await
            .expect("sets")[0]
            .backend_id()
    };

    let reopened = MemoryStore::open(&path, WriteDurability::BestEffort).expect("reopen");
    let snapshot = read_snapshot(&reopened, WorkoutId::new(1)).await.expect("snapshot");
    assert_eq!(snapshot.workout().name(), Some("push"));
    assert_eq!(snapshot.sets()[0].backend_id(), set_id);
    assert_eq!(snapshot.exercises().len(), 1);

    reopened.reset().await.expect("reset");
    let fresh = reopened.create_session(day(2), None).await.expect("fresh");
    assert_eq!(fresh.backend_id(), WorkoutId::new(1));
    assert!(reopened.exercise_history(ExerciseId::new(1), None).await.expect("history").is_empty());
}

#[tokio::test]
async fn corrupt_file_is_reported() {
    let tmp = TempDir::new("corrupt");
    let path = tmp.path().join("store.json");
    std::fs::write(&path, "{not json").expect("write");

    let err = MemoryStore::open(&path, WriteDurability::BestEffort).err().expect("error");
    assert!(matches!(err, StoreError::Json { .. }));
}
