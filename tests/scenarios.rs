// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end session flows through the public API.

use std::sync::Arc;

use liftsync::cache::CacheSource;
use liftsync::collab::{HistoryEngine, RuleClassifier};
use liftsync::coordinator::{Backend, CoreConfig, SessionCoordinator};
use liftsync::identity::IdentityMap;
use liftsync::model::{Exercise, ExerciseId, SessionTree, SetId, WorkoutSet};
use liftsync::ops::{apply_modifications, EntityRef, Modification};
use liftsync::store::{MemoryStore, Store};

async fn coordinator() -> SessionCoordinator {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let backend = Backend {
        store: store.clone(),
        classifier: Arc::new(RuleClassifier::new().expect("patterns")),
        engine: Arc::new(HistoryEngine::new(store, 10)),
    };
    let coordinator = SessionCoordinator::setup(backend, CoreConfig::default()).await.expect("setup");
    coordinator.create_blank_session(None).await.expect("blank session");
    coordinator
}

fn bench_sets(ids: &[i64]) -> Vec<WorkoutSet> {
    ids.iter()
        .zip(1..)
        .map(|(id, index)| WorkoutSet::new(SetId::new(*id), ExerciseId::new(1), 225.0, 5, index))
        .collect()
}

#[tokio::test]
async fn scenario_a_text_input_builds_one_exercise_with_three_sets() {
    let coordinator = coordinator().await;

    let outcome = coordinator.add_set_from_string("3x5 bench 225").await.expect("add");

    assert_eq!(outcome.applied, 1);
    let tree = &outcome.view.tree;
    assert_eq!(tree.exercises().len(), 1);
    let exercise = &tree.exercises()[0];
    assert_eq!(exercise.exercise().name(), "Bench Press");
    let sets: Vec<_> = exercise
        .sets()
        .iter()
        .map(|node| (node.label(), node.set().weight(), node.set().reps()))
        .collect();
    assert_eq!(sets, vec![(1, 225.0, 5), (2, 225.0, 5), (3, 225.0, 5)]);
    assert!(outcome.delta.added.contains(&EntityRef::Exercise(exercise.handle())));
}

#[test]
fn scenario_a_exercise_added_builds_the_tree() {
    let mut tree = SessionTree::new();
    let mut identity = IdentityMap::new();
    let modification = Modification::ExerciseAdded {
        exercise: Exercise::new(ExerciseId::new(1), "Bench Press"),
        sets: bench_sets(&[1, 2, 3]),
    };

    let result = apply_modifications(&mut tree, &mut identity, &[modification]).expect("apply");

    assert_eq!(result.delta.added.len(), 4);
    let labels: Vec<_> = tree.sets().map(|(_, node)| node.label()).collect();
    assert_eq!(labels, vec![1, 2, 3]);
}

#[tokio::test]
async fn scenario_b_deleting_the_middle_set_relabels() {
    let coordinator = coordinator().await;
    coordinator.add_set_from_string("3x5 bench 225").await.expect("add");
    let handles: Vec<_> = coordinator.view().tree.sets().map(|(_, node)| node.handle()).collect();

    let outcome = coordinator.delete_set(handles[1]).await.expect("delete");

    let remaining: Vec<_> =
        outcome.view.tree.sets().map(|(_, node)| (node.handle(), node.label())).collect();
    assert_eq!(remaining, vec![(handles[0], 1), (handles[2], 2)]);
}

#[test]
fn scenario_c_removing_the_last_set_drops_the_exercise_everywhere() {
    let mut tree = SessionTree::new();
    let mut identity = IdentityMap::new();
    apply_modifications(
        &mut tree,
        &mut identity,
        &[Modification::ExerciseAdded {
            exercise: Exercise::new(ExerciseId::new(1), "Bench Press"),
            sets: bench_sets(&[7]),
        }],
    )
    .expect("seed");
    let exercise_handle = identity.exercise_handle(ExerciseId::new(1)).expect("handle");

    let result = apply_modifications(
        &mut tree,
        &mut identity,
        &[Modification::SetRemoved { set_ids: vec![SetId::new(7)] }],
    )
    .expect("remove");

    assert!(tree.is_empty());
    assert!(result.delta.removed.contains(&EntityRef::Exercise(exercise_handle)));
    assert_eq!(identity.exercise_handle(ExerciseId::new(1)), None);
    assert_eq!(identity.set_handle(SetId::new(7)), None);
}

#[tokio::test]
async fn scenario_c_coordinator_clears_focus_of_a_pruned_exercise() {
    let coordinator = coordinator().await;
    coordinator.add_set_from_string("bench 80x8").await.expect("add");
    let view = coordinator.view();
    let (exercise, set) = view.tree.sets().map(|(e, s)| (e.handle(), s.handle())).next().expect("set");

    let outcome = coordinator.delete_set(set).await.expect("delete");

    assert!(outcome.view.tree.is_empty());
    assert!(!outcome.view.focus.is_expanded(exercise));
    assert_eq!(outcome.view.focus.active_exercise(), None);
}

#[tokio::test]
async fn scenario_d_back_to_back_suggestions_are_identical() {
    let coordinator = coordinator().await;
    coordinator.add_set_from_string("bench 80x8").await.expect("add");

    let first = coordinator.get_suggestions().await.expect("first");
    let second = coordinator.get_suggestions().await.expect("second");

    assert_eq!(second.source, CacheSource::Hit);
    assert!(Arc::ptr_eq(&first.payload, &second.payload));
    assert_eq!(
        serde_json::to_vec(&*first.payload).expect("json"),
        serde_json::to_vec(&*second.payload).expect("json")
    );
}

#[tokio::test]
async fn scenario_e_mutation_invalidates_cached_suggestions() {
    let coordinator = coordinator().await;
    coordinator.add_set_from_string("bench 80x8").await.expect("add");
    let before = coordinator.get_suggestions().await.expect("before");

    coordinator.add_set_from_string("bench 80x8").await.expect("mutation");
    let after = coordinator.get_suggestions().await.expect("after");

    assert_ne!(after.source, CacheSource::Hit);
    assert_ne!(after.fingerprint, before.fingerprint);
    assert!(!Arc::ptr_eq(&before.payload, &after.payload));
}
