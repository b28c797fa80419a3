// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The client-side exercise/set tree of one session.
//!
//! Exercises are kept sorted by case-insensitive name (ties by backend id). Sets keep their
//! insertion order inside an exercise and carry a contiguous 1-based label, mirrored into
//! `WorkoutSet::set_index`.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::identity::IdentityMap;

use super::{Exercise, ExerciseHandle, ExerciseId, SetHandle, SetId, Snapshot, WorkoutSet};

#[derive(Debug, Clone, PartialEq)]
pub struct SetNode {
    handle: SetHandle,
    set: WorkoutSet,
}

impl SetNode {
    pub fn new(handle: SetHandle, set: WorkoutSet) -> Self {
        Self { handle, set }
    }

    pub fn handle(&self) -> SetHandle {
        self.handle
    }

    pub fn set(&self) -> &WorkoutSet {
        &self.set
    }

    pub fn label(&self) -> u32 {
        self.set.set_index()
    }

    pub(crate) fn set_mut(&mut self) -> &mut WorkoutSet {
        &mut self.set
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseNode {
    handle: ExerciseHandle,
    exercise: Exercise,
    sets: Vec<SetNode>,
}

impl ExerciseNode {
    pub fn new(handle: ExerciseHandle, exercise: Exercise) -> Self {
        Self { handle, exercise, sets: Vec::new() }
    }

    pub fn handle(&self) -> ExerciseHandle {
        self.handle
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn sets(&self) -> &[SetNode] {
        &self.sets
    }

    pub fn first_set(&self) -> Option<&SetNode> {
        self.sets.first()
    }

    pub fn set_by_handle(&self, handle: SetHandle) -> Option<&SetNode> {
        self.sets.iter().find(|node| node.handle == handle)
    }

    pub(crate) fn sets_mut(&mut self) -> &mut Vec<SetNode> {
        &mut self.sets
    }

    /// Relabels the sets `1..n` in their current order. Returns the handles whose label moved.
    pub(crate) fn relabel(&mut self) -> Vec<SetHandle> {
        let mut moved = Vec::new();
        for (idx, node) in self.sets.iter_mut().enumerate() {
            let label = u32::try_from(idx + 1).unwrap_or(u32::MAX);
            if node.set.set_index() != label {
                node.set.set_set_index(label);
                moved.push(node.handle);
            }
        }
        moved
    }

    fn display_cmp(&self, other: &Exercise) -> Ordering {
        display_order(&self.exercise, other)
    }
}

fn display_order(a: &Exercise, b: &Exercise) -> Ordering {
    a.name()
        .to_lowercase()
        .cmp(&b.name().to_lowercase())
        .then_with(|| a.backend_id().cmp(&b.backend_id()))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTree {
    exercises: Vec<ExerciseNode>,
}

impl SessionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from a store snapshot, resolving handles through `identity` so that ids
    /// seen before keep their handle. Mappings for ids absent from the snapshot are pruned.
    pub fn from_snapshot(snapshot: &Snapshot, identity: &mut IdentityMap) -> Self {
        let mut tree = Self::new();
        let mut sets = snapshot.sets().to_vec();
        sets.sort_by(|a, b| {
            a.set_index().cmp(&b.set_index()).then_with(|| a.backend_id().cmp(&b.backend_id()))
        });

        for set in sets {
            let exercise_id = set.exercise_backend_id();
            let position = match tree.position_of(exercise_id) {
                Some(position) => position,
                None => {
                    let Some(exercise) = snapshot.exercise(exercise_id) else {
                        tracing::warn!(
                            set_id = %set.backend_id(),
                            exercise_id = %exercise_id,
                            "snapshot set references an unknown exercise; skipping"
                        );
                        continue;
                    };
                    let handle = identity.resolve_exercise(exercise_id);
                    tree.insert_exercise(ExerciseNode::new(handle, exercise.clone()))
                }
            };
            let handle = identity.resolve_set(set.backend_id());
            tree.exercises[position].sets.push(SetNode::new(handle, set));
        }

        for node in &mut tree.exercises {
            node.relabel();
        }

        let (live_exercises, live_sets) = tree.live_ids();
        identity.retain(&live_exercises, &live_sets);
        tree
    }

    pub fn exercises(&self) -> &[ExerciseNode] {
        &self.exercises
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|node| node.sets.len()).sum()
    }

    pub fn first_exercise(&self) -> Option<&ExerciseNode> {
        self.exercises.first()
    }

    pub fn exercise_by_id(&self, backend_id: ExerciseId) -> Option<&ExerciseNode> {
        self.exercises.iter().find(|node| node.exercise.backend_id() == backend_id)
    }

    pub fn exercise_by_handle(&self, handle: ExerciseHandle) -> Option<&ExerciseNode> {
        self.exercises.iter().find(|node| node.handle == handle)
    }

    pub fn exercise_by_name(&self, name: &str) -> Option<&ExerciseNode> {
        self.exercises.iter().find(|node| node.exercise.name().eq_ignore_ascii_case(name))
    }

    pub fn set_by_id(&self, backend_id: SetId) -> Option<(&ExerciseNode, &SetNode)> {
        self.exercises.iter().find_map(|exercise| {
            exercise
                .sets
                .iter()
                .find(|node| node.set.backend_id() == backend_id)
                .map(|set| (exercise, set))
        })
    }

    pub fn set_by_handle(&self, handle: SetHandle) -> Option<(&ExerciseNode, &SetNode)> {
        self.exercises.iter().find_map(|exercise| {
            exercise.set_by_handle(handle).map(|set| (exercise, set))
        })
    }

    /// Every set in display order (exercise order, then label).
    pub fn sets(&self) -> impl Iterator<Item = (&ExerciseNode, &SetNode)> + '_ {
        self.exercises.iter().flat_map(|exercise| exercise.sets.iter().map(move |set| (exercise, set)))
    }

    pub fn exercise_handles(&self) -> BTreeSet<ExerciseHandle> {
        self.exercises.iter().map(|node| node.handle).collect()
    }

    pub fn live_ids(&self) -> (BTreeSet<ExerciseId>, BTreeSet<SetId>) {
        let exercises = self.exercises.iter().map(|node| node.exercise.backend_id()).collect();
        let sets = self.sets().map(|(_, set)| set.set.backend_id()).collect();
        (exercises, sets)
    }

    pub(crate) fn position_of(&self, backend_id: ExerciseId) -> Option<usize> {
        self.exercises.iter().position(|node| node.exercise.backend_id() == backend_id)
    }

    pub(crate) fn exercise_at_mut(&mut self, position: usize) -> &mut ExerciseNode {
        &mut self.exercises[position]
    }

    /// Inserts the node at its display position and returns that position.
    pub(crate) fn insert_exercise(&mut self, node: ExerciseNode) -> usize {
        let position = self
            .exercises
            .partition_point(|existing| existing.display_cmp(&node.exercise) == Ordering::Less);
        self.exercises.insert(position, node);
        position
    }

    pub(crate) fn remove_exercise_at(&mut self, position: usize) -> ExerciseNode {
        self.exercises.remove(position)
    }

    /// Position of the exercise holding `set_id`, with the set's position inside it.
    pub(crate) fn locate_set(&self, set_id: SetId) -> Option<(usize, usize)> {
        self.exercises.iter().enumerate().find_map(|(ex_pos, exercise)| {
            exercise
                .sets
                .iter()
                .position(|node| node.set.backend_id() == set_id)
                .map(|set_pos| (ex_pos, set_pos))
        })
    }
}
