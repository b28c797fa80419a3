// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Selection and expansion state for the session view.
//!
//! Re-derived against the tree after every change so it never points at a pruned handle.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{ExerciseHandle, SessionTree, SetHandle};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusState {
    rev: u64,
    active_exercise: Option<ExerciseHandle>,
    active_set: Option<SetHandle>,
    expanded: BTreeSet<ExerciseHandle>,
}

impl FocusState {
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn active_exercise(&self) -> Option<ExerciseHandle> {
        self.active_exercise
    }

    pub fn active_set(&self) -> Option<SetHandle> {
        self.active_set
    }

    pub fn expanded(&self) -> &BTreeSet<ExerciseHandle> {
        &self.expanded
    }

    pub fn is_expanded(&self, handle: ExerciseHandle) -> bool {
        self.expanded.contains(&handle)
    }

    /// Brings the focus back in line with `tree`. Returns whether anything changed.
    pub fn reconcile(&mut self, tree: &SessionTree) -> bool {
        let before = (self.active_exercise, self.active_set, self.expanded.clone());

        let live = tree.exercise_handles();
        self.expanded.retain(|handle| live.contains(handle));

        if let Some(exercise) = self.active_exercise {
            if !live.contains(&exercise) {
                self.active_exercise = None;
                self.active_set = None;
            }
        }

        if let Some(set) = self.active_set {
            match tree.set_by_handle(set) {
                Some((parent, _)) => {
                    // A moved set keeps the focus; follow it to its new exercise.
                    self.active_exercise = Some(parent.handle());
                }
                None => {
                    self.active_set = self
                        .active_exercise
                        .and_then(|handle| tree.exercise_by_handle(handle))
                        .and_then(|node| node.first_set())
                        .map(|node| node.handle());
                }
            }
        }

        if self.active_exercise.is_none() {
            if let Some(first) = tree.first_exercise() {
                self.active_exercise = Some(first.handle());
                self.active_set = first.first_set().map(|node| node.handle());
                self.expanded.insert(first.handle());
            }
        } else if self.active_set.is_none() {
            self.active_set = self
                .active_exercise
                .and_then(|handle| tree.exercise_by_handle(handle))
                .and_then(|node| node.first_set())
                .map(|node| node.handle());
        }

        let changed = before != (self.active_exercise, self.active_set, self.expanded.clone());
        if changed {
            self.bump();
        }
        changed
    }

    /// Focuses `set` and expands its exercise.
    pub fn select_set(&mut self, tree: &SessionTree, set: SetHandle) -> Result<(), FocusError> {
        let Some((parent, _)) = tree.set_by_handle(set) else {
            return Err(FocusError::UnknownSet(set));
        };
        let exercise = parent.handle();
        let inserted = self.expanded.insert(exercise);
        if !inserted && self.active_set == Some(set) && self.active_exercise == Some(exercise) {
            return Ok(());
        }
        self.active_exercise = Some(exercise);
        self.active_set = Some(set);
        self.bump();
        Ok(())
    }

    /// Flips the expansion of `exercise`. Returns whether it is expanded afterwards.
    pub fn toggle_expanded(
        &mut self,
        tree: &SessionTree,
        exercise: ExerciseHandle,
    ) -> Result<bool, FocusError> {
        if tree.exercise_by_handle(exercise).is_none() {
            return Err(FocusError::UnknownExercise(exercise));
        }
        let expanded = if self.expanded.remove(&exercise) {
            false
        } else {
            self.expanded.insert(exercise);
            true
        };
        self.bump();
        Ok(expanded)
    }

    pub fn clear(&mut self) {
        if self.active_exercise.is_none() && self.active_set.is_none() && self.expanded.is_empty()
        {
            return;
        }
        self.active_exercise = None;
        self.active_set = None;
        self.expanded.clear();
        self.bump();
    }

    fn bump(&mut self) {
        self.rev = self.rev.wrapping_add(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusError {
    UnknownSet(SetHandle),
    UnknownExercise(ExerciseHandle),
}

impl fmt::Display for FocusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSet(handle) => write!(f, "set {handle} is not in the session"),
            Self::UnknownExercise(handle) => write!(f, "exercise {handle} is not in the session"),
        }
    }
}

impl std::error::Error for FocusError {}

#[cfg(test)]
mod tests {
    use super::{FocusError, FocusState};
    use crate::identity::IdentityMap;
    use crate::model::fixtures::{exercise, set};
    use crate::model::{ExerciseId, SessionTree, SetId};
    use crate::ops::{apply_modifications, Modification};

    fn tree_with(mods: &[Modification], identity: &mut IdentityMap) -> SessionTree {
        let mut tree = SessionTree::new();
        apply_modifications(&mut tree, identity, mods).expect("apply");
        tree
    }

    fn bench_and_squat() -> Vec<Modification> {
        vec![
            Modification::ExerciseAdded {
                exercise: exercise(1, "Bench"),
                sets: vec![set(10, 1, 80.0, 8, 1), set(11, 1, 80.0, 8, 2)],
            },
            Modification::ExerciseAdded {
                exercise: exercise(2, "Squat"),
                sets: vec![set(20, 2, 120.0, 5, 1)],
            },
        ]
    }

    #[test]
    fn initializer_picks_first_exercise_and_expands_it() {
        let mut identity = IdentityMap::new();
        let tree = tree_with(&bench_and_squat(), &mut identity);
        let mut focus = FocusState::default();

        assert!(focus.reconcile(&tree));

        let bench = identity.exercise_handle(ExerciseId::new(1));
        assert_eq!(focus.active_exercise(), bench);
        assert_eq!(focus.active_set(), identity.set_handle(SetId::new(10)));
        assert!(focus.is_expanded(bench.expect("bench")));
    }

    #[test]
    fn vanished_set_falls_back_to_first_remaining_set() {
        let mut identity = IdentityMap::new();
        let mut tree = tree_with(&bench_and_squat(), &mut identity);
        let mut focus = FocusState::default();
        let second = identity.set_handle(SetId::new(11)).expect("handle");
        focus.select_set(&tree, second).expect("select");

        apply_modifications(
            &mut tree,
            &mut identity,
            &[Modification::SetRemoved { set_ids: vec![SetId::new(11)] }],
        )
        .expect("remove");
        focus.reconcile(&tree);

        assert_eq!(focus.active_set(), identity.set_handle(SetId::new(10)));
        assert_eq!(focus.active_exercise(), identity.exercise_handle(ExerciseId::new(1)));
    }

    #[test]
    fn vanished_exercise_reinitializes_and_prunes_expansion() {
        let mut identity = IdentityMap::new();
        let mut tree = tree_with(&bench_and_squat(), &mut identity);
        let mut focus = FocusState::default();
        let squat_set = identity.set_handle(SetId::new(20)).expect("handle");
        let squat = identity.exercise_handle(ExerciseId::new(2)).expect("handle");
        focus.select_set(&tree, squat_set).expect("select");

        apply_modifications(
            &mut tree,
            &mut identity,
            &[Modification::SetRemoved { set_ids: vec![SetId::new(20)] }],
        )
        .expect("remove");
        focus.reconcile(&tree);

        assert!(!focus.is_expanded(squat));
        assert_eq!(focus.active_exercise(), identity.exercise_handle(ExerciseId::new(1)));
        assert_eq!(focus.active_set(), identity.set_handle(SetId::new(10)));
    }

    #[test]
    fn empty_tree_clears_everything() {
        let mut identity = IdentityMap::new();
        let tree = tree_with(&bench_and_squat(), &mut identity);
        let mut focus = FocusState::default();
        focus.reconcile(&tree);

        focus.reconcile(&SessionTree::new());

        assert_eq!(focus.active_exercise(), None);
        assert_eq!(focus.active_set(), None);
        assert!(focus.expanded().is_empty());
    }

    #[test]
    fn reconcile_is_stable_when_nothing_changed() {
        let mut identity = IdentityMap::new();
        let tree = tree_with(&bench_and_squat(), &mut identity);
        let mut focus = FocusState::default();
        focus.reconcile(&tree);
        let rev = focus.rev();

        assert!(!focus.reconcile(&tree));
        assert_eq!(focus.rev(), rev);
    }

    #[test]
    fn toggle_rejects_unknown_exercise() {
        let mut identity = IdentityMap::new();
        let tree = tree_with(&bench_and_squat(), &mut identity);
        let bench = identity.exercise_handle(ExerciseId::new(1)).expect("handle");
        let mut focus = FocusState::default();

        assert_eq!(focus.toggle_expanded(&tree, bench), Ok(true));
        assert_eq!(focus.toggle_expanded(&tree, bench), Ok(false));

        let stale = {
            let mut other = IdentityMap::new();
            other.resolve_exercise(ExerciseId::new(99));
            other.resolve_exercise(ExerciseId::new(98))
        };
        let err = focus.toggle_expanded(&SessionTree::new(), stale).expect_err("unknown");
        assert_eq!(err, FocusError::UnknownExercise(stale));
    }
}
