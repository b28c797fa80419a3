// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The modification protocol and its applier.
//!
//! A command produces an ordered list of [`Modification`]s describing what the backend already
//! persisted. Applying them to the client tree is all-or-nothing and yields a minimal delta
//! the view layer can use for animation.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::IdentityMap;
use crate::model::{
    Exercise, ExerciseHandle, ExerciseId, ExerciseNode, SessionTree, SetHandle, SetId, SetNode,
    WorkoutSet,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Modification {
    /// Sets appended to an exercise. `exercise` must be present when the client may not know
    /// the parent yet.
    SetAdded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exercise: Option<Exercise>,
        sets: Vec<WorkoutSet>,
    },
    /// Full replacement of existing sets. A changed `exercise_backend_id` moves the set.
    SetModified {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exercise: Option<Exercise>,
        sets: Vec<WorkoutSet>,
    },
    SetRemoved { set_ids: Vec<SetId> },
    ExerciseAdded { exercise: Exercise, sets: Vec<WorkoutSet> },
}

impl Modification {
    pub fn kind(&self) -> ModificationKind {
        match self {
            Self::SetAdded { .. } => ModificationKind::SetAdded,
            Self::SetModified { .. } => ModificationKind::SetModified,
            Self::SetRemoved { .. } => ModificationKind::SetRemoved,
            Self::ExerciseAdded { .. } => ModificationKind::ExerciseAdded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationKind {
    SetAdded,
    SetModified,
    SetRemoved,
    ExerciseAdded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    Exercise(ExerciseHandle),
    Set(SetHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub applied: usize,
    pub delta: Delta,
}

/// Which handles changed as the result of applying modifications.
///
/// Label renumbering counts as an update of the relabeled set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<EntityRef>,
    pub removed: Vec<EntityRef>,
    pub updated: Vec<EntityRef>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: HashSet<EntityRef>,
    removed: HashSet<EntityRef>,
    updated: HashSet<EntityRef>,
}

impl DeltaBuilder {
    fn record_added(&mut self, entity: EntityRef) {
        self.removed.remove(&entity);
        self.updated.remove(&entity);
        self.added.insert(entity);
    }

    fn record_removed(&mut self, entity: EntityRef) {
        if self.added.remove(&entity) {
            // Added and removed inside one batch: never visible to the client.
            self.updated.remove(&entity);
            return;
        }
        self.updated.remove(&entity);
        self.removed.insert(entity);
    }

    fn record_updated(&mut self, entity: EntityRef) {
        if self.added.contains(&entity) || self.removed.contains(&entity) {
            return;
        }
        self.updated.insert(entity);
    }

    fn finish(self) -> Delta {
        let mut added = self.added.into_iter().collect::<Vec<_>>();
        let mut removed = self.removed.into_iter().collect::<Vec<_>>();
        let mut updated = self.updated.into_iter().collect::<Vec<_>>();

        added.sort();
        removed.sort();
        updated.sort();

        Delta { added, removed, updated }
    }
}

/// Applies `modifications` in order to `tree`, resolving handles through `identity`.
///
/// Work happens on candidate copies of both; they replace the originals only when every
/// modification succeeded.
pub fn apply_modifications(
    tree: &mut SessionTree,
    identity: &mut IdentityMap,
    modifications: &[Modification],
) -> Result<ApplyResult, ApplyError> {
    if modifications.is_empty() {
        return Ok(ApplyResult { applied: 0, delta: Delta::default() });
    }

    let mut candidate = tree.clone();
    let mut candidate_identity = identity.clone();
    let mut delta = DeltaBuilder::default();

    for modification in modifications {
        apply_modification(&mut candidate, &mut candidate_identity, modification, &mut delta)?;
    }

    *tree = candidate;
    *identity = candidate_identity;

    Ok(ApplyResult { applied: modifications.len(), delta: delta.finish() })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// A set references an exercise that is neither in the tree nor carried inline.
    MissingExercise { exercise_id: ExerciseId, set_id: SetId },
    MissingSet { set_id: SetId },
    /// An `ExerciseAdded` payload carries a set of another exercise.
    ExerciseMismatch { exercise_id: ExerciseId, set_id: SetId, set_exercise_id: ExerciseId },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingExercise { exercise_id, set_id } => write!(
                f,
                "set {set_id} references exercise {exercise_id}, which is not in the tree and was not sent inline"
            ),
            Self::MissingSet { set_id } => write!(f, "set not found (id={set_id})"),
            Self::ExerciseMismatch { exercise_id, set_id, set_exercise_id } => write!(
                f,
                "exercise {exercise_id} payload carries set {set_id} of exercise {set_exercise_id}"
            ),
        }
    }
}

impl std::error::Error for ApplyError {}

// Per-modification tree surgery used by `apply_modifications`.
include!("ops_impl.rs");
