// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::cache::Fingerprint;
use crate::focus::FocusState;
use crate::model::{SessionTree, Snapshot, WorkoutId, WorkoutSession};
use crate::ops::Delta;

/// Immutable picture of the coordinator, published after every successful change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub revision: u64,
    pub workout: Option<WorkoutSession>,
    pub tree: SessionTree,
    pub focus: FocusState,
    /// Suggestion cache generation the tree was published under.
    pub cache_generation: u64,
}

impl SessionView {
    pub fn workout_id(&self) -> Option<WorkoutId> {
        self.workout.as_ref().map(WorkoutSession::backend_id)
    }

    pub fn fingerprint(&self) -> Option<Fingerprint> {
        let workout = self.workout.as_ref()?;
        Some(Fingerprint::of(workout.backend_id(), workout.intention(), &self.tree))
    }

    /// Rebuilds the backend-shaped snapshot of the published tree.
    pub fn snapshot(&self) -> Option<Snapshot> {
        let workout = self.workout.clone()?;
        let exercises = self.tree.exercises().iter().map(|node| node.exercise().clone()).collect();
        let sets = self.tree.sets().map(|(_, node)| node.set().clone()).collect();
        Some(Snapshot::new(workout, exercises, sets))
    }
}

#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub view: Arc<SessionView>,
    pub applied: usize,
    pub delta: Delta,
}

#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub view: Arc<SessionView>,
    /// The rebuilt tree differed from the one built by applying modifications.
    pub drifted: bool,
}
