// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::{Exercise, WorkoutSession, WorkoutSet};

/// A full read of one session as the store sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    workout: WorkoutSession,
    exercises: Vec<Exercise>,
    sets: Vec<WorkoutSet>,
}

impl Snapshot {
    pub fn new(workout: WorkoutSession, exercises: Vec<Exercise>, sets: Vec<WorkoutSet>) -> Self {
        Self { workout, exercises, sets }
    }

    pub fn workout(&self) -> &WorkoutSession {
        &self.workout
    }

    /// Exercises referenced by at least one set of the session.
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn sets(&self) -> &[WorkoutSet] {
        &self.sets
    }

    pub fn exercise(&self, backend_id: super::ExerciseId) -> Option<&Exercise> {
        self.exercises.iter().find(|exercise| exercise.backend_id() == backend_id)
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
