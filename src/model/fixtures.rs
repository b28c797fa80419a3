// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::NaiveDate;

use super::{Exercise, ExerciseId, SetId, Snapshot, WorkoutId, WorkoutSession, WorkoutSet};

pub(crate) fn workout(id: i64) -> WorkoutSession {
    let date = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");
    WorkoutSession::new(WorkoutId::new(id), date)
}

pub(crate) fn exercise(id: i64, name: &str) -> Exercise {
    Exercise::new(ExerciseId::new(id), name)
}

pub(crate) fn set(id: i64, exercise_id: i64, weight: f64, reps: u32, index: u32) -> WorkoutSet {
    WorkoutSet::new(SetId::new(id), ExerciseId::new(exercise_id), weight, reps, index)
}

pub(crate) fn snapshot(exercises: Vec<Exercise>, sets: Vec<WorkoutSet>) -> Snapshot {
    Snapshot::new(workout(1), exercises, sets)
}
