// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{ExerciseId, SetId, WorkoutId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    backend_id: ExerciseId,
    name: SmolStr,
}

impl Exercise {
    pub fn new(backend_id: ExerciseId, name: impl Into<SmolStr>) -> Self {
        Self { backend_id, name: name.into() }
    }

    pub fn backend_id(&self) -> ExerciseId {
        self.backend_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A single recorded set.
///
/// `set_index` is 1-based and contiguous per exercise within a session; the store renumbers it
/// when a set is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSet {
    backend_id: SetId,
    exercise_backend_id: ExerciseId,
    weight: f64,
    reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rpe: Option<f64>,
    set_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl WorkoutSet {
    pub fn new(
        backend_id: SetId,
        exercise_backend_id: ExerciseId,
        weight: f64,
        reps: u32,
        set_index: u32,
    ) -> Self {
        Self { backend_id, exercise_backend_id, weight, reps, rpe: None, set_index, notes: None }
    }

    pub fn with_rpe(mut self, rpe: Option<f64>) -> Self {
        self.rpe = rpe;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn backend_id(&self) -> SetId {
        self.backend_id
    }

    pub fn exercise_backend_id(&self) -> ExerciseId {
        self.exercise_backend_id
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn rpe(&self) -> Option<f64> {
        self.rpe
    }

    pub fn set_index(&self) -> u32 {
        self.set_index
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub(crate) fn set_reps(&mut self, reps: u32) {
        self.reps = reps;
    }

    pub(crate) fn set_rpe(&mut self, rpe: Option<f64>) {
        self.rpe = rpe;
    }

    pub(crate) fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    pub(crate) fn set_set_index(&mut self, set_index: u32) {
        self.set_index = set_index;
    }

    /// Volume contributed by this set (`weight * reps`).
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSession {
    backend_id: WorkoutId,
    status: SessionStatus,
    date: NaiveDate,
    #[serde(default)]
    duration_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intention: Option<String>,
    /// Serialized [`super::CachedSummary`]; kept opaque here so a corrupt value never blocks
    /// loading the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

impl WorkoutSession {
    pub fn new(backend_id: WorkoutId, date: NaiveDate) -> Self {
        Self {
            backend_id,
            status: SessionStatus::InProgress,
            date,
            duration_seconds: 0,
            name: None,
            intention: None,
            summary: None,
        }
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn backend_id(&self) -> WorkoutId {
        self.backend_id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn intention(&self) -> Option<&str> {
        self.intention.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub(crate) fn set_duration_seconds(&mut self, duration_seconds: u64) {
        self.duration_seconds = duration_seconds;
    }

    pub(crate) fn set_intention(&mut self, intention: Option<String>) {
        self.intention = intention;
    }

    pub(crate) fn set_summary(&mut self, summary: Option<String>) {
        self.summary = summary;
    }
}
