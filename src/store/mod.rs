// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence for workout sessions.
//!
//! The coordinator talks to storage only through the async [`Store`] trait. [`MemoryStore`] is
//! the bundled implementation: in-memory tables with optional JSON persistence to one file.

use std::fmt;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{
    Exercise, ExerciseId, SetId, Snapshot, WorkoutId, WorkoutSession, WorkoutSet,
};

pub mod memory;

pub use memory::{MemoryStore, WriteDurability};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Session,
    Exercise,
    Set,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Session => "session",
            Self::Exercise => "exercise",
            Self::Set => "set",
        })
    }
}

#[derive(Debug)]
pub enum StoreError {
    NotFound {
        entity: EntityKind,
        id: i64,
    },
    ForeignKey {
        entity: EntityKind,
        references: EntityKind,
        id: i64,
    },
    InvalidInput {
        field: &'static str,
        reason: String,
    },
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found (id={id})"),
            Self::ForeignKey { entity, references, id } => {
                write!(f, "{entity} references missing {references} (id={id})")
            }
            Self::InvalidInput { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::NotFound { .. } | Self::ForeignKey { .. } | Self::InvalidInput { .. } => None,
        }
    }
}

/// Values for sets created in one call.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSet {
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
}

/// Partial update of a set. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetUpdate {
    pub exercise: Option<ExerciseId>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
}

impl SetUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Partial update of a session. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPatch {
    pub duration_seconds: Option<u64>,
    pub intention: Option<String>,
    pub summary: Option<String>,
}

/// A set from any session, with the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalSet {
    pub set: WorkoutSet,
    pub workout_id: WorkoutId,
    pub date: NaiveDate,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_session(
        &self,
        date: NaiveDate,
        name: Option<String>,
    ) -> Result<WorkoutSession, StoreError>;

    async fn session(&self, id: WorkoutId) -> Result<WorkoutSession, StoreError>;

    async fn sessions(&self) -> Result<Vec<WorkoutSession>, StoreError>;

    /// The most recently created session that is still in progress.
    async fn in_progress_session(&self) -> Result<Option<WorkoutSession>, StoreError>;

    /// Deletes the session and, in cascade, its sets.
    async fn delete_session(&self, id: WorkoutId) -> Result<(), StoreError>;

    async fn complete_session(&self, id: WorkoutId) -> Result<WorkoutSession, StoreError>;

    async fn update_session(
        &self,
        id: WorkoutId,
        patch: &SessionPatch,
    ) -> Result<WorkoutSession, StoreError>;

    async fn exercises(&self) -> Result<Vec<Exercise>, StoreError>;

    /// Looks the exercise up by case-insensitive name, creating it when missing.
    async fn get_or_create_exercise(&self, name: &str) -> Result<Exercise, StoreError>;

    async fn session_sets(&self, id: WorkoutId) -> Result<Vec<WorkoutSet>, StoreError>;

    /// Appends `count` identical sets, numbered after the exercise's current last set.
    async fn add_sets(
        &self,
        session: WorkoutId,
        exercise: ExerciseId,
        set: &NewSet,
        count: u32,
    ) -> Result<Vec<WorkoutSet>, StoreError>;

    async fn update_set(&self, id: SetId, update: &SetUpdate) -> Result<WorkoutSet, StoreError>;

    /// Deletes the set and renumbers the remaining sets of its exercise in that session.
    async fn delete_set(&self, id: SetId) -> Result<(), StoreError>;

    /// Sets of `exercise` across all sessions, most recent first.
    async fn exercise_history(
        &self,
        exercise: ExerciseId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoricalSet>, StoreError>;

    /// Drops every table. Ids restart from 1.
    async fn reset(&self) -> Result<(), StoreError>;
}

/// Full read of one session: the session row, its sets and the exercises they reference.
pub async fn read_snapshot(store: &dyn Store, id: WorkoutId) -> Result<Snapshot, StoreError> {
    let workout = store.session(id).await?;
    let sets = store.session_sets(id).await?;
    let catalog = store.exercises().await?;
    let exercises = catalog
        .into_iter()
        .filter(|exercise| sets.iter().any(|set| set.exercise_backend_id() == exercise.backend_id()))
        .collect();
    Ok(Snapshot::new(workout, exercises, sets))
}
