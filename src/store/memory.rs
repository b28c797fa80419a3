// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{
    EntityKind, HistoricalSet, NewSet, SessionPatch, SetUpdate, Store, StoreError,
};
use crate::model::{
    Exercise, ExerciseId, SessionStatus, SetId, WorkoutId, WorkoutSession, WorkoutSet,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Temp file plus atomic rename, no fsync.
    #[default]
    BestEffort,

    /// Also syncs the file and its directory. Exact guarantees are platform/filesystem-dependent.
    Durable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSet {
    workout_id: WorkoutId,
    set: WorkoutSet,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    last_session_id: i64,
    #[serde(default)]
    last_exercise_id: i64,
    #[serde(default)]
    last_set_id: i64,
    #[serde(default)]
    sessions: BTreeMap<i64, WorkoutSession>,
    #[serde(default)]
    exercises: BTreeMap<i64, Exercise>,
    #[serde(default)]
    sets: BTreeMap<i64, StoredSet>,
}

impl Tables {
    fn session(&self, id: WorkoutId) -> Result<&WorkoutSession, StoreError> {
        self.sessions
            .get(&id.get())
            .ok_or(StoreError::NotFound { entity: EntityKind::Session, id: id.get() })
    }

    fn session_mut(&mut self, id: WorkoutId) -> Result<&mut WorkoutSession, StoreError> {
        self.sessions
            .get_mut(&id.get())
            .ok_or(StoreError::NotFound { entity: EntityKind::Session, id: id.get() })
    }

    fn create_session(&mut self, date: NaiveDate, name: Option<String>) -> WorkoutSession {
        self.last_session_id += 1;
        let session = WorkoutSession::new(WorkoutId::new(self.last_session_id), date).with_name(name);
        self.sessions.insert(self.last_session_id, session.clone());
        session
    }

    fn get_or_create_exercise(&mut self, name: &str) -> Result<Exercise, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput {
                field: "exercise name",
                reason: "must not be empty".to_owned(),
            });
        }
        if let Some(existing) =
            self.exercises.values().find(|exercise| exercise.name().eq_ignore_ascii_case(name))
        {
            return Ok(existing.clone());
        }
        self.last_exercise_id += 1;
        let exercise = Exercise::new(ExerciseId::new(self.last_exercise_id), name);
        self.exercises.insert(self.last_exercise_id, exercise.clone());
        Ok(exercise)
    }

    fn next_set_index(&self, session: WorkoutId, exercise: ExerciseId) -> u32 {
        self.sets
            .values()
            .filter(|row| row.workout_id == session && row.set.exercise_backend_id() == exercise)
            .map(|row| row.set.set_index())
            .max()
            .unwrap_or(0)
            + 1
    }

    fn add_sets(
        &mut self,
        session: WorkoutId,
        exercise: ExerciseId,
        values: &NewSet,
        count: u32,
    ) -> Result<Vec<WorkoutSet>, StoreError> {
        self.session(session).map_err(|_| StoreError::ForeignKey {
            entity: EntityKind::Set,
            references: EntityKind::Session,
            id: session.get(),
        })?;
        if !self.exercises.contains_key(&exercise.get()) {
            return Err(StoreError::ForeignKey {
                entity: EntityKind::Set,
                references: EntityKind::Exercise,
                id: exercise.get(),
            });
        }
        if count == 0 {
            return Err(StoreError::InvalidInput {
                field: "set count",
                reason: "must be at least 1".to_owned(),
            });
        }
        if !(values.weight.is_finite() && values.weight >= 0.0) {
            return Err(StoreError::InvalidInput {
                field: "weight",
                reason: format!("{} is not a non-negative number", values.weight),
            });
        }

        let first_index = self.next_set_index(session, exercise);
        let mut created = Vec::with_capacity(count as usize);
        for offset in 0..count {
            self.last_set_id += 1;
            let set = WorkoutSet::new(
                SetId::new(self.last_set_id),
                exercise,
                values.weight,
                values.reps,
                first_index + offset,
            )
            .with_rpe(values.rpe)
            .with_notes(values.notes.clone());
            self.sets.insert(self.last_set_id, StoredSet { workout_id: session, set: set.clone() });
            created.push(set);
        }
        Ok(created)
    }

    fn update_set(&mut self, id: SetId, update: &SetUpdate) -> Result<WorkoutSet, StoreError> {
        let Some(row) = self.sets.get(&id.get()) else {
            return Err(StoreError::NotFound { entity: EntityKind::Set, id: id.get() });
        };
        let session = row.workout_id;
        let old_exercise = row.set.exercise_backend_id();

        let moved_to = update.exercise.filter(|target| *target != old_exercise);
        if let Some(target) = moved_to {
            if !self.exercises.contains_key(&target.get()) {
                return Err(StoreError::ForeignKey {
                    entity: EntityKind::Set,
                    references: EntityKind::Exercise,
                    id: target.get(),
                });
            }
        }
        let next_index = moved_to.map(|target| self.next_set_index(session, target));

        let Some(row) = self.sets.get_mut(&id.get()) else {
            return Err(StoreError::NotFound { entity: EntityKind::Set, id: id.get() });
        };
        let mut set = match moved_to {
            Some(target) => WorkoutSet::new(
                id,
                target,
                row.set.weight(),
                row.set.reps(),
                next_index.unwrap_or(1),
            )
            .with_rpe(row.set.rpe())
            .with_notes(row.set.notes().map(str::to_owned)),
            None => row.set.clone(),
        };
        if let Some(weight) = update.weight {
            set.set_weight(weight);
        }
        if let Some(reps) = update.reps {
            set.set_reps(reps);
        }
        if let Some(rpe) = update.rpe {
            set.set_rpe(Some(rpe));
        }
        if let Some(notes) = &update.notes {
            set.set_notes(Some(notes.clone()));
        }
        row.set = set.clone();

        if moved_to.is_some() {
            self.renumber(session, old_exercise);
        }
        Ok(set)
    }

    fn delete_set(&mut self, id: SetId) -> Result<(), StoreError> {
        let Some(row) = self.sets.remove(&id.get()) else {
            return Err(StoreError::NotFound { entity: EntityKind::Set, id: id.get() });
        };
        self.renumber(row.workout_id, row.set.exercise_backend_id());
        Ok(())
    }

    /// Restores `1..n` numbering for one exercise within one session.
    fn renumber(&mut self, session: WorkoutId, exercise: ExerciseId) {
        let mut rows = self
            .sets
            .values_mut()
            .filter(|row| row.workout_id == session && row.set.exercise_backend_id() == exercise)
            .collect::<Vec<_>>();
        rows.sort_by_key(|row| (row.set.set_index(), row.set.backend_id()));
        for (idx, row) in rows.into_iter().enumerate() {
            row.set.set_set_index(u32::try_from(idx + 1).unwrap_or(u32::MAX));
        }
    }

    fn delete_session(&mut self, id: WorkoutId) -> Result<(), StoreError> {
        if self.sessions.remove(&id.get()).is_none() {
            return Err(StoreError::NotFound { entity: EntityKind::Session, id: id.get() });
        }
        self.sets.retain(|_, row| row.workout_id != id);
        Ok(())
    }

    fn session_sets(&self, id: WorkoutId) -> Result<Vec<WorkoutSet>, StoreError> {
        self.session(id)?;
        Ok(self
            .sets
            .values()
            .filter(|row| row.workout_id == id)
            .map(|row| row.set.clone())
            .collect())
    }

    fn exercise_history(&self, exercise: ExerciseId, limit: Option<usize>) -> Vec<HistoricalSet> {
        let mut history = self
            .sets
            .values()
            .filter(|row| row.set.exercise_backend_id() == exercise)
            .filter_map(|row| {
                let session = self.sessions.get(&row.workout_id.get())?;
                Some(HistoricalSet {
                    set: row.set.clone(),
                    workout_id: row.workout_id,
                    date: session.date(),
                })
            })
            .collect::<Vec<_>>();
        history.sort_by(|a, b| {
            b.date.cmp(&a.date).then_with(|| b.set.backend_id().cmp(&a.set.backend_id()))
        });
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        history
    }
}

#[derive(Debug, Clone)]
struct Persistence {
    path: PathBuf,
    durability: WriteDurability,
}

impl Persistence {
    fn load(&self) -> Result<Tables, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Tables::default()),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Json { path: self.path.clone(), source })
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(tables)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        write_atomic(&self.path, format!("{json}\n").as_bytes(), self.durability)
    }
}

/// In-memory tables, optionally mirrored to a JSON file after every write.
///
/// Writes run against a copy of the tables; the copy replaces the live state only after it was
/// persisted, so a failed save leaves both memory and disk at the previous state.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    persistence: Option<Persistence>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { tables: Mutex::new(Tables::default()), persistence: None }
    }

    /// Opens (or starts) a store persisted at `path`.
    pub fn open(path: impl Into<PathBuf>, durability: WriteDurability) -> Result<Self, StoreError> {
        let persistence = Persistence { path: path.into(), durability };
        let tables = persistence.load()?;
        tracing::debug!(
            path = %persistence.path.display(),
            sessions = tables.sessions.len(),
            sets = tables.sets.len(),
            "store loaded"
        );
        Ok(Self { tables: Mutex::new(tables), persistence: Some(persistence) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.persistence.as_ref().map(|persistence| persistence.path.as_path())
    }

    async fn read<R>(
        &self,
        f: impl FnOnce(&Tables) -> Result<R, StoreError> + Send,
    ) -> Result<R, StoreError> {
        let tables = self.tables.lock().await;
        f(&tables)
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<R, StoreError> + Send,
    ) -> Result<R, StoreError> {
        let mut tables = self.tables.lock().await;
        let mut candidate = tables.clone();
        let out = f(&mut candidate)?;
        if let Some(persistence) = &self.persistence {
            persistence.save(&candidate)?;
        }
        *tables = candidate;
        Ok(out)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_session(
        &self,
        date: NaiveDate,
        name: Option<String>,
    ) -> Result<WorkoutSession, StoreError> {
        self.write(move |tables| Ok(tables.create_session(date, name))).await
    }

    async fn session(&self, id: WorkoutId) -> Result<WorkoutSession, StoreError> {
        self.read(|tables| tables.session(id).cloned()).await
    }

    async fn sessions(&self) -> Result<Vec<WorkoutSession>, StoreError> {
        self.read(|tables| Ok(tables.sessions.values().cloned().collect())).await
    }

    async fn in_progress_session(&self) -> Result<Option<WorkoutSession>, StoreError> {
        self.read(|tables| {
            Ok(tables
                .sessions
                .values()
                .rev()
                .find(|session| session.status() == SessionStatus::InProgress)
                .cloned())
        })
        .await
    }

    async fn delete_session(&self, id: WorkoutId) -> Result<(), StoreError> {
        self.write(|tables| tables.delete_session(id)).await
    }

    async fn complete_session(&self, id: WorkoutId) -> Result<WorkoutSession, StoreError> {
        self.write(|tables| {
            let session = tables.session_mut(id)?;
            session.set_status(SessionStatus::Completed);
            Ok(session.clone())
        })
        .await
    }

    async fn update_session(
        &self,
        id: WorkoutId,
        patch: &SessionPatch,
    ) -> Result<WorkoutSession, StoreError> {
        self.write(|tables| {
            let session = tables.session_mut(id)?;
            if let Some(duration) = patch.duration_seconds {
                session.set_duration_seconds(duration);
            }
            if let Some(intention) = &patch.intention {
                let trimmed = intention.trim();
                session.set_intention((!trimmed.is_empty()).then(|| trimmed.to_owned()));
            }
            if let Some(summary) = &patch.summary {
                session.set_summary(Some(summary.clone()));
            }
            Ok(session.clone())
        })
        .await
    }

    async fn exercises(&self) -> Result<Vec<Exercise>, StoreError> {
        self.read(|tables| Ok(tables.exercises.values().cloned().collect())).await
    }

    async fn get_or_create_exercise(&self, name: &str) -> Result<Exercise, StoreError> {
        self.write(|tables| tables.get_or_create_exercise(name)).await
    }

    async fn session_sets(&self, id: WorkoutId) -> Result<Vec<WorkoutSet>, StoreError> {
        self.read(|tables| tables.session_sets(id)).await
    }

    async fn add_sets(
        &self,
        session: WorkoutId,
        exercise: ExerciseId,
        set: &NewSet,
        count: u32,
    ) -> Result<Vec<WorkoutSet>, StoreError> {
        self.write(|tables| tables.add_sets(session, exercise, set, count)).await
    }

    async fn update_set(&self, id: SetId, update: &SetUpdate) -> Result<WorkoutSet, StoreError> {
        self.write(|tables| tables.update_set(id, update)).await
    }

    async fn delete_set(&self, id: SetId) -> Result<(), StoreError> {
        self.write(|tables| tables.delete_set(id)).await
    }

    async fn exercise_history(
        &self,
        exercise: ExerciseId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoricalSet>, StoreError> {
        self.read(|tables| Ok(tables.exercise_history(exercise, limit))).await
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.write(|tables| {
            *tables = Tables::default();
            Ok(())
        })
        .await
    }
}

fn write_atomic(path: &Path, contents: &[u8], durability: WriteDurability) -> Result<(), StoreError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return write_atomic_in(Path::new("."), path, contents, durability);
    };
    fs::create_dir_all(parent)
        .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
    write_atomic_in(parent, path, contents, durability)
}

fn write_atomic_in(
    parent: &Path,
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path = parent.join(format!(".liftsync.tmp.{}.{}", file_name.to_string_lossy(), nanos));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;

    file.write_all(contents).map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io { path: tmp_path.clone(), source })?;
    }
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io { path: path.to_path_buf(), source });
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent)
                .map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
            dir.sync_all().map_err(|source| StoreError::Io { path: parent.to_path_buf(), source })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
