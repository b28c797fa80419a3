// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Executes classifier commands against the store and describes the outcome as modifications.
//!
//! Commands run in order. Each produced modification is applied to a scratch copy of the tree
//! so later commands in the same batch resolve descriptions like "last" against the sets
//! earlier commands created.

use crate::cache::Fingerprint;
use crate::collab::{Command, SetTarget};
use crate::identity::IdentityMap;
use crate::model::{
    CachedSummary, ExerciseNode, SessionTree, SetId, SetNode, WorkoutId, WorkoutSession,
    WorkoutSummary,
};
use crate::ops::{apply_modifications, Modification};
use crate::store::{NewSet, SessionPatch, SetUpdate, Store};

use super::CoreError;

const EXERCISE_MATCH_THRESHOLD: f64 = 0.8;

#[derive(Debug)]
pub(super) struct PipelineOutput {
    pub modifications: Vec<Modification>,
    /// Session row after intention or summary changes.
    pub workout: Option<WorkoutSession>,
}

#[derive(Debug)]
pub(super) struct PipelineFailure {
    pub error: CoreError,
    /// Some store write succeeded before the failure.
    pub wrote: bool,
}

pub(super) struct Pipeline<'a> {
    store: &'a dyn Store,
    workout: WorkoutSession,
    scratch: SessionTree,
    identity: IdentityMap,
    modifications: Vec<Modification>,
    workout_changed: bool,
    wrote: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn Store,
        workout: WorkoutSession,
        tree: &SessionTree,
        identity: &IdentityMap,
    ) -> Self {
        Self {
            store,
            workout,
            scratch: tree.clone(),
            identity: identity.clone(),
            modifications: Vec::new(),
            workout_changed: false,
            wrote: false,
        }
    }

    pub async fn run(mut self, commands: Vec<Command>) -> Result<PipelineOutput, PipelineFailure> {
        for command in commands {
            if let Err(error) = self.execute(command).await {
                return Err(PipelineFailure { error, wrote: self.wrote });
            }
        }
        Ok(PipelineOutput {
            modifications: self.modifications,
            workout: self.workout_changed.then_some(self.workout),
        })
    }

    fn workout_id(&self) -> WorkoutId {
        self.workout.backend_id()
    }

    async fn execute(&mut self, command: Command) -> Result<(), CoreError> {
        match command {
            Command::AddSet { exercise, weight, reps, rpe, set_count, original } => {
                let set = NewSet { weight, reps, rpe, notes: original };
                self.add(&exercise, &set, set_count).await
            }
            Command::Unknown { input } => {
                let name = input.trim().to_owned();
                let set = NewSet { weight: 0.0, reps: 0, rpe: None, notes: Some(name.clone()) };
                self.add(&name, &set, 1).await
            }
            Command::RemoveSet { target } => {
                let set_id = self.resolve(&target)?;
                self.store.delete_set(set_id).await?;
                self.wrote = true;
                tracing::debug!(set_id = %set_id, "removed set");
                self.record(Modification::SetRemoved { set_ids: vec![set_id] })
            }
            Command::EditSet { target, exercise, weight, reps, rpe } => {
                let set_id = self.resolve(&target)?;
                let moved_to = match exercise {
                    Some(name) => Some(self.store.get_or_create_exercise(&name).await?),
                    None => None,
                };
                let update = SetUpdate {
                    exercise: moved_to.as_ref().map(|exercise| exercise.backend_id()),
                    weight,
                    reps,
                    rpe,
                    notes: None,
                };
                let set = self.store.update_set(set_id, &update).await?;
                self.wrote = true;
                tracing::debug!(set_id = %set_id, "edited set");
                self.record(Modification::SetModified { exercise: moved_to, sets: vec![set] })
            }
            Command::ChangeIntention { intention } => {
                let patch = SessionPatch { intention: Some(intention), ..SessionPatch::default() };
                self.patch_session(&patch).await
            }
            Command::UpdateSummary { message, emoji } => {
                let fingerprint =
                    Fingerprint::of(self.workout_id(), self.workout.intention(), &self.scratch);
                let summary = CachedSummary::new(
                    WorkoutSummary::new(message, emoji),
                    Some(fingerprint.to_hex()),
                );
                let patch =
                    SessionPatch { summary: Some(summary.encode()), ..SessionPatch::default() };
                self.patch_session(&patch).await
            }
        }
    }

    async fn add(&mut self, name: &str, set: &NewSet, count: u32) -> Result<(), CoreError> {
        let exercise = self.store.get_or_create_exercise(name).await?;
        let sets = self
            .store
            .add_sets(self.workout_id(), exercise.backend_id(), set, count)
            .await?;
        self.wrote = true;
        tracing::debug!(exercise = %exercise.name(), count = sets.len(), "added sets");

        let modification = if self.scratch.exercise_by_id(exercise.backend_id()).is_some() {
            Modification::SetAdded { exercise: Some(exercise), sets }
        } else {
            Modification::ExerciseAdded { exercise, sets }
        };
        self.record(modification)
    }

    async fn patch_session(&mut self, patch: &SessionPatch) -> Result<(), CoreError> {
        self.workout = self.store.update_session(self.workout_id(), patch).await?;
        self.wrote = true;
        self.workout_changed = true;
        Ok(())
    }

    fn record(&mut self, modification: Modification) -> Result<(), CoreError> {
        apply_modifications(
            &mut self.scratch,
            &mut self.identity,
            std::slice::from_ref(&modification),
        )
        .map_err(CoreError::ProtocolViolation)?;
        self.modifications.push(modification);
        Ok(())
    }

    /// Resolves a target against the scratch tree. Ids that are not in the session are
    /// rejected before any store call.
    fn resolve(&self, target: &SetTarget) -> Result<SetId, CoreError> {
        let resolved = match target {
            SetTarget::Id(set_id) => self.scratch.set_by_id(*set_id).map(|_| *set_id),
            SetTarget::Description(description) => resolve_description(&self.scratch, description),
        };
        resolved.ok_or_else(|| CoreError::UnresolvedReference { target: target_label(target) })
    }
}

fn target_label(target: &SetTarget) -> String {
    match target {
        SetTarget::Id(set_id) => format!("#{set_id}"),
        SetTarget::Description(description) => description.clone(),
    }
}

const FILLER: &[&str] = &["the", "set", "my", "of", "a"];
const QUALIFIERS: &[&str] =
    &["last", "latest", "most", "recent", "second", "to", "penultimate", "that", "this", "it"];

/// Finds the set a free-text description points at.
///
/// "Most recent" means the highest backend id. A bare number counts back from the most recent
/// set; a number after an exercise name is the set's label within that exercise.
pub(super) fn resolve_description(tree: &SessionTree, description: &str) -> Option<SetId> {
    let lower = description.trim().to_lowercase();
    let words: Vec<&str> = lower
        .split_whitespace()
        .map(|word| word.trim_start_matches('#'))
        .filter(|word| !FILLER.contains(word))
        .collect();

    let second = lower.contains("second to last")
        || lower.contains("second last")
        || words.contains(&"penultimate");
    let latest = !second
        && words.iter().any(|word| matches!(*word, "last" | "latest" | "recent" | "that" | "this" | "it"));
    let number = words.iter().find_map(|word| word.parse::<usize>().ok());
    let name = words
        .iter()
        .filter(|word| !QUALIFIERS.contains(word) && word.parse::<usize>().is_err())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        let mut recent: Vec<&SetNode> = tree.sets().map(|(_, node)| node).collect();
        recent.sort_by_key(|node| std::cmp::Reverse(node.set().backend_id()));
        let index = if second {
            1
        } else if latest {
            0
        } else {
            number?.checked_sub(1)?
        };
        return recent.get(index).map(|node| node.set().backend_id());
    }

    let exercise = match_exercise(tree, &name)?;
    if let (Some(label), false, false) = (number, latest, second) {
        return exercise
            .sets()
            .iter()
            .find(|node| node.label() as usize == label)
            .map(|node| node.set().backend_id());
    }
    let mut recent: Vec<&SetNode> = exercise.sets().iter().collect();
    recent.sort_by_key(|node| std::cmp::Reverse(node.set().backend_id()));
    recent.get(usize::from(second)).map(|node| node.set().backend_id())
}

fn match_exercise<'t>(tree: &'t SessionTree, name: &str) -> Option<&'t ExerciseNode> {
    if let Some(exact) = tree.exercise_by_name(name) {
        return Some(exact);
    }
    let exercises = tree.exercises();
    if let Some(partial) = exercises
        .iter()
        .find(|node| node.exercise().name().to_lowercase().contains(name))
    {
        return Some(partial);
    }
    exercises
        .iter()
        .map(|node| {
            let candidate = node.exercise().name().to_lowercase();
            (rapidfuzz::fuzz::ratio(name.chars(), candidate.chars()), node)
        })
        .filter(|(score, _)| *score >= EXERCISE_MATCH_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, node)| node)
}
