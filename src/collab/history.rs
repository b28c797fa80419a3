// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{CollaboratorError, SuggestionEngine};
use crate::model::{
    Exercise, ExerciseId, Snapshot, Suggestion, SuggestionKind, WorkoutSet, WorkoutSummary,
};
use crate::store::{HistoricalSet, Store, StoreError};

const PROGRESSION_STEP_KG: f64 = 2.5;
const DEFAULT_REP_TARGET: u32 = 8;
const WORKING_SETS: usize = 3;
const COMPLETION_EXERCISES: usize = 4;
const COMPLETION_SETS: usize = 16;
/// RPE above which a set is too hard to progress from.
const PROGRESSION_RPE_CEILING: f64 = 8.5;

const STARTERS: &[&str] = &["Squat", "Bench Press", "Deadlift"];

/// Exercise name fragment and the accessory that pairs with it.
const ACCESSORIES: &[(&str, &str)] = &[
    ("bench", "Dumbbell Fly"),
    ("press", "Tricep Pushdown"),
    ("squat", "Walking Lunge"),
    ("deadlift", "Back Extension"),
    ("row", "Face Pull"),
    ("pull", "Bicep Curl"),
    ("chin", "Hammer Curl"),
];

/// Suggestion engine that reads past performance from the store.
pub struct HistoryEngine {
    store: Arc<dyn Store>,
    history_limit: usize,
}

impl HistoryEngine {
    pub fn new(store: Arc<dyn Store>, history_limit: usize) -> Self {
        Self { store, history_limit }
    }

    async fn past_sets(
        &self,
        snapshot: &Snapshot,
        exercise: ExerciseId,
    ) -> Result<Vec<HistoricalSet>, StoreError> {
        let current = snapshot.workout().backend_id();
        let history = self.store.exercise_history(exercise, Some(self.history_limit)).await?;
        Ok(history.into_iter().filter(|entry| entry.workout_id != current).collect())
    }

    async fn starters(&self, snapshot: &Snapshot) -> Result<Vec<Suggestion>, StoreError> {
        let catalog = self.store.exercises().await?;
        let names: Vec<String> = if catalog.is_empty() {
            STARTERS.iter().map(|name| (*name).to_owned()).collect()
        } else {
            catalog.iter().take(3).map(|exercise| exercise.name().to_owned()).collect()
        };
        let reasoning = match snapshot.workout().intention() {
            Some(intention) => format!("Nothing logged yet; today's focus is {intention}."),
            None => "Nothing logged yet.".to_owned(),
        };
        Ok(names
            .into_iter()
            .map(|name| {
                Suggestion::new(SuggestionKind::Exercise, format!("Start with {name}"))
                    .with_exercise(name)
                    .with_reasoning(reasoning.clone())
            })
            .collect())
    }
}

fn grouped(snapshot: &Snapshot) -> Vec<(&Exercise, Vec<&WorkoutSet>)> {
    let mut by_exercise: BTreeMap<ExerciseId, Vec<&WorkoutSet>> = BTreeMap::new();
    for set in snapshot.sets() {
        by_exercise.entry(set.exercise_backend_id()).or_default().push(set);
    }
    let mut groups: Vec<_> = by_exercise
        .into_iter()
        .filter_map(|(id, mut sets)| {
            sets.sort_by_key(|set| set.set_index());
            snapshot.exercise(id).map(|exercise| (exercise, sets))
        })
        .collect();
    groups.sort_by_key(|(exercise, _)| exercise.name().to_lowercase());
    groups
}

fn average(history: &[HistoricalSet]) -> Option<(f64, f64)> {
    if history.is_empty() {
        return None;
    }
    let n = history.len() as f64;
    let weight = history.iter().map(|entry| entry.set.weight()).sum::<f64>() / n;
    let reps = history.iter().map(|entry| f64::from(entry.set.reps())).sum::<f64>() / n;
    Some((weight, reps))
}

fn progression(exercise: &Exercise, sets: &[&WorkoutSet], past: Option<(f64, f64)>) -> Option<Suggestion> {
    let last = sets.last()?;
    if last.weight() <= 0.0 {
        return None;
    }
    let target = past.map_or(DEFAULT_REP_TARGET, |(_, reps)| reps.round().max(1.0) as u32);
    let easy_enough = last.rpe().map_or(true, |rpe| rpe <= PROGRESSION_RPE_CEILING);
    if last.reps() < target || !easy_enough {
        return None;
    }

    let next = last.weight() + PROGRESSION_STEP_KG;
    let reasoning = match past {
        Some((weight, reps)) => format!(
            "Last set hit {} reps; recent average is {weight:.1} kg x {reps:.1}.",
            last.reps()
        ),
        None => format!("Last set hit {} reps at {} kg.", last.reps(), last.weight()),
    };
    Some(
        Suggestion::new(SuggestionKind::Progression, format!("{} {next} kg", exercise.name()))
            .with_subtitle(format!("x {target}"))
            .with_exercise(exercise.name())
            .with_reasoning(reasoning),
    )
}

fn accessory(groups: &[(&Exercise, Vec<&WorkoutSet>)]) -> Option<Suggestion> {
    let logged = |name: &str| groups.iter().any(|(exercise, _)| exercise.name().eq_ignore_ascii_case(name));
    groups.iter().find_map(|(exercise, _)| {
        let lower = exercise.name().to_lowercase();
        ACCESSORIES
            .iter()
            .find(|(fragment, accessory)| lower.contains(fragment) && !logged(accessory))
            .map(|(_, accessory)| {
                Suggestion::new(SuggestionKind::Accessory, format!("Add {accessory}"))
                    .with_exercise(*accessory)
                    .with_reasoning(format!("Pairs well with {}.", exercise.name()))
            })
    })
}

fn store_failure(err: StoreError) -> CollaboratorError {
    CollaboratorError::Failed(err.to_string())
}

#[async_trait]
impl SuggestionEngine for HistoryEngine {
    async fn suggest(&self, snapshot: &Snapshot) -> Result<Vec<Suggestion>, CollaboratorError> {
        if snapshot.sets().is_empty() {
            return self.starters(snapshot).await.map_err(store_failure);
        }

        let groups = grouped(snapshot);
        let mut suggestions = Vec::new();
        for (exercise, sets) in &groups {
            let past = self.past_sets(snapshot, exercise.backend_id()).await.map_err(store_failure)?;
            suggestions.extend(progression(exercise, sets, average(&past)));
            if sets.len() < WORKING_SETS {
                suggestions.push(
                    Suggestion::new(SuggestionKind::Volume, format!("Another set of {}", exercise.name()))
                        .with_subtitle(format!("{} of {WORKING_SETS} working sets", sets.len()))
                        .with_exercise(exercise.name()),
                );
            }
        }
        suggestions.extend(accessory(&groups));

        if groups.len() >= COMPLETION_EXERCISES || snapshot.sets().len() >= COMPLETION_SETS {
            suggestions.push(
                Suggestion::new(SuggestionKind::Completion, "Wrap up the session")
                    .with_reasoning(format!(
                        "{} exercises and {} sets logged.",
                        groups.len(),
                        snapshot.sets().len()
                    )),
            );
        }

        tracing::debug!(
            workout_id = %snapshot.workout().backend_id(),
            count = suggestions.len(),
            "computed suggestions"
        );
        Ok(suggestions)
    }

    async fn summarize(&self, snapshot: &Snapshot) -> Result<WorkoutSummary, CollaboratorError> {
        if snapshot.sets().is_empty() {
            return Ok(WorkoutSummary::empty_session());
        }

        let groups = grouped(snapshot);
        let volume: f64 = snapshot.sets().iter().map(WorkoutSet::volume).sum();
        let details: Vec<String> = groups
            .iter()
            .map(|(exercise, sets)| {
                let n = sets.len() as f64;
                let weight = sets.iter().map(|set| set.weight()).sum::<f64>() / n;
                let reps = sets.iter().map(|set| f64::from(set.reps())).sum::<f64>() / n;
                format!("{}: {} sets, avg {weight:.1}kg x {reps:.0}", exercise.name(), sets.len())
            })
            .collect();

        let message = format!(
            "{} exercises, {} sets, {volume:.0} kg moved. {}",
            groups.len(),
            snapshot.sets().len(),
            details.join("; ")
        );
        let emoji = match snapshot.sets().len() {
            n if n >= COMPLETION_SETS => "🏆",
            n if n >= 8 => "💪",
            _ => "🔥",
        };
        Ok(WorkoutSummary::new(message, emoji))
    }
}
