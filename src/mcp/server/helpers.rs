// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// MCP server helper functions:
/// error mapping, view/workout conversion and handle parsing.
fn core_error(err: CoreError) -> ErrorData {
    let data = Some(serde_json::json!({ "code": err.code() }));
    let message = err.to_string();
    match err {
        CoreError::BackendNotInitialized | CoreError::SessionCompleted { .. } => {
            ErrorData::invalid_request(message, data)
        }
        CoreError::UnresolvedReference { .. } | CoreError::Focus(_) => {
            ErrorData::resource_not_found(message, data)
        }
        CoreError::StoreFailure(ref store) if store.is_not_found() => {
            ErrorData::resource_not_found(message, data)
        }
        CoreError::StoreFailure(StoreError::InvalidInput { .. }) => {
            ErrorData::invalid_params(message, data)
        }
        CoreError::ProtocolViolation(_)
        | CoreError::ClassifierFailure(_)
        | CoreError::SuggestionEngineFailure(_)
        | CoreError::StoreFailure(_)
        | CoreError::Interrupted => ErrorData::internal_error(message, data),
    }
}

fn parse_set_handle(raw: &str) -> Result<SetHandle, ErrorData> {
    raw.parse().map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid set_handle: {err}"),
            Some(serde_json::json!({ "set_handle": raw })),
        )
    })
}

fn parse_exercise_handle(raw: &str) -> Result<ExerciseHandle, ErrorData> {
    raw.parse().map_err(|err| {
        ErrorData::invalid_params(
            format!("invalid exercise_handle: {err}"),
            Some(serde_json::json!({ "exercise_handle": raw })),
        )
    })
}

fn workout_info(workout: &WorkoutSession) -> McpWorkout {
    McpWorkout {
        workout_id: workout.backend_id().get(),
        status: workout.status().as_str().to_owned(),
        date: workout.date().to_string(),
        name: workout.name().map(str::to_owned),
        intention: workout.intention().map(str::to_owned),
        duration_seconds: workout.duration_seconds(),
    }
}

fn view_response(view: &SessionView) -> ViewResponse {
    let exercises = view
        .tree
        .exercises()
        .iter()
        .map(|exercise| McpExercise {
            exercise_handle: exercise.handle().to_string(),
            exercise_id: exercise.exercise().backend_id().get(),
            name: exercise.exercise().name().to_owned(),
            expanded: view.focus.is_expanded(exercise.handle()),
            sets: exercise
                .sets()
                .iter()
                .map(|node| McpSet {
                    set_handle: node.handle().to_string(),
                    set_id: node.set().backend_id().get(),
                    label: node.label(),
                    weight: node.set().weight(),
                    reps: node.set().reps(),
                    rpe: node.set().rpe(),
                    notes: node.set().notes().map(str::to_owned),
                })
                .collect(),
        })
        .collect();

    ViewResponse {
        revision: view.revision,
        workout: view.workout.as_ref().map(workout_info),
        exercises,
        focus: McpFocus {
            active_exercise: view.focus.active_exercise().map(|handle| handle.to_string()),
            active_set: view.focus.active_set().map(|handle| handle.to_string()),
            rev: view.focus.rev(),
        },
    }
}

fn entity_label(entity: &EntityRef) -> String {
    match entity {
        EntityRef::Exercise(handle) => handle.to_string(),
        EntityRef::Set(handle) => handle.to_string(),
    }
}

fn mutation_response(outcome: &MutationOutcome) -> MutationResponse {
    let labels = |entities: &[EntityRef]| entities.iter().map(entity_label).collect::<Vec<_>>();
    MutationResponse {
        applied: outcome.applied as u64,
        delta: McpDelta {
            added: labels(&outcome.delta.added),
            removed: labels(&outcome.delta.removed),
            updated: labels(&outcome.delta.updated),
        },
        view: view_response(&outcome.view),
    }
}

fn cache_source_label(source: CacheSource) -> &'static str {
    match source {
        CacheSource::Hit => "hit",
        CacheSource::Computed => "computed",
        CacheSource::Joined => "joined",
    }
}
