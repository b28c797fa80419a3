// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpWorkout {
    pub workout_id: i64,
    pub status: String,
    /// ISO date (`YYYY-MM-DD`).
    pub date: String,
    pub name: Option<String>,
    pub intention: Option<String>,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpSet {
    pub set_handle: String,
    pub set_id: i64,
    /// 1-based position within the exercise.
    pub label: u32,
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpExercise {
    pub exercise_handle: String,
    pub exercise_id: i64,
    pub name: String,
    pub expanded: bool,
    pub sets: Vec<McpSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpFocus {
    pub active_exercise: Option<String>,
    pub active_set: Option<String>,
    pub rev: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViewResponse {
    pub revision: u64,
    pub workout: Option<McpWorkout>,
    pub exercises: Vec<McpExercise>,
    pub focus: McpFocus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct McpDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MutationResponse {
    pub applied: u64,
    pub delta: McpDelta,
    pub view: ViewResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetupStateResponse {
    pub ready: bool,
    pub in_progress: Option<McpWorkout>,
    pub view: ViewResponse,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddFromTextParams {
    /// Free text such as `bench 80x8` or `remove last set`.
    pub input: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateSetParams {
    pub set_handle: String,
    /// Exercise name to move the set to.
    #[serde(default)]
    pub exercise: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub reps: Option<u32>,
    #[serde(default)]
    pub rpe: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetHandleParams {
    pub set_handle: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExerciseHandleParams {
    pub exercise_handle: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WorkoutIdParams {
    pub workout_id: i64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateBlankParams {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateBlankResponse {
    pub had_existing: bool,
    pub view: ViewResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListWorkoutsResponse {
    pub workouts: Vec<McpWorkout>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RefreshResponse {
    pub drifted: bool,
    pub view: ViewResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpSuggestion {
    pub title: String,
    pub subtitle: Option<String>,
    pub kind: String,
    pub exercise_name: Option<String>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<McpSuggestion>,
    /// `hit`, `computed` or `joined`.
    pub source: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SummaryResponse {
    pub message: String,
    pub emoji: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ChangeIntentionParams {
    /// Empty clears the intention.
    pub intention: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateElapsedParams {
    pub seconds: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LiftsParams {
    pub exercise_id: i64,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LiftPoint {
    pub set_id: i64,
    pub workout_id: i64,
    pub date: String,
    pub weight: f64,
    pub reps: u32,
    pub rpe: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LiftsResponse {
    pub lifts: Vec<LiftPoint>,
}
