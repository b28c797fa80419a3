// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};

use crate::cache::CacheSource;
use crate::coordinator::{CoreError, MutationOutcome, SessionCoordinator, SessionView, SetEdit};
use crate::model::{ExerciseHandle, ExerciseId, SetHandle, WorkoutId, WorkoutSession};
use crate::ops::EntityRef;
use crate::store::StoreError;

use super::types::*;

#[derive(Clone)]
pub struct LiftsyncMcp {
    coordinator: SessionCoordinator,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LiftsyncMcp {
    pub fn new(coordinator: SessionCoordinator) -> Self {
        Self { coordinator, tool_router: Self::tool_router() }
    }

    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.coordinator
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    #[tool(name = "workout.setup_state")]
    async fn workout_setup_state(&self) -> Result<Json<SetupStateResponse>, ErrorData> {
        let view = self.coordinator.view();
        let in_progress = self.coordinator.in_progress_session().await;
        Ok(Json(SetupStateResponse {
            ready: view.workout.is_some(),
            in_progress: in_progress.as_ref().map(workout_info),
            view: view_response(&view),
        }))
    }

    #[tool(name = "workout.add_from_text")]
    async fn workout_add_from_text(
        &self,
        params: Parameters<AddFromTextParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let AddFromTextParams { input } = params.0;
        if input.trim().is_empty() {
            return Err(ErrorData::invalid_params("input must not be empty", None));
        }
        let outcome = self.coordinator.add_set_from_string(&input).await.map_err(core_error)?;
        Ok(Json(mutation_response(&outcome)))
    }

    #[tool(name = "workout.update_set")]
    async fn workout_update_set(
        &self,
        params: Parameters<UpdateSetParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let UpdateSetParams { set_handle, exercise, weight, reps, rpe } = params.0;
        let handle = parse_set_handle(&set_handle)?;
        let edit = SetEdit { exercise, weight, reps, rpe };
        if edit == SetEdit::default() {
            return Err(ErrorData::invalid_params(
                "nothing to update",
                Some(serde_json::json!({ "set_handle": set_handle })),
            ));
        }
        let outcome = self.coordinator.update_set(handle, edit).await.map_err(core_error)?;
        Ok(Json(mutation_response(&outcome)))
    }

    #[tool(name = "workout.delete_set")]
    async fn workout_delete_set(
        &self,
        params: Parameters<SetHandleParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let handle = parse_set_handle(&params.0.set_handle)?;
        let outcome = self.coordinator.delete_set(handle).await.map_err(core_error)?;
        Ok(Json(mutation_response(&outcome)))
    }

    #[tool(name = "workout.delete")]
    async fn workout_delete(
        &self,
        params: Parameters<WorkoutIdParams>,
    ) -> Result<Json<ViewResponse>, ErrorData> {
        let view = self
            .coordinator
            .delete_workout(WorkoutId::new(params.0.workout_id))
            .await
            .map_err(core_error)?;
        Ok(Json(view_response(&view)))
    }

    #[tool(name = "workout.open")]
    async fn workout_open(
        &self,
        params: Parameters<WorkoutIdParams>,
    ) -> Result<Json<ViewResponse>, ErrorData> {
        let view = self
            .coordinator
            .set_active_session(WorkoutId::new(params.0.workout_id))
            .await
            .map_err(core_error)?;
        Ok(Json(view_response(&view)))
    }

    #[tool(name = "workout.create_blank")]
    async fn workout_create_blank(
        &self,
        params: Parameters<CreateBlankParams>,
    ) -> Result<Json<CreateBlankResponse>, ErrorData> {
        let (view, had_existing) =
            self.coordinator.create_blank_session(params.0.name).await.map_err(core_error)?;
        Ok(Json(CreateBlankResponse { had_existing, view: view_response(&view) }))
    }

    #[tool(name = "workout.complete")]
    async fn workout_complete(&self) -> Result<Json<ViewResponse>, ErrorData> {
        let view = self.coordinator.complete_workout().await.map_err(core_error)?;
        Ok(Json(view_response(&view)))
    }

    #[tool(name = "workout.reset")]
    async fn workout_reset(&self) -> Result<Json<ViewResponse>, ErrorData> {
        let view = self.coordinator.reset_database().await.map_err(core_error)?;
        Ok(Json(view_response(&view)))
    }

    #[tool(name = "workout.list")]
    async fn workout_list(&self) -> Result<Json<ListWorkoutsResponse>, ErrorData> {
        let sessions = self.coordinator.fetch_all_sessions().await.map_err(core_error)?;
        Ok(Json(ListWorkoutsResponse { workouts: sessions.iter().map(workout_info).collect() }))
    }

    #[tool(name = "workout.view")]
    async fn workout_view(&self) -> Result<Json<ViewResponse>, ErrorData> {
        Ok(Json(view_response(&self.coordinator.view())))
    }

    #[tool(name = "workout.refresh")]
    async fn workout_refresh(&self) -> Result<Json<RefreshResponse>, ErrorData> {
        let report = self.coordinator.refresh().await.map_err(core_error)?;
        Ok(Json(RefreshResponse { drifted: report.drifted, view: view_response(&report.view) }))
    }

    #[tool(name = "workout.suggestions")]
    async fn workout_suggestions(&self) -> Result<Json<SuggestionsResponse>, ErrorData> {
        let cached = self.coordinator.get_suggestions().await.map_err(core_error)?;
        let suggestions = cached
            .payload
            .iter()
            .map(|suggestion| McpSuggestion {
                title: suggestion.title.clone(),
                subtitle: suggestion.subtitle.clone(),
                kind: suggestion.kind.as_str().to_owned(),
                exercise_name: suggestion.exercise_name.clone(),
                reasoning: suggestion.reasoning.clone(),
            })
            .collect();
        Ok(Json(SuggestionsResponse {
            suggestions,
            source: cache_source_label(cached.source).to_owned(),
            fingerprint: cached.fingerprint.to_hex(),
        }))
    }

    #[tool(name = "workout.summary")]
    async fn workout_summary(&self) -> Result<Json<SummaryResponse>, ErrorData> {
        let summary = self.coordinator.get_summary().await.map_err(core_error)?;
        Ok(Json(SummaryResponse { message: summary.message, emoji: summary.emoji }))
    }

    #[tool(name = "workout.change_intention")]
    async fn workout_change_intention(
        &self,
        params: Parameters<ChangeIntentionParams>,
    ) -> Result<Json<MutationResponse>, ErrorData> {
        let outcome =
            self.coordinator.change_intention(&params.0.intention).await.map_err(core_error)?;
        Ok(Json(mutation_response(&outcome)))
    }

    #[tool(name = "workout.update_elapsed")]
    async fn workout_update_elapsed(
        &self,
        params: Parameters<UpdateElapsedParams>,
    ) -> Result<Json<ViewResponse>, ErrorData> {
        let view =
            self.coordinator.update_elapsed_time(params.0.seconds).await.map_err(core_error)?;
        Ok(Json(view_response(&view)))
    }

    #[tool(name = "exercise.lifts")]
    async fn exercise_lifts(
        &self,
        params: Parameters<LiftsParams>,
    ) -> Result<Json<LiftsResponse>, ErrorData> {
        let LiftsParams { exercise_id, limit } = params.0;
        let history = self
            .coordinator
            .get_lifts(ExerciseId::new(exercise_id), limit.map(|limit| limit as usize))
            .await
            .map_err(core_error)?;
        let lifts = history
            .iter()
            .map(|entry| LiftPoint {
                set_id: entry.set.backend_id().get(),
                workout_id: entry.workout_id.get(),
                date: entry.date.to_string(),
                weight: entry.set.weight(),
                reps: entry.set.reps(),
                rpe: entry.set.rpe(),
            })
            .collect();
        Ok(Json(LiftsResponse { lifts }))
    }

    #[tool(name = "focus.select_set")]
    async fn focus_select_set(
        &self,
        params: Parameters<SetHandleParams>,
    ) -> Result<Json<ViewResponse>, ErrorData> {
        let handle = parse_set_handle(&params.0.set_handle)?;
        let view = self.coordinator.select_set(handle).await.map_err(core_error)?;
        Ok(Json(view_response(&view)))
    }

    #[tool(name = "focus.toggle_expanded")]
    async fn focus_toggle_expanded(
        &self,
        params: Parameters<ExerciseHandleParams>,
    ) -> Result<Json<ViewResponse>, ErrorData> {
        let handle = parse_exercise_handle(&params.0.exercise_handle)?;
        let view = self.coordinator.toggle_expanded(handle).await.map_err(core_error)?;
        Ok(Json(view_response(&view)))
    }
}

#[tool_handler]
impl ServerHandler for LiftsyncMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "liftsync workout session server (tools: workout.setup_state, workout.add_from_text, workout.update_set, workout.delete_set, workout.delete, workout.open, workout.create_blank, workout.complete, workout.reset, workout.list, workout.view, workout.refresh, workout.suggestions, workout.summary, workout.change_intention, workout.update_elapsed, exercise.lifts, focus.select_set, focus.toggle_expanded)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Extracted mapping/parsing helpers for MCP tool handlers.
include!("server/helpers.rs");
