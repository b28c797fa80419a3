// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The session coordinator.
//!
//! Owns the active session's tree, identity map and focus. Mutations are serialized through
//! one writer lock; once a mutation starts writing to the store it finishes on a detached
//! task, so dropping the caller's future never leaves a half-applied command. Readers get
//! immutable [`SessionView`]s from a watch channel.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, OwnedMutexGuard};

use crate::cache::{Cached, SuggestionCache};
use crate::collab::{
    Classification, Classifier, ClassifyContext, CollaboratorError, Command, SetTarget,
    SuggestionEngine,
};
use crate::focus::FocusState;
use crate::identity::IdentityMap;
use crate::model::{
    CachedSummary, ExerciseHandle, ExerciseId, SessionTree, SetHandle, SetId, Snapshot,
    Suggestion, WorkoutId, WorkoutSession, WorkoutSummary,
};
use crate::ops::{apply_modifications, Modification};
use crate::store::{read_snapshot, HistoricalSet, SessionPatch, Store};

mod config;
mod error;
mod pipeline;
mod view;

pub use config::CoreConfig;
pub use error::CoreError;
pub use view::{MutationOutcome, RefreshReport, SessionView};

use pipeline::{Pipeline, PipelineFailure};

/// The collaborators a coordinator talks to.
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn Store>,
    pub classifier: Arc<dyn Classifier>,
    pub engine: Arc<dyn SuggestionEngine>,
}

/// Field changes for [`SessionCoordinator::update_set`]. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetEdit {
    pub exercise: Option<String>,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub rpe: Option<f64>,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    workout: WorkoutSession,
    tree: SessionTree,
}

#[derive(Debug, Default)]
struct CoordinatorState {
    active: Option<ActiveSession>,
    identity: IdentityMap,
    focus: FocusState,
    revision: u64,
    torn_down: bool,
}

impl CoordinatorState {
    fn ready(&self) -> Result<&ActiveSession, CoreError> {
        if self.torn_down {
            return Err(CoreError::BackendNotInitialized);
        }
        self.active.as_ref().ok_or(CoreError::BackendNotInitialized)
    }

    fn writable(&self) -> Result<&ActiveSession, CoreError> {
        let active = self.ready()?;
        if active.workout.is_completed() {
            return Err(CoreError::SessionCompleted { workout_id: active.workout.backend_id() });
        }
        Ok(active)
    }

    fn classify_context(&self, known_exercises: Vec<String>) -> ClassifyContext {
        let tree = self.active.as_ref().map(|active| &active.tree);
        ClassifyContext {
            selected_set_id: self.focus.active_set().and_then(|handle| self.identity.set_id(handle)),
            visible_set_ids: tree
                .map(|tree| tree.sets().map(|(_, node)| node.set().backend_id()).collect())
                .unwrap_or_default(),
            known_exercises,
            intention: self
                .active
                .as_ref()
                .and_then(|active| active.workout.intention().map(str::to_owned)),
        }
    }
}

struct Inner {
    backend: Backend,
    config: CoreConfig,
    state: Arc<Mutex<CoordinatorState>>,
    cache: SuggestionCache<Vec<Suggestion>, CollaboratorError>,
    views: watch::Sender<Arc<SessionView>>,
}

/// Cloneable handle to one coordinator.
#[derive(Clone)]
pub struct SessionCoordinator {
    inner: Arc<Inner>,
}

async fn bounded<T, F>(after: Duration, work: F) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, CollaboratorError>>,
{
    tokio::time::timeout(after, work)
        .await
        .map_err(|_| CollaboratorError::Timeout(after))?
}

/// Runs `work` on its own task and waits for it. Dropping the returned future does not cancel
/// the work.
async fn detached<T, F>(work: F) -> Result<T, CoreError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, CoreError>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => Err(CoreError::Interrupted),
    }
}

impl Inner {
    fn publish(&self, state: &mut CoordinatorState) -> Arc<SessionView> {
        state.revision = state.revision.wrapping_add(1);
        let workout = state.active.as_ref().map(|active| active.workout.clone());
        let cache_generation = workout
            .as_ref()
            .map_or(0, |workout| self.cache.generation(workout.backend_id()));
        let view = Arc::new(SessionView {
            revision: state.revision,
            workout,
            tree: state.active.as_ref().map(|active| active.tree.clone()).unwrap_or_default(),
            focus: state.focus.clone(),
            cache_generation,
        });
        self.views.send_replace(Arc::clone(&view));
        view
    }

    /// Makes `snapshot` the active session, keeping handles for ids that survive.
    fn install(&self, state: &mut CoordinatorState, snapshot: &Snapshot) {
        let tree = SessionTree::from_snapshot(snapshot, &mut state.identity);
        state.focus.reconcile(&tree);
        let workout = snapshot.workout().clone();
        self.cache.invalidate(workout.backend_id());
        state.active = Some(ActiveSession { workout, tree });
    }

    /// Replaces the tree with a fresh read of the store. Returns whether it differed.
    async fn resync(
        &self,
        state: &mut CoordinatorState,
        workout_id: WorkoutId,
    ) -> Result<bool, CoreError> {
        let snapshot = read_snapshot(self.backend.store.as_ref(), workout_id).await?;
        let before = state.active.as_ref().map(|active| active.tree.clone());
        self.install(state, &snapshot);
        let drifted = before.as_ref() != state.active.as_ref().map(|active| &active.tree);
        tracing::info!(workout_id = %workout_id, drifted, "resynced session from store");
        Ok(drifted)
    }

    /// Resyncs and publishes after a failed mutation. A failing re-read is logged so the
    /// caller still sees the original error.
    async fn resync_or_log(&self, state: &mut CoordinatorState, workout_id: WorkoutId) {
        match self.resync(state, workout_id).await {
            Ok(_) => {
                self.publish(state);
            }
            Err(err) => {
                self.cache.invalidate(workout_id);
                tracing::error!(workout_id = %workout_id, error = %err, "resync failed; tree may lag the store until refresh");
            }
        }
    }

    async fn commit(
        &self,
        state: &mut CoordinatorState,
        classification: Classification,
    ) -> Result<MutationOutcome, CoreError> {
        let active = state.writable()?.clone();
        let workout_id = active.workout.backend_id();

        let (modifications, workout) = match classification {
            Classification::Modifications(modifications) => (modifications, None),
            Classification::Commands(commands) => {
                let pipeline =
                    Pipeline::new(self.backend.store.as_ref(), active.workout, &active.tree, &state.identity);
                match pipeline.run(commands).await {
                    Ok(output) => (output.modifications, output.workout),
                    Err(PipelineFailure { error, wrote }) => {
                        if wrote {
                            tracing::warn!(workout_id = %workout_id, error = %error, "command batch failed after writing; resyncing");
                            self.resync_or_log(state, workout_id).await;
                        }
                        return Err(error);
                    }
                }
            }
        };

        self.apply(state, workout_id, &modifications, workout).await
    }

    async fn apply(
        &self,
        state: &mut CoordinatorState,
        workout_id: WorkoutId,
        modifications: &[Modification],
        workout: Option<WorkoutSession>,
    ) -> Result<MutationOutcome, CoreError> {
        let CoordinatorState { active, identity, focus, .. } = &mut *state;
        let Some(active) = active.as_mut() else {
            return Err(CoreError::BackendNotInitialized);
        };
        if let Some(workout) = workout {
            active.workout = workout;
        }

        let result = match apply_modifications(&mut active.tree, identity, modifications) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(workout_id = %workout_id, error = %err, "modifications rejected; resyncing");
                self.resync_or_log(state, workout_id).await;
                return Err(CoreError::ProtocolViolation(err));
            }
        };
        focus.reconcile(&active.tree);
        // The tree already holds the mutation; the cache must not outlive it.
        self.cache.invalidate(workout_id);

        if self.config.verify_after_apply {
            match self.verify(state, workout_id).await {
                Ok(true) => {
                    tracing::warn!(workout_id = %workout_id, "applied tree drifted from store; resynced");
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(workout_id = %workout_id, error = %err, "could not verify applied tree");
                }
            }
        }

        let view = self.publish(state);
        tracing::debug!(
            workout_id = %workout_id,
            applied = result.applied,
            revision = view.revision,
            "applied modifications"
        );
        Ok(MutationOutcome { view, applied: result.applied, delta: result.delta })
    }

    /// Rebuilds the tree from the store with a scratch identity map; adopts it on drift.
    async fn verify(
        &self,
        state: &mut CoordinatorState,
        workout_id: WorkoutId,
    ) -> Result<bool, CoreError> {
        let snapshot = read_snapshot(self.backend.store.as_ref(), workout_id).await?;
        let mut identity = state.identity.clone();
        let rebuilt = SessionTree::from_snapshot(&snapshot, &mut identity);
        let Some(active) = state.active.as_mut() else {
            return Ok(false);
        };
        if rebuilt == active.tree {
            return Ok(false);
        }
        active.tree = rebuilt;
        active.workout = snapshot.workout().clone();
        state.identity = identity;
        state.focus.reconcile(&active.tree);
        Ok(true)
    }

    fn deactivate(&self, state: &mut CoordinatorState) {
        if let Some(active) = state.active.take() {
            self.cache.invalidate(active.workout.backend_id());
        }
        state.identity.clear();
        state.focus.clear();
    }
}

impl SessionCoordinator {
    /// Builds a coordinator and loads the store's in-progress session, if any.
    pub async fn setup(backend: Backend, config: CoreConfig) -> Result<Self, CoreError> {
        let (views, _) = watch::channel(Arc::new(SessionView::default()));
        let inner = Arc::new(Inner {
            cache: SuggestionCache::new(config.suggestion_ttl),
            backend,
            config,
            state: Arc::new(Mutex::new(CoordinatorState::default())),
            views,
        });
        let coordinator = Self { inner };

        let resumed = match coordinator.in_progress_session().await {
            Some(workout) => {
                let store = coordinator.inner.backend.store.as_ref();
                match read_snapshot(store, workout.backend_id()).await {
                    Ok(snapshot) => Some(snapshot),
                    Err(err) => {
                        tracing::warn!(workout_id = %workout.backend_id(), error = %err, "could not load in-progress session");
                        None
                    }
                }
            }
            None => None,
        };

        {
            let mut state = coordinator.inner.state.lock().await;
            if let Some(snapshot) = &resumed {
                coordinator.inner.install(&mut state, snapshot);
                tracing::info!(workout_id = %snapshot.workout().backend_id(), "resumed in-progress session");
            }
            coordinator.inner.publish(&mut state);
        }
        Ok(coordinator)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    async fn writer(&self) -> OwnedMutexGuard<CoordinatorState> {
        Arc::clone(&self.inner.state).lock_owned().await
    }

    /// Classifies `input` and applies the outcome. Classification may be cancelled by dropping
    /// the future; store writes and the apply that follows always run to completion.
    pub async fn add_set_from_string(&self, input: &str) -> Result<MutationOutcome, CoreError> {
        let mut state = self.writer().await;
        state.writable()?;
        let catalog = self.inner.backend.store.exercises().await?;
        let context =
            state.classify_context(catalog.iter().map(|exercise| exercise.name().to_owned()).collect());

        let classification = bounded(
            self.inner.config.classifier_timeout,
            self.inner.backend.classifier.classify(input, &context),
        )
        .await
        .map_err(CoreError::ClassifierFailure)?;

        let inner = Arc::clone(&self.inner);
        detached(async move { inner.commit(&mut state, classification).await }).await
    }

    async fn run_commands(
        &self,
        mut state: OwnedMutexGuard<CoordinatorState>,
        commands: Vec<Command>,
    ) -> Result<MutationOutcome, CoreError> {
        state.writable()?;
        let inner = Arc::clone(&self.inner);
        detached(async move { inner.commit(&mut state, Classification::Commands(commands)).await })
            .await
    }

    fn set_id_of(state: &CoordinatorState, handle: SetHandle) -> Result<SetId, CoreError> {
        state
            .identity
            .set_id(handle)
            .ok_or_else(|| CoreError::UnresolvedReference { target: handle.to_string() })
    }

    pub async fn update_set(&self, set: SetHandle, edit: SetEdit) -> Result<MutationOutcome, CoreError> {
        let state = self.writer().await;
        state.writable()?;
        let set_id = Self::set_id_of(&state, set)?;
        let command = Command::EditSet {
            target: SetTarget::Id(set_id),
            exercise: edit.exercise,
            weight: edit.weight,
            reps: edit.reps,
            rpe: edit.rpe,
        };
        self.run_commands(state, vec![command]).await
    }

    pub async fn delete_set(&self, set: SetHandle) -> Result<MutationOutcome, CoreError> {
        let state = self.writer().await;
        state.writable()?;
        let set_id = Self::set_id_of(&state, set)?;
        self.run_commands(state, vec![Command::RemoveSet { target: SetTarget::Id(set_id) }]).await
    }

    /// Persists the intention. An empty string clears it.
    pub async fn change_intention(&self, intention: &str) -> Result<MutationOutcome, CoreError> {
        let state = self.writer().await;
        let command = Command::ChangeIntention { intention: intention.to_owned() };
        self.run_commands(state, vec![command]).await
    }

    pub async fn update_elapsed_time(&self, seconds: u64) -> Result<Arc<SessionView>, CoreError> {
        let mut state = self.writer().await;
        let workout_id = state.writable()?.workout.backend_id();
        let patch = SessionPatch { duration_seconds: Some(seconds), ..SessionPatch::default() };
        let workout = self.inner.backend.store.update_session(workout_id, &patch).await?;
        if let Some(active) = state.active.as_mut() {
            active.workout = workout;
        }
        Ok(self.inner.publish(&mut state))
    }

    /// Deletes a session and its sets. Deleting the active session deactivates it.
    pub async fn delete_workout(&self, workout_id: WorkoutId) -> Result<Arc<SessionView>, CoreError> {
        let mut state = self.writer().await;
        if state.torn_down {
            return Err(CoreError::BackendNotInitialized);
        }
        self.inner.backend.store.delete_session(workout_id).await?;
        if state.active.as_ref().is_some_and(|active| active.workout.backend_id() == workout_id) {
            self.inner.deactivate(&mut state);
        }
        tracing::info!(workout_id = %workout_id, "deleted workout");
        Ok(self.inner.publish(&mut state))
    }

    pub async fn set_active_session(&self, workout_id: WorkoutId) -> Result<Arc<SessionView>, CoreError> {
        let mut state = self.writer().await;
        if state.torn_down {
            return Err(CoreError::BackendNotInitialized);
        }
        let snapshot = read_snapshot(self.inner.backend.store.as_ref(), workout_id).await?;
        if snapshot.workout().is_completed() {
            return Err(CoreError::SessionCompleted { workout_id });
        }
        let switching = state.active.as_ref().map(|active| active.workout.backend_id()) != Some(workout_id);
        if switching {
            self.inner.deactivate(&mut state);
        }
        self.inner.install(&mut state, &snapshot);
        tracing::info!(workout_id = %workout_id, "activated session");
        Ok(self.inner.publish(&mut state))
    }

    /// Completes any in-progress session and starts an empty one dated today. The flag reports
    /// whether an in-progress session existed.
    pub async fn create_blank_session(
        &self,
        name: Option<String>,
    ) -> Result<(Arc<SessionView>, bool), CoreError> {
        let mut state = self.writer().await;
        if state.torn_down {
            return Err(CoreError::BackendNotInitialized);
        }
        let store = self.inner.backend.store.as_ref();

        let mut had_existing = false;
        while let Some(existing) = store.in_progress_session().await? {
            store.complete_session(existing.backend_id()).await?;
            had_existing = true;
        }
        self.inner.deactivate(&mut state);

        let workout = store.create_session(chrono::Local::now().date_naive(), name).await?;
        let snapshot = Snapshot::new(workout, Vec::new(), Vec::new());
        self.inner.install(&mut state, &snapshot);
        tracing::info!(workout_id = %snapshot.workout().backend_id(), had_existing, "created blank session");
        Ok((self.inner.publish(&mut state), had_existing))
    }

    /// Marks the active session completed and clears it with its focus.
    pub async fn complete_workout(&self) -> Result<Arc<SessionView>, CoreError> {
        let mut state = self.writer().await;
        let workout_id = state.writable()?.workout.backend_id();
        self.inner.backend.store.complete_session(workout_id).await?;
        self.inner.deactivate(&mut state);
        tracing::info!(workout_id = %workout_id, "completed workout");
        Ok(self.inner.publish(&mut state))
    }

    pub async fn reset_database(&self) -> Result<Arc<SessionView>, CoreError> {
        let mut state = self.writer().await;
        if state.torn_down {
            return Err(CoreError::BackendNotInitialized);
        }
        self.inner.backend.store.reset().await?;
        self.inner.deactivate(&mut state);
        self.inner.cache.clear();
        tracing::info!("reset database");
        Ok(self.inner.publish(&mut state))
    }

    /// Suggestions for the published view, served from the cache while the session is
    /// unchanged. Runs concurrently with mutations; a result computed across a mutation is
    /// returned but not cached.
    pub async fn get_suggestions(&self) -> Result<Cached<Vec<Suggestion>>, CoreError> {
        let view = self.view();
        let (Some(workout_id), Some(fingerprint), Some(snapshot)) =
            (view.workout_id(), view.fingerprint(), view.snapshot())
        else {
            return Err(CoreError::BackendNotInitialized);
        };

        let engine = Arc::clone(&self.inner.backend.engine);
        let timeout = self.inner.config.engine_timeout;
        self.inner
            .cache
            .get_or_compute_at(workout_id, fingerprint, view.cache_generation, || async move {
                bounded(timeout, engine.suggest(&snapshot)).await
            })
            .await
            .map_err(CoreError::SuggestionEngineFailure)
    }

    /// The persisted summary while it still matches the session, otherwise a fresh one from
    /// the engine, which is then persisted.
    pub async fn get_summary(&self) -> Result<WorkoutSummary, CoreError> {
        let view = self.view();
        let (Some(workout), Some(fingerprint), Some(snapshot)) =
            (view.workout.as_ref(), view.fingerprint(), view.snapshot())
        else {
            return Err(CoreError::BackendNotInitialized);
        };
        if view.tree.is_empty() {
            return Ok(WorkoutSummary::empty_session());
        }

        let fingerprint = fingerprint.to_hex();
        match workout.summary().map(CachedSummary::parse) {
            Some(Ok(cached)) if cached.matches(&fingerprint) => return Ok(cached.to_summary()),
            Some(Ok(_)) | None => {}
            Some(Err(err)) => {
                tracing::warn!(workout_id = %workout.backend_id(), error = %err, "ignoring unreadable summary");
            }
        }

        let summary = bounded(
            self.inner.config.engine_timeout,
            self.inner.backend.engine.summarize(&snapshot),
        )
        .await
        .map_err(CoreError::SuggestionEngineFailure)?;

        let mut state = self.writer().await;
        let still_current = state.active.as_ref().is_some_and(|active| {
            active.workout.backend_id() == workout.backend_id() && active.tree == view.tree
        });
        if still_current {
            let encoded = CachedSummary::new(summary.clone(), Some(fingerprint)).encode();
            let patch = SessionPatch { summary: Some(encoded), ..SessionPatch::default() };
            let updated = self.inner.backend.store.update_session(workout.backend_id(), &patch).await?;
            if let Some(active) = state.active.as_mut() {
                active.workout = updated;
            }
            self.inner.publish(&mut state);
        }
        Ok(summary)
    }

    /// Historical sets of an exercise, most recent first.
    pub async fn get_lifts(
        &self,
        exercise: ExerciseId,
        limit: Option<usize>,
    ) -> Result<Vec<HistoricalSet>, CoreError> {
        Ok(self.inner.backend.store.exercise_history(exercise, limit).await?)
    }

    /// All sessions, newest first.
    pub async fn fetch_all_sessions(&self) -> Result<Vec<WorkoutSession>, CoreError> {
        let mut sessions = self.inner.backend.store.sessions().await?;
        sessions.sort_by(|a, b| {
            b.date().cmp(&a.date()).then_with(|| b.backend_id().cmp(&a.backend_id()))
        });
        Ok(sessions)
    }

    /// Full read of the active session from the store.
    pub async fn snapshot(&self) -> Result<Snapshot, CoreError> {
        let workout_id = self.view().workout_id().ok_or(CoreError::BackendNotInitialized)?;
        Ok(read_snapshot(self.inner.backend.store.as_ref(), workout_id).await?)
    }

    /// Rebuilds the tree from a fresh store read, preserving handles of surviving ids.
    pub async fn refresh(&self) -> Result<RefreshReport, CoreError> {
        let mut state = self.writer().await;
        let workout_id = state.ready()?.workout.backend_id();
        let drifted = self.inner.resync(&mut state, workout_id).await?;
        if drifted {
            tracing::warn!(workout_id = %workout_id, "session drifted from store");
        }
        Ok(RefreshReport { view: self.inner.publish(&mut state), drifted })
    }

    pub fn view(&self) -> Arc<SessionView> {
        Arc::clone(&self.inner.views.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionView>> {
        self.inner.views.subscribe()
    }

    /// Best-effort lookup; store failures read as "none".
    pub async fn in_progress_session(&self) -> Option<WorkoutSession> {
        match self.inner.backend.store.in_progress_session().await {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(error = %err, "in-progress session lookup failed");
                None
            }
        }
    }

    pub async fn select_set(&self, set: SetHandle) -> Result<Arc<SessionView>, CoreError> {
        let mut state = self.writer().await;
        let CoordinatorState { active, focus, torn_down, .. } = &mut *state;
        let active = active.as_ref().filter(|_| !*torn_down).ok_or(CoreError::BackendNotInitialized)?;
        focus.select_set(&active.tree, set)?;
        Ok(self.inner.publish(&mut state))
    }

    /// Flips the exercise's expansion. The view's focus reports the new state.
    pub async fn toggle_expanded(&self, exercise: ExerciseHandle) -> Result<Arc<SessionView>, CoreError> {
        let mut state = self.writer().await;
        let CoordinatorState { active, focus, torn_down, .. } = &mut *state;
        let active = active.as_ref().filter(|_| !*torn_down).ok_or(CoreError::BackendNotInitialized)?;
        focus.toggle_expanded(&active.tree, exercise)?;
        Ok(self.inner.publish(&mut state))
    }

    /// Stops the coordinator. Later calls fail with [`CoreError::BackendNotInitialized`].
    pub async fn teardown(&self) {
        let mut state = self.writer().await;
        self.inner.deactivate(&mut state);
        self.inner.cache.clear();
        state.torn_down = true;
        self.inner.publish(&mut state);
        tracing::info!("coordinator torn down");
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.inner.cache.stats()
    }

    /// Applies modifications the backend already persisted, as delivered by a push channel.
    pub async fn apply_remote(&self, modifications: Vec<Modification>) -> Result<MutationOutcome, CoreError> {
        let mut state = self.writer().await;
        state.writable()?;
        let inner = Arc::clone(&self.inner);
        detached(async move {
            inner.commit(&mut state, Classification::Modifications(modifications)).await
        })
        .await
    }
}
