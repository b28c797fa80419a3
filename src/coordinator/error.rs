// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use crate::collab::CollaboratorError;
use crate::focus::FocusError;
use crate::model::WorkoutId;
use crate::ops::ApplyError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum CoreError {
    /// No active session, or the coordinator was torn down.
    BackendNotInitialized,
    SessionCompleted { workout_id: WorkoutId },
    /// The backend reported changes that do not fit the local tree. The tree was resynced.
    ProtocolViolation(ApplyError),
    /// A command names a set that is not in the session.
    UnresolvedReference { target: String },
    ClassifierFailure(CollaboratorError),
    SuggestionEngineFailure(CollaboratorError),
    StoreFailure(StoreError),
    Focus(FocusError),
    /// The detached task finishing a mutation was cancelled by runtime shutdown.
    Interrupted,
}

impl CoreError {
    /// Stable machine-readable name of the variant.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BackendNotInitialized => "backend_not_initialized",
            Self::SessionCompleted { .. } => "session_completed",
            Self::ProtocolViolation(_) => "protocol_violation",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::ClassifierFailure(_) => "classifier_failure",
            Self::SuggestionEngineFailure(_) => "suggestion_engine_failure",
            Self::StoreFailure(_) => "store_failure",
            Self::Focus(_) => "focus",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BackendNotInitialized => f.write_str("no active workout session"),
            Self::SessionCompleted { workout_id } => {
                write!(f, "workout {workout_id} is completed and can no longer change")
            }
            Self::ProtocolViolation(err) => write!(f, "backend change did not apply: {err}"),
            Self::UnresolvedReference { target } => {
                write!(f, "could not find a set matching {target:?}")
            }
            Self::ClassifierFailure(err) => write!(f, "classifier failed: {err}"),
            Self::SuggestionEngineFailure(err) => write!(f, "suggestion engine failed: {err}"),
            Self::StoreFailure(err) => write!(f, "store failed: {err}"),
            Self::Focus(err) => err.fmt(f),
            Self::Interrupted => f.write_str("mutation interrupted by shutdown"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ProtocolViolation(err) => Some(err),
            Self::ClassifierFailure(err) | Self::SuggestionEngineFailure(err) => Some(err),
            Self::StoreFailure(err) => Some(err),
            Self::Focus(err) => Some(err),
            Self::BackendNotInitialized
            | Self::SessionCompleted { .. }
            | Self::UnresolvedReference { .. }
            | Self::Interrupted => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        Self::StoreFailure(err)
    }
}

impl From<FocusError> for CoreError {
    fn from(err: FocusError) -> Self {
        Self::Focus(err)
    }
}
