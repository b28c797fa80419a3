// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Store entities (sessions, exercises, sets), the client-side session tree and the typed
//! payloads produced by the suggestion engine.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod ids;
pub mod snapshot;
pub mod suggestion;
pub mod summary;
pub mod tree;
pub mod workout;

pub use ids::{
    BackendId, ExerciseHandle, ExerciseId, ExerciseTag, Handle, HandleKind, HandleParseError,
    SetHandle, SetId, SetTag, WorkoutId, WorkoutTag,
};
pub use snapshot::Snapshot;
pub use suggestion::{Suggestion, SuggestionKind};
pub use summary::{CachedSummary, SummaryParseError, WorkoutSummary};
pub use tree::{ExerciseNode, SessionTree, SetNode};
pub use workout::{Exercise, SessionStatus, WorkoutSession, WorkoutSet};
