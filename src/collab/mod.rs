// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! External collaborators of the coordinator.
//!
//! The classifier turns free text into commands or modifications; the suggestion engine turns
//! a session snapshot into suggestions and a summary. Both sit behind traits so deployments
//! can plug in model-backed implementations. [`RuleClassifier`] and [`HistoryEngine`] are the
//! bundled rule-based ones.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{SetId, Snapshot, Suggestion, WorkoutSummary};
use crate::ops::Modification;

mod history;
mod rules;

pub use history::HistoryEngine;
pub use rules::RuleClassifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    Timeout(Duration),
    Failed(String),
}

impl fmt::Display for CollaboratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(after) => write!(f, "timed out after {}s", after.as_secs_f64()),
            Self::Failed(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for CollaboratorError {}

/// How a command names the set it acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetTarget {
    Id(SetId),
    /// Free text such as "last", "second to last", "bench 2".
    Description(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    AddSet {
        exercise: String,
        weight: f64,
        reps: u32,
        #[serde(default)]
        rpe: Option<f64>,
        #[serde(default = "one")]
        set_count: u32,
        /// The text the command was parsed from, stored as the set's notes.
        #[serde(default)]
        original: Option<String>,
    },
    RemoveSet {
        target: SetTarget,
    },
    EditSet {
        target: SetTarget,
        #[serde(default)]
        exercise: Option<String>,
        #[serde(default)]
        weight: Option<f64>,
        #[serde(default)]
        reps: Option<u32>,
        #[serde(default)]
        rpe: Option<f64>,
    },
    ChangeIntention {
        intention: String,
    },
    UpdateSummary {
        message: String,
        emoji: String,
    },
    /// Input nothing else matched; recorded as a single set named after the text.
    Unknown {
        input: String,
    },
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// The classifier already persisted its changes; these describe them.
    Modifications(Vec<Modification>),
    Commands(Vec<Command>),
}

/// What the classifier may know about the session it classifies for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifyContext {
    pub selected_set_id: Option<SetId>,
    /// Sets in display order.
    pub visible_set_ids: Vec<SetId>,
    pub known_exercises: Vec<String>,
    pub intention: Option<String>,
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        input: &str,
        context: &ClassifyContext,
    ) -> Result<Classification, CollaboratorError>;
}

#[async_trait]
pub trait SuggestionEngine: Send + Sync {
    async fn suggest(&self, snapshot: &Snapshot) -> Result<Vec<Suggestion>, CollaboratorError>;

    async fn summarize(&self, snapshot: &Snapshot) -> Result<WorkoutSummary, CollaboratorError>;
}
