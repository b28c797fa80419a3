// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const EMPTY_SESSION_MESSAGE: &str = "No exercises added yet.";
pub const EMPTY_SESSION_EMOJI: &str = "✨";

/// Human-facing summary of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub message: String,
    pub emoji: String,
}

impl WorkoutSummary {
    pub fn new(message: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self { message: message.into(), emoji: emoji.into() }
    }

    pub fn empty_session() -> Self {
        Self::new(EMPTY_SESSION_MESSAGE, EMPTY_SESSION_EMOJI)
    }
}

/// The typed form of the `summary` column on a session.
///
/// `fingerprint` records the session content the summary was generated for, so a stale summary
/// can be detected without asking the engine again. Older rows may lack it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSummary {
    pub message: String,
    pub emoji: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl CachedSummary {
    pub fn new(summary: WorkoutSummary, fingerprint: Option<String>) -> Self {
        Self { message: summary.message, emoji: summary.emoji, fingerprint }
    }

    pub fn parse(raw: &str) -> Result<Self, SummaryParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SummaryParseError::Empty);
        }
        serde_json::from_str(trimmed).map_err(|err| SummaryParseError::Malformed(err.to_string()))
    }

    pub fn encode(&self) -> String {
        // Only string fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn matches(&self, fingerprint: &str) -> bool {
        self.fingerprint.as_deref() == Some(fingerprint)
    }

    pub fn to_summary(&self) -> WorkoutSummary {
        WorkoutSummary::new(self.message.clone(), self.emoji.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryParseError {
    Empty,
    Malformed(String),
}

impl fmt::Display for SummaryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("summary is empty"),
            Self::Malformed(reason) => write!(f, "summary is not valid JSON: {reason}"),
        }
    }
}

impl std::error::Error for SummaryParseError {}
