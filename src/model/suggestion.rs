// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What a suggestion proposes. The set is open: engines may emit kinds this crate does not
/// know about, which round-trip through [`SuggestionKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SuggestionKind {
    Exercise,
    Progression,
    Volume,
    Accessory,
    Completion,
    Other(String),
}

impl SuggestionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exercise => "exercise",
            Self::Progression => "progression",
            Self::Volume => "volume",
            Self::Accessory => "accessory",
            Self::Completion => "completion",
            Self::Other(kind) => kind,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exercise" => Self::Exercise,
            "progression" => Self::Progression,
            "volume" => Self::Volume,
            "accessory" => Self::Accessory,
            "completion" => Self::Completion,
            _ => Self::Other(raw.trim().to_owned()),
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SuggestionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SuggestionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|raw| Self::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub kind: SuggestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Suggestion {
    pub fn new(kind: SuggestionKind, title: impl Into<String>) -> Self {
        Self { title: title.into(), subtitle: None, kind, exercise_name: None, reasoning: None }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_exercise(mut self, exercise_name: impl Into<String>) -> Self {
        self.exercise_name = Some(exercise_name.into());
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}
