// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Rule-based classifier for terse gym shorthand.
//!
//! Understands inputs like `bench 80x8`, `3x5 squat 100`, `rows 60 for 10 @8`,
//! `remove last set`, `change bench 2 to 85x6` and `intention: heavy triples`. Several commands
//! may be chained with `;`, a newline or `then`.

use async_trait::async_trait;
use regex::{Captures, Regex, RegexBuilder};

use super::{Classification, Classifier, ClassifyContext, CollaboratorError, Command, SetTarget};
use crate::model::SetId;

const NUM: &str = r"\d+(?:\.\d+)?";

/// Common shorthands and their canonical exercise names.
const ALIASES: &[(&str, &str)] = &[
    ("bench", "Bench Press"),
    ("bp", "Bench Press"),
    ("incline", "Incline Bench Press"),
    ("squat", "Squat"),
    ("squats", "Squat"),
    ("dl", "Deadlift"),
    ("deads", "Deadlift"),
    ("rdl", "Romanian Deadlift"),
    ("rdls", "Romanian Deadlift"),
    ("ohp", "Overhead Press"),
    ("press", "Overhead Press"),
    ("row", "Barbell Row"),
    ("rows", "Barbell Row"),
    ("pullup", "Pull-up"),
    ("pullups", "Pull-up"),
    ("chinup", "Chin-up"),
    ("chinups", "Chin-up"),
    ("dips", "Dip"),
    ("curls", "Bicep Curl"),
    ("curl", "Bicep Curl"),
];

const FUZZY_THRESHOLD: f64 = 0.85;

pub struct RuleClassifier {
    splitter: Regex,
    intention: Regex,
    summary: Regex,
    remove: Regex,
    edit: Regex,
    sets_first: Regex,
    name_first: Regex,
    for_reps: Regex,
    reps_only: Regex,
    value_weight_reps: Regex,
    value_reps: Regex,
    value_rpe: Regex,
    value_weight: Regex,
    explicit_id: Regex,
}

fn pattern(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}

impl RuleClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        let rpe = format!(r"(?:\s*@\s*(?:rpe\s*)?(?P<rpe>{NUM}))?");
        let unit = r"\s*(?:kg|kgs|lb|lbs)?";
        Ok(Self {
            splitter: pattern(r"\s*(?:;|\n|\band then\b|\bthen\b)\s*")?,
            intention: pattern(
                r"^(?:(?:set|change)\s+(?:my\s+)?(?:intention|goal)\s+to\s+|(?:intention|goal)\s*[:=]\s*)(?P<text>.*)$",
            )?,
            summary: pattern(r"^summary\s*[:=]\s*(?P<text>.+)$")?,
            remove: pattern(
                r"^(?:remove|delete|undo|scratch)(?:\s+(?:the\s+)?(?P<target>.+?))?(?:\s+set)?$",
            )?,
            edit: pattern(
                r"^(?:change|make|edit|update)\s+(?:the\s+)?(?P<target>.+?)(?:\s+set)?\s+to\s+(?P<value>.+)$",
            )?,
            sets_first: pattern(&format!(
                r"^(?P<sets>\d+)\s*x\s*(?P<reps>\d+)\s+(?P<name>[a-z][a-z\s\-']*?)\s+(?:at\s+|@\s*)?(?P<weight>{NUM}){unit}{rpe}$"
            ))?,
            name_first: pattern(&format!(
                r"^(?P<name>[a-z][a-z\s\-']*?)\s+(?P<weight>{NUM}){unit}\s*(?:x|×)\s*(?P<reps>\d+)(?:\s*x\s*(?P<sets>\d+))?{rpe}$"
            ))?,
            for_reps: pattern(&format!(
                r"^(?P<name>[a-z][a-z\s\-']*?)\s+(?P<weight>{NUM}){unit}\s+for\s+(?P<reps>\d+)(?:\s*reps?)?{rpe}$"
            ))?,
            reps_only: pattern(r"^(?P<reps>\d+)\s+(?:reps?\s+(?:of\s+)?)?(?P<name>[a-z][a-z\s\-']*)$")?,
            value_weight_reps: pattern(&format!(
                r"^(?P<weight>{NUM}){unit}\s*(?:x|×|for)\s*(?P<reps>\d+)(?:\s*reps?)?{rpe}$"
            ))?,
            value_reps: pattern(r"^(?P<reps>\d+)\s*reps?$")?,
            value_rpe: pattern(&format!(r"^(?:rpe\s*|@\s*)(?P<rpe>{NUM})$"))?,
            value_weight: pattern(&format!(r"^(?P<weight>{NUM}){unit}$"))?,
            explicit_id: pattern(r"^(?:#|id\s*)(?P<id>\d+)$")?,
        })
    }

    /// Classifies every clause of `input`. Clauses nothing matches become [`Command::Unknown`].
    pub fn parse(&self, input: &str, context: &ClassifyContext) -> Vec<Command> {
        self.splitter
            .split(input.trim())
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(|clause| self.parse_clause(clause, context))
            .collect()
    }

    fn parse_clause(&self, clause: &str, context: &ClassifyContext) -> Command {
        if let Some(caps) = self.intention.captures(clause) {
            return Command::ChangeIntention { intention: caps["text"].trim().to_owned() };
        }
        if let Some(caps) = self.summary.captures(clause) {
            return Command::UpdateSummary {
                message: caps["text"].trim().to_owned(),
                emoji: "📝".to_owned(),
            };
        }
        if let Some(caps) = self.remove.captures(clause) {
            let target = caps.name("target").map_or("last", |m| m.as_str());
            return Command::RemoveSet { target: self.target(target, context) };
        }
        if let Some(caps) = self.edit.captures(clause) {
            return self.edit_command(&caps, context);
        }
        if let Some(command) = self.add_command(clause, context) {
            return command;
        }
        Command::Unknown { input: clause.to_owned() }
    }

    fn add_command(&self, clause: &str, context: &ClassifyContext) -> Option<Command> {
        let caps = self
            .sets_first
            .captures(clause)
            .or_else(|| self.name_first.captures(clause))
            .or_else(|| self.for_reps.captures(clause));

        if let Some(caps) = caps {
            return Some(Command::AddSet {
                exercise: canonical_exercise(&caps["name"], &context.known_exercises),
                weight: number(&caps, "weight")?,
                reps: caps["reps"].parse().ok()?,
                rpe: number(&caps, "rpe"),
                set_count: caps.name("sets").and_then(|m| m.as_str().parse().ok()).unwrap_or(1),
                original: Some(clause.to_owned()),
            });
        }

        let caps = self.reps_only.captures(clause)?;
        Some(Command::AddSet {
            exercise: canonical_exercise(&caps["name"], &context.known_exercises),
            weight: 0.0,
            reps: caps["reps"].parse().ok()?,
            rpe: None,
            set_count: 1,
            original: Some(clause.to_owned()),
        })
    }

    fn edit_command(&self, caps: &Captures<'_>, context: &ClassifyContext) -> Command {
        let target = self.target(&caps["target"], context);
        let value = caps["value"].trim();
        let (mut exercise, mut weight, mut reps, mut rpe) = (None, None, None, None);

        if let Some(v) = self.value_weight_reps.captures(value) {
            weight = number(&v, "weight");
            reps = v["reps"].parse().ok();
            rpe = number(&v, "rpe");
        } else if let Some(v) = self.value_reps.captures(value) {
            reps = v["reps"].parse().ok();
        } else if let Some(v) = self.value_rpe.captures(value) {
            rpe = number(&v, "rpe");
        } else if let Some(v) = self.value_weight.captures(value) {
            weight = number(&v, "weight");
        } else {
            exercise = Some(canonical_exercise(value, &context.known_exercises));
        }
        Command::EditSet { target, exercise, weight, reps, rpe }
    }

    fn target(&self, raw: &str, context: &ClassifyContext) -> SetTarget {
        let raw = raw.trim();
        if let Some(id) = self
            .explicit_id
            .captures(raw)
            .and_then(|caps| caps["id"].parse::<i64>().ok())
        {
            return SetTarget::Id(SetId::new(id));
        }
        let lower = raw.to_lowercase();
        if matches!(lower.as_str(), "that" | "this" | "it" | "selected") {
            if let Some(selected) = context.selected_set_id {
                return SetTarget::Id(selected);
            }
        }
        SetTarget::Description(raw.to_owned())
    }
}

#[async_trait]
impl Classifier for RuleClassifier {
    async fn classify(
        &self,
        input: &str,
        context: &ClassifyContext,
    ) -> Result<Classification, CollaboratorError> {
        let commands = self.parse(input, context);
        if commands.is_empty() {
            return Err(CollaboratorError::Failed("nothing to classify".to_owned()));
        }
        tracing::debug!(commands = commands.len(), "classified input");
        Ok(Classification::Commands(commands))
    }
}

fn number(caps: &Captures<'_>, name: &str) -> Option<f64> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

/// Maps user shorthand onto a known exercise name when one is close enough, otherwise onto the
/// alias table, otherwise title-cases the input.
fn canonical_exercise(raw: &str, known: &[String]) -> String {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = cleaned.to_lowercase();

    if let Some(exact) = known.iter().find(|name| name.to_lowercase() == lower) {
        return exact.clone();
    }
    if let Some((_, canonical)) = ALIASES.iter().find(|(alias, _)| *alias == lower) {
        if let Some(exact) = known.iter().find(|name| name.eq_ignore_ascii_case(canonical)) {
            return exact.clone();
        }
        return (*canonical).to_owned();
    }

    let best = known
        .iter()
        .map(|name| (rapidfuzz::fuzz::ratio(lower.chars(), name.to_lowercase().chars()), name))
        .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0));
    if let Some((_, name)) = best {
        return name.clone();
    }

    title_case(&cleaned)
}

fn title_case(raw: &str) -> String {
    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
