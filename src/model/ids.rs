// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Numeric identifier assigned by the backing store.
///
/// Backend ids are authoritative but volatile from the client's point of view: they may be
/// renumbered by a reset, and they carry no display ordering. Anything the UI keys on should use
/// a [`Handle`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendId<T> {
    value: i64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BackendId<T> {
    pub const fn new(value: i64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub const fn get(self) -> i64 {
        self.value
    }
}

impl<T> fmt::Display for BackendId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<i64> for BackendId<T> {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for BackendId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value)
    }
}

impl<'de, T> Deserialize<'de> for BackendId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::new)
    }
}

/// Entity kinds that can be addressed by a client handle.
pub trait HandleKind {
    const PREFIX: &'static str;
}

/// Stable, client-private identity for an exercise or set.
///
/// Handles are allocated by the identity map on first sighting of a backend id and never reused
/// by the same map, so animation keys and selection survive snapshot refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle<T> {
    value: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) const fn from_raw(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub const fn raw(self) -> u64 {
        self.value
    }
}

impl<T: HandleKind> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", T::PREFIX, self.value)
    }
}

impl<T: HandleKind> FromStr for Handle<T> {
    type Err = HandleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(raw) = s
            .strip_prefix(T::PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
        else {
            return Err(HandleParseError::WrongKind {
                expected: T::PREFIX,
            });
        };
        raw.parse::<u64>()
            .map(Self::from_raw)
            .map_err(|_| HandleParseError::NotANumber)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleParseError {
    WrongKind { expected: &'static str },
    NotANumber,
}

impl fmt::Display for HandleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongKind { expected } => write!(f, "handle must start with '{expected}-'"),
            Self::NotANumber => f.write_str("handle suffix must be a number"),
        }
    }
}

impl std::error::Error for HandleParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkoutTag {}
pub type WorkoutId = BackendId<WorkoutTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExerciseTag {}
pub type ExerciseId = BackendId<ExerciseTag>;
pub type ExerciseHandle = Handle<ExerciseTag>;

impl HandleKind for ExerciseTag {
    const PREFIX: &'static str = "ex";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SetTag {}
pub type SetId = BackendId<SetTag>;
pub type SetHandle = Handle<SetTag>;

impl HandleKind for SetTag {
    const PREFIX: &'static str = "set";
}
