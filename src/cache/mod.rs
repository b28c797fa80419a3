// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Content-keyed, TTL-bounded suggestion cache.
//!
//! Entries are keyed by `(session, fingerprint)` with at most one live entry per session.
//! Concurrent requests for the same key share one computation. Each session carries a
//! generation counter bumped by [`SuggestionCache::invalidate`]; a computation that started
//! under an older generation still answers its waiters but is never stored.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;

use crate::model::WorkoutId;

mod fingerprint;

pub use fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// Served from a live entry.
    Hit,
    /// This caller ran the computation.
    Computed,
    /// Another caller's computation answered this one.
    Joined,
}

#[derive(Debug, Clone)]
pub struct Cached<V> {
    pub payload: Arc<V>,
    pub fingerprint: Fingerprint,
    pub source: CacheSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub joins: u64,
    pub stale_discarded: u64,
    pub failures: u64,
}

#[derive(Debug)]
struct CacheEntry<V> {
    fingerprint: Fingerprint,
    payload: Arc<V>,
    created_at: Instant,
    expires_at: Instant,
}

type FlightKey = (WorkoutId, Fingerprint, u64);
type FlightCell<V, E> = Arc<OnceCell<Result<Arc<V>, E>>>;

struct CacheState<V, E> {
    entries: HashMap<WorkoutId, CacheEntry<V>>,
    in_flight: HashMap<FlightKey, FlightCell<V, E>>,
    generations: HashMap<WorkoutId, u64>,
    stats: CacheStats,
}

impl<V, E> Default for CacheState<V, E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            generations: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<V, E> CacheState<V, E> {
    fn generation(&self, session: WorkoutId) -> u64 {
        self.generations.get(&session).copied().unwrap_or(0)
    }
}

pub struct SuggestionCache<V, E> {
    ttl: Duration,
    state: Mutex<CacheState<V, E>>,
}

impl<V, E: Clone> SuggestionCache<V, E> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, state: Mutex::new(CacheState::default()) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generation(&self, session: WorkoutId) -> u64 {
        self.lock().generation(session)
    }

    /// Like [`Self::get_or_compute_at`] with the session's current generation.
    pub async fn get_or_compute<F, Fut>(
        &self,
        session: WorkoutId,
        fingerprint: Fingerprint,
        compute: F,
    ) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let generation = self.generation(session);
        self.get_or_compute_at(session, fingerprint, generation, compute).await
    }

    /// Returns the live entry for `(session, fingerprint)` or computes it.
    ///
    /// `generation` is the generation the caller's inputs were read under. The result is
    /// stored only if it is still current when the computation finishes; errors are never
    /// stored.
    pub async fn get_or_compute_at<F, Fut>(
        &self,
        session: WorkoutId,
        fingerprint: Fingerprint,
        generation: u64,
        compute: F,
    ) -> Result<Cached<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = (session, fingerprint, generation);
        let cell = {
            let mut state = self.lock();
            if let Some(entry) = state.entries.get(&session) {
                if entry.fingerprint == fingerprint && Instant::now() < entry.expires_at {
                    let payload = Arc::clone(&entry.payload);
                    state.stats.hits += 1;
                    return Ok(Cached { payload, fingerprint, source: CacheSource::Hit });
                }
            }
            match state.in_flight.get(&key) {
                Some(cell) => {
                    let cell = Arc::clone(cell);
                    state.stats.joins += 1;
                    cell
                }
                None => {
                    let cell: FlightCell<V, E> = Arc::new(OnceCell::new());
                    state.in_flight.insert(key, Arc::clone(&cell));
                    state.stats.misses += 1;
                    cell
                }
            }
        };

        let mut ran = false;
        let ran_here = &mut ran;
        let result = cell
            .get_or_init(|| async move {
                *ran_here = true;
                compute().await.map(Arc::new)
            })
            .await
            .clone();

        let mut state = self.lock();
        if state.in_flight.get(&key).is_some_and(|current| Arc::ptr_eq(current, &cell)) {
            state.in_flight.remove(&key);
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                if ran {
                    state.stats.failures += 1;
                }
                return Err(err);
            }
        };

        if !ran {
            return Ok(Cached { payload, fingerprint, source: CacheSource::Joined });
        }

        if generation == state.generation(session) {
            let now = Instant::now();
            state.entries.insert(
                session,
                CacheEntry {
                    fingerprint,
                    payload: Arc::clone(&payload),
                    created_at: now,
                    expires_at: now + self.ttl,
                },
            );
        } else {
            state.stats.stale_discarded += 1;
        }

        Ok(Cached { payload, fingerprint, source: CacheSource::Computed })
    }

    /// Drops the session's entry and in-flight registrations and bumps its generation.
    /// Returns the new generation.
    pub fn invalidate(&self, session: WorkoutId) -> u64 {
        let mut state = self.lock();
        state.entries.remove(&session);
        state.in_flight.retain(|(flight_session, _, _), _| *flight_session != session);
        let generation = state.generations.entry(session).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Invalidates every session the cache has seen.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.in_flight.clear();
        for generation in state.generations.values_mut() {
            *generation += 1;
        }
    }

    /// Removes expired entries. Returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| now < entry.expires_at);
        before - state.entries.len()
    }

    /// Fingerprint and age of the session's live entry, if any.
    pub fn peek(&self, session: WorkoutId) -> Option<(Fingerprint, Duration)> {
        let now = Instant::now();
        let state = self.lock();
        state
            .entries
            .get(&session)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| (entry.fingerprint, now.duration_since(entry.created_at)))
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

#[cfg(test)]
mod tests;
