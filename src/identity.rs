// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Backend id to client handle reconciliation.
//!
//! The map is owned by the coordinator's single writer path; nothing here is synchronized.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ExerciseHandle, ExerciseId, ExerciseTag, Handle, SetHandle, SetId, SetTag};

#[derive(Debug, Clone)]
struct KindMap<T, H> {
    by_backend: BTreeMap<T, Handle<H>>,
    by_handle: BTreeMap<Handle<H>, T>,
}

impl<T: Ord + Copy, H> Default for KindMap<T, H> {
    fn default() -> Self {
        Self { by_backend: BTreeMap::new(), by_handle: BTreeMap::new() }
    }
}

impl<T: Ord + Copy, H: Ord + Copy> KindMap<T, H> {
    fn resolve(&mut self, backend_id: T, next: &mut u64) -> Handle<H> {
        if let Some(handle) = self.by_backend.get(&backend_id) {
            return *handle;
        }
        *next += 1;
        let handle = Handle::from_raw(*next);
        self.by_backend.insert(backend_id, handle);
        self.by_handle.insert(handle, backend_id);
        handle
    }

    fn release(&mut self, backend_id: T) -> Option<Handle<H>> {
        let handle = self.by_backend.remove(&backend_id)?;
        self.by_handle.remove(&handle);
        Some(handle)
    }

    fn retain(&mut self, live: &BTreeSet<T>) -> usize {
        let before = self.by_backend.len();
        self.by_backend.retain(|id, _| live.contains(id));
        self.by_handle.retain(|_, id| live.contains(id));
        before - self.by_backend.len()
    }

    fn clear(&mut self) {
        self.by_backend.clear();
        self.by_handle.clear();
    }
}

/// Bidirectional mapping between volatile backend ids and stable client handles.
///
/// Handles come from one monotonic counter shared by both kinds, so a released handle is never
/// handed out again by the same map.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    exercises: KindMap<ExerciseId, ExerciseTag>,
    sets: KindMap<SetId, SetTag>,
    next: u64,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_exercise(&mut self, backend_id: ExerciseId) -> ExerciseHandle {
        self.exercises.resolve(backend_id, &mut self.next)
    }

    pub fn resolve_set(&mut self, backend_id: SetId) -> SetHandle {
        self.sets.resolve(backend_id, &mut self.next)
    }

    pub fn exercise_handle(&self, backend_id: ExerciseId) -> Option<ExerciseHandle> {
        self.exercises.by_backend.get(&backend_id).copied()
    }

    pub fn set_handle(&self, backend_id: SetId) -> Option<SetHandle> {
        self.sets.by_backend.get(&backend_id).copied()
    }

    pub fn exercise_id(&self, handle: ExerciseHandle) -> Option<ExerciseId> {
        self.exercises.by_handle.get(&handle).copied()
    }

    pub fn set_id(&self, handle: SetHandle) -> Option<SetId> {
        self.sets.by_handle.get(&handle).copied()
    }

    pub fn release_exercise(&mut self, backend_id: ExerciseId) -> Option<ExerciseHandle> {
        self.exercises.release(backend_id)
    }

    pub fn release_set(&mut self, backend_id: SetId) -> Option<SetHandle> {
        self.sets.release(backend_id)
    }

    /// Drops every mapping whose backend id is not in the given live sets. Returns the number
    /// of pruned entries.
    pub fn retain(
        &mut self,
        live_exercises: &BTreeSet<ExerciseId>,
        live_sets: &BTreeSet<SetId>,
    ) -> usize {
        self.exercises.retain(live_exercises) + self.sets.retain(live_sets)
    }

    /// Forgets all mappings. The handle counter keeps running.
    pub fn clear(&mut self) {
        self.exercises.clear();
        self.sets.clear();
    }

    pub fn exercise_count(&self) -> usize {
        self.exercises.by_backend.len()
    }

    pub fn set_count(&self) -> usize {
        self.sets.by_backend.len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::IdentityMap;
    use crate::model::{ExerciseId, SetId};

    #[test]
    fn resolve_is_stable_for_live_ids() {
        let mut map = IdentityMap::new();
        let first = map.resolve_set(SetId::new(10));
        let again = map.resolve_set(SetId::new(10));
        assert_eq!(first, again);
        assert_eq!(map.set_id(first), Some(SetId::new(10)));
    }

    #[test]
    fn released_handles_are_never_reused() {
        let mut map = IdentityMap::new();
        let old = map.resolve_exercise(ExerciseId::new(1));
        map.release_exercise(ExerciseId::new(1));
        let new = map.resolve_exercise(ExerciseId::new(1));
        assert_ne!(old, new);
        assert_eq!(map.exercise_id(old), None);
    }

    #[test]
    fn retain_prunes_absent_ids_only() {
        let mut map = IdentityMap::new();
        let kept = map.resolve_set(SetId::new(1));
        map.resolve_set(SetId::new(2));
        map.resolve_exercise(ExerciseId::new(7));

        let pruned = map.retain(&BTreeSet::new(), &BTreeSet::from([SetId::new(1)]));

        assert_eq!(pruned, 2);
        assert_eq!(map.set_handle(SetId::new(1)), Some(kept));
        assert_eq!(map.set_handle(SetId::new(2)), None);
        assert_eq!(map.exercise_count(), 0);
    }

    #[test]
    fn clear_keeps_counter_running() {
        let mut map = IdentityMap::new();
        let before = map.resolve_set(SetId::new(1));
        map.clear();
        let after = map.resolve_set(SetId::new(1));
        assert!(after > before);
    }
}
