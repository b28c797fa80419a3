// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use crate::model::{SessionTree, WorkoutId};

const DOMAIN: &[u8] = b"liftsync-fp-v1";

/// Content digest of the inputs a suggestion depends on.
///
/// Covers the session id, the trimmed intention and, per exercise id, the sorted
/// `(weight, reps, rpe)` tuples. Display order, handles, labels and notes do not contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(blake3::Hash);

impl Fingerprint {
    pub fn of(workout_id: WorkoutId, intention: Option<&str>, tree: &SessionTree) -> Self {
        let mut exercises = tree
            .exercises()
            .iter()
            .map(|node| {
                let mut tuples = node
                    .sets()
                    .iter()
                    .map(|set| {
                        let set = set.set();
                        (float_bits(set.weight()), set.reps(), set.rpe().map(float_bits))
                    })
                    .collect::<Vec<_>>();
                tuples.sort_unstable();
                (node.exercise().backend_id().get(), tuples)
            })
            .collect::<Vec<_>>();
        exercises.sort_unstable_by_key(|(id, _)| *id);

        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN);
        hasher.update(&workout_id.get().to_le_bytes());

        let intention = intention.map(str::trim).unwrap_or_default();
        hasher.update(&(intention.len() as u64).to_le_bytes());
        hasher.update(intention.as_bytes());

        hasher.update(&(exercises.len() as u64).to_le_bytes());
        for (exercise_id, tuples) in &exercises {
            hasher.update(&exercise_id.to_le_bytes());
            hasher.update(&(tuples.len() as u64).to_le_bytes());
            for (weight, reps, rpe) in tuples {
                hasher.update(&weight.to_le_bytes());
                hasher.update(&reps.to_le_bytes());
                match rpe {
                    Some(bits) => {
                        hasher.update(&[1]);
                        hasher.update(&bits.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }

        Self(hasher.finalize())
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

// `-0.0` and `0.0` hash the same; NaN never reaches the store.
fn float_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::Fingerprint;
    use crate::identity::IdentityMap;
    use crate::model::fixtures::{exercise, set, snapshot};
    use crate::model::{SessionTree, WorkoutId};

    fn tree(sets: Vec<crate::model::WorkoutSet>) -> SessionTree {
        let snap = snapshot(vec![exercise(1, "Bench"), exercise(2, "Squat")], sets);
        SessionTree::from_snapshot(&snap, &mut IdentityMap::new())
    }

    #[test]
    fn insensitive_to_set_order_and_notes() {
        let a = tree(vec![set(10, 1, 80.0, 8, 1), set(11, 1, 85.0, 6, 2), set(20, 2, 100.0, 5, 1)]);
        let b = tree(vec![
            set(20, 2, 100.0, 5, 1),
            set(11, 1, 85.0, 6, 1).with_notes(Some("felt easy".into())),
            set(10, 1, 80.0, 8, 2),
        ]);
        let id = WorkoutId::new(1);
        assert_eq!(Fingerprint::of(id, None, &a), Fingerprint::of(id, None, &b));
    }

    #[test]
    fn sensitive_to_content_intention_and_session() {
        let base = tree(vec![set(10, 1, 80.0, 8, 1)]);
        let heavier = tree(vec![set(10, 1, 82.5, 8, 1)]);
        let with_rpe = tree(vec![set(10, 1, 80.0, 8, 1).with_rpe(Some(8.0))]);
        let id = WorkoutId::new(1);

        let fp = Fingerprint::of(id, None, &base);
        assert_ne!(fp, Fingerprint::of(id, None, &heavier));
        assert_ne!(fp, Fingerprint::of(id, None, &with_rpe));
        assert_ne!(fp, Fingerprint::of(id, Some("strength"), &base));
        assert_ne!(fp, Fingerprint::of(WorkoutId::new(2), None, &base));
        assert_eq!(fp, Fingerprint::of(id, Some("   "), &base));
    }

    #[test]
    fn hex_is_stable_length() {
        let fp = Fingerprint::of(WorkoutId::new(1), None, &SessionTree::new());
        assert_eq!(fp.to_hex().len(), 64);
        assert_eq!(fp.to_string(), fp.to_hex());
    }
}
