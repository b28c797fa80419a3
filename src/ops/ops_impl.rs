// SPDX-FileCopyrightText: 2026 The liftsync authors
// SPDX-License-Identifier: LicenseRef-Liftsync-Proprietary
//
// All rights reserved.
//
// This file is part of liftsync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Tree mutation helpers used by `apply_modifications`.
/// Keeps `ops::mod` focused on the protocol types and orchestration.
fn apply_modification(
    tree: &mut SessionTree,
    identity: &mut IdentityMap,
    modification: &Modification,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    match modification {
        Modification::SetAdded { exercise, sets } => {
            for set in sets {
                upsert_set(tree, identity, exercise.as_ref(), set, delta)?;
            }
            Ok(())
        }
        Modification::SetModified { exercise, sets } => {
            for set in sets {
                let Some((ex_pos, set_pos)) = tree.locate_set(set.backend_id()) else {
                    return Err(ApplyError::MissingSet { set_id: set.backend_id() });
                };
                replace_set(tree, identity, exercise.as_ref(), set, (ex_pos, set_pos), delta)?;
            }
            Ok(())
        }
        Modification::SetRemoved { set_ids } => {
            for set_id in set_ids {
                remove_set(tree, identity, *set_id, delta);
            }
            Ok(())
        }
        Modification::ExerciseAdded { exercise, sets } => {
            if let Some(stray) =
                sets.iter().find(|set| set.exercise_backend_id() != exercise.backend_id())
            {
                return Err(ApplyError::ExerciseMismatch {
                    exercise_id: exercise.backend_id(),
                    set_id: stray.backend_id(),
                    set_exercise_id: stray.exercise_backend_id(),
                });
            }
            for set in sets {
                upsert_set(tree, identity, Some(exercise), set, delta)?;
            }
            Ok(())
        }
    }
}

/// Appends `set`, or overwrites it in place when it is already present (duplicate delivery).
fn upsert_set(
    tree: &mut SessionTree,
    identity: &mut IdentityMap,
    inline: Option<&Exercise>,
    set: &WorkoutSet,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    if let Some(location) = tree.locate_set(set.backend_id()) {
        return replace_set(tree, identity, inline, set, location, delta);
    }

    let position = ensure_parent(tree, identity, inline, set, delta)?;
    let handle = identity.resolve_set(set.backend_id());
    tree.exercise_at_mut(position).sets_mut().push(SetNode::new(handle, set.clone()));
    delta.record_added(EntityRef::Set(handle));
    relabel_at(tree, position, delta);
    Ok(())
}

fn replace_set(
    tree: &mut SessionTree,
    identity: &mut IdentityMap,
    inline: Option<&Exercise>,
    set: &WorkoutSet,
    (ex_pos, set_pos): (usize, usize),
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    let current_parent = tree.exercises()[ex_pos].exercise().backend_id();

    if current_parent == set.exercise_backend_id() {
        let node = &mut tree.exercise_at_mut(ex_pos).sets_mut()[set_pos];
        *node.set_mut() = set.clone();
        delta.record_updated(EntityRef::Set(node.handle()));
        relabel_at(tree, ex_pos, delta);
        return Ok(());
    }

    // Moved to another exercise: the node keeps its handle.
    let node = tree.exercise_at_mut(ex_pos).sets_mut().remove(set_pos);
    let handle = node.handle();
    let target = ensure_parent(tree, identity, inline, set, delta)?;
    tree.exercise_at_mut(target).sets_mut().push(SetNode::new(handle, set.clone()));
    delta.record_updated(EntityRef::Set(handle));
    relabel_at(tree, target, delta);
    prune_or_relabel(tree, identity, current_parent, delta);
    Ok(())
}

fn remove_set(
    tree: &mut SessionTree,
    identity: &mut IdentityMap,
    set_id: SetId,
    delta: &mut DeltaBuilder,
) {
    let Some((ex_pos, set_pos)) = tree.locate_set(set_id) else {
        // Already gone; replaying a removal is a no-op.
        return;
    };
    let parent = tree.exercises()[ex_pos].exercise().backend_id();
    let node = tree.exercise_at_mut(ex_pos).sets_mut().remove(set_pos);
    identity.release_set(set_id);
    delta.record_removed(EntityRef::Set(node.handle()));
    prune_or_relabel(tree, identity, parent, delta);
}

/// Finds the display position of the set's parent, creating it from the inline payload when
/// the tree does not have it yet.
fn ensure_parent(
    tree: &mut SessionTree,
    identity: &mut IdentityMap,
    inline: Option<&Exercise>,
    set: &WorkoutSet,
    delta: &mut DeltaBuilder,
) -> Result<usize, ApplyError> {
    let exercise_id = set.exercise_backend_id();
    if let Some(position) = tree.position_of(exercise_id) {
        return Ok(position);
    }

    let Some(exercise) = inline.filter(|exercise| exercise.backend_id() == exercise_id) else {
        return Err(ApplyError::MissingExercise { exercise_id, set_id: set.backend_id() });
    };

    let handle = identity.resolve_exercise(exercise_id);
    delta.record_added(EntityRef::Exercise(handle));
    Ok(tree.insert_exercise(ExerciseNode::new(handle, exercise.clone())))
}

fn prune_or_relabel(
    tree: &mut SessionTree,
    identity: &mut IdentityMap,
    exercise_id: ExerciseId,
    delta: &mut DeltaBuilder,
) {
    let Some(position) = tree.position_of(exercise_id) else {
        return;
    };
    if tree.exercises()[position].sets().is_empty() {
        let node = tree.remove_exercise_at(position);
        identity.release_exercise(exercise_id);
        delta.record_removed(EntityRef::Exercise(node.handle()));
    } else {
        relabel_at(tree, position, delta);
    }
}

fn relabel_at(tree: &mut SessionTree, position: usize, delta: &mut DeltaBuilder) {
    for handle in tree.exercise_at_mut(position).relabel() {
        delta.record_updated(EntityRef::Set(handle));
    }
}
