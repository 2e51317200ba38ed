//! Pure position arithmetic for ordered collections.
//!
//! Every structural mutation (insert, delete, move) is planned here as a
//! list of [`Shift`]s plus bounds checks, then executed by the sequencer
//! inside a single store transaction. Keeping the arithmetic free of I/O
//! lets the density invariant be tested exhaustively without a database.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::KanbanError;

/// Where an item sits: its container and its zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub container_id: Uuid,
    pub position: i32,
}

impl Slot {
    pub fn new(container_id: Uuid, position: i32) -> Self {
        Self {
            container_id,
            position,
        }
    }
}

/// Where a newly created item goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// After the last sibling
    Append,
    /// At an explicit position, pushing later siblings back by one
    At(i32),
}

impl From<Option<i32>> for Placement {
    fn from(position: Option<i32>) -> Self {
        position.map_or(Placement::Append, Placement::At)
    }
}

/// Moves every item of one container whose position lies in
/// `from..to` (or `from..` when `to` is `None`) by `delta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub container_id: Uuid,
    pub from: i32,
    pub to: Option<i32>,
    pub delta: i32,
}

impl Shift {
    pub fn covers(&self, position: i32) -> bool {
        position >= self.from && self.to.map_or(true, |to| position < to)
    }

    /// Applies the shift to one item, returning its new position.
    pub fn apply(&self, container_id: Uuid, position: i32) -> i32 {
        if container_id == self.container_id && self.covers(position) {
            position + self.delta
        } else {
            position
        }
    }
}

/// Resolves a placement against the container's current length.
///
/// Explicit positions must lie in `0..=len`.
pub fn insertion_point(placement: Placement, len: i32) -> Result<i32, KanbanError> {
    match placement {
        Placement::Append => Ok(len),
        Placement::At(position) if (0..=len).contains(&position) => Ok(position),
        Placement::At(position) => Err(KanbanError::validation(format!(
            "position {} is out of range 0..={}",
            position, len
        ))),
    }
}

/// Shift that opens a gap at `position` for an insert.
///
/// Returns `None` when appending, since nothing sits at or after the end.
pub fn open_gap(container_id: Uuid, position: i32, len: i32) -> Option<Shift> {
    (position < len).then_some(Shift {
        container_id,
        from: position,
        to: None,
        delta: 1,
    })
}

/// Shift that closes the gap left by removing the item at `slot`.
pub fn close_gap(slot: Slot) -> Shift {
    Shift {
        container_id: slot.container_id,
        from: slot.position + 1,
        to: None,
        delta: -1,
    }
}

/// Checks a move target against the target container's length.
///
/// `target_len` counts the item itself when the move stays in one
/// container, so a same-container target must lie in `0..target_len` while
/// a cross-container target may also be `target_len` (the end).
pub fn check_move_target(current: Slot, target: Slot, target_len: i32) -> Result<(), KanbanError> {
    let upper = if current.container_id == target.container_id {
        target_len - 1
    } else {
        target_len
    };

    if (0..=upper).contains(&target.position) {
        Ok(())
    } else {
        Err(KanbanError::validation(format!(
            "position {} is out of range 0..={}",
            target.position, upper
        )))
    }
}

/// Shifts that make room for moving an item from `current` to `target`.
///
/// The moved item itself is never covered by these shifts; the caller
/// writes its new slot afterwards.
pub fn relocation(current: Slot, target: Slot) -> Vec<Shift> {
    if current.container_id != target.container_id {
        return vec![
            close_gap(current),
            Shift {
                container_id: target.container_id,
                from: target.position,
                to: None,
                delta: 1,
            },
        ];
    }

    let container_id = current.container_id;
    if current.position < target.position {
        vec![Shift {
            container_id,
            from: current.position + 1,
            to: Some(target.position + 1),
            delta: -1,
        }]
    } else if current.position > target.position {
        vec![Shift {
            container_id,
            from: target.position,
            to: Some(current.position),
            delta: 1,
        }]
    } else {
        Vec::new()
    }
}

/// Validates a bulk reorder of a container's full membership.
///
/// `members` are the container's current item IDs; `order` must name each
/// of them exactly once with positions forming a permutation of
/// `0..members.len()`.
pub fn check_reorder(members: &[Uuid], order: &[(Uuid, i32)]) -> Result<(), KanbanError> {
    let known: HashSet<Uuid> = members.iter().copied().collect();
    let mut seen_ids = HashSet::with_capacity(order.len());
    let mut seen_positions = HashSet::with_capacity(order.len());

    for (id, position) in order {
        if !known.contains(id) {
            return Err(KanbanError::validation(format!(
                "{} does not belong to this board",
                id
            )));
        }
        if !seen_ids.insert(*id) {
            return Err(KanbanError::validation(format!("{} is listed more than once", id)));
        }
        if *position < 0 || *position as usize >= members.len() || !seen_positions.insert(*position) {
            return Err(KanbanError::validation(format!(
                "positions must be a permutation of 0..{}",
                members.len()
            )));
        }
    }

    if seen_ids.len() != known.len() {
        return Err(KanbanError::validation(format!(
            "reorder must list all {} items",
            known.len()
        )));
    }

    Ok(())
}

/// Whether positions form exactly `0..n-1` with no gaps or duplicates.
pub fn is_dense<I: IntoIterator<Item = i32>>(positions: I) -> bool {
    let mut positions: Vec<i32> = positions.into_iter().collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(i, p)| *p == i as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Applies a plan to a model container holding `len` items labelled by
    /// their starting index, returning labels in position order.
    fn simulate_same_container(len: i32, from: i32, to: i32) -> Vec<i32> {
        let container = Uuid::new_v4();
        let current = Slot::new(container, from);
        let target = Slot::new(container, to);
        let shifts = relocation(current, target);

        let mut placed: Vec<(i32, i32)> = (0..len)
            .map(|label| {
                let position = if label == from {
                    to
                } else {
                    shifts
                        .iter()
                        .fold(label, |p, shift| shift.apply(container, p))
                };
                (position, label)
            })
            .collect();
        placed.sort();
        placed.into_iter().map(|(_, label)| label).collect()
    }

    #[test]
    fn test_insertion_point_bounds() {
        assert_eq!(insertion_point(Placement::Append, 3).unwrap(), 3);
        assert_eq!(insertion_point(Placement::At(0), 3).unwrap(), 0);
        assert_eq!(insertion_point(Placement::At(3), 3).unwrap(), 3);
        assert!(insertion_point(Placement::At(4), 3).is_err());
        assert!(insertion_point(Placement::At(-1), 3).is_err());
    }

    #[test]
    fn test_open_gap_skips_append() {
        let c = Uuid::new_v4();
        assert_eq!(open_gap(c, 3, 3), None);
        assert_eq!(
            open_gap(c, 1, 3),
            Some(Shift {
                container_id: c,
                from: 1,
                to: None,
                delta: 1
            })
        );
    }

    #[test]
    fn test_move_forward_within_container() {
        // [A,B,C,D] move A to 2 => [B,C,A,D]
        assert_eq!(simulate_same_container(4, 0, 2), vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_move_backward_within_container() {
        // [A,B,C,D] move D to 1 => [A,D,B,C]
        assert_eq!(simulate_same_container(4, 3, 1), vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_move_to_same_slot_is_noop() {
        let slot = Slot::new(Uuid::new_v4(), 2);
        assert!(relocation(slot, slot).is_empty());
    }

    #[test]
    fn test_every_same_container_move_keeps_density() {
        for len in 1..6 {
            for from in 0..len {
                for to in 0..len {
                    let order = simulate_same_container(len, from, to);
                    assert_eq!(order.len() as i32, len);
                    assert_eq!(order.iter().position(|l| *l == from), Some(to as usize));
                    let mut sorted = order.clone();
                    sorted.sort();
                    assert_eq!(sorted, (0..len).collect::<Vec<_>>());
                }
            }
        }
    }

    #[test]
    fn test_cross_container_move_shifts_both_sides() {
        let source = Uuid::new_v4();
        let target = Uuid::new_v4();
        let shifts = relocation(Slot::new(source, 1), Slot::new(target, 0));

        // source [A,B,C] loses B, target [X,Y] receives B at 0
        let source_after: Vec<i32> = [0, 2]
            .iter()
            .map(|p| shifts.iter().fold(*p, |p, s| s.apply(source, p)))
            .collect();
        let target_after: Vec<i32> = [0, 1]
            .iter()
            .map(|p| shifts.iter().fold(*p, |p, s| s.apply(target, p)))
            .collect();

        assert_eq!(source_after, vec![0, 1]);
        assert_eq!(target_after, vec![1, 2]);
    }

    #[test]
    fn test_move_target_bounds() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(check_move_target(Slot::new(a, 0), Slot::new(a, 2), 3).is_ok());
        assert!(check_move_target(Slot::new(a, 0), Slot::new(a, 3), 3).is_err());
        assert!(check_move_target(Slot::new(a, 0), Slot::new(b, 3), 3).is_ok());
        assert!(check_move_target(Slot::new(a, 0), Slot::new(b, 4), 3).is_err());
        assert!(check_move_target(Slot::new(a, 0), Slot::new(b, -1), 3).is_err());
        assert!(check_move_target(Slot::new(a, 0), Slot::new(b, 0), 0).is_ok());
    }

    #[test]
    fn test_check_reorder() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        assert!(check_reorder(&ids, &[(ids[2], 0), (ids[0], 1), (ids[1], 2)]).is_ok());
        // missing one
        assert!(check_reorder(&ids, &[(ids[2], 0), (ids[0], 1)]).is_err());
        // duplicate position
        assert!(check_reorder(&ids, &[(ids[2], 0), (ids[0], 0), (ids[1], 2)]).is_err());
        // foreign id
        assert!(check_reorder(&ids, &[(Uuid::new_v4(), 0), (ids[0], 1), (ids[1], 2)]).is_err());
        // duplicate id
        assert!(check_reorder(&ids, &[(ids[0], 0), (ids[0], 1), (ids[1], 2)]).is_err());
        // out of range
        assert!(check_reorder(&ids, &[(ids[2], 0), (ids[0], 1), (ids[1], 3)]).is_err());
    }

    #[test]
    fn test_is_dense() {
        assert!(is_dense(Vec::new()));
        assert!(is_dense(vec![2, 0, 1]));
        assert!(!is_dense(vec![0, 2]));
        assert!(!is_dense(vec![0, 0, 1]));
    }
}
