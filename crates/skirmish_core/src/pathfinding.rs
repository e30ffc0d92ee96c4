//! Breadth-first movement planning.
//!
//! A unit that has no enemy beside it takes at most one orthogonal step per
//! turn. The step is chosen with two flood fills over passable squares
//! (open and not occupied by another living unit):
//!
//! 1. From the unit, to find the closest square that touches an enemy.
//!    Ties go to the earliest square in reading order.
//! 2. From that square back towards the unit, to find which neighbouring
//!    square lies on a shortest path. Ties again go to reading order.
//!
//! Neither pass depends on queue order for its answer; every choice is an
//! explicit minimum over `(distance, GridPos)`.

use std::collections::VecDeque;

use crate::grid::{GridPos, Map};
use crate::units::{UnitId, UnitRoster};

/// Dense shortest-distance grid produced by one flood fill.
///
/// Distances are `u32::MAX` for squares the fill never reached.
#[derive(Debug, Clone)]
pub struct DistanceField {
    width: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Flood-fill from `origin` over squares accepted by `is_passable`.
    ///
    /// The origin itself is always distance zero, even if `is_passable`
    /// rejects it (a unit stands on its own square).
    pub fn flood<F>(map: &Map, origin: GridPos, mut is_passable: F) -> Self
    where
        F: FnMut(GridPos) -> bool,
    {
        let mut field = Self {
            width: map.width(),
            distances: vec![u32::MAX; map.len()],
        };

        let Some(origin_index) = map.index_of(origin) else {
            return field;
        };
        field.distances[origin_index] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(origin);

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = map.index_of(cell) else {
                continue;
            };
            let next_distance = field.distances[current_index].saturating_add(1);

            for neighbor in cell.neighbors() {
                let Some(neighbor_index) = map.index_of(neighbor) else {
                    continue;
                };
                if field.distances[neighbor_index] <= next_distance {
                    continue;
                }
                if !is_passable(neighbor) {
                    continue;
                }

                field.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }

        field
    }

    /// Distance from the fill origin, if the square was reached.
    #[must_use]
    pub fn distance(&self, pos: GridPos) -> Option<u32> {
        if pos.x >= self.width {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let index = usize::try_from(pos.y)
            .ok()?
            .checked_mul(width)?
            .checked_add(usize::try_from(pos.x).ok()?)?;
        self.distances
            .get(index)
            .copied()
            .filter(|&d| d != u32::MAX)
    }
}

/// The outcome of planning one unit's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Square adjacent to an enemy that the unit is heading for.
    pub destination: GridPos,
    /// Distance from the unit to `destination`.
    pub distance: u32,
    /// Square the unit steps onto this turn.
    pub step: GridPos,
}

fn is_passable(map: &Map, roster: &UnitRoster, pos: GridPos) -> bool {
    map.is_open_at(pos) && !roster.is_occupied(pos)
}

/// Choose the square the unit should head for.
///
/// Candidates are passable squares orthogonally adjacent to a living enemy.
/// Returns the reachable candidate with the smallest distance, ties broken
/// by reading order, together with that distance.
#[must_use]
pub fn select_destination(
    map: &Map,
    roster: &UnitRoster,
    unit: UnitId,
) -> Option<(GridPos, u32)> {
    let start = roster.get(unit)?.position;
    let field = DistanceField::flood(map, start, |pos| is_passable(map, roster, pos));

    roster
        .enemies_of(unit)
        .iter()
        .flat_map(|enemy| enemy.position.neighbors())
        .filter(|&square| is_passable(map, roster, square))
        .filter_map(|square| field.distance(square).map(|d| (d, square)))
        .min()
        .map(|(distance, square)| (square, distance))
}

/// Choose the first step from the unit towards `destination`.
///
/// `distance` is the unit's shortest-path distance to the destination. A
/// neighbour qualifies when it is passable and exactly `distance - 1` away
/// from the destination; the earliest qualifying neighbour in reading
/// order wins.
#[must_use]
pub fn select_step(
    map: &Map,
    roster: &UnitRoster,
    unit: UnitId,
    destination: GridPos,
    distance: u32,
) -> Option<GridPos> {
    let start = roster.get(unit)?.position;
    let wanted = distance.checked_sub(1)?;
    let field = DistanceField::flood(map, destination, |pos| is_passable(map, roster, pos));

    start
        .neighbors()
        .filter(|&square| is_passable(map, roster, square))
        .filter(|&square| field.distance(square) == Some(wanted))
        .min()
}

/// Plan a single step for `unit`, or `None` if no enemy-adjacent square is
/// reachable (the unit then holds position).
#[must_use]
pub fn plan_move(map: &Map, roster: &UnitRoster, unit: UnitId) -> Option<MovePlan> {
    let (destination, distance) = select_destination(map, roster, unit)?;
    let step = select_step(map, roster, unit, destination, distance)?;

    Some(MovePlan {
        destination,
        distance,
        step,
    })
}
