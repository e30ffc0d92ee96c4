//! Unit storage for a single battle.
//!
//! The roster is the only owner of unit positions. Occupancy is an index
//! derived from those positions and is updated in the same call that moves
//! or kills a unit, so the two can never disagree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::grid::GridPos;

/// Stable identifier of a unit within one battle.
///
/// Ids are assigned in scenario order and never reused; dead units keep
/// theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    /// Id of the unit at `index` in scenario order, if it fits in a `u32`.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }
}

/// A combatant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier, equal to the unit's index in the roster.
    pub id: UnitId,
    /// Side the unit fights for.
    pub faction: Faction,
    /// Current square.
    pub position: GridPos,
    /// Remaining health. May drop below zero on the killing blow.
    pub hit_points: i32,
    /// Damage dealt per attack.
    pub attack_power: i32,
    /// False once `hit_points` reached zero or less.
    pub alive: bool,
}

impl Unit {
    /// Whether `other` is a living enemy of this unit.
    #[must_use]
    pub fn is_enemy(&self, other: &Unit) -> bool {
        other.alive && other.faction != self.faction
    }
}

/// Result of applying damage to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageApplied {
    /// Health after the hit.
    pub remaining: i32,
    /// True if this hit killed the unit.
    pub killed: bool,
}

/// Mutable collection of all units in a battle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRoster {
    /// All units ever spawned, indexed by [`UnitId`].
    units: Vec<Unit>,
    /// Square → living occupant.
    occupancy: BTreeMap<GridPos, UnitId>,
}

impl UnitRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a living unit and return its id.
    ///
    /// Placement and unit count are validated by
    /// [`crate::scenario::Scenario`]; the roster only guards against stacking
    /// two units on one square or running out of ids in debug builds.
    pub fn spawn(
        &mut self,
        faction: Faction,
        position: GridPos,
        hit_points: i32,
        attack_power: i32,
    ) -> UnitId {
        debug_assert!(
            !self.occupancy.contains_key(&position),
            "square {position} already occupied"
        );

        let next = UnitId::from_index(self.units.len());
        debug_assert!(next.is_some(), "unit ids exhausted");
        let id = next.unwrap_or(UnitId(u32::MAX));
        self.units.push(Unit {
            id,
            faction,
            position,
            hit_points,
            attack_power,
            alive: true,
        });
        self.occupancy.insert(position, id);
        id
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        usize::try_from(id.0).ok().and_then(|i| self.units.get(i))
    }

    fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        usize::try_from(id.0).ok().and_then(|i| self.units.get_mut(i))
    }

    /// Every unit, dead or alive, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// Number of units ever spawned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Alive units in reading order of their squares.
    #[must_use]
    pub fn living_units(&self) -> Vec<UnitId> {
        // The occupancy index is keyed by position, so it already iterates in
        // reading order.
        self.occupancy.values().copied().collect()
    }

    /// Alive units of the opposing faction, in reading order.
    #[must_use]
    pub fn enemies_of(&self, id: UnitId) -> Vec<&Unit> {
        let Some(unit) = self.get(id) else {
            return Vec::new();
        };
        self.occupancy
            .values()
            .filter_map(|&other| self.get(other))
            .filter(|other| unit.is_enemy(other))
            .collect()
    }

    /// True if at least one unit of `faction` is alive.
    #[must_use]
    pub fn has_living(&self, faction: Faction) -> bool {
        self.units.iter().any(|u| u.alive && u.faction == faction)
    }

    /// Sum of hit points over the faction's living units.
    #[must_use]
    pub fn total_health(&self, faction: Faction) -> i64 {
        self.units
            .iter()
            .filter(|u| u.alive && u.faction == faction)
            .map(|u| i64::from(u.hit_points))
            .sum()
    }

    /// Number of dead units belonging to `faction`.
    #[must_use]
    pub fn casualties(&self, faction: Faction) -> u32 {
        let dead = self
            .units
            .iter()
            .filter(|u| !u.alive && u.faction == faction)
            .count();
        u32::try_from(dead).unwrap_or(u32::MAX)
    }

    /// Living unit standing on `pos`, if any.
    #[must_use]
    pub fn occupant(&self, pos: GridPos) -> Option<UnitId> {
        self.occupancy.get(&pos).copied()
    }

    /// True if a living unit stands on `pos`.
    #[must_use]
    pub fn is_occupied(&self, pos: GridPos) -> bool {
        self.occupancy.contains_key(&pos)
    }

    /// Move a living unit to an empty square.
    ///
    /// Returns `false` and leaves the roster untouched if the unit is dead,
    /// unknown, or the destination is taken.
    pub fn move_unit(&mut self, id: UnitId, to: GridPos) -> bool {
        if self.is_occupied(to) {
            return false;
        }
        let Some(unit) = self.get_mut(id) else {
            return false;
        };
        if !unit.alive {
            return false;
        }

        let from = unit.position;
        unit.position = to;
        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        true
    }

    /// Subtract `amount` from a unit's health, killing it at zero or below.
    ///
    /// A killed unit leaves the occupancy index immediately. Returns `None`
    /// for unknown or already dead units.
    pub fn apply_damage(&mut self, id: UnitId, amount: i32) -> Option<DamageApplied> {
        let unit = self.get_mut(id)?;
        if !unit.alive {
            return None;
        }

        unit.hit_points -= amount;
        let killed = unit.hit_points <= 0;
        let remaining = unit.hit_points;
        let position = unit.position;
        if killed {
            unit.alive = false;
            self.occupancy.remove(&position);
        }

        Some(DamageApplied { remaining, killed })
    }
}
