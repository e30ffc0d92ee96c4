//! Melee target selection and damage resolution.
//!
//! A unit can only strike an enemy on an orthogonally adjacent square. When
//! several are in reach it picks the weakest, and among equally weak targets
//! the first in reading order.

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;
use crate::units::{UnitId, UnitRoster};

/// A resolved attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    /// Unit that struck.
    pub attacker: UnitId,
    /// Unit that was hit.
    pub target: UnitId,
    /// Square the target stood on.
    pub target_position: GridPos,
    /// Damage dealt (the attacker's power).
    pub damage: i32,
    /// Target health after the hit.
    pub remaining: i32,
    /// True if the hit killed the target.
    pub killed: bool,
}

/// Pick the adjacent living enemy to strike, if any.
///
/// Lowest `hit_points` wins; ties go to the target whose square comes first
/// in reading order.
#[must_use]
pub fn select_target(roster: &UnitRoster, attacker: UnitId) -> Option<UnitId> {
    let unit = roster.get(attacker).filter(|u| u.alive)?;

    unit.position
        .neighbors()
        .filter_map(|square| roster.occupant(square))
        .filter_map(|id| roster.get(id))
        .filter(|other| unit.is_enemy(other))
        .min_by_key(|enemy| (enemy.hit_points, enemy.position))
        .map(|enemy| enemy.id)
}

/// True if `attacker` has at least one living enemy beside it.
#[must_use]
pub fn has_adjacent_enemy(roster: &UnitRoster, attacker: UnitId) -> bool {
    select_target(roster, attacker).is_some()
}

/// Strike the selected target, if one is in reach.
///
/// Damage equals the attacker's power. A target reduced to zero or less is
/// marked dead and its square is free for the rest of the round.
pub fn resolve_attack(roster: &mut UnitRoster, attacker: UnitId) -> Option<AttackReport> {
    let target = select_target(roster, attacker)?;
    let damage = roster.get(attacker)?.attack_power;
    let target_position = roster.get(target)?.position;
    let applied = roster.apply_damage(target, damage)?;

    tracing::trace!(
        attacker = attacker.0,
        target = target.0,
        damage,
        remaining = applied.remaining,
        killed = applied.killed,
        "Attack resolved"
    );

    Some(AttackReport {
        attacker,
        target,
        target_position,
        damage,
        remaining: applied.remaining,
        killed: applied.killed,
    })
}
