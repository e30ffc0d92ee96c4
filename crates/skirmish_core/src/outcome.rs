//! Final result of a battle.

use serde::{Deserialize, Serialize};

use crate::factions::Faction;

/// Terminal state of a battle, reduced to the numbers callers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    /// Rounds in which every unit of the opening snapshot got its turn.
    pub rounds_completed: u32,
    /// Health summed over every unit still alive.
    pub remaining_health: i64,
    /// The side left standing, or `None` if the battle was cut short before
    /// either side was wiped out.
    pub winner: Option<Faction>,
    /// Dead units per faction, indexed by [`Faction::index`].
    pub casualties: [u32; 2],
}

impl Outcome {
    /// `rounds_completed × remaining_health`.
    #[must_use]
    pub fn score(&self) -> i64 {
        i64::from(self.rounds_completed) * self.remaining_health
    }

    /// Dead units of one faction.
    #[must_use]
    pub const fn casualties_of(&self, faction: Faction) -> u32 {
        self.casualties[faction.index()]
    }

    /// True if `faction` won without losing a single unit.
    #[must_use]
    pub fn is_flawless_win(&self, faction: Faction) -> bool {
        self.winner == Some(faction) && self.casualties_of(faction) == 0
    }
}
