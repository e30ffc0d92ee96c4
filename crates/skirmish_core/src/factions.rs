//! Faction definitions and identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two opposing sides in a battle.
///
/// The factions are symmetric: they differ only in the stats their units
/// carry, never in how those units behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// The elves.
    Elf,
    /// The goblins.
    Goblin,
}

impl Faction {
    /// Both factions, in index order.
    pub const ALL: [Faction; 2] = [Faction::Elf, Faction::Goblin];

    /// The opposing faction.
    #[must_use]
    pub const fn enemy(self) -> Self {
        match self {
            Self::Elf => Self::Goblin,
            Self::Goblin => Self::Elf,
        }
    }

    /// Dense index for per-faction arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Elf => 0,
            Self::Goblin => 1,
        }
    }

    /// Get the short name for this faction.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Elf => "elf",
            Self::Goblin => "goblin",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
