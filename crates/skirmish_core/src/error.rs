//! Error types for the battle simulation.

use thiserror::Error;

use crate::factions::Faction;
use crate::grid::GridPos;

/// Result type alias using [`SkirmishError`].
pub type Result<T> = std::result::Result<T, SkirmishError>;

/// Top-level error type for scenario construction and simulation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SkirmishError {
    /// The map has no rows or no columns.
    #[error("Map is empty")]
    EmptyMap,

    /// A map row differs in length from the first row.
    #[error("Map row {row} has {found} cells, expected {expected}")]
    JaggedRow {
        /// Zero-based row index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },

    /// A character in the scenario text is not a wall, floor or unit marker.
    #[error("Unknown map symbol '{symbol}' at {position}")]
    UnknownSymbol {
        /// The unrecognised character.
        symbol: char,
        /// Where it was found.
        position: GridPos,
    },

    /// One side has no units at all.
    #[error("Scenario has no {0} units")]
    MissingFaction(Faction),

    /// A unit was placed on a wall or outside the map.
    #[error("Unit placed on blocked cell {0}")]
    UnitOnWall(GridPos),

    /// Two units share a starting square.
    #[error("More than one unit placed at {0}")]
    DuplicateUnit(GridPos),

    /// More units than fit in a [`crate::units::UnitId`].
    #[error("Scenario has {0} units, more than unit ids can address")]
    TooManyUnits(usize),

    /// A unit would start with no health or no attack power.
    #[error("Unit at {position} has invalid stats: {hit_points} hp, {attack_power} attack")]
    InvalidStats {
        /// Starting square of the unit.
        position: GridPos,
        /// Starting health.
        hit_points: i32,
        /// Attack power.
        attack_power: i32,
    },

    /// A rules marker would spawn units with no health or no attack power.
    #[error("Marker '{symbol}' has invalid stats: {hit_points} hp, {attack_power} attack")]
    InvalidMarker {
        /// The marker character.
        symbol: char,
        /// Starting health.
        hit_points: i32,
        /// Attack power.
        attack_power: i32,
    },

    /// A full round passed without any unit moving or attacking.
    #[error("Stalemate after {rounds} rounds: no unit can move or attack")]
    Stalemate {
        /// Rounds completed before the stall was detected.
        rounds: u32,
    },

    /// The boost search exhausted its range without a flawless win.
    #[error("No attack boost up to {max_boost} lets {faction} win without casualties")]
    NoBoostFound {
        /// The protected faction.
        faction: Faction,
        /// Largest boost that was tried.
        max_boost: i32,
    },

    /// Invalid battle state (checkpoint decoding and similar).
    #[error("Invalid battle state: {0}")]
    InvalidState(String),
}
