//! # Skirmish Core
//!
//! Deterministic simulation of a turn-based melee battle between two
//! factions on a grid map.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//!
//! ## Crate Structure
//!
//! - [`grid`] - Coordinates in reading order and the static map
//! - [`units`] - Unit roster and occupancy
//! - [`pathfinding`] - Breadth-first movement planner
//! - [`combat`] - Target selection and damage
//! - [`simulation`] - Round scheduler state machine
//! - [`outcome`] - Final battle result
//! - [`search`] - Minimal attack-boost search
//! - [`scenario`] - Scenario parsing and validation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod error;
pub mod factions;
pub mod grid;
pub mod outcome;
pub mod pathfinding;
pub mod scenario;
pub mod search;
pub mod simulation;
pub mod units;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, SkirmishError};
    pub use crate::factions::Faction;
    pub use crate::grid::{Cell, GridPos, Map};
    pub use crate::outcome::Outcome;
    pub use crate::scenario::{MarkerRule, Scenario, ScenarioRules, UnitTemplate};
    pub use crate::search::{search_min_boost, BoostResult, SearchConfig};
    pub use crate::simulation::{simulate, Battle, BattleEvent, BattlePhase, StopCondition};
    pub use crate::units::{Unit, UnitId, UnitRoster};
}
