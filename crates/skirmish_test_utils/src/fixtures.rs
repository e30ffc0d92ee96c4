//! Test fixtures and helpers.
//!
//! Reference battles with known outcomes and small helpers for building
//! scenarios and inspecting battles in tests.

use skirmish_core::factions::Faction;
use skirmish_core::grid::GridPos;
use skirmish_core::outcome::Outcome;
use skirmish_core::scenario::{Scenario, ScenarioRules};
use skirmish_core::simulation::Battle;

/// A scenario together with the outcomes it is known to produce.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceBattle {
    /// Short label used in assertion messages.
    pub name: &'static str,
    /// Scenario text with default markers.
    pub map: &'static str,
    /// Completed rounds of a plain simulation.
    pub rounds: u32,
    /// Remaining health of a plain simulation.
    pub remaining_health: i64,
    /// Winner of a plain simulation.
    pub winner: Faction,
    /// Elf boost search result as `(boost, rounds, remaining_health)`, if known.
    pub elf_boost: Option<(i32, u32, i64)>,
}

impl ReferenceBattle {
    /// Score of a plain simulation.
    #[must_use]
    pub const fn score(&self) -> i64 {
        self.rounds as i64 * self.remaining_health
    }

    /// Parse the map with default rules.
    ///
    /// # Panics
    ///
    /// Panics if the fixture text is invalid.
    #[must_use]
    pub fn scenario(&self) -> Scenario {
        scenario(self.map)
    }
}

/// Goblins win after 47 rounds; elves need a boost of 12.
pub const OPENING_SKIRMISH: ReferenceBattle = ReferenceBattle {
    name: "opening skirmish",
    map: "\
#######
#.G...#
#...EG#
#.#.#G#
#..G#E#
#.....#
#######
",
    rounds: 47,
    remaining_health: 590,
    winner: Faction::Goblin,
    elf_boost: Some((12, 29, 172)),
};

/// Elves win outright.
pub const ELF_STRONGHOLD: ReferenceBattle = ReferenceBattle {
    name: "elf stronghold",
    map: "\
#######
#G..#E#
#E#E.E#
#G.##.#
#...#E#
#...E.#
#######
",
    rounds: 37,
    remaining_health: 982,
    winner: Faction::Elf,
    elf_boost: None,
};

/// Elves win outright but lose units doing it.
pub const SCATTERED_CAMPS: ReferenceBattle = ReferenceBattle {
    name: "scattered camps",
    map: "\
#######
#E..EG#
#.#G.E#
#E.##E#
#G..#.#
#..E#.#
#######
",
    rounds: 46,
    remaining_health: 859,
    winner: Faction::Elf,
    elf_boost: Some((1, 33, 948)),
};

/// Goblins hold the west side.
pub const WESTERN_HOLD: ReferenceBattle = ReferenceBattle {
    name: "western hold",
    map: "\
#######
#E.G#.#
#.#G..#
#G.#.G#
#G..#.#
#...E.#
#######
",
    rounds: 35,
    remaining_health: 793,
    winner: Faction::Goblin,
    elf_boost: Some((12, 37, 94)),
};

/// Long winding corridor.
pub const WINDING_CORRIDOR: ReferenceBattle = ReferenceBattle {
    name: "winding corridor",
    map: "\
#######
#.E...#
#.#..G#
#.###.#
#E#G#G#
#...#G#
#######
",
    rounds: 54,
    remaining_health: 536,
    winner: Faction::Goblin,
    elf_boost: Some((9, 39, 166)),
};

/// Larger open field.
pub const OPEN_FIELD: ReferenceBattle = ReferenceBattle {
    name: "open field",
    map: "\
#########
#G......#
#.E.#...#
#..##..G#
#...##..#
#...#...#
#.G...G.#
#.....G.#
#########
",
    rounds: 20,
    remaining_health: 937,
    winner: Faction::Goblin,
    elf_boost: Some((31, 30, 38)),
};

/// Every reference battle.
pub const REFERENCE_BATTLES: [ReferenceBattle; 6] = [
    OPENING_SKIRMISH,
    ELF_STRONGHOLD,
    SCATTERED_CAMPS,
    WESTERN_HOLD,
    WINDING_CORRIDOR,
    OPEN_FIELD,
];

/// Nine units converging on a lone elf, with the layout after each of the
/// first three rounds.
pub const CONVERGENCE: [&str; 4] = [
    "\
#########
#G..G..G#
#.......#
#.......#
#G..E..G#
#.......#
#.......#
#G..G..G#
#########
",
    "\
#########
#.G...G.#
#...G...#
#...E..G#
#.G.....#
#.......#
#G..G..G#
#.......#
#########
",
    "\
#########
#..G.G..#
#...G...#
#.G.E.G.#
#.......#
#G..G..G#
#.......#
#.......#
#########
",
    "\
#########
#.......#
#..GGG..#
#..GEG..#
#G..G...#
#......G#
#.......#
#.......#
#########
",
];

/// Rules file reading `a`/`b` markers on `X` walls and `_` floor.
pub const CUSTOM_RULES_RON: &str = r"(
    wall: 'X',
    open: '_',
    markers: [
        (symbol: 'a', faction: Elf, hit_points: 10, attack_power: 5),
        (symbol: 'b', faction: Goblin, hit_points: 20, attack_power: 1),
    ],
)";

/// Parse [`CUSTOM_RULES_RON`].
///
/// # Panics
///
/// Panics if the fixture is not valid RON.
#[must_use]
pub fn custom_rules() -> ScenarioRules {
    ron::from_str(CUSTOM_RULES_RON).expect("custom rules fixture is valid RON")
}

/// Parse scenario text with default rules.
///
/// # Panics
///
/// Panics if the text is not a valid scenario.
#[must_use]
pub fn scenario(text: &str) -> Scenario {
    Scenario::parse(text).unwrap_or_else(|e| panic!("invalid fixture scenario: {e}"))
}

/// Faction and position of every living unit, in reading order.
#[must_use]
pub fn unit_layout(battle: &Battle) -> Vec<(Faction, GridPos)> {
    battle
        .roster()
        .living_units()
        .into_iter()
        .filter_map(|id| battle.roster().get(id))
        .map(|u| (u.faction, u.position))
        .collect()
}

/// Faction and position of every unit drawn in `text`, in reading order.
///
/// # Panics
///
/// Panics if the text is not a valid scenario.
#[must_use]
pub fn expected_layout(text: &str) -> Vec<(Faction, GridPos)> {
    scenario(text)
        .units()
        .iter()
        .map(|u| (u.faction, u.position))
        .collect()
}

/// Play whole rounds until the battle ends or `max_rounds` have been played.
///
/// Returns `None` on stalemate or when the limit is hit.
pub fn run_with_round_limit(battle: &mut Battle, max_rounds: u32) -> Option<Outcome> {
    for _ in 0..max_rounds {
        if let Some(outcome) = battle.outcome() {
            return Some(outcome);
        }
        battle.step_round().ok()?;
    }
    battle.outcome()
}
