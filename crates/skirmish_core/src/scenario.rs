//! Battle scenarios: the immutable starting configuration of a fight.
//!
//! A [`Scenario`] is never mutated by a simulation. Every battle clones the
//! map and instantiates a fresh roster from the unit templates, so many
//! battles (for example the candidates of the boost search) can be run
//! from the same scenario without sharing any state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkirmishError};
use crate::factions::Faction;
use crate::grid::{Cell, GridPos, Map};
use crate::units::UnitId;

/// Default starting health of a unit.
pub const DEFAULT_HIT_POINTS: i32 = 200;

/// Default attack power of a unit.
pub const DEFAULT_ATTACK_POWER: i32 = 3;

/// Maps a map symbol to the unit it spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRule {
    /// Character in the scenario text.
    pub symbol: char,
    /// Faction of the spawned unit.
    pub faction: Faction,
    /// Starting health.
    pub hit_points: i32,
    /// Attack power.
    pub attack_power: i32,
}

/// How scenario text is read.
///
/// Rules are plain data so they can be loaded from a RON file; the defaults
/// describe the classic elf/goblin layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioRules {
    /// Wall symbol.
    pub wall: char,
    /// Open floor symbol.
    pub open: char,
    /// Unit markers. Squares under a marker are open floor.
    pub markers: Vec<MarkerRule>,
}

impl Default for ScenarioRules {
    fn default() -> Self {
        Self {
            wall: '#',
            open: '.',
            markers: vec![
                MarkerRule {
                    symbol: 'E',
                    faction: Faction::Elf,
                    hit_points: DEFAULT_HIT_POINTS,
                    attack_power: DEFAULT_ATTACK_POWER,
                },
                MarkerRule {
                    symbol: 'G',
                    faction: Faction::Goblin,
                    hit_points: DEFAULT_HIT_POINTS,
                    attack_power: DEFAULT_ATTACK_POWER,
                },
            ],
        }
    }
}

impl ScenarioRules {
    /// Check that every marker spawns units with positive health and power.
    ///
    /// # Errors
    ///
    /// Returns [`SkirmishError::InvalidMarker`] for the first marker that
    /// does not.
    pub fn validate(&self) -> Result<()> {
        match self
            .markers
            .iter()
            .find(|m| m.hit_points <= 0 || m.attack_power <= 0)
        {
            Some(m) => Err(SkirmishError::InvalidMarker {
                symbol: m.symbol,
                hit_points: m.hit_points,
                attack_power: m.attack_power,
            }),
            None => Ok(()),
        }
    }

    fn marker(&self, symbol: char) -> Option<&MarkerRule> {
        self.markers.iter().find(|m| m.symbol == symbol)
    }
}

/// Starting state of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Side the unit fights for.
    pub faction: Faction,
    /// Starting square.
    pub position: GridPos,
    /// Starting health.
    pub hit_points: i32,
    /// Attack power.
    pub attack_power: i32,
}

impl UnitTemplate {
    /// A unit with default health and power.
    #[must_use]
    pub const fn new(faction: Faction, position: GridPos) -> Self {
        Self {
            faction,
            position,
            hit_points: DEFAULT_HIT_POINTS,
            attack_power: DEFAULT_ATTACK_POWER,
        }
    }
}

/// A validated map plus its starting units.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scenario {
    map: Map,
    units: Vec<UnitTemplate>,
}

impl Scenario {
    /// Build a scenario from a map and unit templates.
    ///
    /// # Errors
    ///
    /// Fails if a unit stands on a wall or outside the map, two units share
    /// a square, a unit has no health or no attack power, either faction
    /// has no units, or there are more units than ids.
    pub fn new(map: Map, units: Vec<UnitTemplate>) -> Result<Self> {
        if UnitId::from_index(units.len().saturating_sub(1)).is_none() {
            return Err(SkirmishError::TooManyUnits(units.len()));
        }

        let mut seen = std::collections::BTreeSet::new();
        for unit in &units {
            if unit.hit_points <= 0 || unit.attack_power <= 0 {
                return Err(SkirmishError::InvalidStats {
                    position: unit.position,
                    hit_points: unit.hit_points,
                    attack_power: unit.attack_power,
                });
            }
            if !map.is_open_at(unit.position) {
                return Err(SkirmishError::UnitOnWall(unit.position));
            }
            if !seen.insert(unit.position) {
                return Err(SkirmishError::DuplicateUnit(unit.position));
            }
        }

        for faction in Faction::ALL {
            if !units.iter().any(|u| u.faction == faction) {
                return Err(SkirmishError::MissingFaction(faction));
            }
        }

        Ok(Self { map, units })
    }

    /// Parse scenario text with the default rules.
    ///
    /// # Errors
    ///
    /// See [`Scenario::parse_with`].
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ScenarioRules::default())
    }

    /// Parse scenario text: one map row per line, leading and trailing blank
    /// lines ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SkirmishError::UnknownSymbol`] for characters not covered
    /// by `rules`, plus every error of [`Map::from_rows`] and
    /// [`Scenario::new`].
    pub fn parse_with(text: &str, rules: &ScenarioRules) -> Result<Self> {
        let mut rows = Vec::new();
        let mut units = Vec::new();

        for (y, line) in text.trim_matches(&['\n', '\r'][..]).lines().enumerate() {
            let mut row = Vec::with_capacity(line.len());
            for (x, symbol) in line.chars().enumerate() {
                let position = GridPos::new(to_coord(x)?, to_coord(y)?);
                if symbol == rules.wall {
                    row.push(Cell::Wall);
                } else if symbol == rules.open {
                    row.push(Cell::Open);
                } else if let Some(marker) = rules.marker(symbol) {
                    row.push(Cell::Open);
                    units.push(UnitTemplate {
                        faction: marker.faction,
                        position,
                        hit_points: marker.hit_points,
                        attack_power: marker.attack_power,
                    });
                } else {
                    return Err(SkirmishError::UnknownSymbol { symbol, position });
                }
            }
            rows.push(row);
        }

        let map = Map::from_rows(rows)?;
        Self::new(map, units)
    }

    /// The battle map.
    #[must_use]
    pub fn map(&self) -> &Map {
        &self.map
    }

    /// Starting units in scenario order.
    #[must_use]
    pub fn units(&self) -> &[UnitTemplate] {
        &self.units
    }

    /// Number of units of `faction`.
    #[must_use]
    pub fn unit_count(&self, faction: Faction) -> usize {
        self.units.iter().filter(|u| u.faction == faction).count()
    }

    /// A copy with `boost` added to the attack power of every unit of
    /// `faction`. The original scenario is left untouched.
    ///
    /// Attack power never drops below 1, so a negative boost cannot produce
    /// a battle in which no blow does damage.
    #[must_use]
    pub fn with_boost(&self, faction: Faction, boost: i32) -> Self {
        let mut boosted = self.clone();
        for unit in boosted.units.iter_mut().filter(|u| u.faction == faction) {
            unit.attack_power = unit.attack_power.saturating_add(boost).max(1);
        }
        boosted
    }
}

fn to_coord(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| SkirmishError::InvalidState("map too large".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = "\
#######
#.G...#
#...EG#
#######
";

    #[test]
    fn test_parse_builds_map_and_units() {
        let scenario = Scenario::parse(SMALL).unwrap();

        assert_eq!(scenario.map().width(), 7);
        assert_eq!(scenario.map().height(), 4);
        assert!(!scenario.map().is_open(0, 0));
        assert!(scenario.map().is_open(2, 1));

        let positions: Vec<_> = scenario.units().iter().map(|u| u.position).collect();
        assert_eq!(
            positions,
            vec![GridPos::new(2, 1), GridPos::new(4, 2), GridPos::new(5, 2)]
        );
        assert_eq!(scenario.unit_count(Faction::Goblin), 2);
        assert_eq!(scenario.unit_count(Faction::Elf), 1);
        assert!(scenario
            .units()
            .iter()
            .all(|u| u.hit_points == 200 && u.attack_power == 3));
    }

    #[test]
    fn test_parse_ignores_surrounding_blank_lines() {
        let padded = format!("\n\n{SMALL}\n");
        assert_eq!(
            Scenario::parse(&padded).unwrap(),
            Scenario::parse(SMALL).unwrap()
        );
    }

    #[test]
    fn test_custom_rules() {
        let rules = ScenarioRules {
            wall: 'X',
            open: '_',
            markers: vec![
                MarkerRule {
                    symbol: 'a',
                    faction: Faction::Elf,
                    hit_points: 10,
                    attack_power: 5,
                },
                MarkerRule {
                    symbol: 'b',
                    faction: Faction::Goblin,
                    hit_points: 20,
                    attack_power: 1,
                },
            ],
        };

        let scenario = Scenario::parse_with("XXXX\nXabX\nXXXX", &rules).unwrap();
        assert_eq!(scenario.units()[0].hit_points, 10);
        assert_eq!(scenario.units()[1].attack_power, 1);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let result = Scenario::parse("####\n#E?#\n#G.#\n####");
        assert_eq!(
            result,
            Err(SkirmishError::UnknownSymbol {
                symbol: '?',
                position: GridPos::new(2, 1),
            })
        );
    }

    #[test]
    fn test_jagged_rows_rejected() {
        let result = Scenario::parse("####\n#EG#\n###");
        assert!(matches!(result, Err(SkirmishError::JaggedRow { row: 2, .. })));
    }

    #[test]
    fn test_missing_faction_rejected() {
        assert_eq!(
            Scenario::parse("#####\n#E.E#\n#####"),
            Err(SkirmishError::MissingFaction(Faction::Goblin))
        );
        assert_eq!(
            Scenario::parse("#####\n#G..#\n#####"),
            Err(SkirmishError::MissingFaction(Faction::Elf))
        );
    }

    #[test]
    fn test_units_must_stand_on_open_distinct_squares() {
        let map = Scenario::parse(SMALL).unwrap().map().clone();

        let on_wall = vec![
            UnitTemplate::new(Faction::Elf, GridPos::new(0, 0)),
            UnitTemplate::new(Faction::Goblin, GridPos::new(1, 1)),
        ];
        assert_eq!(
            Scenario::new(map.clone(), on_wall),
            Err(SkirmishError::UnitOnWall(GridPos::new(0, 0)))
        );

        let stacked = vec![
            UnitTemplate::new(Faction::Elf, GridPos::new(1, 1)),
            UnitTemplate::new(Faction::Goblin, GridPos::new(1, 1)),
        ];
        assert_eq!(
            Scenario::new(map, stacked),
            Err(SkirmishError::DuplicateUnit(GridPos::new(1, 1)))
        );
    }

    #[test]
    fn test_with_boost_copies() {
        let scenario = Scenario::parse(SMALL).unwrap();
        let boosted = scenario.with_boost(Faction::Elf, 12);

        assert_eq!(boosted.units()[1].attack_power, 15);
        assert_eq!(boosted.units()[0].attack_power, 3);
        assert_eq!(scenario.units()[1].attack_power, 3);
    }

    #[test]
    fn test_with_negative_boost_keeps_power_positive() {
        let scenario = Scenario::parse(SMALL).unwrap();
        let weakened = scenario.with_boost(Faction::Goblin, -10);

        assert_eq!(weakened.units()[0].attack_power, 1);
        assert_eq!(weakened.units()[1].attack_power, 3);
    }

    #[test]
    fn test_zero_attack_power_rejected() {
        let mut rules = ScenarioRules::default();
        for marker in &mut rules.markers {
            marker.attack_power = 0;
        }

        assert_eq!(
            Scenario::parse_with("####\n#EG#\n####", &rules),
            Err(SkirmishError::InvalidStats {
                position: GridPos::new(1, 1),
                hit_points: 200,
                attack_power: 0,
            })
        );
        assert!(matches!(
            rules.validate(),
            Err(SkirmishError::InvalidMarker { symbol: 'E', .. })
        ));
    }

    #[test]
    fn test_non_positive_stats_rejected() {
        let map = Scenario::parse(SMALL).unwrap().map().clone();
        let goblin = UnitTemplate::new(Faction::Goblin, GridPos::new(2, 1));
        let elf = UnitTemplate::new(Faction::Elf, GridPos::new(4, 2));

        let mut dead_goblin = goblin;
        dead_goblin.hit_points = 0;
        assert_eq!(
            Scenario::new(map.clone(), vec![dead_goblin, elf]),
            Err(SkirmishError::InvalidStats {
                position: GridPos::new(2, 1),
                hit_points: 0,
                attack_power: 3,
            })
        );

        let mut healing_elf = elf;
        healing_elf.attack_power = -5;
        assert!(matches!(
            Scenario::new(map, vec![goblin, healing_elf]),
            Err(SkirmishError::InvalidStats {
                attack_power: -5,
                ..
            })
        ));
    }

    #[test]
    fn test_default_rules_are_valid() {
        assert_eq!(ScenarioRules::default().validate(), Ok(()));
    }
}
