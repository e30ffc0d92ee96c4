//! Search for the smallest attack boost that wins a battle without losses.
//!
//! Candidates are tried in increasing order, each on a fresh copy of the
//! scenario, and each run stops at the protected faction's first casualty.
//! Once every protected unit kills any enemy in a single blow, further boosts
//! cannot change a single event, so that boost bounds the search.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkirmishError};
use crate::factions::Faction;
use crate::outcome::Outcome;
use crate::scenario::Scenario;
use crate::simulation::{Battle, StopCondition};

/// Parameters of the boost search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Faction whose attack power is boosted and who must lose nobody.
    pub faction: Faction,
    /// Largest boost to try. `None` uses the one-hit-kill bound.
    pub max_boost: Option<i32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            faction: Faction::Elf,
            max_boost: None,
        }
    }
}

/// The winning candidate of a boost search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostResult {
    /// Boost added to every unit of the protected faction.
    pub boost: i32,
    /// Resulting attack power of the protected faction's weakest hitter.
    pub attack_power: i32,
    /// Outcome of the flawless battle.
    pub outcome: Outcome,
    /// Number of candidate battles simulated, including the winner.
    pub candidates_tried: u32,
}

/// Smallest boost at which every unit of `faction` one-shots every enemy.
#[must_use]
pub fn one_hit_boost(scenario: &Scenario, faction: Faction) -> i32 {
    let toughest_enemy = scenario
        .units()
        .iter()
        .filter(|u| u.faction == faction.enemy())
        .map(|u| u.hit_points)
        .max()
        .unwrap_or(0);
    let weakest_hitter = base_power(scenario, faction);

    toughest_enemy.saturating_sub(weakest_hitter).max(0)
}

fn base_power(scenario: &Scenario, faction: Faction) -> i32 {
    scenario
        .units()
        .iter()
        .filter(|u| u.faction == faction)
        .map(|u| u.attack_power)
        .min()
        .unwrap_or(0)
}

/// Find the minimal boost that lets `config.faction` win with no casualties.
///
/// # Errors
///
/// Returns [`SkirmishError::NoBoostFound`] if no boost up to the bound
/// works, and propagates [`SkirmishError::Stalemate`] from candidate runs.
pub fn search_min_boost(scenario: &Scenario, config: &SearchConfig) -> Result<BoostResult> {
    let faction = config.faction;
    let max_boost = config
        .max_boost
        .unwrap_or_else(|| one_hit_boost(scenario, faction));

    tracing::debug!(%faction, max_boost, "Searching for minimal attack boost");

    let mut candidates_tried = 0;
    for boost in 0..=max_boost {
        candidates_tried += 1;

        let candidate = scenario.with_boost(faction, boost);
        let outcome = Battle::new(&candidate)
            .with_stop_condition(StopCondition::FirstCasualty(faction))
            .run()?;

        if outcome.is_flawless_win(faction) {
            tracing::info!(
                %faction,
                boost,
                rounds = outcome.rounds_completed,
                score = outcome.score(),
                "Flawless victory found"
            );
            return Ok(BoostResult {
                boost,
                attack_power: base_power(scenario, faction) + boost,
                outcome,
                candidates_tried,
            });
        }

        tracing::debug!(
            %faction,
            boost,
            rounds = outcome.rounds_completed,
            "Candidate boost lost a unit"
        );
    }

    Err(SkirmishError::NoBoostFound { faction, max_boost })
}
