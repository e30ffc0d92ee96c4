//! Battle metrics collection.
//!
//! Metrics are built from the event stream of a battle, so they describe
//! what happened during the fight and not only how it ended.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use skirmish_core::factions::Faction;
use skirmish_core::outcome::Outcome;
use skirmish_core::search::BoostResult;
use skirmish_core::simulation::BattleEvent;
use skirmish_core::units::UnitRoster;

/// Complete metrics for a single battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleMetrics {
    /// Scenario name.
    pub scenario: String,
    /// Rounds fully played.
    pub rounds_completed: u32,
    /// Health of every surviving unit.
    pub remaining_health: i64,
    /// `rounds_completed × remaining_health`.
    pub score: i64,
    /// Winning faction, if one side was wiped out.
    pub winner: Option<Faction>,
    /// Per-faction metrics, keyed by faction short name.
    pub factions: BTreeMap<String, FactionMetrics>,
    /// Result of the attack-boost search, if one was run.
    pub boost: Option<BoostMetrics>,
    /// Final battle state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl BattleMetrics {
    /// Create metrics for a scenario.
    #[must_use]
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            ..Default::default()
        }
    }

    /// Get or create faction metrics.
    pub fn faction_mut(&mut self, faction: Faction) -> &mut FactionMetrics {
        self.factions
            .entry(faction.short_name().to_string())
            .or_insert_with(|| FactionMetrics::new(faction))
    }

    /// Metrics of one faction, if it took part.
    #[must_use]
    pub fn faction(&self, faction: Faction) -> Option<&FactionMetrics> {
        self.factions.get(faction.short_name())
    }

    /// Finalize the battle with its outcome.
    pub fn finalize(&mut self, outcome: &Outcome, final_state_hash: u64) {
        self.rounds_completed = outcome.rounds_completed;
        self.remaining_health = outcome.remaining_health;
        self.score = outcome.score();
        self.winner = outcome.winner;
        self.final_state_hash = final_state_hash;
    }
}

/// Metrics for one faction in a battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionMetrics {
    /// The faction.
    pub faction: Faction,
    /// Units at the start of the battle.
    pub starting_units: u32,
    /// Units lost.
    pub casualties: u32,
    /// Steps taken by all units.
    pub moves: u32,
    /// Attacks landed.
    pub attacks: u32,
    /// Damage dealt to the enemy.
    pub damage_dealt: i64,
    /// Kills scored.
    pub kills: u32,
    /// Health of surviving units at the end.
    pub remaining_health: i64,
}

impl FactionMetrics {
    /// Create empty metrics for a faction.
    #[must_use]
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            starting_units: 0,
            casualties: 0,
            moves: 0,
            attacks: 0,
            damage_dealt: 0,
            kills: 0,
            remaining_health: 0,
        }
    }

    /// Surviving units.
    #[must_use]
    pub fn survivors(&self) -> u32 {
        self.starting_units.saturating_sub(self.casualties)
    }
}

/// Result of an attack-boost search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostMetrics {
    /// Faction that was boosted.
    pub faction: Faction,
    /// Minimal boost found.
    pub boost: i32,
    /// Attack power at that boost.
    pub attack_power: i32,
    /// Rounds of the flawless battle.
    pub rounds_completed: u32,
    /// Remaining health of the flawless battle.
    pub remaining_health: i64,
    /// Score of the flawless battle.
    pub score: i64,
    /// Candidate battles simulated.
    pub candidates_tried: u32,
}

impl BoostMetrics {
    /// Summarize a search result.
    #[must_use]
    pub fn from_result(faction: Faction, result: &BoostResult) -> Self {
        Self {
            faction,
            boost: result.boost,
            attack_power: result.attack_power,
            rounds_completed: result.outcome.rounds_completed,
            remaining_health: result.outcome.remaining_health,
            score: result.outcome.score(),
            candidates_tried: result.candidates_tried,
        }
    }
}

/// Summary statistics across multiple battles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total battles played.
    pub total_battles: u32,
    /// Battles won by each faction.
    pub wins_by_faction: BTreeMap<String, u32>,
    /// Average battle length in rounds.
    pub avg_rounds: f64,
    /// Shortest battle.
    pub min_rounds: u32,
    /// Longest battle.
    pub max_rounds: u32,
    /// Sum of all scores.
    pub total_score: i64,
}

impl BatchSummary {
    /// Calculate summary from a list of battle metrics.
    #[must_use]
    pub fn from_battles(battles: &[BattleMetrics]) -> Self {
        if battles.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_battles: u32::try_from(battles.len()).unwrap_or(u32::MAX),
            min_rounds: u32::MAX,
            ..Default::default()
        };

        let mut rounds_sum = 0u64;
        for battle in battles {
            rounds_sum += u64::from(battle.rounds_completed);
            summary.min_rounds = summary.min_rounds.min(battle.rounds_completed);
            summary.max_rounds = summary.max_rounds.max(battle.rounds_completed);
            summary.total_score += battle.score;

            if let Some(winner) = battle.winner {
                *summary
                    .wins_by_faction
                    .entry(winner.short_name().to_string())
                    .or_default() += 1;
            }
        }

        summary.avg_rounds = rounds_sum as f64 / battles.len() as f64;
        summary
    }
}

/// Metrics collector that tracks events during a battle.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: BattleMetrics,
}

impl MetricsCollector {
    /// Create a collector, counting the starting units of `roster`.
    #[must_use]
    pub fn new(scenario: &str, roster: &UnitRoster) -> Self {
        let mut metrics = BattleMetrics::new(scenario);
        for faction in Faction::ALL {
            metrics.faction_mut(faction);
        }
        for unit in roster.iter() {
            metrics.faction_mut(unit.faction).starting_units += 1;
        }
        Self { metrics }
    }

    /// Record one battle event. `roster` resolves unit ids to factions.
    pub fn record(&mut self, event: &BattleEvent, roster: &UnitRoster) {
        match *event {
            BattleEvent::Moved { unit, .. } => {
                if let Some(unit) = roster.get(unit) {
                    self.metrics.faction_mut(unit.faction).moves += 1;
                }
            }
            BattleEvent::Attacked(report) => {
                if let Some(attacker) = roster.get(report.attacker) {
                    let faction = self.metrics.faction_mut(attacker.faction);
                    faction.attacks += 1;
                    faction.damage_dealt += i64::from(report.damage);
                    if report.killed {
                        faction.kills += 1;
                    }
                }
            }
            BattleEvent::Died { faction, .. } => {
                self.metrics.faction_mut(faction).casualties += 1;
            }
            BattleEvent::RoundCompleted { .. } | BattleEvent::CombatEnded(_) => {}
        }
    }

    /// Finish collection with the battle's outcome and final state.
    #[must_use]
    pub fn finalize(
        mut self,
        outcome: &Outcome,
        roster: &UnitRoster,
        final_state_hash: u64,
    ) -> BattleMetrics {
        for faction in Faction::ALL {
            self.metrics.faction_mut(faction).remaining_health = roster.total_health(faction);
        }
        self.metrics.finalize(outcome, final_state_hash);
        self.metrics
    }

    /// Metrics collected so far.
    #[must_use]
    pub fn current(&self) -> &BattleMetrics {
        &self.metrics
    }
}
