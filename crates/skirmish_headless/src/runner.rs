//! Single-battle runner.
//!
//! Plays one scenario round by round, feeding every event into a
//! [`MetricsCollector`], then optionally runs the attack-boost search.

use std::path::Path;
use std::time::Instant;

use skirmish_core::scenario::{Scenario, ScenarioRules};
use skirmish_core::search::{search_min_boost, SearchConfig};
use skirmish_core::simulation::Battle;
use tracing::{debug, info};

use crate::metrics::{BattleMetrics, BoostMetrics, MetricsCollector};
use crate::scenario::{load_scenario, ScenarioError};

/// Runner configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Skip the plain simulation and only search.
    pub search_only: bool,
    /// Run the attack-boost search with these parameters.
    pub search: Option<SearchConfig>,
}

impl RunConfig {
    /// Plain simulation followed by the default elf search.
    #[must_use]
    pub fn with_search() -> Self {
        Self {
            search_only: false,
            search: Some(SearchConfig::default()),
        }
    }

    /// Only the boost search.
    #[must_use]
    pub fn search_only(search: SearchConfig) -> Self {
        Self {
            search_only: true,
            search: Some(search),
        }
    }
}

/// Runs battles according to a [`RunConfig`].
#[derive(Debug, Clone, Default)]
pub struct BattleRunner {
    config: RunConfig,
}

impl BattleRunner {
    /// Create a runner that only simulates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: RunConfig) -> Self {
        Self { config }
    }

    /// The runner's configuration.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run a scenario and collect its metrics.
    pub fn run(&self, name: &str, scenario: &Scenario) -> Result<BattleMetrics, ScenarioError> {
        let start = Instant::now();
        info!(scenario = %name, units = scenario.units().len(), "Starting battle");

        let mut metrics = if self.config.search_only {
            BattleMetrics::new(name)
        } else {
            simulate_with_metrics(name, scenario)?
        };

        if let Some(search) = &self.config.search {
            let result = search_min_boost(scenario, search)?;
            metrics.boost = Some(BoostMetrics::from_result(search.faction, &result));
        }

        info!(
            scenario = %name,
            rounds = metrics.rounds_completed,
            score = metrics.score,
            boost = ?metrics.boost.map(|b| b.boost),
            elapsed_ms = start.elapsed().as_millis(),
            "Battle finished"
        );
        Ok(metrics)
    }

    /// Load a scenario file and run it.
    pub fn run_file(
        &self,
        path: &Path,
        rules: &ScenarioRules,
    ) -> Result<BattleMetrics, ScenarioError> {
        let loaded = load_scenario(path, rules)?;
        self.run(&loaded.name, &loaded.scenario)
    }
}

/// Play a scenario to the end, recording every event.
pub fn simulate_with_metrics(name: &str, scenario: &Scenario) -> Result<BattleMetrics, ScenarioError> {
    let mut battle = Battle::new(scenario);
    let mut collector = MetricsCollector::new(name, battle.roster());

    let outcome = loop {
        let report = battle.step_round()?;
        for event in &report.events {
            collector.record(event, battle.roster());
        }
        if report.completed {
            debug!(round = battle.rounds_completed(), events = report.events.len(), "Round");
        }
        if let Some(outcome) = battle.outcome() {
            break outcome;
        }
    };

    Ok(collector.finalize(&outcome, battle.roster(), battle.state_hash()))
}

/// Human-readable summary of a battle.
#[must_use]
pub fn format_summary(metrics: &BattleMetrics) -> String {
    let mut lines = vec![format!("Scenario: {}", metrics.scenario)];

    if metrics.rounds_completed > 0 || metrics.winner.is_some() {
        let winner = metrics
            .winner
            .map_or_else(|| "none".to_string(), |w| w.to_string());
        lines.push(format!(
            "Combat ends after {} full rounds",
            metrics.rounds_completed
        ));
        lines.push(format!(
            "Winner: {winner} with {} total hit points left",
            metrics.remaining_health
        ));
        lines.push(format!(
            "Outcome: {} * {} = {}",
            metrics.rounds_completed, metrics.remaining_health, metrics.score
        ));
        for faction in metrics.factions.values() {
            lines.push(format!(
                "  {}: {}/{} survivors, {} damage dealt, {} kills",
                faction.faction,
                faction.survivors(),
                faction.starting_units,
                faction.damage_dealt,
                faction.kills
            ));
        }
    }

    if let Some(boost) = metrics.boost {
        lines.push(format!(
            "Minimal {} boost: +{} (attack power {}, {} candidates)",
            boost.faction, boost.boost, boost.attack_power, boost.candidates_tried
        ));
        lines.push(format!(
            "Boosted outcome: {} * {} = {}",
            boost.rounds_completed, boost.remaining_health, boost.score
        ));
    }

    lines.join("\n")
}
