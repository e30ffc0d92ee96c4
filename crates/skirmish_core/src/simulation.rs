//! Core battle loop.
//!
//! A battle is a small state machine:
//!
//! ```text
//! RoundStart ──► UnitTurn(0) ──► UnitTurn(1) ──► … ──► RoundEnd ──► RoundStart
//!                    │                 │
//!                    └────────► CombatOver ◄──┘
//! ```
//!
//! At `RoundStart` the living units are snapshotted in reading order; that
//! order is fixed for the whole round even as units move and die. A unit
//! whose turn comes up after it died is skipped. A unit that finds no living
//! enemy anywhere ends combat on the spot, and the round in progress is not
//! counted. Only a round whose snapshot was fully processed reaches
//! `RoundEnd` and increments `rounds_completed`.
//!
//! # Determinism
//!
//! - Turn order, target squares, steps and attack targets are all chosen by
//!   explicit `(value, reading order)` minima.
//! - No randomness and no hash-map iteration.
//! - The same scenario always yields the same events, in the same order.
//!
//! # Example
//!
//! ```
//! use skirmish_core::scenario::Scenario;
//! use skirmish_core::simulation::Battle;
//!
//! let scenario = Scenario::parse("#####\n#EG.#\n#####").unwrap();
//! let mut battle = Battle::new(&scenario);
//! let outcome = battle.run().unwrap();
//!
//! assert_eq!(outcome.rounds_completed, 67);
//! assert_eq!(outcome.score(), 134);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combat::{has_adjacent_enemy, resolve_attack, AttackReport};
use crate::error::{Result, SkirmishError};
use crate::factions::Faction;
use crate::grid::{GridPos, Map};
use crate::outcome::Outcome;
use crate::pathfinding::plan_move;
use crate::scenario::Scenario;
use crate::units::{UnitId, UnitRoster};

/// Where the battle's state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattlePhase {
    /// About to snapshot the turn order for a new round.
    RoundStart,
    /// About to play the turn of the snapshot entry at this index.
    UnitTurn(usize),
    /// Every snapshot entry has been processed.
    RoundEnd,
    /// Terminal.
    CombatOver,
}

/// When a battle ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StopCondition {
    /// Fight until one side has no living units.
    #[default]
    Elimination,
    /// Also stop as soon as the given faction loses any unit.
    FirstCasualty(Faction),
}

/// Something that happened during a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A unit stepped to an adjacent square.
    Moved {
        /// The unit that moved.
        unit: UnitId,
        /// Square it left.
        from: GridPos,
        /// Square it entered.
        to: GridPos,
    },
    /// A unit struck an adjacent enemy.
    Attacked(AttackReport),
    /// A unit was killed.
    Died {
        /// The dead unit.
        unit: UnitId,
        /// Its faction.
        faction: Faction,
        /// The square it vacated.
        position: GridPos,
    },
    /// A round was fully played.
    RoundCompleted {
        /// New value of `rounds_completed`.
        rounds_completed: u32,
    },
    /// The battle reached its terminal state.
    CombatEnded(Outcome),
}

/// Everything that happened while playing (the rest of) one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Events in the order they happened.
    pub events: Vec<BattleEvent>,
    /// True if the round ran to completion and was counted.
    pub completed: bool,
}

impl RoundReport {
    /// Moves and attacks only, the units' actual trajectory.
    pub fn actions(&self) -> impl Iterator<Item = &BattleEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, BattleEvent::Moved { .. } | BattleEvent::Attacked(_)))
    }
}

/// One battle, owning its own copy of the map and every unit.
///
/// Battles are created from a [`Scenario`] and never share state with it or
/// with each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battle {
    map: Map,
    roster: UnitRoster,
    rounds_completed: u32,
    phase: BattlePhase,
    /// Turn order snapshot for the round in progress.
    turn_order: Vec<UnitId>,
    /// Whether any unit moved or attacked in the round in progress.
    round_active: bool,
    stop: StopCondition,
    outcome: Option<Outcome>,
}

impl Battle {
    /// Instantiate a fresh battle from a scenario.
    #[must_use]
    pub fn new(scenario: &Scenario) -> Self {
        let mut roster = UnitRoster::new();
        for unit in scenario.units() {
            roster.spawn(unit.faction, unit.position, unit.hit_points, unit.attack_power);
        }

        Self {
            map: scenario.map().clone(),
            roster,
            rounds_completed: 0,
            phase: BattlePhase::RoundStart,
            turn_order: Vec::new(),
            round_active: false,
            stop: StopCondition::Elimination,
            outcome: None,
        }
    }

    /// Use a different stop condition.
    #[must_use]
    pub fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    /// The battle map.
    #[must_use]
    pub fn map(&self) -> &Map {
        &self.map
    }

    /// All units, dead and alive.
    #[must_use]
    pub fn roster(&self) -> &UnitRoster {
        &self.roster
    }

    /// Rounds fully played so far.
    #[must_use]
    pub const fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    /// Current state-machine phase.
    #[must_use]
    pub const fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// True once the battle reached [`BattlePhase::CombatOver`].
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == BattlePhase::CombatOver
    }

    /// The final outcome, once the battle is over.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Perform one state-machine transition, appending what happened to
    /// `events`.
    ///
    /// # Errors
    ///
    /// Returns [`SkirmishError::Stalemate`] when a full round ends without a
    /// single move or attack; such a battle would never end.
    pub fn advance(&mut self, events: &mut Vec<BattleEvent>) -> Result<BattlePhase> {
        self.phase = match self.phase {
            BattlePhase::RoundStart => {
                self.turn_order = self.roster.living_units();
                self.round_active = false;
                BattlePhase::UnitTurn(0)
            }
            BattlePhase::UnitTurn(index) => self.play_turn(index, events),
            BattlePhase::RoundEnd => {
                if !self.round_active {
                    return Err(SkirmishError::Stalemate {
                        rounds: self.rounds_completed,
                    });
                }
                self.rounds_completed += 1;
                events.push(BattleEvent::RoundCompleted {
                    rounds_completed: self.rounds_completed,
                });
                tracing::debug!(
                    round = self.rounds_completed,
                    elf_health = self.roster.total_health(Faction::Elf),
                    goblin_health = self.roster.total_health(Faction::Goblin),
                    "Round completed"
                );
                BattlePhase::RoundStart
            }
            BattlePhase::CombatOver => BattlePhase::CombatOver,
        };

        Ok(self.phase)
    }

    /// Play until the current round is finished or combat is over.
    ///
    /// # Errors
    ///
    /// See [`Battle::advance`].
    pub fn step_round(&mut self) -> Result<RoundReport> {
        let mut report = RoundReport::default();
        if self.is_over() {
            return Ok(report);
        }

        loop {
            match self.advance(&mut report.events)? {
                BattlePhase::RoundStart => {
                    report.completed = true;
                    return Ok(report);
                }
                BattlePhase::CombatOver => return Ok(report),
                BattlePhase::UnitTurn(_) | BattlePhase::RoundEnd => {}
            }
        }
    }

    /// Play the battle to its end and return the outcome.
    ///
    /// Calling this on a finished battle returns the same outcome again.
    ///
    /// # Errors
    ///
    /// See [`Battle::advance`].
    pub fn run(&mut self) -> Result<Outcome> {
        loop {
            if let Some(outcome) = self.outcome {
                return Ok(outcome);
            }
            self.step_round()?;
        }
    }

    fn play_turn(&mut self, index: usize, events: &mut Vec<BattleEvent>) -> BattlePhase {
        let Some(&id) = self.turn_order.get(index) else {
            return BattlePhase::RoundEnd;
        };
        let next = if index + 1 < self.turn_order.len() {
            BattlePhase::UnitTurn(index + 1)
        } else {
            BattlePhase::RoundEnd
        };

        let Some((faction, from)) = self
            .roster
            .get(id)
            .filter(|u| u.alive)
            .map(|u| (u.faction, u.position))
        else {
            return next;
        };
        if !self.roster.has_living(faction.enemy()) {
            return self.finish(events);
        }

        if !has_adjacent_enemy(&self.roster, id) {
            if let Some(plan) = plan_move(&self.map, &self.roster, id) {
                if self.roster.move_unit(id, plan.step) {
                    tracing::trace!(unit = id.0, %from, to = %plan.step, "Unit moved");
                    events.push(BattleEvent::Moved {
                        unit: id,
                        from,
                        to: plan.step,
                    });
                    self.round_active = true;
                }
            }
        }

        if let Some(report) = resolve_attack(&mut self.roster, id) {
            events.push(BattleEvent::Attacked(report));
            self.round_active = true;

            let victim = self.roster.get(report.target).map(|u| u.faction);
            if let (true, Some(victim)) = (report.killed, victim) {
                events.push(BattleEvent::Died {
                    unit: report.target,
                    faction: victim,
                    position: report.target_position,
                });

                if self.stop == StopCondition::FirstCasualty(victim) {
                    return self.finish(events);
                }
            }
        }

        next
    }

    fn finish(&mut self, events: &mut Vec<BattleEvent>) -> BattlePhase {
        let living: Vec<Faction> = Faction::ALL
            .into_iter()
            .filter(|&f| self.roster.has_living(f))
            .collect();
        let winner = match living.as_slice() {
            [only] => Some(*only),
            _ => None,
        };

        let outcome = Outcome {
            rounds_completed: self.rounds_completed,
            remaining_health: Faction::ALL
                .iter()
                .map(|&f| self.roster.total_health(f))
                .sum(),
            winner,
            casualties: Faction::ALL.map(|f| self.roster.casualties(f)),
        };

        tracing::debug!(
            rounds = outcome.rounds_completed,
            remaining_health = outcome.remaining_health,
            winner = ?outcome.winner,
            score = outcome.score(),
            "Combat over"
        );

        events.push(BattleEvent::CombatEnded(outcome));
        self.outcome = Some(outcome);
        BattlePhase::CombatOver
    }

    /// Hash of the complete battle state.
    ///
    /// Two battles with equal hashes have (with overwhelming probability)
    /// identical unit positions, health and round counters.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.rounds_completed.hash(&mut hasher);
        self.phase.hash(&mut hasher);

        self.roster.len().hash(&mut hasher);
        for unit in self.roster.iter() {
            unit.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Play the battle to its end, folding the state hash after every round
    /// into one value.
    ///
    /// Equal trajectory hashes mean the battles moved and fought identically,
    /// not merely finished in the same state.
    ///
    /// # Errors
    ///
    /// See [`Battle::advance`].
    pub fn trajectory_hash(mut self) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        self.state_hash().hash(&mut hasher);

        while !self.is_over() {
            let report = self.step_round()?;
            report.events.len().hash(&mut hasher);
            self.state_hash().hash(&mut hasher);
        }

        self.outcome.hash(&mut hasher);
        Ok(hasher.finish())
    }

    /// Serialize the battle to bytes for checkpointing.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| SkirmishError::InvalidState(format!("Failed to serialize battle: {e}")))
    }

    /// Restore a battle from bytes produced by [`Battle::serialize`].
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| SkirmishError::InvalidState(format!("Failed to deserialize battle: {e}")))
    }
}

/// Run a scenario to completion with default rules.
///
/// # Errors
///
/// Returns [`SkirmishError::Stalemate`] if the two sides can never reach
/// each other.
pub fn simulate(scenario: &Scenario) -> Result<Outcome> {
    Battle::new(scenario).run()
}
