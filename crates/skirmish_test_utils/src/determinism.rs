//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Every decision a unit makes is an explicit minimum over
//! `(value, reading order)`, so two battles started from the same scenario
//! must agree event for event. Sources of non-determinism to watch for:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Occupancy lives in a `BTreeMap` and turn order is sorted.
//!
//! - **Shared state between runs**: every battle owns a fresh roster built
//!   from the scenario, so a run can never see another run's damage.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: planner and combat choices are stable
//! 2. **Property tests**: generated arenas replay identically
//! 3. **Integration tests**: reference battles are reproducible
//! 4. **Parallel tests**: running N battles on N threads all match

use std::thread;

use skirmish_core::simulation::Battle;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of rounds played per run.
    pub rounds: u32,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the battle was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Rounds: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.rounds,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped computation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `rounds` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use skirmish_core::scenario::Scenario;
/// use skirmish_core::simulation::Battle;
/// use skirmish_test_utils::determinism::verify_determinism;
///
/// let scenario = Scenario::parse("#####\n#E.G#\n#####").unwrap();
/// let result = verify_determinism(
///     5,
///     20,
///     || Battle::new(&scenario),
///     |battle| {
///         let _ = battle.step_round();
///     },
///     Battle::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    rounds: u32,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..rounds {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !is_deterministic {
        tracing::warn!(runs, rounds, ?hashes, "Runs produced different hashes");
    }

    DeterminismResult {
        is_deterministic,
        hashes,
        rounds,
    }
}

/// Result of parallel battle runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Trajectory hash from each battle.
    pub hashes: Vec<u64>,
    /// Number of battles run.
    pub num_battles: usize,
}

impl ParallelRunResult {
    /// Check if all battles produced identical trajectories.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all battles matched.
    ///
    /// # Panics
    ///
    /// Panics if battles produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel battles diverged!\n\
                 Battles: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_battles,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N battles on scoped threads and collect their
/// [`Battle::trajectory_hash`] values.
///
/// # Panics
///
/// Panics if a battle errors or a worker thread panics.
pub fn run_parallel_battles<F>(setup_fn: F, num_battles: usize) -> ParallelRunResult
where
    F: Fn() -> Battle + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_battles)
            .map(|_| s.spawn(|| setup_fn().trajectory_hash()))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });

    ParallelRunResult {
        hashes,
        num_battles,
    }
}

/// Step two battles round by round, finding the first round after which
/// their states differ.
///
/// # Returns
///
/// `None` if the battles agree for `max_rounds` rounds (or until both end),
/// `Some(round)` if they diverge after that round. Round 0 is the initial
/// state.
pub fn find_first_divergence<F>(setup_fn: F, max_rounds: u32) -> Option<u32>
where
    F: Fn() -> Battle,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for round in 1..=max_rounds {
        let a = first.step_round();
        let b = second.step_round();

        if a != b || first.state_hash() != second.state_hash() {
            tracing::warn!(round, "Battles diverged");
            return Some(round);
        }
        if first.is_over() {
            break;
        }
    }

    None
}

/// Checkpoint a battle after `rounds` rounds and verify the restored copy
/// finishes exactly like the original.
pub fn verify_checkpoint_determinism<F>(setup_fn: F, rounds: u32) -> bool
where
    F: Fn() -> Battle,
{
    let mut battle = setup_fn();

    for _ in 0..rounds {
        if battle.step_round().is_err() {
            return false;
        }
    }

    let Ok(bytes) = battle.serialize() else {
        return false;
    };
    let Ok(restored) = Battle::deserialize(&bytes) else {
        return false;
    };

    if restored.state_hash() != battle.state_hash() {
        return false;
    }

    match (battle.trajectory_hash(), restored.trajectory_hash()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
