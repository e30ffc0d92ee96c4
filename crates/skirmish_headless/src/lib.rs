//! Headless battle runner for scenario files and CI verification.
//!
//! This crate wraps the deterministic core with everything that touches the
//! outside world:
//!
//! - **Scenario files**: map text plus optional RON rules
//! - **Metrics**: per-faction statistics gathered from battle events
//! - **Batch runs**: many files in parallel, results saved as JSON
//! - **Determinism checks**: repeated runs compared by trajectory hash
//!
//! # Example
//!
//! ```bash
//! # Simulate a map and search for the minimal elf boost
//! cargo run -p skirmish_headless -- run maps/arena.txt
//!
//! # Run a batch of maps and save the results
//! cargo run -p skirmish_headless -- batch maps/*.txt --output results/batch.json
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify maps/arena.txt --runs 8
//! ```

pub mod batch;
pub mod metrics;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, VerifyReport};
pub use metrics::{BatchSummary, BattleMetrics, BoostMetrics, FactionMetrics, MetricsCollector};
pub use runner::{format_summary, BattleRunner, RunConfig};
pub use scenario::{load_rules, load_scenario, LoadedScenario, ScenarioError};
