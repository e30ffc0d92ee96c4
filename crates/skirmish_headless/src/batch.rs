//! Batch battle runner.
//!
//! Runs many scenario files in parallel using rayon. Each file's battles
//! stay sequential and own their state; only whole files are spread across
//! threads.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_core::scenario::Scenario;
use skirmish_core::search::SearchConfig;
use skirmish_core::simulation::Battle;
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, BattleMetrics};
use crate::runner::{BattleRunner, RunConfig};
use crate::scenario::{load_rules_or_default, ScenarioError};

/// Configuration for a batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario files to run
    pub scenarios: Vec<PathBuf>,
    /// Optional RON rules file applied to every scenario
    pub rules: Option<PathBuf>,
    /// Boost search to run after each simulation
    pub search: Option<SearchConfig>,
    /// Maximum parallel battles (0 = use rayon default)
    pub parallel: u32,
}

impl BatchConfig {
    /// Create config for a set of scenario files
    pub fn new(scenarios: Vec<PathBuf>) -> Self {
        Self {
            scenarios,
            ..Default::default()
        }
    }

    /// Set rules file
    pub fn with_rules(mut self, rules: PathBuf) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Enable the boost search
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = Some(search);
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual battle metrics, in input order
    pub battles: Vec<BattleMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Scenario file
    pub scenario: PathBuf,
    /// Error message
    pub message: String,
}

/// Run a batch of scenario files
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let start = Instant::now();
    let total = config.scenarios.len();
    let completed = AtomicU32::new(0);

    info!("Starting batch run: {} scenarios", total);

    let rules = load_rules_or_default(config.rules.as_deref())?;
    let runner = BattleRunner::with_config(RunConfig {
        search_only: false,
        search: config.search,
    });

    if config.parallel > 0 {
        configure_thread_pool(config.parallel);
    }

    let results: Vec<Result<BattleMetrics, BatchError>> = config
        .scenarios
        .par_iter()
        .map(|path| match runner.run_file(path, &rules) {
            Ok(metrics) => {
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                debug!("Progress: {}/{}", done, total);
                Ok(metrics)
            }
            Err(e) => {
                warn!("Scenario {} failed: {}", path.display(), e);
                Err(BatchError {
                    scenario: path.clone(),
                    message: e.to_string(),
                })
            }
        })
        .collect();

    let (battles, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let battles: Vec<BattleMetrics> = battles.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_battles(&battles);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} battles in {:.3}s ({} failed)",
        battles.len(),
        duration_seconds,
        errors.len()
    );

    Ok(BatchResults {
        config,
        battles,
        summary,
        duration_seconds,
        errors,
    })
}

/// Size rayon's global pool. The pool can only be built once per process;
/// later requests are logged and the existing pool is kept.
///
/// Returns true if the requested size took effect.
fn configure_thread_pool(threads: u32) -> bool {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads as usize)
        .build_global()
    {
        Ok(()) => {
            debug!(threads, "Configured thread pool");
            true
        }
        Err(e) => {
            warn!(
                requested = threads,
                current = rayon::current_num_threads(),
                error = %e,
                "Thread pool already initialized, keeping existing size"
            );
            false
        }
    }
}

/// Outcome of a determinism check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Number of runs compared
    pub runs: u32,
    /// Trajectory hash of each run
    pub hashes: Vec<u64>,
}

impl VerifyReport {
    /// True if every run followed the same trajectory.
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Verify determinism by simulating the same scenario several times in
/// parallel and comparing trajectory hashes
pub fn verify_determinism(scenario: &Scenario, runs: u32) -> Result<VerifyReport, ScenarioError> {
    let hashes = (0..runs)
        .into_par_iter()
        .map(|_| Battle::new(scenario).trajectory_hash())
        .collect::<Result<Vec<u64>, _>>()?;

    Ok(VerifyReport { runs, hashes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_test_utils::fixtures::{REFERENCE_BATTLES, WINDING_CORRIDOR};

    fn write_reference_maps(dir: &Path) -> Vec<PathBuf> {
        REFERENCE_BATTLES
            .iter()
            .enumerate()
            .map(|(i, reference)| {
                let path = dir.join(format!("map_{i}.txt"));
                std::fs::write(&path, reference.map).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(vec![PathBuf::from("a.txt")])
            .with_rules(PathBuf::from("rules.ron"))
            .with_search(SearchConfig::default());

        assert_eq!(config.scenarios.len(), 1);
        assert_eq!(config.rules, Some(PathBuf::from("rules.ron")));
        assert!(config.search.is_some());
        assert_eq!(config.parallel, 0);
    }

    #[test]
    fn test_run_batch_reference_maps() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_reference_maps(dir.path());

        let results = run_batch(BatchConfig::new(paths)).unwrap();

        assert!(results.errors.is_empty());
        let scores: Vec<i64> = results.battles.iter().map(|b| b.score).collect();
        assert_eq!(scores, vec![27730, 36334, 39514, 27755, 28944, 18740]);
        assert_eq!(results.summary.total_battles, 6);
        assert_eq!(results.summary.wins_by_faction["goblin"], 4);
        assert_eq!(results.summary.wins_by_faction["elf"], 2);
    }

    #[test]
    fn test_batch_collects_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_reference_maps(dir.path());
        paths.push(dir.path().join("missing.txt"));

        let results = run_batch(BatchConfig::new(paths)).unwrap();

        assert_eq!(results.battles.len(), 6);
        assert_eq!(results.errors.len(), 1);
        assert!(results.errors[0].message.contains("not found"));
    }

    #[test]
    fn test_batch_missing_rules_is_fatal() {
        let config = BatchConfig::new(Vec::new()).with_rules(PathBuf::from("/no/rules.ron"));
        assert!(matches!(run_batch(config), Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_batch_results_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_reference_maps(dir.path());
        let results = run_batch(BatchConfig::new(paths[..2].to_vec())).unwrap();

        let path = dir.path().join("out").join("results.json");
        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.battles, results.battles);
        assert_eq!(loaded.config.scenarios.len(), 2);
    }

    #[test]
    fn test_second_thread_pool_request_is_refused() {
        // Whichever call runs first may build the global pool; a second
        // request in the same process can never take effect.
        configure_thread_pool(2);
        assert!(!configure_thread_pool(3));
    }

    #[test]
    fn test_verify_determinism() {
        let report = verify_determinism(&WINDING_CORRIDOR.scenario(), 4).unwrap();
        assert_eq!(report.hashes.len(), 4);
        assert!(report.is_deterministic());
    }

    #[test]
    fn test_verify_stalemate_errors() {
        let scenario = skirmish_test_utils::fixtures::scenario("#######\n#E.#.G#\n#######");
        assert!(verify_determinism(&scenario, 2).is_err());
    }
}
