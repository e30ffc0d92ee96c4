//! Headless battle runner.
//!
//! Runs grid battles from scenario files without any interface. Results go
//! to stdout, logs to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Simulate a map, then search for the minimal elf boost
//! cargo run -p skirmish_headless -- run maps/arena.txt
//!
//! # Same, as JSON, with custom symbols
//! cargo run -p skirmish_headless -- run maps/arena.txt --rules rules.ron --json
//!
//! # Only the boost search, protecting goblins
//! cargo run -p skirmish_headless -- search maps/arena.txt --faction goblin
//!
//! # Many maps in parallel
//! cargo run -p skirmish_headless -- batch maps/*.txt --output results/batch.json
//!
//! # Verify determinism
//! cargo run -p skirmish_headless -- verify maps/arena.txt --runs 8
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skirmish_core::factions::Faction;
use skirmish_core::scenario::ScenarioRules;
use skirmish_core::search::SearchConfig;
use skirmish_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{format_summary, BattleRunner, RunConfig},
    scenario::{load_rules_or_default, load_scenario},
};

#[derive(Parser)]
#[command(name = "skirmish")]
#[command(about = "Headless grid battle runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Faction protected by the boost search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FactionArg {
    Elf,
    Goblin,
}

impl From<FactionArg> for Faction {
    fn from(arg: FactionArg) -> Self {
        match arg {
            FactionArg::Elf => Faction::Elf,
            FactionArg::Goblin => Faction::Goblin,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a scenario, then search for the minimal elf boost
    Run {
        /// Scenario map file
        map: PathBuf,

        /// RON rules file for map symbols and unit stats
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Print metrics as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Only search for the minimal boost giving a flawless victory
    Search {
        /// Scenario map file
        map: PathBuf,

        /// Faction to boost and protect
        #[arg(short, long, value_enum, default_value = "elf")]
        faction: FactionArg,

        /// Largest boost to try (default: one-hit-kill bound)
        #[arg(long)]
        max_boost: Option<i32>,

        /// RON rules file for map symbols and unit stats
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Run many scenario files in parallel
    Batch {
        /// Scenario map files
        #[arg(required = true)]
        maps: Vec<PathBuf>,

        /// Output JSON file for results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// RON rules file applied to every map
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Also run the elf boost search for every map
        #[arg(long)]
        search: bool,

        /// Maximum parallel battles (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,
    },

    /// Verify determinism by simulating the same scenario several times
    Verify {
        /// Scenario map file
        map: PathBuf,

        /// Number of verification runs
        #[arg(short = 'n', long, default_value = "5")]
        runs: u32,

        /// RON rules file for map symbols and unit stats
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for results)
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run { map, rules, json } => cmd_run(&map, rules.as_deref(), json),
        Commands::Search {
            map,
            faction,
            max_boost,
            rules,
        } => cmd_search(&map, faction.into(), max_boost, rules.as_deref()),
        Commands::Batch {
            maps,
            output,
            rules,
            search,
            parallel,
        } => cmd_batch(maps, output, rules, search, parallel),
        Commands::Verify { map, runs, rules } => cmd_verify(&map, runs, rules.as_deref()),
    }
}

/// Load rules or exit.
fn rules_or_exit(path: Option<&Path>) -> ScenarioRules {
    match load_rules_or_default(path) {
        Ok(rules) => rules,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load rules");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}

/// Simulate one scenario and run the default boost search
fn cmd_run(map: &Path, rules: Option<&Path>, json: bool) {
    let rules = rules_or_exit(rules);
    let runner = BattleRunner::with_config(RunConfig::with_search());

    let metrics = match runner.run_file(map, &rules) {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::error!(error = %e, map = %map.display(), "Battle failed");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&metrics) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("FATAL: Failed to encode metrics: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!("{}", format_summary(&metrics));
    }
}

/// Search for the minimal boost only
fn cmd_search(map: &Path, faction: Faction, max_boost: Option<i32>, rules: Option<&Path>) {
    let rules = rules_or_exit(rules);
    let runner = BattleRunner::with_config(RunConfig::search_only(SearchConfig {
        faction,
        max_boost,
    }));

    match runner.run_file(map, &rules) {
        Ok(metrics) => println!("{}", format_summary(&metrics)),
        Err(e) => {
            tracing::error!(error = %e, map = %map.display(), %faction, "Boost search failed");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}

/// Run a batch of scenario files
fn cmd_batch(
    maps: Vec<PathBuf>,
    output: Option<PathBuf>,
    rules: Option<PathBuf>,
    search: bool,
    parallel: u32,
) {
    let mut config = BatchConfig::new(maps);
    config.rules = rules;
    config.parallel = parallel;
    if search {
        config = config.with_search(SearchConfig::default());
    }

    let results = match run_batch(config) {
        Ok(results) => results,
        Err(e) => {
            tracing::error!(error = %e, "Batch failed");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    if let Some(path) = output {
        if let Err(e) = results.save(&path) {
            tracing::error!(error = %e, path = %path.display(), "Failed to save results");
            eprintln!("FATAL: Failed to save results: {e}");
            std::process::exit(1);
        }
        eprintln!("Results saved to: {}", path.display());
    }

    for battle in &results.battles {
        println!("{}", format_summary(battle));
        println!();
    }

    eprintln!("{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Battles played: {}", results.battles.len());
    for (faction, wins) in &results.summary.wins_by_faction {
        eprintln!("  {faction} wins: {wins}");
    }
    eprintln!("Duration: {:.3}s", results.duration_seconds);

    if !results.errors.is_empty() {
        eprintln!("\nFAILURES:");
        for error in &results.errors {
            eprintln!("  {}: {}", error.scenario.display(), error.message);
        }
        std::process::exit(1);
    }
}

/// Verify determinism by running the same scenario multiple times
fn cmd_verify(map: &Path, runs: u32, rules: Option<&Path>) {
    tracing::info!("Verifying determinism: {} ({} runs)", map.display(), runs);

    let rules = rules_or_exit(rules);
    let report = load_scenario(map, &rules)
        .and_then(|loaded| verify_determinism(&loaded.scenario, runs));

    match report {
        Ok(report) if report.is_deterministic() => {
            eprintln!("PASS: All {runs} runs produced identical trajectories");
            if let Some(hash) = report.hashes.first() {
                eprintln!("  Trajectory hash: {hash:016x}");
            }
        }
        Ok(report) => {
            eprintln!("FAIL: Non-determinism detected!");
            eprintln!("  Hashes: {:x?}", report.hashes);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, map = %map.display(), "Verification failed");
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    }
}
