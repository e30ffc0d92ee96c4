//! Scenario loading and configuration.
//!
//! A scenario file is plain map text. How its symbols are read is described
//! by [`ScenarioRules`], which default to the classic elf/goblin layout and
//! can be overridden by a RON rules file.

use std::path::{Path, PathBuf};

use skirmish_core::error::SkirmishError;
use skirmish_core::scenario::{Scenario, ScenarioRules};
use thiserror::Error;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse rules: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// The scenario itself is invalid, or simulating it failed.
    #[error("{0}")]
    Battle(#[from] SkirmishError),
}

/// A scenario together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedScenario {
    /// Display name, taken from the file stem.
    pub name: String,
    /// Source file.
    pub path: PathBuf,
    /// The parsed scenario.
    pub scenario: Scenario,
}

/// Load scenario rules from a RON file.
pub fn load_rules<P: AsRef<Path>>(path: P) -> Result<ScenarioRules, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    rules_from_ron_str(&contents)
}

/// Load rules from a RON string (useful for embedded rules).
///
/// Markers with non-positive health or attack power are rejected.
pub fn rules_from_ron_str(ron: &str) -> Result<ScenarioRules, ScenarioError> {
    let rules: ScenarioRules = ron::from_str(ron)?;
    rules.validate()?;
    Ok(rules)
}

/// Load rules from an optional path, falling back to the defaults.
pub fn load_rules_or_default(path: Option<&Path>) -> Result<ScenarioRules, ScenarioError> {
    match path {
        Some(path) => {
            let rules = load_rules(path)?;
            tracing::debug!(path = %path.display(), markers = rules.markers.len(), "Loaded rules");
            Ok(rules)
        }
        None => Ok(ScenarioRules::default()),
    }
}

/// Load and parse a scenario file.
pub fn load_scenario<P: AsRef<Path>>(
    path: P,
    rules: &ScenarioRules,
) -> Result<LoadedScenario, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }

    let contents = std::fs::read_to_string(path)?;
    let scenario = Scenario::parse_with(&contents, rules)?;
    let name = path
        .file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());

    tracing::debug!(
        %name,
        width = scenario.map().width(),
        height = scenario.map().height(),
        units = scenario.units().len(),
        "Loaded scenario"
    );

    Ok(LoadedScenario {
        name,
        path: path.to_path_buf(),
        scenario,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::factions::Faction;

    #[test]
    fn test_load_scenario_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duel.txt");
        std::fs::write(&path, "####\n#EG#\n####\n").unwrap();

        let loaded = load_scenario(&path, &ScenarioRules::default()).unwrap();
        assert_eq!(loaded.name, "duel");
        assert_eq!(loaded.scenario.unit_count(Faction::Elf), 1);
        assert_eq!(loaded.scenario.unit_count(Faction::Goblin), 1);
    }

    #[test]
    fn test_missing_file() {
        let result = load_scenario("/definitely/not/here.txt", &ScenarioRules::default());
        assert!(matches!(result, Err(ScenarioError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_map_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "####\n#E?#\n####\n").unwrap();

        let result = load_scenario(&path, &ScenarioRules::default());
        assert!(matches!(
            result,
            Err(ScenarioError::Battle(SkirmishError::UnknownSymbol { symbol: '?', .. }))
        ));
    }

    #[test]
    fn test_rules_from_ron() {
        let rules = rules_from_ron_str(skirmish_test_utils::fixtures::CUSTOM_RULES_RON).unwrap();
        assert_eq!(rules.open, '_');
        assert_eq!(rules.markers[0].attack_power, 5);
    }

    #[test]
    fn test_partial_rules_use_defaults() {
        let rules = rules_from_ron_str("(wall: 'X')").unwrap();
        assert_eq!(rules.wall, 'X');
        assert_eq!(rules.open, '.');
        assert_eq!(rules.markers, ScenarioRules::default().markers);
    }

    #[test]
    fn test_bad_ron_rejected() {
        assert!(matches!(
            rules_from_ron_str("(wall: )"),
            Err(ScenarioError::ParseError(_))
        ));
    }

    #[test]
    fn test_custom_rules_file() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("rules.ron");
        let map_path = dir.path().join("custom.txt");
        std::fs::write(&rules_path, skirmish_test_utils::fixtures::CUSTOM_RULES_RON).unwrap();
        std::fs::write(&map_path, "XXXX\nXabX\nXXXX").unwrap();

        let rules = load_rules_or_default(Some(&rules_path)).unwrap();
        let loaded = load_scenario(&map_path, &rules).unwrap();
        assert_eq!(loaded.scenario.units()[0].hit_points, 10);
        assert_eq!(loaded.scenario.units()[1].hit_points, 20);
    }

    #[test]
    fn test_powerless_rules_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let rules_path = dir.path().join("powerless.ron");
        std::fs::write(
            &rules_path,
            "(markers: [\n\
             (symbol: 'E', faction: Elf, hit_points: 200, attack_power: 0),\n\
             (symbol: 'G', faction: Goblin, hit_points: 200, attack_power: 0),\n\
             ])",
        )
        .unwrap();

        let result = load_rules_or_default(Some(&rules_path));
        assert!(matches!(
            result,
            Err(ScenarioError::Battle(SkirmishError::InvalidMarker {
                symbol: 'E',
                attack_power: 0,
                ..
            }))
        ));
    }

    #[test]
    fn test_dead_marker_rejected() {
        let result =
            rules_from_ron_str("(markers: [(symbol: 'G', faction: Goblin, hit_points: 0, attack_power: 3)])");
        assert!(matches!(
            result,
            Err(ScenarioError::Battle(SkirmishError::InvalidMarker {
                hit_points: 0,
                ..
            }))
        ));
    }
}
