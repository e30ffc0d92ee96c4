//! End-to-end battle tests.
//!
//! These tests run complete battles on reference maps with known results
//! and check the round-counting, movement and search rules as a whole.

use skirmish_core::prelude::*;
use skirmish_test_utils::fixtures::{
    expected_layout, scenario, unit_layout, CONVERGENCE, ELF_STRONGHOLD, OPENING_SKIRMISH,
    REFERENCE_BATTLES, SCATTERED_CAMPS, WINDING_CORRIDOR,
};

// =============================================================================
// Reference Outcomes
// =============================================================================

mod reference {
    use super::*;

    #[test]
    fn test_reference_battles_simulate() {
        for reference in REFERENCE_BATTLES {
            let outcome = simulate(&reference.scenario()).unwrap();

            assert_eq!(outcome.rounds_completed, reference.rounds, "{}", reference.name);
            assert_eq!(
                outcome.remaining_health, reference.remaining_health,
                "{}",
                reference.name
            );
            assert_eq!(outcome.winner, Some(reference.winner), "{}", reference.name);
            assert_eq!(outcome.score(), reference.score(), "{}", reference.name);
        }
    }

    #[test]
    fn test_reference_scores() {
        let scores: Vec<i64> = REFERENCE_BATTLES
            .iter()
            .map(|r| simulate(&r.scenario()).unwrap().score())
            .collect();
        assert_eq!(scores, vec![27730, 36334, 39514, 27755, 28944, 18740]);
    }

    #[test]
    fn test_reference_boost_searches() {
        for reference in REFERENCE_BATTLES {
            let Some((boost, rounds, health)) = reference.elf_boost else {
                continue;
            };
            let result = search_min_boost(&reference.scenario(), &SearchConfig::default())
                .unwrap();

            assert_eq!(result.boost, boost, "{}", reference.name);
            assert_eq!(result.attack_power, 3 + boost, "{}", reference.name);
            assert_eq!(result.outcome.rounds_completed, rounds, "{}", reference.name);
            assert_eq!(result.outcome.remaining_health, health, "{}", reference.name);
            assert!(result.outcome.is_flawless_win(Faction::Elf), "{}", reference.name);
        }
    }

    #[test]
    fn test_search_scores() {
        let scores: Vec<i64> = REFERENCE_BATTLES
            .iter()
            .filter(|r| r.elf_boost.is_some())
            .map(|r| {
                search_min_boost(&r.scenario(), &SearchConfig::default())
                    .unwrap()
                    .outcome
                    .score()
            })
            .collect();
        assert_eq!(scores, vec![4988, 31284, 3478, 6474, 1140]);
    }

    #[test]
    fn test_casualties_recorded() {
        let outcome = simulate(&SCATTERED_CAMPS.scenario()).unwrap();
        let scenario = SCATTERED_CAMPS.scenario();

        assert_eq!(
            outcome.casualties_of(Faction::Goblin),
            u32::try_from(scenario.unit_count(Faction::Goblin)).unwrap()
        );
        assert!(outcome.casualties_of(Faction::Elf) > 0);
        assert!(!outcome.is_flawless_win(Faction::Elf));
    }

    #[test]
    fn test_search_outcome_matches_boosted_run() {
        let scenario = ELF_STRONGHOLD.scenario();
        let result = search_min_boost(&scenario, &SearchConfig::default()).unwrap();

        let replay = Battle::new(&scenario.with_boost(Faction::Elf, result.boost))
            .with_stop_condition(StopCondition::FirstCasualty(Faction::Elf))
            .run()
            .unwrap();
        assert_eq!(replay, result.outcome);
    }
}

// =============================================================================
// Round Counting
// =============================================================================

mod rounds {
    use super::*;

    #[test]
    fn test_elimination_mid_round_not_counted() {
        // The elf dies to the first goblin in round 34; the second goblin
        // then finds no enemy and ends combat before the round completes.
        let outcome = simulate(&scenario("#####\n#GEG#\n#####")).unwrap();

        assert_eq!(outcome.rounds_completed, 33);
        assert_eq!(outcome.remaining_health, 101 + 200);
        assert_eq!(outcome.winner, Some(Faction::Goblin));
    }

    #[test]
    fn test_elimination_with_nobody_left_to_act_counted() {
        // The back goblin can never reach the elf. The front goblin lands
        // the killing blow in round 67 and only the dead elf is left to act.
        let outcome = simulate(&scenario("#####\n#GGE#\n#####")).unwrap();

        assert_eq!(outcome.rounds_completed, 67);
        assert_eq!(outcome.remaining_health, 200 + 2);
        assert_eq!(outcome.score(), 67 * 202);
    }

    #[test]
    fn test_round_reports_follow_counter() {
        let mut battle = Battle::new(&OPENING_SKIRMISH.scenario());

        let mut completed = 0;
        while !battle.is_over() {
            let report = battle.step_round().unwrap();
            if report.completed {
                completed += 1;
                assert!(report.events.contains(&BattleEvent::RoundCompleted {
                    rounds_completed: completed,
                }));
            } else {
                assert!(matches!(
                    report.events.last(),
                    Some(BattleEvent::CombatEnded(_))
                ));
            }
            assert_eq!(battle.rounds_completed(), completed);
        }

        assert_eq!(completed, 47);
    }

    #[test]
    fn test_unreachable_factions_stalemate() {
        let result = simulate(&scenario("#########\n#E.G#G.E#\n#########"));
        // Each pocket fights to the end, then the survivors are walled apart.
        assert!(matches!(result, Err(SkirmishError::Stalemate { .. })));
    }
}

// =============================================================================
// Movement
// =============================================================================

mod movement {
    use super::*;

    #[test]
    fn test_convergence_rounds() {
        let mut battle = Battle::new(&scenario(CONVERGENCE[0]));

        for expected in &CONVERGENCE[1..] {
            let report = battle.step_round().unwrap();
            assert!(report.completed);
            assert_eq!(unit_layout(&battle), expected_layout(expected));
        }
    }

    #[test]
    fn test_units_never_share_squares() {
        let mut battle = Battle::new(&WINDING_CORRIDOR.scenario());

        while !battle.is_over() {
            battle.step_round().unwrap();
            let layout = unit_layout(&battle);
            let mut squares: Vec<GridPos> = layout.iter().map(|(_, p)| *p).collect();
            squares.sort();
            squares.dedup();
            assert_eq!(squares.len(), layout.len());
        }
    }

    #[test]
    fn test_moves_are_single_open_steps() {
        let scenario = OPENING_SKIRMISH.scenario();
        let mut battle = Battle::new(&scenario);

        while !battle.is_over() {
            let report = battle.step_round().unwrap();
            for event in report.actions() {
                if let BattleEvent::Moved { from, to, .. } = event {
                    assert!(from.is_adjacent(*to));
                    assert!(scenario.map().is_open_at(*to));
                }
            }
        }
    }
}

// =============================================================================
// Boost Search
// =============================================================================

mod search {
    use super::*;

    /// Elf casualties of a full battle at each boost in `0..=max_boost`.
    fn elf_casualties_by_boost(scenario: &Scenario, max_boost: i32) -> Vec<u32> {
        (0..=max_boost)
            .map(|boost| {
                simulate(&scenario.with_boost(Faction::Elf, boost))
                    .unwrap()
                    .casualties_of(Faction::Elf)
            })
            .collect()
    }

    #[test]
    fn test_reference_casualties_fall_with_boost() {
        for reference in REFERENCE_BATTLES {
            let scenario = reference.scenario();
            let result = search_min_boost(&scenario, &SearchConfig::default()).unwrap();
            let casualties = elf_casualties_by_boost(&scenario, result.boost);

            assert!(
                casualties.windows(2).all(|w| w[1] <= w[0]),
                "{}: {casualties:?}",
                reference.name
            );
            assert_eq!(casualties.last(), Some(&0), "{}", reference.name);
        }
    }

    #[test]
    fn test_opening_casualties_by_boost() {
        let casualties = elf_casualties_by_boost(&OPENING_SKIRMISH.scenario(), 12);
        assert_eq!(casualties, vec![2, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 0]);
    }

    #[test]
    fn test_casualties_can_rise_with_boost() {
        // One extra point of elf power costs the elves a second unit.
        let scenario = scenario(
            "\
#######
#E..#E#
#.#G..#
#..#..#
#G.#EG#
#######
",
        );

        let casualties = elf_casualties_by_boost(&scenario, 5);
        assert_eq!(casualties, vec![1, 2, 1, 1, 1, 0]);

        let result = search_min_boost(&scenario, &SearchConfig::default()).unwrap();
        assert_eq!(result.boost, 5);
        assert_eq!(result.candidates_tried, 6);
        assert_eq!(result.outcome.rounds_completed, 45);
        assert_eq!(result.outcome.remaining_health, 372);
    }
}

// =============================================================================
// Checkpoints
// =============================================================================

mod checkpoints {
    use super::*;

    #[test]
    fn test_resume_from_checkpoint() {
        let scenario = WINDING_CORRIDOR.scenario();
        let mut battle = Battle::new(&scenario);
        for _ in 0..25 {
            battle.step_round().unwrap();
        }

        let bytes = battle.serialize().unwrap();
        let mut restored = Battle::deserialize(&bytes).unwrap();
        assert_eq!(restored, battle);

        let expected = battle.run().unwrap();
        assert_eq!(restored.run().unwrap(), expected);
        assert_eq!(expected.score(), WINDING_CORRIDOR.score());
    }

    #[test]
    fn test_checkpoint_mid_round() {
        let mut battle = Battle::new(&OPENING_SKIRMISH.scenario());
        let mut events = Vec::new();
        for _ in 0..5 {
            battle.advance(&mut events).unwrap();
        }
        assert!(matches!(battle.phase(), BattlePhase::UnitTurn(_)));

        let mut restored = Battle::deserialize(&battle.serialize().unwrap()).unwrap();
        assert_eq!(restored.state_hash(), battle.state_hash());
        assert_eq!(restored.run().unwrap(), battle.run().unwrap());
    }
}
