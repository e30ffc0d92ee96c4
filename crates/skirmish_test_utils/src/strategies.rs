//! Proptest strategies for battle testing.
//!
//! These strategies generate random but reproducible arenas for
//! property-based testing of the simulation.

use proptest::prelude::*;
use skirmish_core::factions::Faction;
use skirmish_core::scenario::Scenario;

/// Generate one interior square: mostly floor, with some walls and units.
pub fn arb_square() -> impl Strategy<Value = char> {
    prop_oneof![
        8 => Just('.'),
        2 => Just('#'),
        1 => Just('E'),
        1 => Just('G'),
    ]
}

/// Generate the interior rows of an arena of up to `max_width` by
/// `max_height` squares, with at least one unit of each faction.
pub fn arb_interior(max_width: usize, max_height: usize) -> impl Strategy<Value = Vec<Vec<char>>> {
    (2..=max_width, 1..=max_height)
        .prop_flat_map(|(width, height)| {
            proptest::collection::vec(proptest::collection::vec(arb_square(), width), height)
        })
        .prop_filter("both factions present", |rows| {
            rows.iter().flatten().any(|&c| c == 'E') && rows.iter().flatten().any(|&c| c == 'G')
        })
}

/// Surround interior rows with a wall border.
#[must_use]
pub fn render_arena(rows: &[Vec<char>]) -> String {
    let width = rows.first().map_or(0, Vec::len) + 2;
    let border = "#".repeat(width);

    let mut text = String::new();
    text.push_str(&border);
    text.push('\n');
    for row in rows {
        text.push('#');
        text.extend(row);
        text.push_str("#\n");
    }
    text.push_str(&border);
    text
}

fn parse_arena(text: &str) -> Scenario {
    Scenario::parse(text).unwrap_or_else(|e| panic!("generated arena invalid: {e}\n{text}"))
}

/// Generate scenario text for a walled arena.
pub fn arb_arena_text(max_width: usize, max_height: usize) -> impl Strategy<Value = String> {
    arb_interior(max_width, max_height).prop_map(|rows| render_arena(&rows))
}

/// Generate a valid scenario for a walled arena.
pub fn arb_arena(max_width: usize, max_height: usize) -> impl Strategy<Value = Scenario> {
    arb_arena_text(max_width, max_height).prop_map(|text| parse_arena(&text))
}

/// Generate an arena with no interior walls, so every unit can reach every
/// other one unless blocked by bodies.
pub fn arb_open_arena(max_width: usize, max_height: usize) -> impl Strategy<Value = Scenario> {
    arb_interior(max_width, max_height).prop_map(|mut rows| {
        for square in rows.iter_mut().flatten() {
            if *square == '#' {
                *square = '.';
            }
        }
        parse_arena(&render_arena(&rows))
    })
}

/// Generate a protected faction for boost searches.
pub fn arb_faction() -> impl Strategy<Value = Faction> {
    prop_oneof![Just(Faction::Elf), Just(Faction::Goblin)]
}

/// Generate attack boosts (0-20).
pub fn arb_boost() -> impl Strategy<Value = i32> {
    0i32..=20
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_arena_has_both_factions(scenario in arb_arena(6, 4)) {
            prop_assert!(scenario.unit_count(Faction::Elf) > 0);
            prop_assert!(scenario.unit_count(Faction::Goblin) > 0);
        }

        #[test]
        fn prop_arena_is_walled(scenario in arb_arena(6, 4)) {
            let map = scenario.map();
            for x in 0..map.width() {
                prop_assert!(!map.is_open(x, 0));
                prop_assert!(!map.is_open(x, map.height() - 1));
            }
            for y in 0..map.height() {
                prop_assert!(!map.is_open(0, y));
                prop_assert!(!map.is_open(map.width() - 1, y));
            }
        }

        #[test]
        fn prop_open_arena_has_no_interior_walls(scenario in arb_open_arena(6, 4)) {
            let map = scenario.map();
            for y in 1..map.height() - 1 {
                for x in 1..map.width() - 1 {
                    prop_assert!(map.is_open(x, y));
                }
            }
        }
    }
}
