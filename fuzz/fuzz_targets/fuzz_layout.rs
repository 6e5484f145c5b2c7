#![no_main]

//! Layout parser fuzzer.
//!
//! Arbitrary text must either be rejected with an error or produce a layout
//! whose initial state satisfies every invariant.

use flagrun::game::{check_invariants, GameState, Layout};
use flagrun::RulesConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(layout) = text.parse::<Layout>() else {
        return;
    };

    let grid = layout.grid();
    assert_eq!(layout.total_food(), grid.food_count());
    for &start in layout.agent_starts() {
        assert!(grid.in_bounds(start));
        assert!(!grid.is_wall(start));
    }

    for agents in 2..=layout.agent_starts().len() {
        if let Ok(state) = GameState::new(&layout, RulesConfig::default(), 100, agents) {
            let violations = check_invariants(&state);
            assert!(violations.is_empty(), "{violations:?}");
        }
    }
});
