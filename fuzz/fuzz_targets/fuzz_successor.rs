#![no_main]

//! Successor generation fuzzer.
//!
//! Plays fuzzer-chosen actions round robin on a fixed arena, under
//! fuzzer-chosen rule constants, and checks every invariant after each
//! move. Illegal actions must be rejected without touching the parent.

use arbitrary::Arbitrary;
use flagrun::game::{check_invariants, Action, GameState, Layout};
use flagrun::{DumpSide, RulesConfig};
use libfuzzer_sys::fuzz_target;

const ARENA: [&str; 7] = [
    "%%%%%%%%%%%%",
    "%1 .  % . 2%",
    "% %%. o  % %",
    "%  .    .  %",
    "% %  o .%% %",
    "%3 . %  . 4%",
    "%%%%%%%%%%%%",
];

/// Structured input for successor fuzzing.
#[derive(Arbitrary, Debug)]
struct MatchInput {
    kill_points: i8,
    scared_time: u8,
    min_food_reserve: u8,
    collision_tolerance: u8,
    capture_side: bool,
    two_agents: bool,
    /// Action index per move, agents in round robin.
    actions: Vec<u8>,
}

fuzz_target!(|input: MatchInput| {
    let Ok(layout) = Layout::from_rows(&ARENA) else {
        return;
    };
    let rules = RulesConfig {
        kill_points: i32::from(input.kill_points),
        scared_time: u32::from(input.scared_time),
        min_food_reserve: u32::from(input.min_food_reserve % 8),
        collision_tolerance: u32::from(input.collision_tolerance % 3),
        dump_side: if input.capture_side {
            DumpSide::CaptureSide
        } else {
            DumpSide::VictimHome
        },
        ..RulesConfig::default()
    };
    let agents = if input.two_agents { 2 } else { 4 };
    let Ok(mut state) = GameState::new(&layout, rules, 1200, agents) else {
        return;
    };

    for (turn, &choice) in input.actions.iter().take(1200).enumerate() {
        if state.is_terminal() {
            assert!(state.successor(0, Action::Stop).is_err());
            break;
        }
        let agent = turn % agents;
        let action = Action::ALL[usize::from(choice) % Action::ALL.len()];
        let legal = state.legal_actions(agent).expect("agent exists");

        match state.successor(agent, action) {
            Ok(next) => {
                assert!(legal.contains(&action));
                let violations = check_invariants(&next);
                assert!(
                    violations.is_empty(),
                    "Invariants violated after turn {turn}: {violations:?}"
                );
                assert_eq!(next.time_left() + 1, state.time_left());
                state = next;
            }
            Err(_) => assert!(!legal.contains(&action)),
        }
    }
});
