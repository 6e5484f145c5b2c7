//! Game invariants - sanity checks that detect bugs.
//!
//! The rules should never produce a state that fails these checks. If one
//! triggers, a successor computed something wrong.

use crate::game::{GameState, Team};

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    // Food is only ever moved between the grid, carriers and the bank
    let on_grid = state.grid.food_count();
    let carried = state.total_carrying();
    let returned: u32 = state.agents.iter().map(|a| a.num_returned).sum();
    if on_grid + carried + returned != state.total_food {
        violations.push(violation(format!(
            "Food not conserved: {on_grid} on grid + {carried} carried + {returned} returned != {}",
            state.total_food
        )));
    }

    let scared_time = state.rules.scared_time;
    for (id, agent) in state.agents.iter().enumerate() {
        let expected = agent.team.is_red() != state.grid.is_red_side(agent.position);
        if agent.is_pacman != expected {
            violations.push(violation(format!(
                "Agent {id} at {:?} has role pacman={} but its side implies {expected}",
                agent.position, agent.is_pacman
            )));
        }

        if !agent.is_pacman && agent.num_carrying > 0 {
            violations.push(violation(format!(
                "Defender {id} carries {} food",
                agent.num_carrying
            )));
        }

        if state.grid.is_wall(agent.position) {
            violations.push(violation(format!(
                "Agent {id} stands in a wall or off the grid at {:?}",
                agent.position
            )));
        }

        if agent.scared_timer > scared_time {
            violations.push(violation(format!(
                "Agent {id} scared timer {} exceeds {scared_time}",
                agent.scared_timer
            )));
        }

        if state.roster.team_of(id) != Some(agent.team) {
            violations.push(violation(format!(
                "Agent {id} is {} but the roster disagrees",
                agent.team
            )));
        }
    }

    let listed = state.roster.members(Team::Red).len() + state.roster.members(Team::Blue).len();
    if listed != state.agents.len() {
        violations.push(violation(format!(
            "Roster lists {listed} agents, state has {}",
            state.agents.len()
        )));
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::game::{Action, Coord, Layout};

    fn create_valid_game() -> GameState {
        let layout = Layout::from_rows(&[
            "%%%%%%%%", //
            "%1 . . %", //
            "%  o  2%", //
            "%%%%%%%%",
        ])
        .unwrap();
        GameState::new(&layout, RulesConfig::default(), 100, 2).unwrap()
    }

    #[test]
    fn test_valid_game_passes() {
        let game = create_valid_game();
        let violations = check_invariants(&game);
        assert!(violations.is_empty(), "{violations:?}");
    }

    #[test]
    fn test_successors_keep_invariants() {
        let mut game = create_valid_game();
        for action in [Action::East, Action::East, Action::East, Action::East, Action::West] {
            game = game.successor(0, action).unwrap();
            assert_invariants(&game);
        }
        assert_eq!(game.agent(0).unwrap().num_carrying, 1);
    }

    #[test]
    fn test_lost_food_detected() {
        let mut game = create_valid_game();
        game.grid_mut().set_food(Coord::new(3, 2), false);

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("conserved"));
    }

    #[test]
    fn test_wrong_role_detected() {
        let mut game = create_valid_game();
        game.agent_mut(0).unwrap().is_pacman = true;

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("role"));
    }

    #[test]
    fn test_carrying_defender_detected() {
        let mut game = create_valid_game();
        game.grid_mut().set_food(Coord::new(3, 2), false);
        game.agent_mut(0).unwrap().num_carrying = 1;

        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("Defender 0"));
    }

    #[test]
    fn test_agent_in_wall_detected() {
        let mut game = create_valid_game();
        game.agent_mut(1).unwrap().position = Coord::new(7, 1);

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("wall")));
    }

    #[test]
    fn test_scared_timer_bound() {
        let mut game = create_valid_game();
        game.agent_mut(1).unwrap().scared_timer = 40;
        assert!(check_invariants(&game).is_empty());

        game.agent_mut(1).unwrap().scared_timer = 41;
        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("scared"));
    }

    #[test]
    fn test_team_mismatch_detected() {
        let mut game = create_valid_game();
        game.agent_mut(1).unwrap().team = Team::Red;
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("roster")));
    }

    #[test]
    fn test_multiple_violations_all_reported() {
        let mut game = create_valid_game();
        game.grid_mut().set_food(Coord::new(3, 2), false);
        game.agent_mut(1).unwrap().scared_timer = 99;

        let violations = check_invariants(&game);
        assert!(violations.len() >= 2, "{violations:?}");
    }

    #[test]
    #[should_panic(expected = "Game invariant violations")]
    #[cfg(debug_assertions)]
    fn test_assert_invariants_panics() {
        let mut game = create_valid_game();
        game.agent_mut(0).unwrap().is_pacman = true;
        assert_invariants(&game);
    }
}
