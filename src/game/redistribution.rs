//! Scattering of food dropped by an eliminated attacker.

use std::collections::{HashSet, VecDeque};

use crate::config::DumpSide;
use crate::error::RulesError;
use crate::game::{AgentId, Coord, GameState, Team};

/// Drop the food carried by `victim` onto free cells near where it fell.
///
/// Cells are visited breadth-first over the 8-neighborhood, starting at the
/// victim's position, in [`Coord::block`] order. A cell receives food if it
/// is a free floor cell on the target side with no food, capsule or agent on
/// it. Returns the filled cells in placement order and clears the victim's
/// carried count.
///
/// # Errors
///
/// Returns [`RulesError::RedistributionExhausted`] if every reachable cell
/// was visited before all food was placed.
pub fn redistribute(state: &mut GameState, victim: AgentId) -> Result<Vec<Coord>, RulesError> {
    let agent = *state
        .agents
        .get(victim)
        .ok_or(RulesError::UnknownAgent(victim))?;
    let side = match state.rules.dump_side {
        DumpSide::VictimHome => agent.team,
        DumpSide::CaptureSide => state.grid.home_team(agent.position),
    };

    let mut remaining = agent.num_carrying;
    let mut placed = Vec::new();
    let mut queue = VecDeque::from([agent.position]);
    let mut visited = HashSet::from([agent.position]);

    while remaining > 0 {
        let Some(coord) = queue.pop_front() else {
            tracing::warn!(agent = victim, remaining, "no free cell left for dropped food");
            return Err(RulesError::RedistributionExhausted {
                agent: victim,
                remaining,
            });
        };

        if accepts(state, coord, side) {
            state.grid.set_food(coord, true);
            placed.push(coord);
            remaining -= 1;
        }

        for next in coord.block() {
            if state.grid.in_bounds(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    state.agents[victim].num_carrying = 0;
    Ok(placed)
}

fn accepts(state: &GameState, coord: Coord, side: Team) -> bool {
    let grid = &state.grid;
    grid.in_bounds(coord)
        && !grid.is_wall(coord)
        && !grid.has_food(coord)
        && grid.home_team(coord) == side
        && !grid.has_capsule(coord)
        && state.agents.iter().all(|a| a.position != coord)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RulesConfig;
    use crate::game::{Action, Layout};

    const FIELD: [&str; 5] = ["%%%%%%%%", "%1     %", "%      %", "%     2%", "%%%%%%%%"];

    fn field(rules: RulesConfig) -> GameState {
        let layout = Layout::from_rows(&FIELD).unwrap();
        GameState::new(&layout, rules, 100, 2).unwrap()
    }

    #[test]
    fn test_drops_on_victim_home_side() {
        let mut state = field(RulesConfig::default());
        // Red agent dies on Blue's side at (4, 2)
        let a = state.agent_mut(0).unwrap();
        a.position = Coord::new(4, 2);
        a.is_pacman = true;
        a.num_carrying = 3;

        let placed = redistribute(&mut state, 0).unwrap();
        assert_eq!(placed, vec![Coord::new(3, 1), Coord::new(3, 2), Coord::new(3, 3)]);
        assert!(placed.iter().all(|&c| state.grid().has_food(c)));
        assert_eq!(state.agent(0).unwrap().num_carrying, 0);
    }

    #[test]
    fn test_capture_side_option() {
        let rules = RulesConfig {
            dump_side: DumpSide::CaptureSide,
            ..RulesConfig::default()
        };
        let mut state = field(rules);
        let a = state.agent_mut(0).unwrap();
        a.position = Coord::new(4, 2);
        a.is_pacman = true;
        a.num_carrying = 2;

        let placed = redistribute(&mut state, 0).unwrap();
        // Victim's own cell is occupied, so scatter starts at the block
        assert_eq!(placed, vec![Coord::new(4, 1), Coord::new(4, 3)]);
    }

    #[test]
    fn test_skips_food_capsules_and_agents() {
        let rows = ["%%%%%%", "%1.o %", "%  . %", "%  2 %", "%%%%%%"];
        let layout = Layout::from_rows(&rows).unwrap();
        let mut state = GameState::new(&layout, RulesConfig::default(), 10, 2).unwrap();
        // Red half is x < 3
        let a = state.agent_mut(0).unwrap();
        a.position = Coord::new(2, 2);
        a.is_pacman = false;
        a.num_carrying = 2;
        state.agent_mut(1).unwrap().position = Coord::new(1, 1);

        let placed = redistribute(&mut state, 0).unwrap();
        // (1,1) holds agent 1; agent 0 has left its start at (1,3)
        assert_eq!(placed, vec![Coord::new(1, 2), Coord::new(1, 3)]);
        assert!(!placed.contains(&Coord::new(2, 3)));
    }

    #[test]
    fn test_exhaustion_is_an_error() {
        let rows = ["%%%%%%", "%1 .2%", "%%%%%%"];
        let layout = Layout::from_rows(&rows).unwrap();
        let mut state = GameState::new(&layout, RulesConfig::default(), 10, 2).unwrap();
        // Red home is x < 3: (1,1) and (2,1); the victim stands on (2,1)
        let a = state.agent_mut(0).unwrap();
        a.position = Coord::new(2, 1);
        a.num_carrying = 3;
        state.agent_mut(1).unwrap().position = Coord::new(1, 1);

        let err = redistribute(&mut state, 0).unwrap_err();
        assert_eq!(
            err,
            RulesError::RedistributionExhausted {
                agent: 0,
                remaining: 3
            }
        );
    }

    #[test]
    fn test_dropped_food_via_successor() {
        let mut state = field(RulesConfig::default());
        let a = state.agent_mut(0).unwrap();
        a.position = Coord::new(5, 1);
        a.is_pacman = true;
        a.num_carrying = 2;
        let next = state.successor(0, Action::East).unwrap();
        // Walked into the blue defender at (6, 1)
        assert_eq!(next.last_events().eliminated, vec![0]);
        assert_eq!(next.last_events().food_dropped.len(), 2);
        assert_eq!(next.grid().food_count(), 2);
        assert!(next
            .last_events()
            .food_dropped
            .iter()
            .all(|&c| next.grid().is_red_side(c)));
    }
}
