//! Match replay.
//!
//! Because successor generation is deterministic, replay requires only:
//! - the layout and configuration
//! - the number of agents
//! - the applied move history from [`MatchResult`](crate::controller::MatchResult)
//!
//! No state deltas are stored. To view move N, re-run the moves from the
//! initial state up to N.
//!
//! A forfeit ends a match without a move, so the crash score is not part of
//! any replayed state.

use crate::config::MatchConfig;
use crate::controller::Move;
use crate::error::MatchError;
use crate::game::{GameState, Layout};

/// Re-run `moves` and return every snapshot, the initial state first.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the layout cannot host
/// the agents, or a move cannot be applied.
pub fn replay(
    layout: &Layout,
    config: &MatchConfig,
    num_agents: usize,
    moves: &[Move],
) -> Result<Vec<GameState>, MatchError> {
    config.validate()?;
    let mut state = GameState::new(layout, config.rules, config.time_limit, num_agents)?;
    let mut states = Vec::with_capacity(moves.len() + 1);
    for mv in moves {
        let next = state.successor(mv.agent, mv.action)?;
        states.push(state);
        state = next;
    }
    states.push(state);
    Ok(states)
}

/// Re-run the first `turn` moves and return the resulting state.
///
/// # Errors
///
/// Returns an error if `turn` exceeds the recorded moves or replay fails.
pub fn state_at(
    layout: &Layout,
    config: &MatchConfig,
    num_agents: usize,
    moves: &[Move],
    turn: usize,
) -> Result<GameState, MatchError> {
    let prefix = moves.get(..turn).ok_or(MatchError::TurnOutOfBounds {
        requested: turn,
        available: moves.len(),
    })?;
    config.validate()?;
    let mut state = GameState::new(layout, config.rules, config.time_limit, num_agents)?;
    for mv in prefix {
        state = state.successor(mv.agent, mv.action)?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, RandomAgent};
    use crate::controller::run_match;
    use crate::game::{Action, Coord};

    const ARENA: [&str; 5] = ["%%%%%%%%", "%1 .. 2%", "%      %", "%3 .. 4%", "%%%%%%%%"];

    #[test]
    fn test_replay_matches_live_match() {
        let layout = Layout::from_rows(&ARENA).unwrap();
        let config = MatchConfig {
            time_limit: 300,
            ..MatchConfig::default()
        };
        let agents: Vec<Box<dyn Agent>> = (0..4)
            .map(|i| Box::new(RandomAgent::new(100 + i)) as Box<dyn Agent>)
            .collect();
        let result = run_match(&layout, config, agents, 5).unwrap();

        let states = replay(&layout, &config, 4, &result.history).unwrap();
        assert_eq!(states.len(), result.history.len() + 1);
        let last = states.last().unwrap();
        assert_eq!(last.score(), result.score);
        assert_eq!(last.returned_by(crate::game::Team::Red), result.red_returned);
        assert_eq!(last.time_left(), 300 - result.moves_played);
    }

    #[test]
    fn test_state_at() {
        let layout = Layout::from_rows(&ARENA).unwrap();
        let config = MatchConfig::default();
        let moves = [
            Move {
                agent: 0,
                action: Action::East,
            },
            Move {
                agent: 1,
                action: Action::West,
            },
        ];
        let state = state_at(&layout, &config, 2, &moves, 1).unwrap();
        assert_eq!(state.agent_position(0), Some(Coord::new(2, 3)));
        assert_eq!(state.agent_position(1), Some(Coord::new(6, 3)));
        assert!(matches!(
            state_at(&layout, &config, 2, &moves, 3),
            Err(MatchError::TurnOutOfBounds {
                requested: 3,
                available: 2
            })
        ));
    }

    #[test]
    fn test_illegal_recorded_move_fails() {
        let layout = Layout::from_rows(&ARENA).unwrap();
        let moves = [Move {
            agent: 0,
            action: Action::North,
        }];
        assert!(matches!(
            replay(&layout, &MatchConfig::default(), 2, &moves),
            Err(MatchError::Rules(_))
        ));
    }
}
