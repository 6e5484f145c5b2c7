//! Collision resolution between attackers and defenders.

use std::sync::Arc;

use crate::error::RulesError;
use crate::game::{redistribute, AgentId, GameState};

/// Resolve collisions between the acting agent and the opposing team.
///
/// Opponents are scanned in ascending id order. An attacker that touches a
/// defender is eliminated unless the defender is scared, in which case the
/// defender is eliminated instead. Scanning stops once the acting agent has
/// been eliminated.
pub(crate) fn check_death(state: &mut GameState, agent: AgentId) -> Result<(), RulesError> {
    let roster = Arc::clone(&state.roster);
    let tolerance = state.rules.collision_tolerance;
    let team = state.agents[agent].team;

    for &other in roster.members(team.opponent()) {
        let me = state.agents[agent];
        let them = state.agents[other];
        if me.is_pacman == them.is_pacman || me.position.manhattan(them.position) > tolerance {
            continue;
        }

        let (pacman, ghost) = if me.is_pacman {
            (agent, other)
        } else {
            (other, agent)
        };
        let victim = if state.agents[ghost].is_scared() {
            ghost
        } else {
            pacman
        };
        eliminate(state, victim)?;
        if victim == agent {
            break;
        }
    }
    Ok(())
}

/// Eliminate an agent: drop its carried food, pay the kill points to the
/// other team and send it back to its start.
pub(crate) fn eliminate(state: &mut GameState, victim: AgentId) -> Result<(), RulesError> {
    if state.agents[victim].num_carrying > 0 {
        let placed = redistribute(state, victim)?;
        state.events.food_dropped.extend(placed);
    }

    let team = state.agents[victim].team;
    state.add_score(-team.sign() * state.rules.kill_points);
    state.agents[victim].respawn();
    state.events.eliminated.push(victim);
    tracing::debug!(agent = victim, %team, "agent eliminated");
    Ok(())
}
