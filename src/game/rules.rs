//! Action rules: movement, role change, banking and consumption.

use crate::error::RulesError;
use crate::game::{Action, AgentId, Coord, GameState, Grid};

/// Legal actions from `coord`: every move not blocked by a wall, then Stop.
#[must_use]
pub fn legal_actions_at(grid: &Grid, coord: Coord) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|&action| action == Action::Stop || !grid.is_wall(coord.step(action)))
        .collect()
}

/// Check whether `returned` food meets the win threshold
/// `returned >= total / 2 - reserve`, in exact integer arithmetic.
#[must_use]
pub fn meets_threshold(returned: u32, total: u32, reserve: u32) -> bool {
    2 * i64::from(returned) >= i64::from(total) - 2 * i64::from(reserve)
}

/// Move an agent, update its role, bank carried food on reaching home and
/// eat whatever an attacker lands on.
pub(super) fn apply_action(
    state: &mut GameState,
    agent: AgentId,
    action: Action,
) -> Result<(), RulesError> {
    let position = state.agents[agent].position;
    if !legal_actions_at(&state.grid, position).contains(&action) {
        return Err(RulesError::IllegalAction { agent, action });
    }

    let next = position.step(action);
    let on_red_side = state.grid.is_red_side(next);
    let me = &mut state.agents[agent];
    me.position = next;
    if action != Action::Stop {
        me.facing = action;
    }
    me.is_pacman = me.team.is_red() != on_red_side;

    if !me.is_pacman && me.num_carrying > 0 {
        bank(state, agent);
    }
    if state.agents[agent].is_pacman {
        consume(state, agent, next);
    }
    Ok(())
}

/// Move carried food into the returned count and check the win threshold.
fn bank(state: &mut GameState, agent: AgentId) {
    let me = &mut state.agents[agent];
    let carried = me.num_carrying;
    let team = me.team;
    me.num_returned += carried;
    me.num_carrying = 0;

    state.events.banked += carried;
    state.add_score(team.sign() * i32::try_from(carried).unwrap_or(i32::MAX));
    tracing::debug!(agent, carried, %team, "food banked");

    let total = state.total_food;
    let reserve = state.rules.min_food_reserve;
    let reached = [state.returned_by(team), state.returned_by(team.opponent())]
        .into_iter()
        .any(|returned| meets_threshold(returned, total, reserve));
    if reached {
        tracing::debug!(%team, "returned-food threshold reached");
        state.win = true;
    }
}

/// Eat food or an opposing capsule at `coord`.
fn consume(state: &mut GameState, agent: AgentId, coord: Coord) {
    if state.grid.has_food(coord) {
        state.grid.set_food(coord, false);
        state.agents[agent].num_carrying += 1;
        state.events.food_eaten = Some(coord);
    }

    let team = state.agents[agent].team;
    if state.grid.has_capsule(coord) && state.grid.home_team(coord) != team {
        state.grid.remove_capsule(coord);
        state.events.capsule_eaten = Some(coord);
        let scared_time = state.rules.scared_time;
        for &other in state.roster.members(team.opponent()) {
            state.agents[other].scared_timer = scared_time;
        }
        tracing::debug!(agent, ?coord, "capsule eaten");
    }
}
