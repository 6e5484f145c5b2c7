//! Authoritative game state and successor generation.

use std::sync::Arc;

use serde::Serialize;

use crate::config::RulesConfig;
use crate::error::{LayoutError, RulesError};
use crate::game::{
    check_death, legal_actions_at, rules, Action, AgentId, AgentState, Coord, Grid, Layout, Team,
};

/// Team membership for every agent, computed once per match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    /// Team of each agent, indexed by agent id.
    teams: Vec<Team>,
    /// Red agent ids in ascending order.
    red: Vec<AgentId>,
    /// Blue agent ids in ascending order.
    blue: Vec<AgentId>,
}

impl Roster {
    fn from_teams(teams: Vec<Team>) -> Self {
        let red = (0..teams.len()).filter(|&i| teams[i] == Team::Red).collect();
        let blue = (0..teams.len()).filter(|&i| teams[i] == Team::Blue).collect();
        Self { teams, red, blue }
    }

    /// Team of an agent.
    #[must_use]
    pub fn team_of(&self, agent: AgentId) -> Option<Team> {
        self.teams.get(agent).copied()
    }

    /// Agent ids of a team, ascending.
    #[must_use]
    pub fn members(&self, team: Team) -> &[AgentId] {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }
}

/// What happened during the most recent successor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TurnEvents {
    /// The agent that acted, `None` for the initial state.
    pub agent: Option<AgentId>,
    /// Cell whose food was eaten.
    pub food_eaten: Option<Coord>,
    /// Cell whose capsule was eaten.
    pub capsule_eaten: Option<Coord>,
    /// Cells that received food from an eliminated attacker, in placement order.
    pub food_dropped: Vec<Coord>,
    /// Agents eliminated this turn, in resolution order.
    pub eliminated: Vec<AgentId>,
    /// Food banked this turn.
    pub banked: u32,
    /// Net score change this turn.
    pub score_change: i32,
}

/// Complete state of a match at one instant.
///
/// Cloning is cheap: walls are shared by every snapshot and food and
/// capsules are shared until a successor modifies them.
#[derive(Debug, Clone)]
pub struct GameState {
    pub(super) grid: Grid,
    pub(super) agents: Vec<AgentState>,
    pub(super) roster: Arc<Roster>,
    pub(super) score: i32,
    pub(super) time_left: u32,
    pub(super) total_food: u32,
    pub(super) win: bool,
    pub(super) rules: Arc<RulesConfig>,
    pub(super) events: TurnEvents,
}

impl GameState {
    /// Create the initial state for a match.
    ///
    /// The first `num_agents` starts of the layout are used. Each agent joins
    /// the team whose home side holds its start.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout has fewer starts than `num_agents` or
    /// one team would be empty.
    pub fn new(
        layout: &Layout,
        rules: RulesConfig,
        time_limit: u32,
        num_agents: usize,
    ) -> Result<Self, LayoutError> {
        let starts = layout.agent_starts();
        if num_agents > starts.len() {
            return Err(LayoutError::NotEnoughAgents {
                requested: num_agents,
                available: starts.len(),
            });
        }

        let grid = layout.grid().clone();
        let agents: Vec<AgentState> = starts[..num_agents]
            .iter()
            .map(|&start| AgentState::new(start, grid.home_team(start)))
            .collect();
        let roster = Roster::from_teams(agents.iter().map(|a| a.team).collect());
        for team in [Team::Red, Team::Blue] {
            if roster.members(team).is_empty() {
                return Err(LayoutError::EmptyTeam(team));
            }
        }

        Ok(Self {
            total_food: grid.food_count(),
            grid,
            agents,
            roster: Arc::new(roster),
            score: 0,
            time_left: time_limit,
            win: false,
            rules: Arc::new(rules),
            events: TurnEvents::default(),
        })
    }

    fn check_agent(&self, agent: AgentId) -> Result<(), RulesError> {
        if agent < self.agents.len() {
            Ok(())
        } else {
            Err(RulesError::UnknownAgent(agent))
        }
    }

    /// Legal actions for an agent, in North, South, East, West, Stop order.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::UnknownAgent`] for an id outside the match.
    pub fn legal_actions(&self, agent: AgentId) -> Result<Vec<Action>, RulesError> {
        self.check_agent(agent)?;
        Ok(legal_actions_at(&self.grid, self.agents[agent].position))
    }

    /// Generate the state after `agent` takes `action`.
    ///
    /// Applies movement, role change, banking and consumption, then resolves
    /// collisions for the acting agent, counts down its scared timer, applies
    /// the score change and spends one unit of time.
    ///
    /// # Errors
    ///
    /// Returns an error if the state is terminal, the agent is unknown, the
    /// action is illegal, or carried food could not be redistributed.
    pub fn successor(&self, agent: AgentId, action: Action) -> Result<Self, RulesError> {
        if self.is_terminal() {
            return Err(RulesError::GameOver);
        }
        self.check_agent(agent)?;

        let mut next = self.clone();
        next.events = TurnEvents {
            agent: Some(agent),
            ..TurnEvents::default()
        };

        rules::apply_action(&mut next, agent, action)?;
        check_death(&mut next, agent)?;
        next.agents[agent].decrement_timer();
        next.score += next.events.score_change;
        next.time_left = next.time_left.saturating_sub(1);
        Ok(next)
    }

    /// Check if the match is over: time ran out or a team banked enough food.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.win || self.time_left == 0
    }

    /// Check if a team reached the returned-food threshold.
    #[must_use]
    pub const fn threshold_reached(&self) -> bool {
        self.win
    }

    /// Current score. Positive favors Red.
    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    /// Moves left before time expires.
    #[must_use]
    pub const fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Food on the layout when the match started.
    #[must_use]
    pub const fn total_food(&self) -> u32 {
        self.total_food
    }

    /// Rule constants of this match.
    #[must_use]
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// The grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid access for building scenario states.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Number of agents.
    #[must_use]
    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    /// All agent records in id order.
    #[must_use]
    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    /// An agent record.
    #[must_use]
    pub fn agent(&self, agent: AgentId) -> Option<&AgentState> {
        self.agents.get(agent)
    }

    /// Mutable agent access for building scenario states.
    pub fn agent_mut(&mut self, agent: AgentId) -> Option<&mut AgentState> {
        self.agents.get_mut(agent)
    }

    /// Position of an agent.
    #[must_use]
    pub fn agent_position(&self, agent: AgentId) -> Option<Coord> {
        self.agents.get(agent).map(|a| a.position)
    }

    /// Respawn coordinate of an agent.
    #[must_use]
    pub fn initial_position(&self, agent: AgentId) -> Option<Coord> {
        self.agents.get(agent).map(|a| a.start)
    }

    /// Team of an agent.
    #[must_use]
    pub fn team_of(&self, agent: AgentId) -> Option<Team> {
        self.roster.team_of(agent)
    }

    /// The team roster.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Red agent ids.
    #[must_use]
    pub fn red_team(&self) -> &[AgentId] {
        self.roster.members(Team::Red)
    }

    /// Blue agent ids.
    #[must_use]
    pub fn blue_team(&self) -> &[AgentId] {
        self.roster.members(Team::Blue)
    }

    /// Check if a coordinate lies on Red's half.
    #[must_use]
    pub const fn is_red_side(&self, coord: Coord) -> bool {
        self.grid.is_red_side(coord)
    }

    /// Food that `team` defends.
    #[must_use]
    pub fn food_on_side(&self, team: Team) -> Vec<Coord> {
        self.grid.food_on_side(team).collect()
    }

    /// Capsules that `team` defends.
    #[must_use]
    pub fn capsules_on_side(&self, team: Team) -> Vec<Coord> {
        self.grid.capsules_on_side(team).collect()
    }

    /// Food banked so far by a team.
    #[must_use]
    pub fn returned_by(&self, team: Team) -> u32 {
        self.roster
            .members(team)
            .iter()
            .map(|&i| self.agents[i].num_returned)
            .sum()
    }

    /// Food currently carried by all agents.
    #[must_use]
    pub fn total_carrying(&self) -> u32 {
        self.agents.iter().map(|a| a.num_carrying).sum()
    }

    /// Events of the most recent successor.
    #[must_use]
    pub const fn last_events(&self) -> &TurnEvents {
        &self.events
    }

    /// Overwrite the score. Used when a match ends by forfeit.
    pub(crate) fn set_score(&mut self, score: i32) {
        self.score = score;
    }

    /// Apply a score change to this turn's running delta.
    pub(super) fn add_score(&mut self, delta: i32) {
        self.events.score_change += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Layout {
        Layout::from_rows(&[
            "%%%%%%%", //
            "%1 ...%", //
            "%     %", //
            "%    2%", //
            "%%%%%%%",
        ])
        .unwrap()
    }

    fn start(layout: &Layout) -> GameState {
        GameState::new(layout, RulesConfig::default(), 100, 2).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let state = start(&corridor());
        assert_eq!(state.num_agents(), 2);
        assert_eq!(state.red_team(), &[0]);
        assert_eq!(state.blue_team(), &[1]);
        assert_eq!(state.team_of(1), Some(Team::Blue));
        assert_eq!(state.team_of(2), None);
        assert_eq!(state.agent_position(0), Some(Coord::new(1, 3)));
        assert_eq!(state.initial_position(1), Some(Coord::new(5, 1)));
        assert_eq!(state.total_food(), 3);
        assert_eq!(state.score(), 0);
        assert_eq!(state.time_left(), 100);
        assert!(!state.is_terminal());
        assert_eq!(state.last_events(), &TurnEvents::default());
    }

    #[test]
    fn test_not_enough_agents() {
        let err = GameState::new(&corridor(), RulesConfig::default(), 10, 3).unwrap_err();
        assert_eq!(
            err,
            LayoutError::NotEnoughAgents {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn test_empty_team_rejected() {
        let layout = Layout::from_rows(&["%%%%%%", "%12  %", "%%%%%%"]).unwrap();
        let err = GameState::new(&layout, RulesConfig::default(), 10, 2).unwrap_err();
        assert_eq!(err, LayoutError::EmptyTeam(Team::Blue));
    }

    #[test]
    fn test_successor_spends_time_and_shares_walls() {
        let state = start(&corridor());
        let next = state.successor(0, Action::East).unwrap();
        assert_eq!(next.time_left(), 99);
        assert_eq!(next.agent_position(0), Some(Coord::new(2, 3)));
        assert_eq!(state.agent_position(0), Some(Coord::new(1, 3)));
        assert!(next.grid().shares_walls_with(state.grid()));
        assert!(next.grid().shares_food_with(state.grid()));
        assert_eq!(next.last_events().agent, Some(0));
    }

    #[test]
    fn test_successor_errors() {
        let state = start(&corridor());
        assert_eq!(
            state.successor(0, Action::North).unwrap_err(),
            RulesError::IllegalAction {
                agent: 0,
                action: Action::North
            }
        );
        assert_eq!(
            state.successor(7, Action::Stop).unwrap_err(),
            RulesError::UnknownAgent(7)
        );
        assert_eq!(state.legal_actions(9), Err(RulesError::UnknownAgent(9)));
    }

    #[test]
    fn test_time_expiry_is_terminal() {
        let state = GameState::new(&corridor(), RulesConfig::default(), 1, 2).unwrap();
        let next = state.successor(0, Action::Stop).unwrap();
        assert!(next.is_terminal());
        assert!(!next.threshold_reached());
        assert_eq!(next.successor(1, Action::Stop).unwrap_err(), RulesError::GameOver);
    }

    #[test]
    fn test_legal_actions_order() {
        let state = start(&corridor());
        assert_eq!(
            state.legal_actions(0).unwrap(),
            vec![Action::South, Action::East, Action::Stop]
        );
        assert_eq!(
            state.legal_actions(1).unwrap(),
            vec![Action::North, Action::West, Action::Stop]
        );
    }

    #[test]
    fn test_side_views() {
        let state = start(&corridor());
        assert!(state.food_on_side(Team::Red).is_empty());
        assert_eq!(state.food_on_side(Team::Blue).len(), 3);
        assert!(state.is_red_side(Coord::new(2, 1)));
        assert!(!state.is_red_side(Coord::new(3, 1)));
        assert!(state.capsules_on_side(Team::Red).is_empty());
    }
}
