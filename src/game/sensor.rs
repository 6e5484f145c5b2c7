//! Agent-scoped observations: noisy distances and sight-limited enemy positions.

use std::sync::Arc;

use rand::Rng;

use crate::config::RulesConfig;
use crate::error::RulesError;
use crate::game::{legal_actions_at, Action, AgentId, Coord, GameState, Grid, Roster, Team};

/// What an observer knows about one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentView {
    /// Team membership.
    pub team: Team,
    /// Exact position, `None` for an enemy out of sight.
    pub position: Option<Coord>,
    /// Facing direction, hidden together with the position.
    pub facing: Option<Action>,
    /// Attacker flag.
    pub is_pacman: bool,
    /// Turns of vulnerability left.
    pub scared_timer: u32,
    /// Food currently carried.
    pub num_carrying: u32,
    /// Food banked so far.
    pub num_returned: u32,
    /// Respawn coordinate.
    pub start: Coord,
}

/// A derived, observer-specific copy of the game state.
#[derive(Debug, Clone)]
pub struct Observation {
    observer: AgentId,
    grid: Grid,
    agents: Vec<AgentView>,
    noisy_distances: Vec<i32>,
    roster: Arc<Roster>,
    legal_actions: Vec<Action>,
    score: i32,
    time_left: u32,
    total_food: u32,
    rules: RulesConfig,
}

impl Observation {
    /// The observing agent.
    #[must_use]
    pub const fn observer(&self) -> AgentId {
        self.observer
    }

    /// Team of the observing agent.
    #[must_use]
    pub fn team(&self) -> Team {
        self.agents[self.observer].team
    }

    /// Walls, food and capsules. These are never hidden.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Every agent as the observer sees it.
    #[must_use]
    pub fn agents(&self) -> &[AgentView] {
        &self.agents
    }

    /// Position of an agent, `None` if unknown or occluded.
    #[must_use]
    pub fn agent_position(&self, agent: AgentId) -> Option<Coord> {
        self.agents.get(agent).and_then(|a| a.position)
    }

    /// Noisy Manhattan distance from the observer to each agent.
    #[must_use]
    pub fn noisy_distances(&self) -> &[i32] {
        &self.noisy_distances
    }

    /// Legal actions of the observer.
    #[must_use]
    pub fn legal_actions(&self) -> &[Action] {
        &self.legal_actions
    }

    /// Agent ids of a team.
    #[must_use]
    pub fn members(&self, team: Team) -> &[AgentId] {
        self.roster.members(team)
    }

    /// Current score. Positive favors Red.
    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    /// Moves left in the match.
    #[must_use]
    pub const fn time_left(&self) -> u32 {
        self.time_left
    }

    /// Food on the layout at the start of the match.
    #[must_use]
    pub const fn total_food(&self) -> u32 {
        self.total_food
    }

    /// Probability of a noisy reading given the true distance.
    #[must_use]
    pub fn distance_probability(&self, true_distance: u32, noisy_distance: i32) -> f64 {
        distance_probability(&self.rules, true_distance, noisy_distance)
    }
}

/// Probability of observing `noisy_distance` when the true distance is
/// `true_distance`: uniform over the noise kernel, zero outside it.
#[must_use]
pub fn distance_probability(rules: &RulesConfig, true_distance: u32, noisy_distance: i32) -> f64 {
    let offset = i64::from(noisy_distance) - i64::from(true_distance);
    if offset.abs() <= i64::from(rules.max_noise()) {
        1.0 / f64::from(rules.sonar_noise_range)
    } else {
        0.0
    }
}

/// Build the observation of `observer`.
///
/// Distances to every agent get uniform noise from `rng`, drawn in agent
/// order. An enemy is hidden unless some member of the observer's team,
/// the observer included, is within the sight range of it.
///
/// # Errors
///
/// Returns [`RulesError::UnknownAgent`] if `observer` is not in the match.
pub fn observe<R: Rng>(
    state: &GameState,
    observer: AgentId,
    rng: &mut R,
) -> Result<Observation, RulesError> {
    let me = *state
        .agents
        .get(observer)
        .ok_or(RulesError::UnknownAgent(observer))?;
    let rules = *state.rules;
    let noise = rules.max_noise();

    #[allow(clippy::cast_possible_wrap)]
    let noisy_distances = state
        .agents
        .iter()
        .map(|a| me.position.manhattan(a.position) as i32 + rng.random_range(-noise..=noise))
        .collect();

    let teammates = state.roster.members(me.team);
    let agents = state
        .agents
        .iter()
        .map(|a| {
            let visible = a.team == me.team
                || teammates.iter().any(|&t| {
                    state.agents[t].position.manhattan(a.position) <= rules.sight_range
                });
            AgentView {
                team: a.team,
                position: visible.then_some(a.position),
                facing: visible.then_some(a.facing),
                is_pacman: a.is_pacman,
                scared_timer: a.scared_timer,
                num_carrying: a.num_carrying,
                num_returned: a.num_returned,
                start: a.start,
            }
        })
        .collect();

    Ok(Observation {
        observer,
        grid: state.grid.clone(),
        agents,
        noisy_distances,
        roster: Arc::clone(&state.roster),
        legal_actions: legal_actions_at(&state.grid, me.position),
        score: state.score,
        time_left: state.time_left,
        total_food: state.total_food,
        rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Layout;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const WIDE: [&str; 4] = [
        "%%%%%%%%%%%%%%%%",
        "%1            2%",
        "%3            4%",
        "%%%%%%%%%%%%%%%%",
    ];

    fn wide_state() -> GameState {
        let layout = Layout::from_rows(&WIDE).unwrap();
        GameState::new(&layout, RulesConfig::default(), 100, 4).unwrap()
    }

    #[test]
    fn test_distant_enemies_hidden() {
        let state = wide_state();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let obs = observe(&state, 0, &mut rng).unwrap();
        assert_eq!(obs.team(), Team::Red);
        assert_eq!(obs.agent_position(0), Some(Coord::new(1, 2)));
        assert_eq!(obs.agent_position(2), Some(Coord::new(1, 1)));
        assert_eq!(obs.agent_position(1), None);
        assert_eq!(obs.agents()[1].facing, None);
        assert_eq!(obs.agent_position(3), None);
    }

    #[test]
    fn test_teammate_reveals_enemy() {
        let mut state = wide_state();
        // Teammate 2 stands within sight range of enemy 3; observer 0 is far away
        state.agent_mut(2).unwrap().position = Coord::new(10, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let obs = observe(&state, 0, &mut rng).unwrap();
        assert_eq!(obs.agent_position(3), Some(Coord::new(14, 1)));
        assert_eq!(obs.agent_position(1), Some(Coord::new(14, 2)));
    }

    #[test]
    fn test_sight_range_is_inclusive() {
        let mut state = wide_state();
        state.agent_mut(0).unwrap().position = Coord::new(9, 2);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let obs = observe(&state, 0, &mut rng).unwrap();
        // (9,2) to (14,2) is exactly 5
        assert_eq!(obs.agent_position(1), Some(Coord::new(14, 2)));
        // (9,2) to (14,1) is 6
        assert_eq!(obs.agent_position(3), None);
    }

    #[test]
    fn test_noise_within_kernel() {
        let state = wide_state();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..200 {
            let obs = observe(&state, 1, &mut rng).unwrap();
            for (agent, &noisy) in obs.noisy_distances().iter().enumerate() {
                let truth = state.agents()[1].position.manhattan(state.agents()[agent].position);
                assert!(obs.distance_probability(truth, noisy) > 0.0);
                let diff = i64::from(noisy) - i64::from(truth);
                assert!(diff.abs() <= 6);
            }
        }
    }

    #[test]
    fn test_distance_probability() {
        let rules = RulesConfig::default();
        let p = distance_probability(&rules, 10, 16);
        assert!((p - 1.0 / 13.0).abs() < 1e-12);
        assert!((distance_probability(&rules, 10, 4) - 1.0 / 13.0).abs() < 1e-12);
        assert!(distance_probability(&rules, 10, 17).abs() < 1e-12);
        assert!(distance_probability(&rules, 10, 3).abs() < 1e-12);
    }

    #[test]
    fn test_observation_is_seed_deterministic() {
        let state = wide_state();
        let a = observe(&state, 2, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = observe(&state, 2, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a.noisy_distances(), b.noisy_distances());
        assert_eq!(a.legal_actions(), &[Action::North, Action::East, Action::Stop]);
    }

    #[test]
    fn test_unknown_observer() {
        let state = wide_state();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(
            observe(&state, 4, &mut rng).unwrap_err(),
            RulesError::UnknownAgent(4)
        );
    }
}
