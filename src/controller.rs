//! Match controller for Flagrun games.
//!
//! Provides a pure function interface: `(layout, config, agents, seed) -> MatchResult`
//!
//! The controller handles:
//! - One-time agent registration under the startup budget
//! - The coin flip for the first mover
//! - Round-robin turns with per-move and total time budgets
//! - Forfeits for crashes, panics and timeouts
//! - Terminal detection and result assembly
//!
//! Each agent runs on its own worker thread (see [`seat`]), so a decision
//! that never returns is cut off at the hard per-move timeout.

mod seat;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::agent::Agent;
use crate::config::MatchConfig;
use crate::display::{Display, NullDisplay};
use crate::error::{AgentFault, MatchError, RulesError};
use crate::game::{assert_invariants, observe, Action, AgentId, GameState, Layout, Team};

use seat::{Outcome, Seat};

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchPhase {
    /// Agents have not been registered yet.
    NotStarted,
    /// Turns are being played.
    Running,
    /// No further actions are accepted.
    Finished,
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// A team banked enough food.
    ResourceThreshold,
    /// The move limit was reached.
    TimeExpired,
    /// An agent crashed or overran its time budget.
    CrashForfeit,
    /// A rule invariant broke and the match was abandoned.
    Aborted,
}

/// One applied move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Move {
    /// The acting agent.
    pub agent: AgentId,
    /// The action applied. A rejected action is recorded as `Stop`.
    pub action: Action,
}

/// Statistics for a single agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// Decisions requested.
    pub moves: u32,
    /// Time spent registering the initial state.
    pub startup: Duration,
    /// Total time spent deciding.
    pub thinking: Duration,
    /// Slow-move warnings collected.
    pub warnings: u32,
    /// Actions rejected as illegal.
    pub illegal_actions: u32,
}

/// Final result of a match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Final score. Positive favors Red.
    pub score: i32,
    /// Food banked by Red.
    pub red_returned: u32,
    /// Food banked by Blue.
    pub blue_returned: u32,
    /// Why the match ended.
    pub reason: EndReason,
    /// The winning team, `None` for a tie.
    pub winner: Option<Team>,
    /// Moves applied.
    pub moves_played: u32,
    /// The agent that moved first.
    pub first_agent: AgentId,
    /// The seed used for this match.
    pub seed: u64,
    /// Per-agent statistics.
    pub agent_stats: Vec<AgentStats>,
    /// The fault that ended the match, if any.
    pub fault: Option<AgentFault>,
    /// Every applied move in order.
    pub history: Vec<Move>,
}

/// Run a complete match with the given layout, agents and seed.
///
/// # Determinism
///
/// Given the same layout, configuration, seed and deterministic agents,
/// this function always produces the same move history and final state.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the layout cannot host
/// the agents, or carried food could not be redistributed.
pub fn run_match(
    layout: &Layout,
    config: MatchConfig,
    agents: Vec<Box<dyn Agent>>,
    seed: u64,
) -> Result<MatchResult, MatchError> {
    MatchRunner::new(layout, config, agents, seed)?.run()
}

/// Sequences the turns of one match.
pub struct MatchRunner {
    /// Authoritative game state.
    state: GameState,
    /// One worker per agent.
    seats: Vec<Seat>,
    /// Observer of every state.
    display: Box<dyn Display>,
    /// Configuration.
    config: MatchConfig,
    /// Source for the coin flip and sensor noise.
    rng: ChaCha8Rng,
    /// Original seed.
    seed: u64,
    phase: MatchPhase,
    first_agent: AgentId,
    next_agent: AgentId,
    stats: Vec<AgentStats>,
    history: Vec<Move>,
    fault: Option<AgentFault>,
    reason: Option<EndReason>,
}

impl std::fmt::Debug for MatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchRunner")
            .field("phase", &self.phase)
            .field("seed", &self.seed)
            .field("moves", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl MatchRunner {
    /// Create a match on `layout` with one agent per collaborator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the layout cannot
    /// host the agents.
    pub fn new(
        layout: &Layout,
        config: MatchConfig,
        agents: Vec<Box<dyn Agent>>,
        seed: u64,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        let state = GameState::new(layout, config.rules, config.time_limit, agents.len())?;
        Self::from_state(state, config, agents, seed)
    }

    /// Create a match from a prepared initial state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the number of
    /// collaborators differs from the number of agents in `state`.
    pub fn from_state(
        state: GameState,
        config: MatchConfig,
        agents: Vec<Box<dyn Agent>>,
        seed: u64,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        if agents.len() != state.num_agents() {
            return Err(MatchError::AgentCount {
                expected: state.num_agents(),
                found: agents.len(),
            });
        }
        let seats = agents
            .into_iter()
            .enumerate()
            .map(|(id, agent)| Seat::spawn(id, agent))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            stats: vec![AgentStats::default(); seats.len()],
            state,
            seats,
            display: Box::new(NullDisplay),
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            phase: MatchPhase::NotStarted,
            first_agent: 0,
            next_agent: 0,
            history: Vec::new(),
            fault: None,
            reason: None,
        })
    }

    /// Attach a display collaborator.
    #[must_use]
    pub fn with_display(mut self, display: Box<dyn Display>) -> Self {
        self.display = display;
        self
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Current game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Moves applied so far.
    #[must_use]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Per-agent statistics so far.
    #[must_use]
    pub fn stats(&self) -> &[AgentStats] {
        &self.stats
    }

    /// The agent whose turn is next.
    #[must_use]
    pub const fn next_agent(&self) -> AgentId {
        self.next_agent
    }

    /// Register every agent and flip for the first mover.
    ///
    /// Does nothing if the match is already running.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Finished`] if the match is over.
    pub fn start(&mut self) -> Result<(), MatchError> {
        match self.phase {
            MatchPhase::Running => return Ok(()),
            MatchPhase::Finished => return Err(MatchError::Finished),
            MatchPhase::NotStarted => {}
        }

        self.phase = MatchPhase::Running;
        self.display.initialize(&self.state);
        tracing::info!(
            seed = self.seed,
            agents = self.seats.len(),
            food = self.state.total_food(),
            time_limit = self.config.time_limit,
            "match started"
        );

        let startup = self.config.budgets.startup;
        for id in 0..self.seats.len() {
            let (outcome, elapsed) = self.seats[id].register(self.state.clone(), startup);
            self.stats[id].startup = elapsed;

            let fault = match outcome {
                Outcome::Failed(message) => Some(AgentFault::Crash { agent: id, message }),
                Outcome::Expired => Some(AgentFault::StartupTimeout { agent: id, elapsed }),
                Outcome::Done(()) if elapsed > startup => {
                    Some(AgentFault::StartupTimeout { agent: id, elapsed })
                }
                Outcome::Done(()) => None,
            };
            if let Some(fault) = fault {
                self.forfeit(fault);
                return Ok(());
            }
        }

        self.first_agent = self.rng.random_range(0..2).min(self.seats.len() - 1);
        self.next_agent = self.first_agent;
        tracing::info!(first_agent = self.first_agent, "coin flip");
        Ok(())
    }

    /// Play one agent's turn.
    ///
    /// Starts the match if needed. Returns the applied move, or `None` if
    /// the agent forfeited the match instead of moving.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Finished`] once the match is over, and a rules
    /// error if carried food could not be redistributed. A rules error
    /// finishes the match with [`EndReason::Aborted`].
    pub fn step(&mut self) -> Result<Option<Move>, MatchError> {
        if self.phase == MatchPhase::NotStarted {
            self.start()?;
        }
        if self.phase == MatchPhase::Finished {
            return Err(MatchError::Finished);
        }

        let id = self.next_agent;
        let observation = observe(&self.state, id, &mut self.rng)?;
        let legal = observation.legal_actions().to_vec();
        let budgets = self.config.budgets;
        let seat = &self.seats[id];
        let (outcome, elapsed) = seat.choose(observation, budgets.move_timeout);

        let stats = &mut self.stats[id];
        stats.moves += 1;
        stats.thinking += elapsed;

        let fault = match &outcome {
            Outcome::Failed(message) => Some(AgentFault::Crash {
                agent: id,
                message: message.clone(),
            }),
            Outcome::Expired => Some(AgentFault::Timeout { agent: id, elapsed }),
            Outcome::Done(_) if elapsed > budgets.move_timeout => {
                Some(AgentFault::Timeout { agent: id, elapsed })
            }
            Outcome::Done(_) if elapsed > budgets.move_warning => {
                stats.warnings += 1;
                tracing::warn!(
                    agent = id,
                    name = seat.name(),
                    ?elapsed,
                    warnings = stats.warnings,
                    "slow move"
                );
                (stats.warnings > budgets.max_warnings).then_some(AgentFault::TooManyWarnings {
                    agent: id,
                    warnings: stats.warnings,
                })
            }
            Outcome::Done(_) => None,
        };
        let fault = fault.or_else(|| {
            (stats.thinking > budgets.max_total).then_some(AgentFault::TotalTimeExceeded {
                agent: id,
                total: stats.thinking,
            })
        });
        if let Some(fault) = fault {
            self.forfeit(fault);
            return Ok(None);
        }

        let mut action = match outcome {
            Outcome::Done(action) => action,
            Outcome::Failed(_) | Outcome::Expired => Action::Stop,
        };
        if !legal.contains(&action) {
            tracing::warn!(
                agent = id,
                name = seat.name(),
                %action,
                "illegal action rejected, move forfeited"
            );
            stats.illegal_actions += 1;
            action = Action::Stop;
        }

        let next = match self.state.successor(id, action) {
            Ok(next) => next,
            Err(err) => {
                self.abort(err);
                return Err(err.into());
            }
        };
        assert_invariants(&next);
        self.state = next;
        self.display.update(&self.state);

        let applied = Move { agent: id, action };
        self.history.push(applied);
        self.next_agent = (id + 1) % self.seats.len();

        if self.state.is_terminal() {
            let reason = if self.state.threshold_reached() {
                EndReason::ResourceThreshold
            } else {
                EndReason::TimeExpired
            };
            self.finish(reason);
        }
        Ok(Some(applied))
    }

    /// Play the match to the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the match was already finished before the call
    /// or carried food could not be redistributed.
    pub fn run(mut self) -> Result<MatchResult, MatchError> {
        self.start()?;
        while self.phase != MatchPhase::Finished {
            self.step()?;
        }
        self.result().ok_or(MatchError::Finished)
    }

    /// The result, once the match has finished.
    #[must_use]
    pub fn result(&self) -> Option<MatchResult> {
        let reason = self.reason?;
        let score = self.state.score();
        let winner = match score.signum() {
            1 => Some(Team::Red),
            -1 => Some(Team::Blue),
            _ => None,
        };

        Some(MatchResult {
            score,
            red_returned: self.state.returned_by(Team::Red),
            blue_returned: self.state.returned_by(Team::Blue),
            reason,
            winner,
            moves_played: u32::try_from(self.history.len()).unwrap_or(u32::MAX),
            first_agent: self.first_agent,
            seed: self.seed,
            agent_stats: self.stats.clone(),
            fault: self.fault.clone(),
            history: self.history.clone(),
        })
    }

    /// End the match with the crash score against the faulting agent's team.
    fn forfeit(&mut self, fault: AgentFault) {
        let agent = fault.agent();
        let team = self.state.team_of(agent).unwrap_or(Team::Red);
        let name = self.seats.get(agent).map_or("agent", Seat::name);
        tracing::warn!(%fault, %team, name, "agent forfeits the match");
        self.state.set_score(-team.sign() * self.config.crash_score);
        self.fault = Some(fault);
        self.finish(EndReason::CrashForfeit);
    }

    /// Abandon the match after a broken rule invariant.
    fn abort(&mut self, err: RulesError) {
        tracing::error!(%err, moves = self.history.len(), "match aborted");
        self.finish(EndReason::Aborted);
    }

    fn finish(&mut self, reason: EndReason) {
        self.phase = MatchPhase::Finished;
        self.reason = Some(reason);
        self.display.finish();
        tracing::info!(
            ?reason,
            score = self.state.score(),
            moves = self.history.len(),
            "match finished"
        );
    }
}
