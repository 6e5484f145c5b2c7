//! Agent collaborators.
//!
//! The match controller only needs something that turns an observation into
//! an action. Strategy lives outside this crate; the two agents here exist
//! so that matches can be driven in tests, benchmarks and series.

use std::collections::VecDeque;

use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::AgentError;
use crate::game::{Action, GameState, Observation};

/// A decision maker for one agent.
///
/// The controller moves each agent onto its own worker thread, hence `Send`.
/// A call that outlives the hard per-move timeout is abandoned and forfeits
/// the match.
pub trait Agent: Send {
    /// Display name used in logs.
    fn name(&self) -> &str {
        "agent"
    }

    /// One-time setup before the first move, bounded by the startup budget.
    ///
    /// # Errors
    ///
    /// An error forfeits the match for the agent's team.
    fn register_initial_state(&mut self, _state: &GameState) -> Result<(), AgentError> {
        Ok(())
    }

    /// Choose an action from [`Observation::legal_actions`].
    ///
    /// # Errors
    ///
    /// An error forfeits the match for the agent's team.
    fn choose_action(&mut self, observation: &Observation) -> Result<Action, AgentError>;
}

/// Picks a uniformly random legal action.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: ChaCha8Rng,
}

impl RandomAgent {
    /// Create an agent with its own seeded random source.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&mut self, observation: &Observation) -> Result<Action, AgentError> {
        Ok(observation
            .legal_actions()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Action::Stop))
    }
}

/// Plays a fixed list of actions, then stays put.
///
/// Actions are returned as given, legal or not.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgent {
    script: VecDeque<Action>,
}

impl ScriptedAgent {
    /// Create an agent that plays `script` in order.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Action>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// An agent that always stops.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    fn choose_action(&mut self, _observation: &Observation) -> Result<Action, AgentError> {
        Ok(self.script.pop_front().unwrap_or(Action::Stop))
    }
}
