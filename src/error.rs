//! Error types for the match engine.
//!
//! Rules errors come out of successor generation and are fatal for the
//! decision that produced them. Agent faults are recoverable at the match
//! level: they end the match with a forfeit but never corrupt the state.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::game::{Action, AgentId, Team};

/// Violations of the state-transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RulesError {
    /// The requested action is not in the agent's legal set.
    #[error("illegal action {action} for agent {agent}")]
    IllegalAction {
        /// The acting agent.
        agent: AgentId,
        /// The rejected action.
        action: Action,
    },
    /// The breadth-first scatter ran out of cells before placing every carried unit.
    #[error("no free cell left for {remaining} food carried by agent {agent}")]
    RedistributionExhausted {
        /// The eliminated agent.
        agent: AgentId,
        /// Units that could not be placed.
        remaining: u32,
    },
    /// The agent index does not exist in this match.
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),
    /// The state is terminal; no further actions are legal.
    #[error("the match is already over")]
    GameOver,
}

/// Rejections of a malformed layout or an unplayable agent setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The layout has no rows or no columns.
    #[error("layout is empty")]
    Empty,
    /// A row differs in width from the first row.
    #[error("row {row} has width {found}, expected {expected}")]
    Ragged {
        /// Text row index (0 = top).
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },
    /// A character that is not part of the layout alphabet.
    #[error("unknown layout character {ch:?} at ({x}, {y})")]
    UnknownTile {
        /// The offending character.
        ch: char,
        /// Column.
        x: i32,
        /// Row, counted from the bottom.
        y: i32,
    },
    /// The same agent digit appears twice.
    #[error("agent start {0} appears more than once")]
    DuplicateAgent(u32),
    /// More agents were requested than the layout has starts for.
    #[error("layout has {available} agent starts, {requested} requested")]
    NotEnoughAgents {
        /// Agents requested.
        requested: usize,
        /// Starts in the layout.
        available: usize,
    },
    /// One team would have no agents.
    #[error("the {0} team has no agents")]
    EmptyTeam(Team),
}

/// Invalid match configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The sonar noise kernel must have odd, non-zero width.
    #[error("sonar noise range must be odd and non-zero, got {0}")]
    EvenNoiseRange(u32),
    /// A match needs at least one move.
    #[error("time limit must be positive")]
    ZeroTimeLimit,
    /// The configuration text could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Error reported by an agent collaborator while deciding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AgentError(pub String);

impl AgentError {
    /// Create an agent error from any message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Recoverable agent misbehavior that forfeits the match for its team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum AgentFault {
    /// `register_initial_state` overran the startup budget.
    #[error("agent {agent} exceeded the startup budget ({elapsed:?})")]
    StartupTimeout {
        /// The offending agent.
        agent: AgentId,
        /// Time taken.
        elapsed: Duration,
    },
    /// A single decision overran the hard per-move timeout.
    #[error("agent {agent} timed out after {elapsed:?}")]
    Timeout {
        /// The offending agent.
        agent: AgentId,
        /// Time taken.
        elapsed: Duration,
    },
    /// The agent collected more slow-move warnings than allowed.
    #[error("agent {agent} exceeded {warnings} slow-move warnings")]
    TooManyWarnings {
        /// The offending agent.
        agent: AgentId,
        /// Warnings collected.
        warnings: u32,
    },
    /// The agent's cumulative thinking time overran the match budget.
    #[error("agent {agent} used {total:?} of thinking time")]
    TotalTimeExceeded {
        /// The offending agent.
        agent: AgentId,
        /// Cumulative time.
        total: Duration,
    },
    /// The agent returned an error or panicked.
    #[error("agent {agent} crashed: {message}")]
    Crash {
        /// The offending agent.
        agent: AgentId,
        /// Error or panic message.
        message: String,
    },
}

impl AgentFault {
    /// The agent responsible for the fault.
    #[must_use]
    pub fn agent(&self) -> AgentId {
        match self {
            Self::StartupTimeout { agent, .. }
            | Self::Timeout { agent, .. }
            | Self::TooManyWarnings { agent, .. }
            | Self::TotalTimeExceeded { agent, .. }
            | Self::Crash { agent, .. } => *agent,
        }
    }
}

/// Errors that abort a match.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The layout could not host the requested agents.
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// A core rule invariant broke during the match.
    #[error(transparent)]
    Rules(#[from] RulesError),
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The number of agent collaborators does not match the agent count.
    #[error("expected {expected} agents, got {found}")]
    AgentCount {
        /// Agents in the game state.
        expected: usize,
        /// Collaborators supplied.
        found: usize,
    },
    /// The match has already finished.
    #[error("the match has already finished")]
    Finished,
    /// An agent worker thread could not be started.
    #[error("failed to start agent worker: {0}")]
    Spawn(#[source] std::io::Error),
    /// A replay asked for a move beyond the recorded history.
    #[error("turn {requested} out of bounds ({available} moves recorded)")]
    TurnOutOfBounds {
        /// Requested turn.
        requested: usize,
        /// Moves available.
        available: usize,
    },
}
