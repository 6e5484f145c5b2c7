//! Per-agent state: team, facing, role and carried food.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::Coord;

/// Index of an agent in the match. Fixed at initialization.
pub type AgentId = usize;

/// Team membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// Defends the western half; positive score favors Red.
    Red,
    /// Defends the eastern half.
    Blue,
}

impl Team {
    /// The other team.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }

    /// Score direction: `+1` for Red, `-1` for Blue.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Red => 1,
            Self::Blue => -1,
        }
    }

    /// Check if this is the red team.
    #[must_use]
    pub const fn is_red(self) -> bool {
        matches!(self, Self::Red)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Red => write!(f, "Red"),
            Self::Blue => write!(f, "Blue"),
        }
    }
}

/// A move an agent can make. Also used as the facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// `y + 1`.
    North,
    /// `y - 1`.
    South,
    /// `x + 1`.
    East,
    /// `x - 1`.
    West,
    /// Stay in place.
    Stop,
}

impl Action {
    /// All actions in legal-action enumeration order.
    pub const ALL: [Action; 5] = [
        Action::North,
        Action::South,
        Action::East,
        Action::West,
        Action::Stop,
    ];

    /// Direction vector `(dx, dy)` for one cell of movement.
    #[must_use]
    pub const fn vector(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::South => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::Stop => (0, 0),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Mutable record for a single agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// Current grid position.
    pub position: Coord,
    /// Direction of the last non-Stop move.
    pub facing: Action,
    /// Team membership, fixed for the match.
    pub team: Team,
    /// Attacker flag: true while on the opponent's half.
    pub is_pacman: bool,
    /// Turns left during which this agent is vulnerable as a defender.
    pub scared_timer: u32,
    /// Food eaten but not yet brought home.
    pub num_carrying: u32,
    /// Food banked over the whole match.
    pub num_returned: u32,
    /// Respawn coordinate.
    pub start: Coord,
}

impl AgentState {
    /// Create an agent standing on its start as a defender.
    #[must_use]
    pub const fn new(start: Coord, team: Team) -> Self {
        Self {
            position: start,
            facing: Action::Stop,
            team,
            is_pacman: false,
            scared_timer: 0,
            num_carrying: 0,
            num_returned: 0,
            start,
        }
    }

    /// Check if this agent is currently scared.
    #[must_use]
    pub const fn is_scared(&self) -> bool {
        self.scared_timer > 0
    }

    /// Send the agent back to its start as an unscared defender.
    ///
    /// Carried food must already have been redistributed.
    pub fn respawn(&mut self) {
        self.position = self.start;
        self.facing = Action::Stop;
        self.is_pacman = false;
        self.scared_timer = 0;
        self.num_carrying = 0;
    }

    /// Count down the scared timer by one turn, stopping at zero.
    pub fn decrement_timer(&mut self) {
        self.scared_timer = self.scared_timer.saturating_sub(1);
    }
}
