//! Game layer for Flagrun.
//!
//! Implements the capture rules on a grid split into two home halves:
//! - Grid with walls, food and capsules
//! - Agents that defend at home and attack on the opposing half
//! - Movement, banking and consumption
//! - Collision resolution and food redistribution
//! - Noisy, sight-limited observations

mod agent_state;
mod collision;
mod grid;
pub mod invariants;
mod layout;
mod redistribution;
mod rules;
mod sensor;
mod state;

pub use agent_state::{Action, AgentId, AgentState, Team};
pub(crate) use collision::check_death;
pub use grid::{Coord, Grid};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use layout::Layout;
pub use redistribution::redistribute;
pub use rules::{legal_actions_at, meets_threshold};
pub use sensor::{distance_probability, observe, AgentView, Observation};
pub use state::{GameState, Roster, TurnEvents};
