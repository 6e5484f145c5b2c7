//! Display collaborators. They observe the match and never affect it.

use crate::game::GameState;

/// Receives every state of a match.
pub trait Display {
    /// Called once with the initial state.
    fn initialize(&mut self, _state: &GameState) {}

    /// Called after every successor.
    fn update(&mut self, _state: &GameState) {}

    /// Called once when the match finishes.
    fn finish(&mut self) {}
}

/// A display that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {}

/// Emits turn events as `tracing` trace records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDisplay {
    updates: u64,
}

impl TracingDisplay {
    /// Number of updates seen so far.
    #[must_use]
    pub const fn updates(&self) -> u64 {
        self.updates
    }
}

impl Display for TracingDisplay {
    fn initialize(&mut self, state: &GameState) {
        tracing::trace!(
            agents = state.num_agents(),
            food = state.total_food(),
            time_left = state.time_left(),
            "display initialized"
        );
    }

    fn update(&mut self, state: &GameState) {
        self.updates += 1;
        let events = state.last_events();
        tracing::trace!(
            agent = ?events.agent,
            score = state.score(),
            time_left = state.time_left(),
            eaten = ?events.food_eaten,
            capsule = ?events.capsule_eaten,
            eliminated = ?events.eliminated,
            dropped = events.food_dropped.len(),
            banked = events.banked,
            "turn"
        );
    }

    fn finish(&mut self) {
        tracing::trace!(updates = self.updates, "display finished");
    }
}
