//! Match configuration.
//!
//! Every tunable that the rules or the controller read lives here and is
//! passed in at construction. Nothing is process-wide.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which half receives the food dropped by an eliminated attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DumpSide {
    /// The eliminated agent's own home side.
    #[default]
    VictimHome,
    /// The half on which the elimination happened.
    CaptureSide,
}

/// Game rule constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Score delta for an elimination, paid to the team that did not lose the agent.
    pub kill_points: i32,
    /// Turns an opposing defender stays scared after a capsule is eaten.
    pub scared_time: u32,
    /// Food a team may leave uneaten and still win on returns.
    pub min_food_reserve: u32,
    /// Manhattan distance at which an attacker and a defender collide.
    pub collision_tolerance: u32,
    /// Manhattan radius within which a teammate reveals an enemy.
    pub sight_range: u32,
    /// Width of the uniform sonar noise kernel. Must be odd.
    pub sonar_noise_range: u32,
    /// Where carried food goes when an attacker is eliminated.
    pub dump_side: DumpSide,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            kill_points: 0,
            scared_time: 40,
            min_food_reserve: 2,
            collision_tolerance: 0,
            sight_range: 5,
            sonar_noise_range: 13,
            dump_side: DumpSide::VictimHome,
        }
    }
}

impl RulesConfig {
    /// Largest absolute sonar offset, `(range - 1) / 2`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn max_noise(&self) -> i32 {
        (self.sonar_noise_range.saturating_sub(1) / 2) as i32
    }

    /// Check the rule constants.
    ///
    /// # Errors
    ///
    /// Returns an error if the noise kernel width is even or zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sonar_noise_range % 2 == 0 {
            return Err(ConfigError::EvenNoiseRange(self.sonar_noise_range));
        }
        Ok(())
    }
}

/// Per-agent thinking budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBudgets {
    /// Limit for the one-time initial-state registration.
    pub startup: Duration,
    /// A decision slower than this earns a warning.
    pub move_warning: Duration,
    /// A decision slower than this forfeits the match.
    pub move_timeout: Duration,
    /// Warnings tolerated; one more forfeits the match.
    pub max_warnings: u32,
    /// Cumulative thinking time allowed over the match.
    pub max_total: Duration,
}

impl Default for TimeBudgets {
    fn default() -> Self {
        Self {
            startup: Duration::from_secs(15),
            move_warning: Duration::from_secs(1),
            move_timeout: Duration::from_secs(3),
            max_warnings: 2,
            max_total: Duration::from_secs(900),
        }
    }
}

/// Configuration for a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Rule constants.
    pub rules: RulesConfig,
    /// Agent thinking budgets.
    pub budgets: TimeBudgets,
    /// Total moves (over all agents) before time runs out.
    pub time_limit: u32,
    /// Score awarded to the opposing team when an agent crashes.
    pub crash_score: i32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            budgets: TimeBudgets::default(),
            time_limit: 1200,
            crash_score: 1,
        }
    }
}

impl MatchConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON or the values fail validation.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the time limit is zero or the rules are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit == 0 {
            return Err(ConfigError::ZeroTimeLimit);
        }
        self.rules.validate()
    }
}
