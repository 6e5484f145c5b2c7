//! Series runner: many independent matches on one layout.
//!
//! Each match gets seed `base_seed + i`, its own agents and its own RNG, so
//! matches run in parallel with rayon and still reproduce exactly.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::config::MatchConfig;
use crate::controller::{run_match, MatchResult};
use crate::error::MatchError;
use crate::game::{Layout, Team};

/// How many matches to play and from which seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Matches to play.
    pub games: u32,
    /// Seed of the first match.
    pub base_seed: u64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            games: 10,
            base_seed: 42,
        }
    }
}

/// Outcome of one match in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameOutcome {
    /// Positive final score.
    Red,
    /// Zero final score.
    Tie,
    /// Negative final score.
    Blue,
}

impl From<Option<Team>> for GameOutcome {
    fn from(winner: Option<Team>) -> Self {
        match winner {
            Some(Team::Red) => Self::Red,
            Some(Team::Blue) => Self::Blue,
            None => Self::Tie,
        }
    }
}

/// Aggregate over a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    /// Mean final score.
    pub average_score: f64,
    /// Matches with a positive score.
    pub red_wins: u32,
    /// Matches with a negative score.
    pub blue_wins: u32,
    /// Matches with a zero score.
    pub ties: u32,
    /// Outcome of each match in seed order.
    pub record: Vec<GameOutcome>,
}

impl SeriesSummary {
    /// Summarize a list of results.
    #[must_use]
    pub fn from_results(results: &[MatchResult]) -> Self {
        let record: Vec<GameOutcome> = results.iter().map(|r| r.winner.into()).collect();
        let count = |outcome| {
            let n = record.iter().filter(|&&o| o == outcome).count();
            u32::try_from(n).unwrap_or(u32::MAX)
        };
        #[allow(clippy::cast_precision_loss)]
        let average_score = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| f64::from(r.score)).sum::<f64>() / results.len() as f64
        };

        Self {
            average_score,
            red_wins: count(GameOutcome::Red),
            blue_wins: count(GameOutcome::Blue),
            ties: count(GameOutcome::Tie),
            record,
        }
    }
}

/// Per-match results and their summary.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesReport {
    /// Results in seed order.
    pub results: Vec<MatchResult>,
    /// Aggregate over `results`.
    pub summary: SeriesSummary,
}

/// Play a series of matches in parallel.
///
/// `make_agents` is called once per match with that match's seed and must
/// return one agent per layout start to be used.
///
/// # Errors
///
/// Returns the first match error in seed order.
pub fn run_series<F>(
    layout: &Layout,
    config: &MatchConfig,
    series: SeriesConfig,
    make_agents: F,
) -> Result<SeriesReport, MatchError>
where
    F: Fn(u64) -> Vec<Box<dyn Agent>> + Sync,
{
    config.validate()?;
    let results = (0..series.games)
        .into_par_iter()
        .map(|i| {
            let seed = series.base_seed.wrapping_add(u64::from(i));
            run_match(layout, *config, make_agents(seed), seed)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = SeriesSummary::from_results(&results);
    tracing::info!(
        games = series.games,
        red_wins = summary.red_wins,
        blue_wins = summary.blue_wins,
        ties = summary.ties,
        average_score = summary.average_score,
        "series finished"
    );
    Ok(SeriesReport { results, summary })
}
