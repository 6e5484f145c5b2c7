// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Flagrun: a deterministic capture-the-flag match engine.
//!
//! Two teams share a grid split into home halves. Agents defend at home and
//! attack on the opposing half, eating food and banking it by walking back.
//! This crate provides:
//! - Copy-on-write game states with explicit successor generation
//! - Collision resolution and breadth-first food redistribution
//! - Noisy, sight-limited observations for agents
//! - A time-budgeted match controller, replay and parallel series
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │     Series Runner / Replay          │
//! ├─────────────────────────────────────┤
//! │     Match Controller                │
//! ├─────────────────────────────────────┤
//! │     Game Rules + Sensor Model       │
//! └─────────────────────────────────────┘
//! ```
//!
//! Every source of randomness is a seeded `ChaCha8Rng`, so a seed, a layout
//! and deterministic agents reproduce a match exactly.

pub mod agent;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod game;
pub mod replay;
pub mod series;

pub use agent::{Agent, RandomAgent, ScriptedAgent};
pub use config::{DumpSide, MatchConfig, RulesConfig, TimeBudgets};
pub use controller::{run_match, EndReason, MatchPhase, MatchResult, MatchRunner, Move};
pub use error::{AgentError, AgentFault, ConfigError, LayoutError, MatchError, RulesError};

// Re-export key game types at crate root for convenience
pub use game::{Action, AgentId, Coord, GameState, Layout, Observation, Team};
