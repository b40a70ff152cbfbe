//! Episode-level game logic.
//!
//! - [`EnvConfig`] - Validated environment parameters
//! - [`Simulation`] - Deterministic per-tick transition and sensor queries
//! - [`EpisodeStats`] / [`DeathCause`] - Outcome of a finished episode
//! - [`Replay`] - Recorded action trace with deterministic playback
//!
//! # Tick order
//!
//! Each [`Simulation::step`] turns first, then moves the head and resolves,
//! in this order: wall collision, self collision (the tail does not count),
//! eating or sliding, stall, timeout. The first terminal condition met ends
//! the episode and later checks are skipped.

pub use self::{env_config::*, episode_stats::*, replay::*, simulation::*};

mod env_config;
mod episode_stats;
mod replay;
mod simulation;
