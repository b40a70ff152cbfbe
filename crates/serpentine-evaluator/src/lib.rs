//! Policy evaluation for the snake simulation.
//!
//! This crate turns a flat genome into episode scores:
//!
//! 1. **Observation** ([`observation`]) - Encodes the simulation state as a
//!    small `f32` vector (`wall`, `self`, `fruit` or `multi` encoding).
//! 2. **Policy** ([`policy`]) - A fixed-topology feed-forward network decoded
//!    from the genome picks straight, left or right each tick.
//! 3. **Fitness** ([`fitness`]) - Reduces a finished episode to a scalar score
//!    using the training track's objective.
//! 4. **Aggregation** ([`aggregate`]) - Summarises several seeds of the same
//!    genome and computes the robustness score `mean − λ·std`.
//!
//! [`Evaluator`] ties the four together. Observation and fitness modes are
//! plain enums resolved once when the evaluator is built, so the per-tick
//! path is a `match` and never a name lookup.
//!
//! # Determinism
//!
//! An episode depends only on the environment configuration, the genome and
//! the episode seed. Evaluations share no mutable state, so scores do not
//! depend on which thread runs them or in what order.

pub use self::{episode::*, evaluator::*};

pub mod aggregate;
mod episode;
mod evaluator;
pub mod fitness;
pub mod observation;
pub mod policy;
