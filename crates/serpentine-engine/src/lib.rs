//! Deterministic grid snake engine.
//!
//! The [`core`] module holds geometry and the body representation; the
//! [`engine`] module builds the simulation, episode statistics and replays on
//! top of it. Everything an evaluator needs is re-exported at the crate root.
//!
//! # Example
//!
//! ```
//! use serpentine_engine::{Action, EnvConfig, Simulation};
//!
//! let config = EnvConfig::new(10, 10, 3, 200, 9999, true)?;
//! let mut sim = Simulation::new(&config, 1234);
//! while sim.is_alive() {
//!     let action = if sim.is_danger(Action::Straight) {
//!         Action::TurnLeft
//!     } else {
//!         Action::Straight
//!     };
//!     sim.step(action);
//! }
//! println!("{:?}", sim.stats(1234));
//! # Ok::<(), serpentine_engine::EnvConfigError>(())
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;
