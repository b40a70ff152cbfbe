use serde::{Deserialize, Serialize};

use crate::core::Action;

use super::{env_config::EnvConfig, episode_stats::EpisodeStats, simulation::Simulation};

/// Raised when re-simulating a replay does not reproduce its recorded outcome.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
#[display(
    "replay diverged: recorded {} fruits / {} ticks / {}, replayed {} fruits / {} ticks / {}",
    recorded.fruits, recorded.ticks, recorded.death,
    replayed.fruits, replayed.ticks, replayed.death
)]
pub struct ReplayMismatchError {
    pub recorded: EpisodeStats,
    pub replayed: EpisodeStats,
}

/// A recorded episode: everything needed to re-simulate it exactly.
///
/// Because the simulation is deterministic, feeding `actions` into a fresh
/// [`Simulation`] built from `config` and `seed` reproduces `final_stats`.
///
/// # Example
///
/// ```
/// use serpentine_engine::{Action, EnvConfig, Replay};
///
/// let config = EnvConfig::new(8, 8, 2, 50, 9999, true)?;
/// let replay = Replay::record(&config, 11, |sim| {
///     if sim.is_danger(Action::Straight) {
///         Action::TurnRight
///     } else {
///         Action::Straight
///     }
/// });
/// assert!(replay.verify().is_ok());
/// # Ok::<(), serpentine_engine::EnvConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub seed: u32,
    pub config: EnvConfig,
    pub actions: Vec<Action>,
    pub final_stats: EpisodeStats,
}

impl Replay {
    /// Runs a full episode, asking `policy` for each action, and records it.
    pub fn record<F>(config: &EnvConfig, seed: u32, mut policy: F) -> Self
    where
        F: FnMut(&Simulation) -> Action,
    {
        let mut recorder = ReplayRecorder::new(config, seed);
        while recorder.simulation().is_alive() {
            let action = policy(recorder.simulation());
            recorder.step(action);
        }
        recorder.finish()
    }

    /// Starts a step-by-step playback from a fresh simulation.
    #[must_use]
    pub fn playback(&self) -> Playback<'_> {
        Playback {
            replay: self,
            simulation: Simulation::new(&self.config, self.seed),
            cursor: 0,
        }
    }

    /// Re-simulates every recorded action and returns the final state.
    #[must_use]
    pub fn replay_to_end(&self) -> Simulation {
        let mut playback = self.playback();
        while playback.step().is_some() {}
        playback.simulation
    }

    /// Checks that re-simulation reproduces the recorded statistics.
    pub fn verify(&self) -> Result<EpisodeStats, ReplayMismatchError> {
        let replayed = self.replay_to_end().stats(self.seed);
        if replayed == self.final_stats {
            Ok(replayed)
        } else {
            Err(ReplayMismatchError {
                recorded: self.final_stats,
                replayed,
            })
        }
    }
}

/// Captures actions while driving a live simulation.
#[derive(Debug, Clone)]
pub struct ReplayRecorder {
    seed: u32,
    simulation: Simulation,
    actions: Vec<Action>,
}

impl ReplayRecorder {
    #[must_use]
    pub fn new(config: &EnvConfig, seed: u32) -> Self {
        Self {
            seed,
            simulation: Simulation::new(config, seed),
            actions: vec![],
        }
    }

    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Applies `action` and records it. Actions after death are ignored.
    pub fn step(&mut self, action: Action) {
        if self.simulation.is_alive() {
            self.actions.push(action);
            self.simulation.step(action);
        }
    }

    #[must_use]
    pub fn finish(self) -> Replay {
        Replay {
            seed: self.seed,
            config: *self.simulation.config(),
            final_stats: self.simulation.stats(self.seed),
            actions: self.actions,
        }
    }
}

/// Step-by-step re-simulation of a [`Replay`].
#[derive(Debug, Clone)]
pub struct Playback<'a> {
    replay: &'a Replay,
    simulation: Simulation,
    cursor: usize,
}

impl Playback<'_> {
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Number of actions applied so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.replay.actions.len() || !self.simulation.is_alive()
    }

    /// Applies the next recorded action and returns it, or `None` once the
    /// trace is exhausted.
    pub fn step(&mut self) -> Option<Action> {
        if self.is_finished() {
            return None;
        }
        let action = self.replay.actions[self.cursor];
        self.cursor += 1;
        self.simulation.step(action);
        Some(action)
    }
}
