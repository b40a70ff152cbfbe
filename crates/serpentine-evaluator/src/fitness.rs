//! Fitness functions: reducing an episode to a scalar score.
//!
//! Each training track has its own objective:
//!
//! ```text
//! wall:  ticks − wall_penalty·[wall]
//! self:  ticks − self_penalty·[self] − wall_penalty·scale·[wall] − stall_penalty·[stall]
//! fruit: fruit_reward·fruits + survival_weight·min(ticks, survival_cap)
//!        + progress_weight·progress − death_penalty
//! multi: 8000·fruits + 2·min(ticks, 60) + progress_weight·progress − death_penalty
//!
//! death_penalty = 300 for wall/self, 150 for stall/timeout
//! ```
//!
//! The `self` track's lighter wall penalty (`scale`, 0.33 by default) was tuned
//! empirically and is kept configurable.

use serde::{Deserialize, Serialize};
use serpentine_engine::{DeathCause, EpisodeStats};

const COLLISION_PENALTY: f64 = 300.0;
const EXHAUSTION_PENALTY: f64 = 150.0;

const MULTI_FRUIT_REWARD: f64 = 8000.0;
const MULTI_SURVIVAL_WEIGHT: f64 = 2.0;
const MULTI_SURVIVAL_CAP: u32 = 60;

/// Which objective to score episodes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMode {
    #[display("wall")]
    Wall,
    #[serde(rename = "self")]
    #[display("self")]
    SelfAvoid,
    #[display("fruit")]
    Fruit,
    #[display("multi")]
    Multi,
}

impl FitnessMode {
    pub const ALL: [Self; 4] = [Self::Wall, Self::SelfAvoid, Self::Fruit, Self::Multi];

    /// Parses a mode name (case-insensitive).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.to_string().eq_ignore_ascii_case(name))
    }
}

/// Penalty and reward magnitudes shared by the fitness functions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessParams {
    pub wall_penalty: f64,
    pub self_penalty: f64,
    pub stall_penalty: f64,
    pub fruit_reward: f64,
    pub survival_cap: u32,
    pub survival_weight: f64,
    pub progress_weight: f64,
    pub self_track_wall_scale: f64,
}

impl Default for FitnessParams {
    fn default() -> Self {
        Self {
            wall_penalty: 500.0,
            self_penalty: 600.0,
            stall_penalty: 100.0,
            fruit_reward: 5000.0,
            survival_cap: 40,
            survival_weight: 2.0,
            progress_weight: 10.0,
            self_track_wall_scale: 0.33,
        }
    }
}

/// A fitness mode bound to its parameters.
///
/// # Example
///
/// ```
/// use serpentine_engine::{DeathCause, EpisodeStats};
/// use serpentine_evaluator::fitness::{FitnessFunction, FitnessMode, FitnessParams};
///
/// let fitness = FitnessFunction::new(FitnessMode::Wall, FitnessParams::default());
/// let stats = EpisodeStats {
///     fruits: 0,
///     ticks: 120,
///     progress_sum: 0.0,
///     death: DeathCause::Wall,
///     seed: 0,
/// };
/// assert_eq!(fitness.score(&stats), 120.0 - 500.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessFunction {
    mode: FitnessMode,
    params: FitnessParams,
}

impl FitnessFunction {
    #[must_use]
    pub const fn new(mode: FitnessMode, params: FitnessParams) -> Self {
        Self { mode, params }
    }

    #[must_use]
    pub const fn mode(&self) -> FitnessMode {
        self.mode
    }

    #[must_use]
    pub const fn params(&self) -> &FitnessParams {
        &self.params
    }

    /// Scores a finished episode. Higher is better.
    #[must_use]
    pub fn score(&self, stats: &EpisodeStats) -> f64 {
        let p = &self.params;
        let ticks = f64::from(stats.ticks);
        let fruits = f64::from(stats.fruits);
        match self.mode {
            FitnessMode::Wall => match stats.death {
                DeathCause::Wall => ticks - p.wall_penalty,
                _ => ticks,
            },
            FitnessMode::SelfAvoid => match stats.death {
                DeathCause::SelfCollision => ticks - p.self_penalty,
                DeathCause::Wall => ticks - p.wall_penalty * p.self_track_wall_scale,
                DeathCause::Stall => ticks - p.stall_penalty,
                DeathCause::None | DeathCause::Timeout => ticks,
            },
            FitnessMode::Fruit => {
                let survival = f64::from(stats.ticks.min(p.survival_cap));
                p.fruit_reward * fruits
                    + p.survival_weight * survival
                    + p.progress_weight * stats.progress_sum
                    - death_penalty(stats.death)
            }
            FitnessMode::Multi => {
                let survival = f64::from(stats.ticks.min(MULTI_SURVIVAL_CAP));
                MULTI_FRUIT_REWARD * fruits
                    + MULTI_SURVIVAL_WEIGHT * survival
                    + p.progress_weight * stats.progress_sum
                    - death_penalty(stats.death)
            }
        }
    }
}

fn death_penalty(death: DeathCause) -> f64 {
    match death {
        DeathCause::Wall | DeathCause::SelfCollision => COLLISION_PENALTY,
        DeathCause::Stall | DeathCause::Timeout => EXHAUSTION_PENALTY,
        DeathCause::None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(ticks: u32, fruits: u32, death: DeathCause, progress_sum: f64) -> EpisodeStats {
        EpisodeStats {
            fruits,
            ticks,
            progress_sum,
            death,
            seed: 0,
        }
    }

    fn score(mode: FitnessMode, stats: &EpisodeStats) -> f64 {
        FitnessFunction::new(mode, FitnessParams::default()).score(stats)
    }

    #[test]
    fn test_fruit_score_exact() {
        let s = stats(150, 2, DeathCause::Wall, 12.5);
        assert_eq!(score(FitnessMode::Fruit, &s), 9905.0);
    }

    #[test]
    fn test_wall_track() {
        let wall = |ticks, death| score(FitnessMode::Wall, &stats(ticks, 0, death, 0.0));
        assert_eq!(wall(200, DeathCause::Timeout), 200.0);
        assert_eq!(wall(10, DeathCause::Wall), -490.0);
        assert_eq!(wall(10, DeathCause::SelfCollision), 10.0);
    }

    #[test]
    fn test_self_track_penalties() {
        let avoid = |death| score(FitnessMode::SelfAvoid, &stats(50, 0, death, 0.0));
        assert_eq!(avoid(DeathCause::SelfCollision), -550.0);
        assert!((avoid(DeathCause::Wall) - (50.0 - 165.0)).abs() < 1e-9);
        assert_eq!(avoid(DeathCause::Stall), -50.0);
        assert_eq!(avoid(DeathCause::Timeout), 50.0);
    }

    #[test]
    fn test_self_track_wall_scale_is_tunable() {
        let params = FitnessParams {
            self_track_wall_scale: 1.0,
            ..FitnessParams::default()
        };
        let fitness = FitnessFunction::new(FitnessMode::SelfAvoid, params);
        assert_eq!(fitness.score(&stats(50, 0, DeathCause::Wall, 0.0)), -450.0);
    }

    #[test]
    fn test_multi_track() {
        let s = stats(100, 3, DeathCause::Stall, 4.0);
        assert_eq!(
            score(FitnessMode::Multi, &s),
            24_000.0 + 120.0 + 40.0 - 150.0
        );
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(FitnessMode::parse("self"), Some(FitnessMode::SelfAvoid));
        assert_eq!(FitnessMode::parse("Fruit"), Some(FitnessMode::Fruit));
        assert_eq!(FitnessMode::parse("speed"), None);
    }
}
