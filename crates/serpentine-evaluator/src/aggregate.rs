use serde::{Deserialize, Serialize};
use serpentine_engine::{DeathCauseCounts, EpisodeStats};
use serpentine_stats::descriptive::DescriptiveStats;

/// One scored episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    pub stats: EpisodeStats,
    pub score: f64,
}

/// Summary of several episodes played by the same agent.
///
/// Recomputed from scratch for every set of episodes; nothing is accumulated
/// across calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedStats {
    pub score_mean: f64,
    /// Population standard deviation of the scores.
    pub score_std: f64,
    pub fruits_mean: f64,
    pub ticks_mean: f64,
    pub progress_mean: f64,
    pub death_counts: DeathCauseCounts,
    pub episodes: usize,
}

impl AggregatedStats {
    /// Aggregates a set of outcomes. An empty set yields all zeros.
    ///
    /// ```
    /// use serpentine_engine::{DeathCause, EpisodeStats};
    /// use serpentine_evaluator::aggregate::{AggregatedStats, EpisodeOutcome};
    ///
    /// let outcome = |score| EpisodeOutcome {
    ///     stats: EpisodeStats {
    ///         fruits: 0,
    ///         ticks: 10,
    ///         progress_sum: 0.0,
    ///         death: DeathCause::Wall,
    ///         seed: 0,
    ///     },
    ///     score,
    /// };
    /// let agg = AggregatedStats::from_outcomes(&[outcome(10.0), outcome(20.0), outcome(30.0)]);
    /// assert_eq!(agg.score_mean, 20.0);
    /// assert!((agg.robustness_score(0.25) - 17.959).abs() < 1e-3);
    /// ```
    #[must_use]
    pub fn from_outcomes(outcomes: &[EpisodeOutcome]) -> Self {
        let Some(scores) = DescriptiveStats::new(outcomes.iter().map(|o| o.score)) else {
            return Self::default();
        };
        Self {
            score_mean: scores.mean,
            score_std: scores.std_dev,
            fruits_mean: mean_of(outcomes, |o| f64::from(o.stats.fruits)),
            ticks_mean: mean_of(outcomes, |o| f64::from(o.stats.ticks)),
            progress_mean: mean_of(outcomes, |o| o.stats.progress_sum),
            death_counts: DeathCauseCounts::from_causes(outcomes.iter().map(|o| o.stats.death)),
            episodes: outcomes.len(),
        }
    }

    /// `score_mean − lambda · score_std`: rewards consistency across seeds.
    #[must_use]
    pub fn robustness_score(&self, lambda: f64) -> f64 {
        self.score_mean - lambda * self.score_std
    }
}

fn mean_of<F>(outcomes: &[EpisodeOutcome], f: F) -> f64
where
    F: Fn(&EpisodeOutcome) -> f64,
{
    DescriptiveStats::mean_or_zero(outcomes.iter().map(f))
}
