use serpentine_engine::{EnvConfig, Replay};

use crate::{
    aggregate::{AggregatedStats, EpisodeOutcome},
    episode::EpisodeRunner,
    fitness::FitnessFunction,
    observation::{FeatureExtractor, ObservationKind},
    policy::{GenomeLengthError, PolicyNetwork, Topology, TopologyError},
};

#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum EvaluatorError {
    #[display("invalid network topology: {_0}")]
    Topology(TopologyError),
    #[display("invalid genome: {_0}")]
    GenomeLength(GenomeLengthError),
}

/// Scores genomes by playing episodes.
///
/// The environment, observation encoding, network topology and fitness
/// function are resolved once at construction. Each evaluation call builds its
/// own simulation, network and extractor, so an `Evaluator` can be shared by
/// reference across worker threads.
///
/// # Example
///
/// ```
/// use serpentine_engine::EnvConfig;
/// use serpentine_evaluator::{
///     Evaluator,
///     fitness::{FitnessFunction, FitnessMode, FitnessParams},
///     observation::ObservationKind,
/// };
///
/// let env = EnvConfig::new(10, 10, 1, 200, 9999, false)?;
/// let fitness = FitnessFunction::new(FitnessMode::Wall, FitnessParams::default());
/// let evaluator = Evaluator::new(env, ObservationKind::Wall, 8, 0, fitness)?;
///
/// let genome = vec![0.0; evaluator.genome_len()];
/// // A zero network always goes straight and hits the wall on tick 5.
/// let outcome = evaluator.evaluate(&genome, 1)?;
/// assert_eq!(outcome.stats.ticks, 5);
/// assert_eq!(outcome.score, 5.0 - 500.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Evaluator {
    env: EnvConfig,
    observation: ObservationKind,
    topology: Topology,
    fitness: FitnessFunction,
}

impl Evaluator {
    /// Creates an evaluator. A `hidden2` of zero means a single hidden layer.
    pub fn new(
        env: EnvConfig,
        observation: ObservationKind,
        hidden1: usize,
        hidden2: usize,
        fitness: FitnessFunction,
    ) -> Result<Self, EvaluatorError> {
        let topology = Topology::new(observation.dimension(), hidden1, hidden2)?;
        Ok(Self {
            env,
            observation,
            topology,
            fitness,
        })
    }

    /// Returns a copy playing in a different environment.
    #[must_use]
    pub fn with_env(&self, env: EnvConfig) -> Self {
        Self {
            env,
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn env(&self) -> &EnvConfig {
        &self.env
    }

    #[must_use]
    pub const fn observation(&self) -> ObservationKind {
        self.observation
    }

    #[must_use]
    pub const fn topology(&self) -> &Topology {
        &self.topology
    }

    #[must_use]
    pub const fn fitness(&self) -> &FitnessFunction {
        &self.fitness
    }

    #[must_use]
    pub fn genome_len(&self) -> usize {
        self.topology.genome_len()
    }

    /// Builds a runner with its own network loaded from `genome`.
    pub fn runner(&self, genome: &[f32]) -> Result<EpisodeRunner, EvaluatorError> {
        let network = PolicyNetwork::from_genome(self.topology.clone(), genome)?;
        Ok(EpisodeRunner::new(
            self.env,
            network,
            FeatureExtractor::new(self.observation),
            self.fitness,
        ))
    }

    /// Plays a single episode with `seed`.
    pub fn evaluate(&self, genome: &[f32], seed: u32) -> Result<EpisodeOutcome, EvaluatorError> {
        Ok(self.runner(genome)?.run(seed))
    }

    /// Plays one episode per seed and aggregates them.
    pub fn evaluate_seeds<I>(
        &self,
        genome: &[f32],
        seeds: I,
    ) -> Result<AggregatedStats, EvaluatorError>
    where
        I: IntoIterator<Item = u32>,
    {
        Ok(self.runner(genome)?.run_seeds(seeds))
    }

    /// Plays a single episode and records it for later playback.
    pub fn record_replay(
        &self,
        genome: &[f32],
        seed: u32,
    ) -> Result<(Replay, EpisodeOutcome), EvaluatorError> {
        Ok(self.runner(genome)?.record(seed))
    }
}

/// `runs` consecutive seeds starting at `base`, wrapping at `u32::MAX`.
pub fn seed_range(base: u32, runs: usize) -> impl Iterator<Item = u32> + Clone {
    (0..runs).map(move |i| {
        #[expect(clippy::cast_possible_truncation)]
        let offset = i as u32;
        base.wrapping_add(offset)
    })
}

#[cfg(test)]
mod tests {
    use serpentine_engine::DeathCause;

    use crate::fitness::{FitnessMode, FitnessParams};

    use super::*;

    fn evaluator(observation: ObservationKind, mode: FitnessMode, fruit: bool) -> Evaluator {
        let env = EnvConfig::new(10, 10, 2, 150, 60, fruit).unwrap();
        let fitness = FitnessFunction::new(mode, FitnessParams::default());
        Evaluator::new(env, observation, 6, 4, fitness).unwrap()
    }

    fn pseudo_genome(len: usize, salt: u32) -> Vec<f32> {
        (0..len)
            .map(|i| {
                #[expect(clippy::cast_possible_truncation)]
                let x = (i as u32).wrapping_mul(2_654_435_761).wrapping_add(salt);
                #[expect(clippy::cast_precision_loss)]
                let v = (x % 2001) as f32 / 1000.0 - 1.0;
                v
            })
            .collect()
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let evaluator = evaluator(ObservationKind::Multi, FitnessMode::Multi, true);
        let genome = pseudo_genome(evaluator.genome_len(), 7);
        for seed in [0, 1, 99, u32::MAX] {
            let a = evaluator.evaluate(&genome, seed).unwrap();
            let b = evaluator.evaluate(&genome, seed).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.stats.seed, seed);
            assert_ne!(a.stats.death, DeathCause::None);
        }
    }

    #[test]
    fn test_rejects_wrong_genome_length() {
        let evaluator = evaluator(ObservationKind::Wall, FitnessMode::Wall, false);
        let err = evaluator.evaluate(&[0.0; 3], 0).unwrap_err();
        assert!(matches!(err, EvaluatorError::GenomeLength(_)));
    }

    #[test]
    fn test_rejects_zero_hidden() {
        let env = EnvConfig::new(10, 10, 1, 100, 100, false).unwrap();
        let fitness = FitnessFunction::new(FitnessMode::Wall, FitnessParams::default());
        let err = Evaluator::new(env, ObservationKind::Wall, 0, 0, fitness).unwrap_err();
        assert_eq!(err, EvaluatorError::Topology(TopologyError::ZeroHidden));
    }

    #[test]
    fn test_evaluate_seeds_matches_single_runs() {
        let evaluator = evaluator(ObservationKind::Fruit, FitnessMode::Fruit, true);
        let genome = pseudo_genome(evaluator.genome_len(), 3);
        let agg = evaluator
            .evaluate_seeds(&genome, seed_range(1000, 4))
            .unwrap();
        let outcomes = seed_range(1000, 4)
            .map(|seed| evaluator.evaluate(&genome, seed).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(agg, AggregatedStats::from_outcomes(&outcomes));
        assert_eq!(agg.episodes, 4);
    }

    #[test]
    fn test_replay_matches_evaluation() {
        let evaluator = evaluator(ObservationKind::SelfAvoid, FitnessMode::SelfAvoid, true);
        let genome = pseudo_genome(evaluator.genome_len(), 11);
        let (replay, outcome) = evaluator.record_replay(&genome, 42).unwrap();
        assert_eq!(outcome, evaluator.evaluate(&genome, 42).unwrap());
        assert_eq!(replay.verify().unwrap(), outcome.stats);
    }

    #[test]
    fn test_seed_range_wraps() {
        assert_eq!(
            seed_range(u32::MAX - 1, 3).collect::<Vec<_>>(),
            vec![u32::MAX - 1, u32::MAX, 0]
        );
        assert_eq!(seed_range(5, 0).count(), 0);
    }
}
