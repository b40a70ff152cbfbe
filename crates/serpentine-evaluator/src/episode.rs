use serpentine_engine::{EnvConfig, Replay, ReplayRecorder, Simulation};

use crate::{
    aggregate::{AggregatedStats, EpisodeOutcome},
    fitness::FitnessFunction,
    observation::FeatureExtractor,
    policy::PolicyNetwork,
};

/// Plays episodes for one genome.
///
/// The runner owns its network and extractor, so several runners can play in
/// parallel without sharing any mutable state. Every episode starts from a
/// fresh [`Simulation`] seeded with the episode seed.
#[derive(Debug, Clone)]
pub struct EpisodeRunner {
    env: EnvConfig,
    network: PolicyNetwork,
    extractor: FeatureExtractor,
    fitness: FitnessFunction,
}

impl EpisodeRunner {
    #[must_use]
    pub const fn new(
        env: EnvConfig,
        network: PolicyNetwork,
        extractor: FeatureExtractor,
        fitness: FitnessFunction,
    ) -> Self {
        Self {
            env,
            network,
            extractor,
            fitness,
        }
    }

    /// Plays one episode to completion.
    pub fn run(&mut self, seed: u32) -> EpisodeOutcome {
        let mut sim = Simulation::new(&self.env, seed);
        while sim.is_alive() {
            let observation = self.extractor.extract(&sim);
            let action = self.network.forward(observation);
            sim.step(action);
        }
        self.outcome(&sim, seed)
    }

    /// Plays one episode per seed and aggregates the outcomes.
    pub fn run_seeds<I>(&mut self, seeds: I) -> AggregatedStats
    where
        I: IntoIterator<Item = u32>,
    {
        let outcomes = seeds
            .into_iter()
            .map(|seed| self.run(seed))
            .collect::<Vec<_>>();
        AggregatedStats::from_outcomes(&outcomes)
    }

    /// Plays one episode while recording its action trace.
    pub fn record(&mut self, seed: u32) -> (Replay, EpisodeOutcome) {
        let mut recorder = ReplayRecorder::new(&self.env, seed);
        while recorder.simulation().is_alive() {
            let observation = self.extractor.extract(recorder.simulation());
            let action = self.network.forward(observation);
            recorder.step(action);
        }
        let replay = recorder.finish();
        let outcome = EpisodeOutcome {
            stats: replay.final_stats,
            score: self.fitness.score(&replay.final_stats),
        };
        (replay, outcome)
    }

    fn outcome(&self, sim: &Simulation, seed: u32) -> EpisodeOutcome {
        let stats = sim.stats(seed);
        EpisodeOutcome {
            stats,
            score: self.fitness.score(&stats),
        }
    }
}
