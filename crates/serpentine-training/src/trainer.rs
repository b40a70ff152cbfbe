//! Generation loop with two-pass robustness ranking.
//!
//! Each generation is split in two calls so the driver can inspect the scored
//! population before it is replaced:
//!
//! 1. [`Trainer::evaluate_generation`] plays one episode per agent with the
//!    generation seed, sorts the population, re-scores the robustness
//!    candidates (top-K plus the best-ever agent) on the fixed multi-seed
//!    suite, updates the best-ever agent and runs the periodic benchmark.
//! 2. [`Trainer::evolve`] replaces the population with the next generation.
//!
//! Both evaluation passes go through the [`WorkerPool`] and block until every
//! agent in the batch is done. Workers only write to the agent they were
//! handed; sorting and replacement happen on the calling thread.

use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serpentine_evaluator::{
    Evaluator, EvaluatorError, aggregate::AggregatedStats, policy::GenomeLengthError, seed_range,
};
use serpentine_stats::descriptive::DescriptiveStats;
use tracing::{debug, info};

use crate::{
    dispatch::WorkerPool,
    genetic::{Agent, GenerationSummary, Population, PopulationEvolver},
};

/// Number of agents re-scored by the periodic benchmark.
pub const BENCHMARK_AGENTS: usize = 5;

/// Parameters of the evaluation protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationParams {
    /// Agents re-scored on the multi-seed suite each generation.
    pub top_k: usize,
    pub multiseed_runs: usize,
    pub multiseed_base_seed: u32,
    /// Weight of the score standard deviation in the robustness score.
    pub robustness_lambda: f64,
    /// Benchmark cadence in generations; zero disables it.
    pub benchmark_every: u32,
    pub benchmark_seeds: Vec<u32>,
    /// Worker threads; zero uses every available CPU.
    pub workers: usize,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            top_k: 50,
            multiseed_runs: 7,
            multiseed_base_seed: 1000,
            robustness_lambda: 0.25,
            benchmark_every: 50,
            benchmark_seeds: (2000..2010).collect(),
            workers: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainerError {
    #[display("top-K must be at least 1")]
    EmptyCandidateSet,
    #[display("multi-seed runs must be at least 1")]
    ZeroMultiseedRuns,
    #[display("robustness lambda must be finite (got {value})")]
    InvalidLambda { value: f64 },
    #[display("population size {actual} does not match the configured size {expected}")]
    PopulationSize { expected: usize, actual: usize },
    #[display("agent {index} has an invalid genome: {source}")]
    Genome {
        index: usize,
        source: GenomeLengthError,
    },
    #[display("evaluation failed: {_0}")]
    #[from]
    Evaluation(EvaluatorError),
}

/// Result of one evaluated generation.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub summary: GenerationSummary,
    /// Seed used by the single-seed pass.
    pub seed: u32,
    /// Fittest agent of the single-seed pass.
    pub best: Agent,
    /// Agents re-scored by the multi-seed pass: the top-K plus the best-ever
    /// agent when it is not among them.
    pub candidates: usize,
    /// Highest robustness score among this generation's candidates.
    pub best_robustness: f64,
    /// Robustness score of the best-ever agent after the update.
    pub best_ever_robustness: f64,
    /// Whether the best-ever agent was replaced this generation.
    pub improved: bool,
    pub benchmark: Option<BenchmarkReport>,
}

/// Aggregates of the top agents on the fixed benchmark seeds.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub generation: u32,
    pub results: Vec<AggregatedStats>,
}

impl BenchmarkReport {
    /// Mean of the per-agent tick means.
    #[must_use]
    pub fn ticks_mean(&self) -> f64 {
        DescriptiveStats::mean_or_zero(self.results.iter().map(|r| r.ticks_mean))
    }

    /// Mean of the per-agent fruit means.
    #[must_use]
    pub fn fruits_mean(&self) -> f64 {
        DescriptiveStats::mean_or_zero(self.results.iter().map(|r| r.fruits_mean))
    }
}

/// Drives the genetic algorithm.
#[derive(Debug)]
pub struct Trainer {
    evaluator: Evaluator,
    evolver: PopulationEvolver,
    params: EvaluationParams,
    pool: WorkerPool,
    seed: u64,
    rng: Pcg32,
    population: Population,
    generation: u32,
    evaluated: bool,
    best_ever: Option<Agent>,
}

impl Trainer {
    /// Creates a trainer with a random initial population.
    ///
    /// The GA random source is seeded from `seed`; the same seed and
    /// configuration reproduce the same run regardless of the worker count.
    pub fn new(
        evaluator: Evaluator,
        evolver: PopulationEvolver,
        params: EvaluationParams,
        seed: u64,
    ) -> Result<Self, TrainerError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let population = Population::random(
            evolver.params().population_size,
            evaluator.genome_len(),
            &mut rng,
        );
        Self::build(evaluator, evolver, params, seed, rng, population)
    }

    fn build(
        evaluator: Evaluator,
        evolver: PopulationEvolver,
        params: EvaluationParams,
        seed: u64,
        rng: Pcg32,
        population: Population,
    ) -> Result<Self, TrainerError> {
        if params.top_k == 0 {
            return Err(TrainerError::EmptyCandidateSet);
        }
        if params.multiseed_runs == 0 {
            return Err(TrainerError::ZeroMultiseedRuns);
        }
        if !params.robustness_lambda.is_finite() {
            return Err(TrainerError::InvalidLambda {
                value: params.robustness_lambda,
            });
        }
        let expected = evolver.params().population_size;
        if population.len() != expected {
            return Err(TrainerError::PopulationSize {
                expected,
                actual: population.len(),
            });
        }
        for (index, agent) in population.agents().iter().enumerate() {
            evaluator
                .topology()
                .check_genome(agent.genome())
                .map_err(|source| TrainerError::Genome { index, source })?;
        }

        let pool = WorkerPool::new(params.workers);
        debug!(workers = pool.workers(), "worker pool ready");
        Ok(Self {
            evaluator,
            evolver,
            params,
            pool,
            seed,
            rng,
            population,
            generation: 0,
            evaluated: false,
            best_ever: None,
        })
    }

    #[must_use]
    pub const fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    #[must_use]
    pub const fn params(&self) -> &EvaluationParams {
        &self.params
    }

    #[must_use]
    pub const fn population(&self) -> &Population {
        &self.population
    }

    /// Number of generations evaluated so far.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// The most robust agent seen so far.
    #[must_use]
    pub const fn best_ever(&self) -> Option<&Agent> {
        self.best_ever.as_ref()
    }

    /// Single-seed pass seed of `generation`: the base seed plus the
    /// generation, truncated to 32 bits.
    #[must_use]
    pub fn generation_seed(&self, generation: u32) -> u32 {
        #[expect(clippy::cast_possible_truncation)]
        let seed = self.seed.wrapping_add(u64::from(generation)) as u32;
        seed
    }

    /// Evaluates the current population as the next generation.
    ///
    /// Afterwards [`population`](Self::population) is sorted by fitness and
    /// holds this generation's scores until [`evolve`](Self::evolve) is called.
    ///
    /// # Panics
    ///
    /// Panics if the current population was already evaluated.
    pub fn evaluate_generation(&mut self) -> Result<GenerationReport, TrainerError> {
        assert!(
            !self.evaluated,
            "population already evaluated; call evolve first"
        );
        let generation = self.generation + 1;
        let seed = self.generation_seed(generation);

        let Self {
            evaluator,
            params,
            pool,
            population,
            best_ever,
            evolver,
            ..
        } = self;

        // Single-seed pass.
        pool.try_for_each(population.agents_mut(), |agent| {
            let outcome = evaluator.evaluate(agent.genome(), seed)?;
            agent.record_episode(outcome);
            Ok::<_, EvaluatorError>(())
        })?;
        population.sort_by_fitness();
        let summary = population.summary(generation);
        debug!(
            generation,
            seed,
            best = summary.best_fitness,
            mean = summary.mean_fitness,
            "single-seed pass done"
        );

        // Multi-seed pass over the candidates.
        let top = params
            .top_k
            .max(evolver.params().elites)
            .min(population.len());
        let (head, _) = population.agents_mut().split_at_mut(top);
        let best_ever_present = best_ever
            .as_ref()
            .is_some_and(|b| head.iter().any(|a| a.id() == b.id()));
        let mut candidates = head.iter_mut().collect::<Vec<_>>();
        if let Some(agent) = best_ever.as_mut().filter(|_| !best_ever_present) {
            candidates.push(agent);
        }
        let seeds = seed_range(params.multiseed_base_seed, params.multiseed_runs);
        let lambda = params.robustness_lambda;
        pool.try_for_each(&mut candidates, |agent| {
            let aggregated = evaluator.evaluate_seeds(agent.genome(), seeds.clone())?;
            agent.record_robustness(aggregated, lambda);
            Ok::<_, EvaluatorError>(())
        })?;
        let mut best_candidate: Option<&Agent> = None;
        for agent in &candidates {
            let agent = &**agent;
            if best_candidate.is_none_or(|best| robustness_of(agent) > robustness_of(best)) {
                best_candidate = Some(agent);
            }
        }
        let best_candidate = best_candidate.cloned();
        let candidate_count = candidates.len();
        debug!(
            generation,
            candidates = candidate_count,
            "multi-seed pass done"
        );
        drop(candidates);

        // Best-ever update.
        let mut best_robustness = f64::MIN;
        let mut improved = false;
        if let Some(candidate) = best_candidate {
            best_robustness = robustness_of(&candidate);
            if best_ever
                .as_ref()
                .is_none_or(|b| best_robustness > robustness_of(b))
            {
                info!(
                    generation,
                    agent = %candidate.id(),
                    robustness = best_robustness,
                    fitness = candidate.fitness(),
                    "new best-ever agent"
                );
                *best_ever = Some(candidate);
                improved = true;
            }
        }
        let best_ever_robustness = best_ever.as_ref().map_or(f64::MIN, robustness_of);

        let benchmark = (params.benchmark_every > 0
            && generation % params.benchmark_every == 0
            && !params.benchmark_seeds.is_empty())
        .then(|| run_benchmark(evaluator, pool, params, population, generation))
        .transpose()?;

        let best = population
            .best()
            .cloned()
            .expect("population is never empty");

        self.generation = generation;
        self.evaluated = true;
        Ok(GenerationReport {
            summary,
            seed,
            best,
            candidates: candidate_count,
            best_robustness,
            best_ever_robustness,
            improved,
            benchmark,
        })
    }

    /// Replaces the evaluated population with the next generation.
    ///
    /// # Panics
    ///
    /// Panics if the current population has not been evaluated.
    pub fn evolve(&mut self) {
        assert!(
            self.evaluated,
            "population must be evaluated before evolving"
        );
        self.population = self.evolver.evolve(&self.population, &mut self.rng);
        self.evaluated = false;
    }

    /// Evaluates the current generation and evolves the next one.
    pub fn run_generation(&mut self) -> Result<GenerationReport, TrainerError> {
        let report = self.evaluate_generation()?;
        self.evolve();
        Ok(report)
    }
}

fn robustness_of(agent: &Agent) -> f64 {
    agent.robustness().unwrap_or(f64::MIN)
}

fn run_benchmark(
    evaluator: &Evaluator,
    pool: &WorkerPool,
    params: &EvaluationParams,
    population: &Population,
    generation: u32,
) -> Result<BenchmarkReport, EvaluatorError> {
    let mut entries = population
        .agents()
        .iter()
        .take(BENCHMARK_AGENTS)
        .map(|agent| (agent, AggregatedStats::default()))
        .collect::<Vec<_>>();
    pool.try_for_each(&mut entries, |(agent, result)| {
        *result =
            evaluator.evaluate_seeds(agent.genome(), params.benchmark_seeds.iter().copied())?;
        Ok::<_, EvaluatorError>(())
    })?;
    let report = BenchmarkReport {
        generation,
        results: entries.into_iter().map(|(_, result)| result).collect(),
    };
    debug!(
        generation,
        ticks = report.ticks_mean(),
        fruits = report.fruits_mean(),
        "benchmark done"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use serpentine_engine::EnvConfig;
    use serpentine_evaluator::{
        fitness::{FitnessFunction, FitnessMode, FitnessParams},
        observation::ObservationKind,
    };

    use crate::genetic::EvolutionParams;

    use super::*;

    fn evaluator() -> Evaluator {
        let env = EnvConfig::new(8, 8, 1, 60, 9999, false).unwrap();
        let fitness = FitnessFunction::new(FitnessMode::Wall, FitnessParams::default());
        Evaluator::new(env, ObservationKind::Wall, 6, 0, fitness).unwrap()
    }

    fn evolver() -> PopulationEvolver {
        PopulationEvolver::new(EvolutionParams {
            population_size: 12,
            elites: 2,
            selection_pool: 6,
            ..EvolutionParams::default()
        })
        .unwrap()
    }

    fn params(workers: usize) -> EvaluationParams {
        EvaluationParams {
            top_k: 4,
            multiseed_runs: 3,
            benchmark_every: 2,
            benchmark_seeds: vec![7, 8],
            workers,
            ..EvaluationParams::default()
        }
    }

    fn fingerprint(trainer: &mut Trainer, generations: u32) -> Vec<(f64, f64)> {
        (0..generations)
            .map(|_| {
                let report = trainer.run_generation().unwrap();
                (report.summary.best_fitness, report.best_ever_robustness)
            })
            .collect()
    }

    #[test]
    fn test_generation_seed() {
        let trainer = Trainer::new(evaluator(), evolver(), params(1), 1337).unwrap();
        assert_eq!(trainer.generation_seed(1), 1338);
        let trainer = Trainer::new(evaluator(), evolver(), params(1), u64::from(u32::MAX)).unwrap();
        assert_eq!(trainer.generation_seed(1), 0);
    }

    #[test]
    fn test_evaluate_generation_sorts_and_tracks_best_ever() {
        let mut trainer = Trainer::new(evaluator(), evolver(), params(2), 5).unwrap();
        let report = trainer.evaluate_generation().unwrap();

        assert_eq!(report.summary.generation, 1);
        assert_eq!(report.seed, 6);
        assert!(trainer.population().is_sorted_by_fitness());
        assert_eq!(report.best.id(), trainer.population().agents()[0].id());
        assert!(report.improved);
        assert_eq!(report.candidates, 4);

        let best_ever = trainer.best_ever().unwrap();
        assert_eq!(best_ever.robustness(), Some(report.best_ever_robustness));
        assert_eq!(report.best_robustness, report.best_ever_robustness);
        for agent in &trainer.population().agents()[..4] {
            assert!(agent.robustness().unwrap() <= report.best_ever_robustness);
        }
        let rest = &trainer.population().agents()[4..];
        assert!(rest.iter().all(|a| a.robustness().is_none()));
        assert!(report.benchmark.is_none());
    }

    #[test]
    fn test_best_ever_never_regresses() {
        let mut trainer = Trainer::new(evaluator(), evolver(), params(2), 9).unwrap();
        let mut previous = f64::MIN;
        for _ in 0..6 {
            let report = trainer.run_generation().unwrap();
            assert!(report.best_ever_robustness >= previous);
            previous = report.best_ever_robustness;
        }
    }

    #[test]
    fn test_benchmark_cadence() {
        let mut trainer = Trainer::new(evaluator(), evolver(), params(2), 3).unwrap();
        assert!(trainer.run_generation().unwrap().benchmark.is_none());
        let benchmark = trainer.run_generation().unwrap().benchmark.unwrap();
        assert_eq!(benchmark.generation, 2);
        assert_eq!(benchmark.results.len(), BENCHMARK_AGENTS);
        assert!(benchmark.results.iter().all(|r| r.episodes == 2));
    }

    #[test]
    fn test_runs_are_independent_of_worker_count() {
        let mut serial = Trainer::new(evaluator(), evolver(), params(1), 21).unwrap();
        let mut parallel = Trainer::new(evaluator(), evolver(), params(4), 21).unwrap();
        assert_eq!(fingerprint(&mut serial, 4), fingerprint(&mut parallel, 4));
    }

    fn build(population: Population) -> Result<Trainer, TrainerError> {
        let rng = Pcg32::seed_from_u64(0);
        Trainer::build(evaluator(), evolver(), params(1), 0, rng, population)
    }

    #[test]
    fn test_best_ever_outside_top_k_is_rescored() {
        let mut trainer = Trainer::new(evaluator(), evolver(), params(2), 17).unwrap();
        let mut stale = Agent::new(vec![0.0; trainer.evaluator().genome_len()]);
        let aggregated = AggregatedStats {
            score_mean: 1e9,
            ..AggregatedStats::default()
        };
        stale.record_robustness(aggregated, 0.0);
        trainer.best_ever = Some(stale);

        let report = trainer.evaluate_generation().unwrap();
        assert_eq!(report.candidates, 5);
        assert!(report.best_ever_robustness < 1e9);
        assert_eq!(report.best_ever_robustness, report.best_robustness);
    }

    #[test]
    fn test_best_ever_inside_top_k_is_not_duplicated() {
        let wide = EvaluationParams {
            top_k: 12,
            ..params(2)
        };
        let mut trainer = Trainer::new(evaluator(), evolver(), wide, 17).unwrap();
        trainer.best_ever = Some(trainer.population().agents()[5].clone());

        let report = trainer.evaluate_generation().unwrap();
        assert_eq!(report.candidates, 12);
        let agents = trainer.population().agents();
        assert!(agents.iter().all(|a| a.robustness().is_some()));
    }

    #[test]
    fn test_rejects_mismatched_population() {
        let population = Population::from_agents(vec![Agent::new(vec![0.0; 3]); 12]);
        let err = build(population).unwrap_err();
        assert!(matches!(err, TrainerError::Genome { index: 0, .. }));

        let err = build(Population::from_agents(vec![])).unwrap_err();
        assert_eq!(
            err,
            TrainerError::PopulationSize {
                expected: 12,
                actual: 0
            }
        );
    }

    #[test]
    fn test_rejects_invalid_params() {
        let err = Trainer::new(
            evaluator(),
            evolver(),
            EvaluationParams {
                multiseed_runs: 0,
                ..params(1)
            },
            0,
        )
        .unwrap_err();
        assert_eq!(err, TrainerError::ZeroMultiseedRuns);
    }

    #[test]
    #[should_panic(expected = "population must be evaluated")]
    fn test_evolve_requires_evaluation() {
        let mut trainer = Trainer::new(evaluator(), evolver(), params(1), 0).unwrap();
        trainer.evolve();
    }
}
