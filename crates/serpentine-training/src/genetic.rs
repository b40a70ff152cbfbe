//! Genetic algorithm over policy genomes.
//!
//! # Algorithm Overview
//!
//! Each generation the trainer scores every [`Agent`] and sorts the
//! [`Population`] by fitness (best first). [`PopulationEvolver::evolve`] then
//! builds the next generation:
//!
//! 1. **Elitism** - The top `elites` agents are deep-copied unchanged
//! 2. **Selection pool** - Parents are drawn only from the top `selection_pool` agents
//! 3. **Tournament selection** - Two parents per child, each the fittest of
//!    `tournament_k` draws (with replacement) from the pool
//! 4. **Crossover** - With probability `crossover_rate` a uniform crossover,
//!    otherwise a copy of one parent picked by a fair coin
//! 5. **Mutation** - Per-gene reset or Gaussian perturbation
//! 6. **Fraction reset** - With probability 0.1 per generation, the last
//!    `reset_fraction` of the new population (never an elite) is re-drawn
//!
//! # Reproducibility
//!
//! All draws come from one random source owned by the caller, consumed in a
//! fixed order: per offspring slot, both tournaments, then the crossover
//! decision and its genes, then mutation. The fraction reset comes last. The
//! same seed therefore always yields the same next generation.
//!
//! # Agent identity
//!
//! Every agent carries an [`AgentId`]. Clones (elites, best-ever copies) keep
//! their id; every newly produced genome gets a fresh one. Two agents with the
//! same id are copies of each other but never share genome storage.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use serde::Serialize;
use serpentine_engine::{DeathCauseCounts, EpisodeStats};
use serpentine_evaluator::aggregate::{AggregatedStats, EpisodeOutcome};
use serpentine_stats::descriptive::DescriptiveStats;

use crate::genome::{self, MutationParams, MutationParamsError};

/// Probability that the fraction reset fires in a given generation.
pub const FRACTION_RESET_PROBABILITY: f64 = 0.1;

static NEXT_AGENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a genome lineage step, preserved by clones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, derive_more::Display,
)]
#[display("#{_0}")]
pub struct AgentId(u64);

impl AgentId {
    fn fresh() -> Self {
        Self(NEXT_AGENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A candidate policy: a genome plus its most recent evaluation results.
///
/// `Clone` is a deep copy of the genome.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    genome: Vec<f32>,
    fitness: f64,
    stats: Option<EpisodeStats>,
    aggregated: Option<AggregatedStats>,
    robustness: Option<f64>,
}

impl Agent {
    /// Wraps a genome in a new, unevaluated agent with a fresh id.
    #[must_use]
    pub fn new(genome: Vec<f32>) -> Self {
        Self {
            id: AgentId::fresh(),
            genome,
            fitness: f64::MIN,
            stats: None,
            aggregated: None,
            robustness: None,
        }
    }

    /// Creates an agent with a randomly initialized genome.
    pub fn random<R>(rng: &mut R, genome_len: usize) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::new(genome::random(rng, genome_len))
    }

    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn genome(&self) -> &[f32] {
        &self.genome
    }

    /// Single-seed fitness from the latest evaluation.
    #[must_use]
    pub const fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub const fn stats(&self) -> Option<&EpisodeStats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub const fn aggregated(&self) -> Option<&AggregatedStats> {
        self.aggregated.as_ref()
    }

    /// Robustness score from the latest multi-seed evaluation.
    #[must_use]
    pub const fn robustness(&self) -> Option<f64> {
        self.robustness
    }

    /// Stores a single-seed evaluation.
    pub fn record_episode(&mut self, outcome: EpisodeOutcome) {
        self.stats = Some(outcome.stats);
        self.fitness = outcome.score;
    }

    /// Stores a multi-seed evaluation and its robustness score.
    pub fn record_robustness(&mut self, aggregated: AggregatedStats, lambda: f64) {
        self.robustness = Some(aggregated.robustness_score(lambda));
        self.aggregated = Some(aggregated);
    }
}

/// An ordered collection of agents.
#[derive(Debug, Clone)]
pub struct Population {
    agents: Vec<Agent>,
}

impl Population {
    /// Creates `count` agents with random genomes.
    #[must_use]
    pub fn random<R>(count: usize, genome_len: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let agents = (0..count).map(|_| Agent::random(rng, genome_len)).collect();
        Self { agents }
    }

    #[must_use]
    pub const fn from_agents(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Mutable access to the agents. The set of agents cannot be changed.
    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Sorts by fitness, best first. Equal fitness keeps the current order.
    pub fn sort_by_fitness(&mut self) {
        self.agents.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    }

    #[must_use]
    pub fn is_sorted_by_fitness(&self) -> bool {
        self.agents
            .is_sorted_by(|a, b| b.fitness.total_cmp(&a.fitness).is_le())
    }

    /// The fittest agent; the first one wins ties.
    #[must_use]
    pub fn best(&self) -> Option<&Agent> {
        let (first, rest) = self.agents.split_first()?;
        Some(rest.iter().fold(first, |best, agent| {
            if agent.fitness > best.fitness {
                agent
            } else {
                best
            }
        }))
    }

    /// Summarises the latest single-seed evaluation.
    #[must_use]
    pub fn summary(&self, generation: u32) -> GenerationSummary {
        let best = self.best();
        let best_stats = best.and_then(Agent::stats);
        let stats = || self.agents.iter().filter_map(Agent::stats);
        GenerationSummary {
            generation,
            best_fitness: best.map_or(0.0, Agent::fitness),
            mean_fitness: DescriptiveStats::mean_or_zero(self.agents.iter().map(Agent::fitness)),
            best_ticks: best_stats.map_or(0, |s| s.ticks),
            mean_ticks: DescriptiveStats::mean_or_zero(stats().map(|s| f64::from(s.ticks))),
            best_fruits: best_stats.map_or(0, |s| s.fruits),
            mean_fruits: DescriptiveStats::mean_or_zero(stats().map(|s| f64::from(s.fruits))),
            death_counts: DeathCauseCounts::from_causes(stats().map(|s| s.death)),
        }
    }
}

/// Per-generation population statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub generation: u32,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub best_ticks: u32,
    pub mean_ticks: f64,
    pub best_fruits: u32,
    pub mean_fruits: f64,
    pub death_counts: DeathCauseCounts,
}

/// Hyperparameters of the genetic algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionParams {
    pub population_size: usize,
    pub elites: usize,
    pub selection_pool: usize,
    pub tournament_k: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub mutation_sigma: f64,
    pub reset_mutation_p: f64,
    pub reset_fraction: f64,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 200,
            elites: 4,
            selection_pool: 80,
            tournament_k: 3,
            crossover_rate: 0.7,
            mutation_rate: 0.10,
            mutation_sigma: 0.06,
            reset_mutation_p: 0.01,
            reset_fraction: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EvolutionParamsError {
    #[display("population size must be at least 1")]
    EmptyPopulation,
    #[display("elites ({elites}) cannot exceed the population size ({population_size})")]
    TooManyElites {
        elites: usize,
        population_size: usize,
    },
    #[display("selection pool must be at least 1")]
    EmptySelectionPool,
    #[display("tournament size must be at least 1")]
    EmptyTournament,
    #[display("{name} must be within [0, 1] (got {value})")]
    Probability { name: &'static str, value: f64 },
    #[display("{_0}")]
    #[from]
    Mutation(MutationParamsError),
}

/// Builds the next generation from a scored population.
#[derive(Debug, Clone)]
pub struct PopulationEvolver {
    params: EvolutionParams,
    mutation: MutationParams,
}

impl PopulationEvolver {
    pub fn new(params: EvolutionParams) -> Result<Self, EvolutionParamsError> {
        if params.population_size == 0 {
            return Err(EvolutionParamsError::EmptyPopulation);
        }
        if params.elites > params.population_size {
            return Err(EvolutionParamsError::TooManyElites {
                elites: params.elites,
                population_size: params.population_size,
            });
        }
        if params.selection_pool == 0 {
            return Err(EvolutionParamsError::EmptySelectionPool);
        }
        if params.tournament_k == 0 {
            return Err(EvolutionParamsError::EmptyTournament);
        }
        for (name, value) in [
            ("crossover rate", params.crossover_rate),
            ("reset fraction", params.reset_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EvolutionParamsError::Probability { name, value });
            }
        }
        let mutation = MutationParams::new(
            params.mutation_rate,
            params.mutation_sigma,
            params.reset_mutation_p,
        )?;
        Ok(Self { params, mutation })
    }

    #[must_use]
    pub const fn params(&self) -> &EvolutionParams {
        &self.params
    }

    /// Evolves `population` into the next generation.
    ///
    /// # Panics
    ///
    /// Panics if `population` is empty or not sorted by fitness.
    #[must_use]
    pub fn evolve<R>(&self, population: &Population, rng: &mut R) -> Population
    where
        R: Rng + ?Sized,
    {
        assert!(!population.is_empty(), "cannot evolve an empty population");
        assert!(
            population.is_sorted_by_fitness(),
            "population must be sorted by fitness"
        );

        let size = self.params.population_size;
        let elites = self.params.elites.min(population.len());
        let pool_len = self.params.selection_pool.min(population.len());
        let pool = &population.agents[..pool_len];

        let mut next = Vec::with_capacity(size);
        next.extend(population.agents[..elites].iter().cloned());

        while next.len() < size {
            let p1 = tournament_select(pool, self.params.tournament_k, rng);
            let p2 = tournament_select(pool, self.params.tournament_k, rng);
            let mut child = self.create_child(p1, p2, rng);
            genome::mutate(&mut child, &self.mutation, rng);
            next.push(Agent::new(child));
        }

        if self.params.reset_fraction > 0.0 && rng.random_bool(FRACTION_RESET_PROBABILITY) {
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss,
                clippy::cast_sign_loss
            )]
            let count = (size as f64 * self.params.reset_fraction) as usize;
            let start = size.saturating_sub(count).max(elites);
            for agent in &mut next[start..] {
                let mut genes = std::mem::take(&mut agent.genome);
                genome::reinitialize(&mut genes, rng);
                *agent = Agent::new(genes);
            }
        }

        Population { agents: next }
    }

    fn create_child<R>(&self, p1: &Agent, p2: &Agent, rng: &mut R) -> Vec<f32>
    where
        R: Rng + ?Sized,
    {
        if rng.random_bool(self.params.crossover_rate) {
            genome::uniform_crossover(&p1.genome, &p2.genome, rng)
        } else if rng.random_bool(0.5) {
            p1.genome.clone()
        } else {
            p2.genome.clone()
        }
    }
}

/// Picks the fittest of `k` uniform draws (with replacement) from `pool`.
///
/// `k` is capped at the pool size. On equal fitness the earlier draw wins.
fn tournament_select<'a, R>(pool: &'a [Agent], k: usize, rng: &mut R) -> &'a Agent
where
    R: Rng + ?Sized,
{
    assert!(!pool.is_empty() && k > 0);
    let k = k.min(pool.len());
    let mut best = &pool[rng.random_range(0..pool.len())];
    for _ in 1..k {
        let candidate = &pool[rng.random_range(0..pool.len())];
        if candidate.fitness > best.fitness {
            best = candidate;
        }
    }
    best
}
