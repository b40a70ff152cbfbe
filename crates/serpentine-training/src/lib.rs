//! Genetic training of snake policy networks.
//!
//! This crate evolves the flat weight vectors (genomes) of the policy networks
//! defined in `serpentine-evaluator`. Fitness is measured by playing episodes
//! in the `serpentine-engine` simulation.
//!
//! # How Training Works
//!
//! 1. **Population** - Create agents with randomly initialized genomes
//! 2. **Screening** - Every agent plays one episode on the generation seed
//! 3. **Ranking** - Sort by single-seed fitness
//! 4. **Robustness** - The top-K agents and the best-ever agent play a fixed
//!    suite of seeds; `mean - lambda * std` of their scores is the robustness score
//! 5. **Best-ever** - The most robust agent seen so far is kept aside as a deep copy
//! 6. **Reproduction** - Elitism, tournament selection, crossover and mutation
//!    build the next generation
//!
//! The cheap screening pass keeps the expensive multi-seed pass limited to a
//! few promising agents, while the robustness score prevents a single lucky
//! episode from crowning a champion.
//!
//! # Architecture
//!
//! ```text
//! Trainer (trainer)
//!     ↓ dispatches episodes through
//! WorkerPool (dispatch)
//!     ↓ scores genomes with
//! Evaluator (serpentine-evaluator)
//!     ↓ results guide
//! PopulationEvolver (genetic) + variation operators (genome)
//!     ↓ best-ever agent exported as
//! ChampionSnapshot (champion)
//! ```
//!
//! # Determinism
//!
//! Episodes are seeded explicitly and own their random source, so scores do
//! not depend on the worker count or scheduling order. The GA draws from a
//! single generator owned by the [`Trainer`](trainer::Trainer) and seeded from
//! the run seed.
//!
//! # Example
//!
//! ```
//! use serpentine_engine::EnvConfig;
//! use serpentine_evaluator::{
//!     Evaluator,
//!     fitness::{FitnessFunction, FitnessMode, FitnessParams},
//!     observation::ObservationKind,
//! };
//! use serpentine_training::{
//!     genetic::{EvolutionParams, PopulationEvolver},
//!     trainer::{EvaluationParams, Trainer},
//! };
//!
//! let env = EnvConfig::new(8, 8, 1, 50, 9999, false)?;
//! let fitness = FitnessFunction::new(FitnessMode::Wall, FitnessParams::default());
//! let evaluator = Evaluator::new(env, ObservationKind::Wall, 4, 0, fitness)?;
//! let evolver = PopulationEvolver::new(EvolutionParams {
//!     population_size: 10,
//!     elites: 2,
//!     selection_pool: 5,
//!     ..EvolutionParams::default()
//! })?;
//! let params = EvaluationParams {
//!     top_k: 3,
//!     multiseed_runs: 2,
//!     benchmark_every: 0,
//!     workers: 2,
//!     ..EvaluationParams::default()
//! };
//!
//! let mut trainer = Trainer::new(evaluator, evolver, params, 1337)?;
//! for _ in 0..3 {
//!     let report = trainer.run_generation()?;
//!     assert!(report.summary.best_fitness >= report.summary.mean_fitness);
//! }
//! assert_eq!(trainer.generation(), 3);
//! assert!(trainer.best_ever().is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Current Limitations
//!
//! - **Fixed topology**: Only weights evolve; layer widths come from configuration
//! - **Single objective**: Each track folds its goals into one scalar fitness

pub mod champion;
pub mod dispatch;
pub mod genetic;
pub mod genome;
pub mod trainer;
