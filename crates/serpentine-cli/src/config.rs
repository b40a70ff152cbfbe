use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail, ensure};
use serde::{Deserialize, Serialize};
use serpentine_engine::EnvConfig;
use serpentine_evaluator::{
    Evaluator,
    fitness::{FitnessFunction, FitnessMode, FitnessParams},
    observation::ObservationKind,
};
use serpentine_training::{
    genetic::{EvolutionParams, PopulationEvolver},
    trainer::EvaluationParams,
};
use tracing::warn;

/// Run configuration, read from a YAML file.
///
/// Every field is optional; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub seed: u64,
    pub track: TrackSection,
    pub env: EnvSection,
    pub nn: NetworkSection,
    pub ga: GaSection,
    pub eval: EvalSection,
    pub logging: LoggingSection,
    pub fitness: FitnessSection,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            track: TrackSection::default(),
            env: EnvSection::default(),
            nn: NetworkSection::default(),
            ga: GaSection::default(),
            eval: EvalSection::default(),
            logging: LoggingSection::default(),
            fitness: FitnessSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSection {
    /// `wall`, `self`, `fruit` or `multi`.
    pub mode: String,
    /// Observation encoding; `*_min` spellings are accepted.
    pub obs: String,
    pub actions: String,
}

impl Default for TrackSection {
    fn default() -> Self {
        Self {
            mode: "wall".to_owned(),
            obs: "wall".to_owned(),
            actions: RELATIVE_ACTIONS.to_owned(),
        }
    }
}

const RELATIVE_ACTIONS: &str = "relative3";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvSection {
    pub width: usize,
    pub height: usize,
    pub start_length: usize,
    pub tick_cap: u32,
    pub stall_window: u32,
    pub fruit_enabled: bool,
}

impl Default for EnvSection {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            start_length: 1,
            tick_cap: 200,
            stall_window: 9999,
            fruit_enabled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSection {
    pub hidden1: usize,
    /// Zero means a single hidden layer.
    pub hidden2: usize,
    pub activation: String,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            hidden1: 8,
            hidden2: 0,
            activation: RELU.to_owned(),
        }
    }
}

const RELU: &str = "relu";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaSection {
    pub population: usize,
    pub elites: usize,
    pub selection_pool: usize,
    pub tournament_k: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub mutation_sigma: f64,
    pub reset_mutation_p: f64,
    pub reset_fraction: f64,
}

impl Default for GaSection {
    fn default() -> Self {
        let params = EvolutionParams::default();
        Self {
            population: params.population_size,
            elites: params.elites,
            selection_pool: params.selection_pool,
            tournament_k: params.tournament_k,
            crossover_rate: params.crossover_rate,
            mutation_rate: params.mutation_rate,
            mutation_sigma: params.mutation_sigma,
            reset_mutation_p: params.reset_mutation_p,
            reset_fraction: params.reset_fraction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalSection {
    pub topk_multiseed: usize,
    pub multiseed_runs: usize,
    pub multiseed_base_seed: u32,
    pub robustness_lambda: f64,
    pub benchmark_every: u32,
    pub benchmark_seeds: Vec<u32>,
    /// Zero uses every available CPU.
    pub workers: usize,
}

impl Default for EvalSection {
    fn default() -> Self {
        let params = EvaluationParams::default();
        Self {
            topk_multiseed: params.top_k,
            multiseed_runs: params.multiseed_runs,
            multiseed_base_seed: params.multiseed_base_seed,
            robustness_lambda: params.robustness_lambda,
            benchmark_every: params.benchmark_every,
            benchmark_seeds: params.benchmark_seeds,
            workers: params.workers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub every_gen_summary: bool,
    pub topn_debug: usize,
    pub save_champion_every: u32,
    pub replay_every: u32,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            every_gen_summary: true,
            topn_debug: 5,
            save_champion_every: 250,
            replay_every: 500,
            csv_path: PathBuf::from("runs/run.csv"),
            json_path: PathBuf::from("runs/run.jsonl"),
            artifacts_dir: PathBuf::from("artifacts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessSection {
    /// Overrides `track.mode` when set.
    pub mode: Option<String>,
    pub wall_penalty: f64,
    pub self_penalty: f64,
    pub stall_penalty: f64,
    pub fruit_reward: f64,
    pub survival_cap: u32,
    pub survival_w: f64,
    pub progress_w: f64,
    pub self_wall_scale: f64,
}

impl Default for FitnessSection {
    fn default() -> Self {
        let params = FitnessParams::default();
        Self {
            mode: None,
            wall_penalty: params.wall_penalty,
            self_penalty: params.self_penalty,
            stall_penalty: params.stall_penalty,
            fruit_reward: params.fruit_reward,
            survival_cap: params.survival_cap,
            survival_w: params.survival_weight,
            progress_w: params.progress_weight,
            self_wall_scale: params.self_track_wall_scale,
        }
    }
}

impl TrainingConfig {
    /// Reads a YAML config file. An empty file yields the defaults.
    pub fn load<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Checks every section, so a bad value fails before any episode is played.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.evaluator()?;
        self.evolver()?;
        let eval = self.evaluation_params();
        ensure!(eval.top_k > 0, "eval.topk_multiseed must be at least 1");
        ensure!(
            eval.multiseed_runs > 0,
            "eval.multiseed_runs must be at least 1"
        );
        ensure!(
            eval.robustness_lambda.is_finite(),
            "eval.robustness_lambda must be finite"
        );
        Ok(())
    }

    pub fn env_config(&self) -> anyhow::Result<EnvConfig> {
        let EnvSection {
            width,
            height,
            start_length,
            tick_cap,
            stall_window,
            fruit_enabled,
        } = self.env;
        EnvConfig::new(
            width,
            height,
            start_length,
            tick_cap,
            stall_window,
            fruit_enabled,
        )
        .context("Invalid env section")
    }

    /// Observation encoding named by `track.obs`; unknown names fall back to `wall`.
    #[must_use]
    pub fn observation(&self) -> ObservationKind {
        ObservationKind::parse(&self.track.obs).unwrap_or_else(|| {
            warn!(obs = %self.track.obs, "unknown observation encoding, using wall");
            ObservationKind::Wall
        })
    }

    /// Fitness mode from `fitness.mode`, or `track.mode` when unset.
    pub fn fitness_mode(&self) -> anyhow::Result<FitnessMode> {
        let name = self.fitness.mode.as_deref().unwrap_or(&self.track.mode);
        match FitnessMode::parse(name) {
            Some(mode) => Ok(mode),
            None => bail!("Unknown fitness mode: {name}"),
        }
    }

    #[must_use]
    pub fn fitness_params(&self) -> FitnessParams {
        let f = &self.fitness;
        FitnessParams {
            wall_penalty: f.wall_penalty,
            self_penalty: f.self_penalty,
            stall_penalty: f.stall_penalty,
            fruit_reward: f.fruit_reward,
            survival_cap: f.survival_cap,
            survival_weight: f.survival_w,
            progress_weight: f.progress_w,
            self_track_wall_scale: f.self_wall_scale,
        }
    }

    pub fn evaluator(&self) -> anyhow::Result<Evaluator> {
        ensure!(
            self.track.actions == RELATIVE_ACTIONS,
            "Unsupported action set: {} (only {RELATIVE_ACTIONS} is available)",
            self.track.actions
        );
        ensure!(
            self.nn.activation.eq_ignore_ascii_case(RELU),
            "Unsupported activation: {} (only {RELU} is available)",
            self.nn.activation
        );
        let fitness = FitnessFunction::new(self.fitness_mode()?, self.fitness_params());
        Evaluator::new(
            self.env_config()?,
            self.observation(),
            self.nn.hidden1,
            self.nn.hidden2,
            fitness,
        )
        .context("Invalid nn section")
    }

    #[must_use]
    pub fn evolution_params(&self) -> EvolutionParams {
        let ga = &self.ga;
        EvolutionParams {
            population_size: ga.population,
            elites: ga.elites,
            selection_pool: ga.selection_pool,
            tournament_k: ga.tournament_k,
            crossover_rate: ga.crossover_rate,
            mutation_rate: ga.mutation_rate,
            mutation_sigma: ga.mutation_sigma,
            reset_mutation_p: ga.reset_mutation_p,
            reset_fraction: ga.reset_fraction,
        }
    }

    pub fn evolver(&self) -> anyhow::Result<PopulationEvolver> {
        PopulationEvolver::new(self.evolution_params()).context("Invalid ga section")
    }

    #[must_use]
    pub fn evaluation_params(&self) -> EvaluationParams {
        let eval = &self.eval;
        EvaluationParams {
            top_k: eval.topk_multiseed,
            multiseed_runs: eval.multiseed_runs,
            multiseed_base_seed: eval.multiseed_base_seed,
            robustness_lambda: eval.robustness_lambda,
            benchmark_every: eval.benchmark_every,
            benchmark_seeds: eval.benchmark_seeds.clone(),
            workers: eval.workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrainingConfig::from_yaml("").unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.seed, 1337);
        assert_eq!(config.ga.population, 200);
        assert_eq!(
            config.eval.benchmark_seeds,
            (2000..2010).collect::<Vec<_>>()
        );
        assert_eq!(config.logging.csv_path, PathBuf::from("runs/run.csv"));
        assert_eq!(config.fitness.fruit_reward, 5000.0);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = TrainingConfig::from_yaml(
            "seed: 42\n\
             track:\n  mode: fruit\n  obs: fruit_min\n\
             env:\n  fruit_enabled: true\n  tick_cap: 500\n\
             nn:\n  hidden1: 16\n  hidden2: 8\n\
             ga:\n  population: 50\n",
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.env.width, 10);
        assert_eq!(config.env.tick_cap, 500);
        assert_eq!(config.ga.population, 50);
        assert_eq!(config.ga.elites, 4);
        assert_eq!(config.observation(), ObservationKind::Fruit);
        assert_eq!(config.fitness_mode().unwrap(), FitnessMode::Fruit);

        let evaluator = config.evaluator().unwrap();
        assert_eq!(
            evaluator.genome_len(),
            (6 + 1) * 16 + (16 + 1) * 8 + (8 + 1) * 3
        );
    }

    #[test]
    fn test_fitness_mode_override() {
        let config =
            TrainingConfig::from_yaml("track:\n  mode: wall\nfitness:\n  mode: multi\n").unwrap();
        assert_eq!(config.fitness_mode().unwrap(), FitnessMode::Multi);
    }

    #[test]
    fn test_unknown_observation_falls_back_to_wall() {
        let config = TrainingConfig::from_yaml("track:\n  obs: vision\n").unwrap();
        assert_eq!(config.observation(), ObservationKind::Wall);
    }

    #[test]
    fn test_validation_failures() {
        let bad = [
            "env:\n  width: 0\n",
            "env:\n  start_length: 9\n",
            "nn:\n  hidden1: 0\n",
            "nn:\n  activation: tanh\n",
            "ga:\n  elites: 500\n",
            "ga:\n  crossover_rate: 1.5\n",
            "ga:\n  tournament_k: 0\n",
            "eval:\n  multiseed_runs: 0\n",
            "track:\n  mode: maze\n",
        ];
        for yaml in bad {
            let config = TrainingConfig::from_yaml(yaml).unwrap();
            assert!(config.validate().is_err(), "{yaml}");
        }
    }

    #[test]
    fn test_bundled_configs() {
        let configs = [
            (
                include_str!("../../../configs/wall.yaml"),
                ObservationKind::Wall,
                FitnessMode::Wall,
            ),
            (
                include_str!("../../../configs/self.yaml"),
                ObservationKind::SelfAvoid,
                FitnessMode::SelfAvoid,
            ),
            (
                include_str!("../../../configs/fruit.yaml"),
                ObservationKind::Fruit,
                FitnessMode::Fruit,
            ),
            (
                include_str!("../../../configs/multi.yaml"),
                ObservationKind::Multi,
                FitnessMode::Multi,
            ),
        ];
        for (yaml, observation, mode) in configs {
            let config = TrainingConfig::from_yaml(yaml).unwrap();
            config.validate().unwrap();
            assert_eq!(config.observation(), observation);
            assert_eq!(config.fitness_mode().unwrap(), mode);
        }
    }
}
