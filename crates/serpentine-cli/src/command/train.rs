use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::Utc;
use serpentine_evaluator::Evaluator;
use serpentine_training::{
    champion::ChampionSnapshot,
    genetic::Agent,
    trainer::{GenerationReport, Trainer},
};
use tracing::{info, warn};

use crate::{
    config::TrainingConfig,
    run_log::{self, RunLog},
    schema::{
        champion::{ChampionFile, NetworkInfo},
        replay::ReplayFile,
    },
    util,
};

/// Generations between top-N listings.
const TOP_N_EVERY: u32 = 10;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Path to the YAML config file
    #[arg(long, default_value = "configs/wall.yaml")]
    config: PathBuf,
    /// Number of generations to run
    #[arg(long, default_value_t = 1000)]
    generations: u32,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config: config_path,
        generations,
    } = arg;

    let config = TrainingConfig::load(config_path)?;
    config.validate()?;
    let evaluator = config.evaluator()?;
    let mut trainer = Trainer::new(
        evaluator,
        config.evolver()?,
        config.evaluation_params(),
        config.seed,
    )?;
    info!(
        config = %config_path.display(),
        observation = %trainer.evaluator().observation(),
        fitness = %trainer.evaluator().fitness().mode(),
        genome_len = trainer.evaluator().genome_len(),
        population = config.ga.population,
        generations,
        "training started"
    );

    let logging = &config.logging;
    let mut run_log = logging
        .every_gen_summary
        .then(|| RunLog::create(&logging.csv_path, &logging.json_path));
    let started = Instant::now();

    for generation in 1..=*generations {
        let report = trainer.evaluate_generation()?;

        if let Some(run_log) = &mut run_log {
            run_log.record(&report.summary);
            println!("{}", run_log::summary_line(&report.summary));
        }
        if logging.topn_debug > 0 && generation % TOP_N_EVERY == 0 {
            println!("  Top {} agents:", logging.topn_debug);
            for (i, agent) in trainer
                .population()
                .agents()
                .iter()
                .take(logging.topn_debug)
                .enumerate()
            {
                println!("{}", run_log::agent_line(i + 1, agent));
            }
        }
        if let Some(benchmark) = &report.benchmark {
            println!("{}", run_log::benchmark_line(benchmark));
        }
        if is_due(generation, logging.save_champion_every) {
            let path = logging
                .artifacts_dir
                .join(format!("champion_gen{generation}.json"));
            save_champion(trainer.evaluator(), &report.best, generation, &path);
        }
        if is_due(generation, logging.replay_every) {
            let path = logging
                .artifacts_dir
                .join(format!("replay_gen{generation}.json"));
            save_replay(trainer.evaluator(), &report, &path);
        }

        trainer.evolve();
    }

    println!("---");
    println!(
        "Training complete! {generations} generations in {:.1?}",
        started.elapsed()
    );
    if let Some(best) = trainer.best_ever() {
        let (ticks, fruits) = best.stats().map_or((0, 0), |s| (s.ticks, s.fruits));
        println!(
            "Best ever: Fitness={:.1}, RobustScore={:.1}, Ticks={ticks}, Fruits={fruits}",
            best.fitness(),
            best.robustness().unwrap_or_default(),
        );
        let path = logging.artifacts_dir.join("champion_final.json");
        save_champion(trainer.evaluator(), best, *generations, &path);
    }

    Ok(())
}

const fn is_due(generation: u32, every: u32) -> bool {
    every > 0 && generation % every == 0
}

fn save_champion(evaluator: &Evaluator, agent: &Agent, generation: u32, path: &Path) {
    let topology = evaluator.topology();
    let file = ChampionFile {
        saved_at: Some(Utc::now()),
        network: Some(NetworkInfo {
            observation: evaluator.observation(),
            hidden1: topology.hidden1(),
            hidden2: topology.hidden2().unwrap_or(0),
        }),
        robustness: agent.robustness(),
        snapshot: ChampionSnapshot::from_agent(agent, generation),
    };
    write_artifact("champion", &file, path);
}

fn save_replay(evaluator: &Evaluator, report: &GenerationReport, path: &Path) {
    let replay = match evaluator.record_replay(report.best.genome(), report.seed) {
        Ok((replay, _)) => replay,
        Err(err) => {
            warn!("failed to record replay: {err}");
            return;
        }
    };
    let file = ReplayFile {
        recorded_at: Utc::now(),
        generation: report.summary.generation,
        replay,
    };
    write_artifact("replay", &file, path);
}

fn write_artifact<T>(kind: &str, value: &T, path: &Path)
where
    T: serde::Serialize,
{
    match util::write_json_file(path, value) {
        Ok(()) => info!(path = %path.display(), "saved {kind}"),
        Err(err) => warn!("failed to save {kind}: {err:#}"),
    }
}
