use std::{path::PathBuf, thread, time::Duration};

use anyhow::Context as _;
use serpentine_engine::Simulation;
use serpentine_evaluator::observation::FeatureExtractor;
use tracing::warn;

use crate::{
    config::TrainingConfig,
    render::{self, render_frame},
    schema::champion::NetworkInfo,
    util,
};

/// Tick cap and stall window used when the limits are lifted.
const UNLIMITED: u32 = 999_999;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Path to the YAML config the champion was trained with
    #[arg(long, default_value = "configs/wall.yaml")]
    config: PathBuf,
    /// Path to the champion JSON file
    #[arg(long, default_value = "artifacts/champion_final.json")]
    champion: PathBuf,
    /// Episode seed
    #[arg(long, default_value_t = 12345)]
    seed: u32,
    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
    /// Play without drawing frames
    #[arg(long)]
    no_display: bool,
    /// Disable the tick cap
    #[arg(long)]
    no_timeout: bool,
    /// Disable stall detection
    #[arg(long)]
    no_stall: bool,
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    let PlayArg {
        config: config_path,
        champion: champion_path,
        seed,
        delay_ms,
        no_display,
        no_timeout,
        no_stall,
    } = arg;

    let config = TrainingConfig::load(config_path)?;
    let mut env = config.env_config()?;
    if *no_timeout {
        env = env.with_tick_cap(UNLIMITED)?;
    }
    if *no_stall {
        env = env.with_stall_window(UNLIMITED)?;
    }
    let evaluator = config.evaluator()?.with_env(env);

    let champion = util::read_champion_file(champion_path)?;
    let expected = NetworkInfo {
        observation: evaluator.observation(),
        hidden1: evaluator.topology().hidden1(),
        hidden2: evaluator.topology().hidden2().unwrap_or(0),
    };
    if let Some(saved) = champion.network.filter(|saved| *saved != expected) {
        warn!(
            ?saved,
            ?expected,
            "champion was trained with a different network layout"
        );
    }
    let snapshot = &champion.snapshot;
    let mut network = snapshot
        .network(evaluator.topology().clone())
        .with_context(|| {
            format!(
                "Champion does not fit the network of {}",
                config_path.display()
            )
        })?;
    let mut extractor = FeatureExtractor::new(evaluator.observation());

    println!(
        "Loaded champion from gen {} (fitness={:.1}, ticks={}, fruits={})",
        snapshot.generation, snapshot.fitness, snapshot.ticks, snapshot.fruits
    );
    println!("Config: {}, Seed: {seed}", config_path.display());
    println!("Press Ctrl+C to exit");
    println!();

    let delay = Duration::from_millis(*delay_ms);
    let mut sim = Simulation::new(evaluator.env(), *seed);
    while sim.is_alive() {
        let action = network.forward(extractor.extract(&sim));
        if !*no_display {
            render::draw(&render_frame(&sim, Some(action)))?;
            thread::sleep(delay);
        }
        sim.step(action);
    }
    if !*no_display {
        render::draw(&render_frame(&sim, None))?;
    }

    let stats = sim.stats(*seed);
    println!();
    println!("═══════════════════════════════════");
    println!("  Game Over! Death: {}", stats.death);
    println!("  Ticks: {}, Fruits: {}", stats.ticks, stats.fruits);
    println!("  Progress Sum: {:.2}", stats.progress_sum);
    println!("  Fitness: {:.1}", evaluator.fitness().score(&stats));
    println!("═══════════════════════════════════");

    Ok(())
}
