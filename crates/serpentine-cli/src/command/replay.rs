use std::{path::PathBuf, thread, time::Duration};

use tracing::warn;

use crate::{
    render::{self, render_frame},
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Path to a replay JSON file written during training
    replay: PathBuf,
    /// Delay between frames in milliseconds
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
    /// Re-simulate without drawing frames
    #[arg(long)]
    no_display: bool,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let ReplayArg {
        replay: replay_path,
        delay_ms,
        no_display,
    } = arg;

    let file = util::read_replay_file(replay_path)?;
    let replay = &file.replay;
    println!(
        "Replay from gen {} (seed={}, {} actions, recorded {})",
        file.generation,
        replay.seed,
        replay.actions.len(),
        file.recorded_at.format("%Y-%m-%d %H:%M:%S"),
    );
    println!();

    let delay = Duration::from_millis(*delay_ms);
    let mut playback = replay.playback();
    while !playback.is_finished() {
        if !*no_display {
            let upcoming = replay.actions.get(playback.position()).copied();
            render::draw(&render_frame(playback.simulation(), upcoming))?;
            thread::sleep(delay);
        }
        playback.step();
    }
    if !*no_display {
        render::draw(&render_frame(playback.simulation(), None))?;
    }

    let stats = playback.simulation().stats(replay.seed);
    println!();
    println!("═══════════════════════════════════");
    println!("  Death: {}", stats.death);
    println!("  Ticks: {}, Fruits: {}", stats.ticks, stats.fruits);
    println!("  Progress Sum: {:.2}", stats.progress_sum);
    println!("═══════════════════════════════════");

    if stats == replay.final_stats {
        println!("  Replay matches the recorded outcome");
    } else {
        warn!(
            recorded_ticks = replay.final_stats.ticks,
            recorded_fruits = replay.final_stats.fruits,
            recorded_death = %replay.final_stats.death,
            "replay diverged from the recorded outcome"
        );
    }

    Ok(())
}
