use clap::{Parser, Subcommand};

use self::{play::PlayArg, replay::ReplayArg, train::TrainArg};

mod play;
mod replay;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve snake policies with a genetic algorithm
    Train(#[clap(flatten)] TrainArg),
    /// Watch a saved champion play one episode
    Play(#[clap(flatten)] PlayArg),
    /// Re-simulate a recorded episode
    Replay(#[clap(flatten)] ReplayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
    }
    Ok(())
}
