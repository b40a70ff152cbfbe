use tracing_subscriber::EnvFilter;

mod command;
mod config;
mod render;
mod run_log;
mod schema;
mod util;

fn main() -> anyhow::Result<()> {
    init_tracing();
    command::run()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
