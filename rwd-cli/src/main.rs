//! RWD CLI - data quality and statistics for reservoir weather observations.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "rwd-cli",
    version,
    about = "Reservoir weather data quality and analysis toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: rwd_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("rwd-cli {}", env!("CARGO_PKG_VERSION"));
    rwd_cmd::run(cli.command)
}
