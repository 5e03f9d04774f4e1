use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use sitescore::cli::{Cli, Commands};
use sitescore::commands::{inspect, rank};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match &cli.command {
        Commands::Rank(args) => rank::run(&cli, args),
        Commands::Inspect(args) => inspect::run(&cli, args),
    }
}
