use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Rank candidate sites by density and proximity to infrastructure
#[derive(Parser, Debug)]
#[command(name = "sitescore", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score sites and write the top-ranked ones as GeoJSON
    Rank(RankArgs),

    /// Summarise a shapefile: feature count, CRS, geometry mix, attributes
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct RankArgs {
    /// Candidate sites (.zip containing a shapefile, or .shp)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// JSON configuration file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory holding the reference shapefiles under their default names
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub reference_dir: Option<PathBuf>,

    /// Number of sites to return
    #[arg(short = 'n', long)]
    pub top: Option<usize>,

    /// Output GeoJSON file ("-" is rejected)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Also write every scored candidate to this CSV file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub csv: Option<PathBuf>,

    /// Overwrite output files if they exist
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Shapefile to summarise (.zip or .shp)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,
}
