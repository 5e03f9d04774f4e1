use anyhow::{bail, Result};
use log::info;
use std::path::Path;

use crate::cli::{Cli, RankArgs};
use crate::common::{ensure_parent_dir, read_collection, require_writable, write_csv, write_geojson};
use crate::config::Config;
use crate::pipeline::{Pipeline, PipelineError};

pub fn run(_cli: &Cli, args: &RankArgs) -> Result<()> {
    // Assert output paths are not stdout
    if args.output == Path::new("-") || args.csv.as_deref() == Some(Path::new("-")) {
        bail!("stdout is not supported.");
    }
    require_writable(&args.output, args.force)?;
    if let Some(csv) = &args.csv {
        require_writable(csv, args.force)?;
    }

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &args.reference_dir {
        config = config.with_reference_dir(dir);
    }
    if let Some(top) = args.top {
        config = config.with_top_n(top);
    }

    info!("[rank] input={} -> {}", args.input.display(), args.output.display());

    let pipeline = Pipeline::new(&config)?;
    let collection = read_collection(&args.input)?;
    let ranking = pipeline.run(collection)?;

    ensure_parent_dir(&args.output)?;
    write_geojson(&args.output, ranking.sites()).map_err(PipelineError::Output)?;

    if let Some(csv) = &args.csv {
        ensure_parent_dir(csv)?;
        write_csv(csv, ranking.table()).map_err(PipelineError::Output)?;
        info!("Wrote {} scored candidates -> {}", ranking.candidates(), csv.display());
    }

    println!(
        "Wrote top {} of {} sites -> {}",
        ranking.sites().len(),
        ranking.candidates(),
        args.output.display()
    );
    Ok(())
}
