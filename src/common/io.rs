use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{anyhow, Context, Result};
use log::debug;
use polars::{frame::DataFrame, io::SerWriter, prelude::CsvWriter};

use crate::{
    common::{extract_zip, find_file_with_extension, read_shapefile},
    geom::GeometryCollection,
    pipeline::PipelineError,
};

/// Read an input geometry collection from a `.zip` archive holding a shapefile or from a
/// bare `.shp` file. Any other file type is rejected.
pub fn read_collection(path: &Path) -> Result<GeometryCollection, PipelineError> {
    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("zip") => read_zipped_shapefile(path).map_err(PipelineError::Input),
        Some("shp") => read_shapefile(path).map_err(PipelineError::Input),
        _ => Err(PipelineError::Input(anyhow!(
            "only .zip or .shp shapefiles are supported: {}", path.display()
        ))),
    }
}

fn read_zipped_shapefile(path: &Path) -> Result<GeometryCollection> {
    let scratch = tempfile::tempdir().context("Failed to create a scratch directory")?;
    extract_zip(path, scratch.path())?;

    let shp = find_file_with_extension(scratch.path(), "shp")?
        .ok_or_else(|| anyhow!("no .shp file found in {}", path.display()))?;
    debug!("Reading {} from {}", shp.strip_prefix(scratch.path()).unwrap_or(shp.as_path()).display(), path.display());

    read_shapefile(&shp)
}

/// Write a collection as a GeoJSON FeatureCollection.
pub fn write_geojson(path: &Path, collection: &GeometryCollection) -> Result<()> {
    let geojson = collection.to_geojson()?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create GeoJSON file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &geojson)
        .with_context(|| format!("Failed to write GeoJSON to {}", path.display()))
}

/// Write a DataFrame to a CSV file.
pub fn write_csv(path: &Path, df: &DataFrame) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(BufWriter::new(file))
        .finish(&mut df.clone())
        .with_context(|| format!("Failed to write CSV to {}", path.display()))
}
