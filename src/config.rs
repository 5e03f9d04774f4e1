use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    crs::{Crs, CrsPolicy},
    pipeline::PipelineOptions,
    reference::Category,
};

/// Directory the reference shapefiles are read from unless configured otherwise.
pub const DEFAULT_DATASET_DIR: &str = "dataset";

/// Pipeline settings, loadable from a JSON file. Fields left out of the file keep their
/// default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Source shapefile per infrastructure category.
    pub references: BTreeMap<Category, PathBuf>,
    /// Projected CRS distances are measured in.
    pub working_epsg: u32,
    /// CRS the ranked sites are returned in.
    pub display_epsg: u32,
    /// CRS assumed for data without a `.prj`.
    pub default_epsg: u32,
    pub density_field: String,
    pub top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            references: Self::references_in(Path::new(DEFAULT_DATASET_DIR)),
            working_epsg: 32733,
            display_epsg: 4326,
            default_epsg: 4326,
            density_field: "dens_sqkm".to_string(),
            top_n: 5,
        }
    }
}

impl Config {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Default file name for every category under `dir`.
    pub fn references_in(dir: &Path) -> BTreeMap<Category, PathBuf> {
        Category::ALL.iter()
            .map(|category| (*category, dir.join(category.default_file())))
            .collect()
    }

    /// Point every category at its default file name under `dir`.
    pub fn with_reference_dir(mut self, dir: &Path) -> Self {
        self.references = Self::references_in(dir);
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<()> {
        self.options().map(|_| ())
    }

    /// Resolve EPSG codes and check the settings.
    pub fn options(&self) -> Result<PipelineOptions> {
        let working = Crs::from_epsg(self.working_epsg).context("working_epsg")?;
        let display = Crs::from_epsg(self.display_epsg).context("display_epsg")?;
        let default_crs = Crs::from_epsg(self.default_epsg).context("default_epsg")?;

        if working.is_geographic() {
            bail!("working CRS {working} is geographic; distances need a projected CRS");
        }
        ensure!(self.top_n > 0, "top_n must be at least 1");
        ensure!(!self.density_field.trim().is_empty(), "density_field must not be empty");
        for category in Category::ALL {
            ensure!(self.references.contains_key(&category), "no source file configured for {category}");
        }

        Ok(PipelineOptions {
            working,
            display,
            policy: CrsPolicy { default_crs },
            density_field: self.density_field.clone(),
            top_n: self.top_n,
        })
    }
}
