use std::time::Instant;

use anyhow::anyhow;
use log::{debug, info};
use polars::prelude::{Column, DataFrame};

use crate::{
    config::Config,
    crs::{normalize, reproject, Crs, CrsPolicy},
    distance::compute_nearest,
    geom::GeometryCollection,
    pipeline::PipelineError,
    reference::ReferenceStore,
    score::score,
};

/// Name of the 1-based rank column added to ranked output.
pub const RANK: &str = "rank";

/// Validated settings for a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Projected CRS all distances are measured in.
    pub working: Crs,
    /// CRS the ranked selection is returned in.
    pub display: Crs,
    pub policy: CrsPolicy,
    /// Attribute holding population density.
    pub density_field: String,
    /// Number of sites to return.
    pub top_n: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            working: Crs::UTM_33S,
            display: Crs::WGS84,
            policy: CrsPolicy::default(),
            density_field: "dens_sqkm".to_string(),
            top_n: 5,
        }
    }
}

/// Output of one run: the best sites plus the full scored table.
#[derive(Debug, Clone)]
pub struct Ranking {
    sites: GeometryCollection,
    table: DataFrame,
    candidates: usize,
}

impl Ranking {
    /// The top-N sites, best first, in the display CRS.
    #[inline] pub fn sites(&self) -> &GeometryCollection { &self.sites }

    /// Attributes and scores of every candidate, best first.
    #[inline] pub fn table(&self) -> &DataFrame { &self.table }

    /// Number of geometries that were scored.
    #[inline] pub fn candidates(&self) -> usize { self.candidates }
}

/// Sequences CRS normalisation, distance measurement, scoring and selection.
/// Reference layers are loaded once at construction and shared read-only by every run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
    store: ReferenceStore,
}

impl Pipeline {
    /// Validate `config` and load its reference layers.
    pub fn new(config: &Config) -> Result<Self, PipelineError> {
        let options = config.options().map_err(PipelineError::Config)?;

        let start = Instant::now();
        info!("Loading reference layers in {}", options.working);
        let store = ReferenceStore::load(&config.references, options.working, &options.policy)?;
        debug!("Reference layers ready in {:.2?}", start.elapsed());

        Ok(Self { options, store })
    }

    /// Use an already loaded store. It must be in the working CRS.
    pub fn with_store(options: PipelineOptions, store: ReferenceStore) -> Result<Self, PipelineError> {
        if options.working.is_geographic() {
            return Err(PipelineError::Config(anyhow!("working CRS {} is not projected", options.working)));
        }
        if store.crs() != options.working {
            return Err(PipelineError::Config(anyhow!(
                "reference layers are in {} but the working CRS is {}", store.crs(), options.working
            )));
        }
        Ok(Self { options, store })
    }

    /// Score a collection and return the configured number of top sites.
    pub fn run(&self, collection: GeometryCollection) -> Result<Ranking, PipelineError> {
        self.run_top(collection, self.options.top_n)
    }

    /// Score a collection and return the best `n` sites.
    pub fn run_top(&self, collection: GeometryCollection, n: usize) -> Result<Ranking, PipelineError> {
        let PipelineOptions { working, display, policy, density_field, .. } = &self.options;

        if n == 0 {
            return Err(PipelineError::Config(anyhow!("number of sites to return must be at least 1")));
        }
        if collection.is_empty() {
            return Err(PipelineError::Input(anyhow!("no geometries to score")));
        }
        if !collection.has_measurable_geometry() {
            return Err(PipelineError::Input(anyhow!("none of the {} geometries has a spatial extent", collection.len())));
        }

        let start = Instant::now();
        info!("Scoring {} candidate sites", collection.len());

        let collection = normalize(collection, *working, policy).map_err(PipelineError::Projection)?;
        if !collection.has_measurable_geometry() {
            return Err(PipelineError::Projection(anyhow!("no geometry could be expressed in {working}")));
        }

        let measured = compute_nearest(collection, &self.store).map_err(PipelineError::Scoring)?;
        let mut scored = score(measured, density_field).map_err(PipelineError::Scoring)?;

        let candidates = scored.len();
        let ranks = (1..=candidates as u32).collect::<Vec<_>>();
        scored.set_column(Column::new(RANK.into(), ranks)).map_err(PipelineError::Scoring)?;

        let top = scored.head(n).map_err(PipelineError::Scoring)?;
        // Every measured site in the selection must survive the display reprojection.
        let sites = reproject(top, *display, policy).map_err(PipelineError::Projection)?;
        debug!("Pipeline run took {:.2?}", start.elapsed());
        info!("Selected {} of {candidates} sites", sites.len());

        Ok(Ranking { sites, table: scored.attributes().clone(), candidates })
    }
}
