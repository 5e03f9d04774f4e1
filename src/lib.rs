#![doc = "Site suitability ranking: density plus proximity to health, police and road infrastructure"]
pub mod cli;
pub mod commands;

mod common;
mod config;
mod crs;
mod distance;
mod geom;
mod pipeline;
mod reference;
mod score;

#[doc(inline)]
pub use common::{read_collection, write_csv, write_geojson};

#[doc(inline)]
pub use config::Config;

#[doc(inline)]
pub use crs::{crs_from_shapefile, crs_from_wkt, normalize, reproject, Crs, CrsPolicy};

#[doc(inline)]
pub use distance::{compute_nearest, measure, Measurement, Undefined};

#[doc(inline)]
pub use geom::{GeometryCollection, FEATURE_ID};

#[doc(inline)]
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, Ranking, RANK};

#[doc(inline)]
pub use reference::{Category, ReferenceLayer, ReferenceStore};

#[doc(inline)]
pub use score::{score, DENSITY_SCORE, DENSITY_WEIGHT, EPSILON, HEALTH_WEIGHT, POLICE_WEIGHT, ROADS_WEIGHT, SCORE};
