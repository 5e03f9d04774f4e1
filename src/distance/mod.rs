//! Nearest-distance measurement from each geometry's centroid to each reference layer.

use std::{fmt, time::Instant};

use anyhow::{ensure, Result};
use geo::{Centroid, Geometry};
use log::{debug, warn};
use rayon::prelude::*;

use crate::{
    geom::GeometryCollection,
    reference::{ReferenceLayer, ReferenceStore},
};

/// Why a distance cell has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undefined {
    /// The reference layer has nothing to measure against.
    EmptyLayer,
    /// The input geometry is empty, so it has no centroid.
    NoCentroid,
    /// The computation produced NaN or infinity.
    NonFinite,
}

impl fmt::Display for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Undefined::EmptyLayer => "reference layer is empty",
            Undefined::NoCentroid => "geometry has no centroid",
            Undefined::NonFinite => "distance is not finite",
        })
    }
}

/// Result of measuring one geometry against one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    Meters(f64),
    Undefined(Undefined),
}

impl Measurement {
    /// The distance, if defined.
    #[inline]
    pub fn value(self) -> Option<f64> {
        match self {
            Measurement::Meters(d) => Some(d),
            Measurement::Undefined(_) => None,
        }
    }
}

/// Distance from the centroid of `geometry` to the nearest geometry in `layer`.
pub fn measure(geometry: &Geometry<f64>, layer: &ReferenceLayer) -> Measurement {
    if layer.is_empty() { return Measurement::Undefined(Undefined::EmptyLayer) }

    let Some(centroid) = geometry.centroid() else {
        return Measurement::Undefined(Undefined::NoCentroid)
    };
    if !(centroid.x().is_finite() && centroid.y().is_finite()) {
        return Measurement::Undefined(Undefined::NonFinite)
    }

    match layer.nearest_distance(&centroid) {
        Some(distance) if distance.is_finite() => Measurement::Meters(distance),
        _ => Measurement::Undefined(Undefined::NonFinite),
    }
}

/// Measure every geometry of the collection against one layer, in input order.
pub fn nearest_column(collection: &GeometryCollection, layer: &ReferenceLayer) -> Vec<Measurement> {
    if layer.is_empty() {
        return vec![Measurement::Undefined(Undefined::EmptyLayer); collection.len()]
    }
    collection.geometries().par_iter()
        .map(|geometry| measure(geometry, layer))
        .collect()
}

/// Append one `dist_<category>` column per layer in the store. Cells that cannot be
/// measured are left null; an empty layer nulls its whole column.
pub fn compute_nearest(mut collection: GeometryCollection, references: &ReferenceStore) -> Result<GeometryCollection> {
    ensure!(
        collection.crs() == Some(references.crs()),
        "collection is in {} but reference layers are in {}",
        collection.crs().map_or_else(|| "an undefined CRS".to_string(), |crs| crs.to_string()),
        references.crs()
    );

    for layer in references.layers() {
        let category = layer.category();
        let start = Instant::now();

        let measurements = nearest_column(&collection, layer);

        if layer.is_empty() {
            warn!("{category} reference layer is empty; {} is undefined for every geometry", category.distance_column());
        } else {
            for (i, measurement) in measurements.iter().enumerate() {
                if let Measurement::Undefined(reason) = measurement {
                    warn!("{category} distance undefined for feature {i}: {reason}");
                }
            }
        }

        let values = measurements.into_iter().map(Measurement::value).collect();
        collection.set_f64_column(&category.distance_column(), values)?;
        debug!("{category}: measured {} geometries against {} features in {:.2?}", collection.len(), layer.len(), start.elapsed());
    }

    Ok(collection)
}
