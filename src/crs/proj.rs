use anyhow::{anyhow, ensure, Context, Result};
use geo::{Coord, Geometry, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::crs::Crs;

/// A prepared transformation between two supported systems.
pub(crate) struct Transformer {
    from: Proj4,
    to: Proj4,
    from_geographic: bool,
    to_geographic: bool,
}

impl Transformer {
    pub(crate) fn new(source: Crs, target: Crs) -> Result<Self> {
        let from = {
            let proj_string = source.proj4();
            Proj4::from_proj_string(&proj_string)
                .with_context(|| anyhow!("failed to build source PROJ.4: {proj_string}"))?
        };

        let to = {
            let proj_string = target.proj4();
            Proj4::from_proj_string(&proj_string)
                .with_context(|| anyhow!("failed to build target PROJ.4: {proj_string}"))?
        };

        Ok(Self {
            from,
            to,
            from_geographic: source.is_geographic(),
            to_geographic: target.is_geographic(),
        })
    }

    /// Transform one coordinate. Degrees in/out for geographic systems, meters otherwise.
    pub(crate) fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = if self.from_geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(&self.from, &self.to, &mut point)
            .with_context(|| format!("CRS transform failed at ({}, {})", coord.x, coord.y))?;

        let (x, y) = if self.to_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };
        ensure!(x.is_finite() && y.is_finite(), "CRS transform of ({}, {}) is not finite", coord.x, coord.y);

        Ok(Coord { x, y })
    }

    /// Transform every coordinate of a geometry, failing on the first bad coordinate.
    pub(crate) fn geometry(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
        geometry.try_map_coords(|coord| self.coord(coord))
    }
}
