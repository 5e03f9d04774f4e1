use anyhow::{ensure, Context, Result};
use geo::{BoundingRect, Coord, Geometry, GeometryCollection as GeoCollection, Rect};
use polars::prelude::*;

use crate::crs::Crs;

/// Name of the row-index column added to every attribute table.
pub const FEATURE_ID: &str = "fid";

/// An ordered set of planar geometries with one attribute row per geometry.
/// All geometries share one coordinate reference system, which may be unknown.
#[derive(Debug, Clone)]
pub struct GeometryCollection {
    geometries: Vec<Geometry<f64>>,
    attributes: DataFrame,
    crs: Option<Crs>,
}

impl GeometryCollection {
    /// Construct a collection from geometries and their attribute table.
    /// A `fid` column holding the input position is added unless already present.
    pub fn new(geometries: Vec<Geometry<f64>>, attributes: DataFrame, crs: Option<Crs>) -> Result<Self> {
        let attributes = if attributes.width() == 0 {
            DataFrame::new(vec![Column::new(
                FEATURE_ID.into(),
                (0..geometries.len() as IdxSize).collect::<Vec<_>>(),
            )])?
        } else if attributes.column(FEATURE_ID).is_err() {
            attributes.with_row_index(FEATURE_ID.into(), None)?
        } else {
            attributes
        };

        ensure!(
            attributes.height() == geometries.len(),
            "attribute table has {} rows but there are {} geometries",
            attributes.height(),
            geometries.len()
        );

        Ok(Self { geometries, attributes, crs })
    }

    /// Construct a collection of geometries with no attributes beyond `fid`.
    pub fn from_geometries(geometries: Vec<Geometry<f64>>, crs: Option<Crs>) -> Result<Self> {
        Self::new(geometries, DataFrame::empty(), crs)
    }

    /// An empty geometry, used in place of shapes that could not be read or reprojected.
    #[inline]
    pub fn empty_geometry() -> Geometry<f64> {
        Geometry::GeometryCollection(GeoCollection(Vec::new()))
    }

    /// Get the number of geometries.
    #[inline] pub fn len(&self) -> usize { self.geometries.len() }

    /// Check if there are no geometries.
    #[inline] pub fn is_empty(&self) -> bool { self.geometries.is_empty() }

    /// Get a reference to the list of geometries.
    #[inline] pub fn geometries(&self) -> &[Geometry<f64>] { &self.geometries }

    /// Get a reference to the attribute table.
    #[inline] pub fn attributes(&self) -> &DataFrame { &self.attributes }

    /// Get the coordinate reference system, if known.
    #[inline] pub fn crs(&self) -> Option<Crs> { self.crs }

    /// Label the collection with a CRS without touching coordinates.
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Swap in transformed geometries, keeping order and attributes.
    pub(crate) fn replace_geometries(mut self, geometries: Vec<Geometry<f64>>, crs: Crs) -> Result<Self> {
        ensure!(
            geometries.len() == self.geometries.len(),
            "replacement has {} geometries, expected {}",
            geometries.len(),
            self.geometries.len()
        );
        self.geometries = geometries;
        self.crs = Some(crs);
        Ok(self)
    }

    /// Check whether at least one geometry has a spatial extent.
    pub fn has_measurable_geometry(&self) -> bool {
        self.geometries.iter().any(|geometry| geometry.bounding_rect().is_some())
    }

    /// Compute the bounding rectangle of all geometries.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometries.iter()
            .filter_map(|geometry| geometry.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }

    /// Check whether the attribute table has a column with this name.
    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.attributes.column(name).is_ok()
    }

    /// Read a column as nullable floats. Values that are not numeric become null.
    /// Returns `None` if the column does not exist.
    pub fn f64_column(&self, name: &str) -> Result<Option<Vec<Option<f64>>>> {
        let Ok(column) = self.attributes.column(name) else { return Ok(None) };
        let column = column.cast(&DataType::Float64)
            .with_context(|| format!("column {name} cannot be read as numbers"))?;
        let values = column.f64()?.into_iter().collect();
        Ok(Some(values))
    }

    /// Add or replace a nullable float column.
    pub fn set_f64_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        self.set_column(Column::new(name.into(), values))
    }

    /// Add or replace an attribute column of any type.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        ensure!(
            column.len() == self.len(),
            "column {} has {} values, expected {}",
            column.name(),
            column.len(),
            self.len()
        );
        self.attributes.with_column(column)?;
        Ok(())
    }

    /// Select rows (geometry and attributes together) in the given order.
    pub fn take(&self, indices: &[usize]) -> Result<Self> {
        let geometries = indices.iter()
            .map(|&i| self.geometries.get(i).cloned()
                .with_context(|| format!("row {i} out of bounds for {} geometries", self.len())))
            .collect::<Result<Vec<_>>>()?;

        let idx = IdxCa::from_vec("idx".into(), indices.iter().map(|&i| i as IdxSize).collect());
        let attributes = self.attributes.take(&idx)?;

        Ok(Self { geometries, attributes, crs: self.crs })
    }

    /// Keep the first `n` rows.
    pub fn head(&self, n: usize) -> Result<Self> {
        self.take(&(0..n.min(self.len())).collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};
    use polars::df;

    fn square(x: f64, y: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x - 1.0, y: y - 1.0),
            (x: x + 1.0, y: y - 1.0),
            (x: x + 1.0, y: y + 1.0),
            (x: x - 1.0, y: y + 1.0)
        ])
    }

    fn sample() -> GeometryCollection {
        let attributes = df!("name" => ["a", "b", "c"], "dens" => ["10", "x", "2.5"]).unwrap();
        GeometryCollection::new(
            vec![square(0.0, 0.0), Geometry::Point(point!(x: 5.0, y: 5.0)), square(10.0, 0.0)],
            attributes,
            None,
        ).unwrap()
    }

    #[test]
    fn adds_feature_ids_in_input_order() {
        let collection = sample();
        let fid = collection.attributes().column(FEATURE_ID).unwrap()
            .cast(&DataType::Float64).unwrap();
        let fid: Vec<_> = fid.f64().unwrap().into_iter().collect();
        assert_eq!(fid, vec![Some(0.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn rejects_mismatched_attribute_rows() {
        let attributes = df!("name" => ["a", "b"]).unwrap();
        assert!(GeometryCollection::new(vec![square(0.0, 0.0)], attributes, None).is_err());
    }

    #[test]
    fn coerces_non_numeric_values_to_null() {
        let collection = sample();
        let dens = collection.f64_column("dens").unwrap().unwrap();
        assert_eq!(dens, vec![Some(10.0), None, Some(2.5)]);
        assert!(collection.f64_column("missing").unwrap().is_none());
    }

    #[test]
    fn take_reorders_geometries_and_rows_together() {
        let mut collection = sample();
        collection.set_f64_column("score", vec![Some(0.1), Some(0.9), None]).unwrap();

        let taken = collection.take(&[1, 0]).unwrap();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken.geometries()[0], Geometry::Point(point!(x: 5.0, y: 5.0)));
        assert_eq!(taken.f64_column("score").unwrap().unwrap(), vec![Some(0.9), Some(0.1)]);
        assert!(collection.take(&[3]).is_err());
    }

    #[test]
    fn bounds_skip_empty_geometries() {
        let mut geometries = sample().geometries().to_vec();
        geometries.push(GeometryCollection::empty_geometry());
        let collection = GeometryCollection::from_geometries(geometries, None).unwrap();

        let bounds = collection.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: -1.0, y: -1.0 });
        assert_eq!(bounds.max(), Coord { x: 11.0, y: 5.0 });
        assert!(collection.has_measurable_geometry());
    }

    #[test]
    fn head_clamps_to_length() {
        assert_eq!(sample().head(2).unwrap().len(), 2);
        assert_eq!(sample().head(10).unwrap().len(), 3);
    }
}
