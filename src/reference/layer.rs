use anyhow::{anyhow, Result};
use geo::{BoundingRect, Distance, Euclidean, Point};
use rstar::RTree;

use crate::{crs::Crs, geom::{BoundingBox, GeometryCollection}, reference::Category};

/// One infrastructure category's geometries in the working CRS, with an R-tree over
/// their bounding boxes for nearest-distance queries.
#[derive(Debug, Clone)]
pub struct ReferenceLayer {
    category: Category,
    crs: Crs,
    collection: GeometryCollection,
    rtree: RTree<BoundingBox>,
}

impl ReferenceLayer {
    /// Index a collection. The collection must carry its CRS.
    /// Geometries without extent (null shapes) are kept but never indexed.
    pub fn new(category: Category, collection: GeometryCollection) -> Result<Self> {
        let crs = collection.crs()
            .ok_or_else(|| anyhow!("{category} reference layer has no CRS"))?;

        let rtree = RTree::bulk_load(
            collection.geometries().iter().enumerate()
                .filter_map(|(i, geometry)| geometry.bounding_rect().map(|bbox| BoundingBox::new(i, bbox)))
                .collect()
        );

        Ok(Self { category, crs, collection, rtree })
    }

    /// A layer with no geometries.
    pub fn empty(category: Category, crs: Crs) -> Result<Self> {
        Self::new(category, GeometryCollection::from_geometries(Vec::new(), Some(crs))?)
    }

    #[inline] pub fn category(&self) -> Category { self.category }

    /// Get the CRS the layer is expressed in.
    #[inline] pub fn crs(&self) -> Crs { self.crs }

    /// Number of geometries as loaded, including null shapes.
    #[inline] pub fn len(&self) -> usize { self.collection.len() }

    /// True when no geometry can be measured against.
    #[inline] pub fn is_empty(&self) -> bool { self.rtree.size() == 0 }

    /// Minimum planar distance from `point` to any geometry in the layer.
    /// Visits candidates in order of bounding-box distance and stops once no box can be closer.
    pub fn nearest_distance(&self, point: &Point<f64>) -> Option<f64> {
        let mut best: Option<f64> = None;

        for (entry, bbox_distance_2) in self.rtree.nearest_neighbor_iter_with_distance_2(&[point.x(), point.y()]) {
            if let Some(best) = best {
                // Slack for rounding in the squared box distance.
                if bbox_distance_2 > best * best * (1.0 + 1e-12) { break; }
            }
            let distance = Euclidean.distance(point, &self.collection.geometries()[entry.idx()]);
            if distance.is_finite() && best.is_none_or(|best| distance < best) {
                best = Some(distance);
            }
        }

        best
    }

    /// Minimum distance by exhaustive scan; the reference for `nearest_distance`.
    pub fn nearest_distance_linear(&self, point: &Point<f64>) -> Option<f64> {
        self.collection.geometries().iter()
            .filter(|geometry| geometry.bounding_rect().is_some())
            .map(|geometry| Euclidean.distance(point, geometry))
            .filter(|distance| distance.is_finite())
            .reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, point, polygon, Geometry};

    fn layer(geometries: Vec<Geometry<f64>>) -> ReferenceLayer {
        ReferenceLayer::new(
            Category::Health,
            GeometryCollection::from_geometries(geometries, Some(Crs::UTM_33S)).unwrap(),
        ).unwrap()
    }

    #[test]
    fn nearest_point_line_and_polygon() {
        let layer = layer(vec![
            Geometry::Point(point!(x: 10.0, y: 0.0)),
            Geometry::LineString(line_string![(x: -5.0, y: 3.0), (x: 5.0, y: 3.0)]),
            Geometry::Polygon(polygon![(x: 20.0, y: 20.0), (x: 30.0, y: 20.0), (x: 30.0, y: 30.0), (x: 20.0, y: 30.0)]),
        ]);

        assert_eq!(layer.nearest_distance(&point!(x: 0.0, y: 0.0)), Some(3.0));
        assert_eq!(layer.nearest_distance(&point!(x: 10.0, y: 1.0)), Some(1.0));
        // Inside the polygon
        assert_eq!(layer.nearest_distance(&point!(x: 25.0, y: 25.0)), Some(0.0));
    }

    #[test]
    fn indexed_search_matches_linear_scan() {
        let geometries = (0..40)
            .map(|i| {
                let x = (i * 37 % 101) as f64 * 13.5;
                let y = (i * 59 % 97) as f64 * 7.25;
                if i % 3 == 0 {
                    Geometry::LineString(line_string![(x: x, y: y), (x: x + 40.0, y: y - 15.0)])
                } else {
                    Geometry::Point(point!(x: x, y: y))
                }
            })
            .collect();
        let layer = layer(geometries);

        for i in 0..50 {
            let query = point!(x: (i * 71 % 113) as f64 * 11.0 - 50.0, y: (i * 29 % 89) as f64 * 9.0 - 30.0);
            assert_eq!(layer.nearest_distance(&query), layer.nearest_distance_linear(&query), "query {query:?}");
        }
    }

    #[test]
    fn null_shapes_are_not_indexed() {
        let layer = layer(vec![GeometryCollection::empty_geometry()]);
        assert_eq!(layer.len(), 1);
        assert!(layer.is_empty());
        assert_eq!(layer.nearest_distance(&point!(x: 0.0, y: 0.0)), None);

        let empty = ReferenceLayer::empty(Category::Roads, Crs::UTM_33S).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.crs(), Crs::UTM_33S);
    }

    #[test]
    fn requires_a_crs() {
        let collection = GeometryCollection::from_geometries(vec![], None).unwrap();
        assert!(ReferenceLayer::new(Category::Police, collection).is_err());
    }
}
