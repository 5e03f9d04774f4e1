use geo::Rect;
use rstar::{PointDistance, RTreeObject, AABB};

/// A bounding box in an R-tree, associated with a reference geometry by index.
#[derive(Debug, Clone)]
pub(crate) struct BoundingBox {
    idx: usize, // Index of corresponding geometry in the layer
    bbox: Rect<f64>,
}

impl BoundingBox {
    pub(crate) fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, bbox }
    }

    /// Get the index of the corresponding geometry.
    pub(crate) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Squared distance from a point to the box, a lower bound for the distance to the
/// geometry it encloses.
impl PointDistance for BoundingBox {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope().distance_2(point)
    }
}
