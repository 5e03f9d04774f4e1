use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::{crs::{proj::Transformer, Crs}, geom::GeometryCollection};

/// Policy for collections that arrive without a CRS label.
/// Unlabeled data is assumed to be in `default_crs`; nothing is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrsPolicy {
    pub default_crs: Crs,
}

impl Default for CrsPolicy {
    fn default() -> Self {
        Self { default_crs: Crs::WGS84 }
    }
}

impl CrsPolicy {
    /// The CRS a collection is taken to be in.
    #[inline]
    pub fn resolve(&self, crs: Option<Crs>) -> Crs {
        crs.unwrap_or(self.default_crs)
    }
}

fn source_crs(collection: &GeometryCollection, policy: &CrsPolicy) -> Crs {
    collection.crs().unwrap_or_else(|| {
        info!("CRS undefined, assuming {}", policy.default_crs);
        policy.default_crs
    })
}

/// Express a collection in `target`, preserving geometry order and attributes.
/// A geometry whose coordinates cannot be transformed is replaced by an empty geometry.
pub fn normalize(collection: GeometryCollection, target: Crs, policy: &CrsPolicy) -> Result<GeometryCollection> {
    let source = source_crs(&collection, policy);
    if source == target {
        return Ok(collection.with_crs(target));
    }

    let transformer = Transformer::new(source, target)?;
    let geometries = collection.geometries().iter().enumerate()
        .map(|(idx, geometry)| transformer.geometry(geometry).unwrap_or_else(|err| {
            warn!("geometry {idx}: reprojection {source} -> {target} failed: {err:#}");
            GeometryCollection::empty_geometry()
        }))
        .collect();

    info!("Reprojected {} geometries from {source} to {target}", collection.len());
    collection.replace_geometries(geometries, target)
}

/// Like [`normalize`], but the first geometry that cannot be transformed fails the whole
/// collection. Empty geometries pass through unchanged.
pub fn reproject(collection: GeometryCollection, target: Crs, policy: &CrsPolicy) -> Result<GeometryCollection> {
    let source = source_crs(&collection, policy);
    if source == target {
        return Ok(collection.with_crs(target));
    }

    let transformer = Transformer::new(source, target)?;
    let geometries = collection.geometries().iter().enumerate()
        .map(|(idx, geometry)| transformer.geometry(geometry)
            .with_context(|| format!("geometry {idx} cannot be expressed in {target}")))
        .collect::<Result<Vec<_>>>()?;

    debug!("Reprojected {} geometries from {source} to {target}", collection.len());
    collection.replace_geometries(geometries, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, Centroid, Geometry};
    use polars::df;

    fn towns(crs: Option<Crs>) -> GeometryCollection {
        GeometryCollection::new(
            vec![
                Geometry::Point(point!(x: 13.234, y: -8.838)),
                Geometry::Point(point!(x: 15.0, y: -12.5)),
            ],
            df!("name" => ["Luanda", "Huambo"]).unwrap(),
            crs,
        ).unwrap()
    }

    #[test]
    fn undefined_crs_is_assumed_to_be_the_policy_default() {
        let assumed = normalize(towns(None), Crs::UTM_33S, &CrsPolicy::default()).unwrap();
        let labelled = normalize(towns(Some(Crs::WGS84)), Crs::UTM_33S, &CrsPolicy::default()).unwrap();
        assert_eq!(assumed.crs(), Some(Crs::UTM_33S));
        assert_eq!(assumed.geometries(), labelled.geometries());
    }

    #[test]
    fn preserves_order_and_attributes() {
        let projected = normalize(towns(Some(Crs::WGS84)), Crs::UTM_33S, &CrsPolicy::default()).unwrap();
        assert!(projected.attributes().equals(towns(None).attributes()));

        // Huambo sits on the zone's central meridian.
        let huambo = projected.geometries()[1].centroid().unwrap();
        assert!((huambo.x() - 500_000.0).abs() < 1e-3);
        let luanda = projected.geometries()[0].centroid().unwrap();
        assert!(luanda.x() < huambo.x() && luanda.y() > huambo.y());
    }

    #[test]
    fn same_crs_is_a_no_op() {
        let original = towns(Some(Crs::UTM_33S));
        let normalized = normalize(original.clone(), Crs::UTM_33S, &CrsPolicy::default()).unwrap();
        assert_eq!(normalized.geometries(), original.geometries());
    }

    #[test]
    fn policy_default_is_configurable() {
        let policy = CrsPolicy { default_crs: Crs::UTM_33S };
        let normalized = normalize(towns(None), Crs::UTM_33S, &policy).unwrap();
        assert_eq!(normalized.geometries(), towns(None).geometries());
    }

    fn out_of_range() -> GeometryCollection {
        GeometryCollection::new(
            vec![
                Geometry::Point(point!(x: 15.0, y: -9.0)),
                Geometry::Point(point!(x: 15.0, y: 95.0)),
                Geometry::Point(point!(x: f64::INFINITY, y: 0.0)),
                Geometry::Point(point!(x: 15.0, y: -12.5)),
            ],
            df!("name" => ["ok", "north of the pole", "infinite", "Huambo"]).unwrap(),
            Some(Crs::WGS84),
        ).unwrap()
    }

    #[test]
    fn untransformable_geometries_become_empty() {
        let projected = normalize(out_of_range(), Crs::UTM_33S, &CrsPolicy::default()).unwrap();
        assert_eq!(projected.len(), 4);
        assert!(projected.attributes().equals(out_of_range().attributes()));

        assert_eq!(projected.geometries()[1], GeometryCollection::empty_geometry());
        assert_eq!(projected.geometries()[2], GeometryCollection::empty_geometry());

        // Neighbours are still transformed.
        for idx in [0, 3] {
            let Geometry::Point(p) = &projected.geometries()[idx] else { panic!("expected a point") };
            assert!((p.x() - 500_000.0).abs() < 1e-3, "{p:?}");
            assert!(p.y() > 8_000_000.0 && p.y() < 10_000_000.0, "{p:?}");
        }
    }

    #[test]
    fn strict_reprojection_fails_on_the_first_bad_geometry() {
        let err = reproject(out_of_range(), Crs::UTM_33S, &CrsPolicy::default()).unwrap_err();
        assert!(format!("{err:#}").contains("geometry 1"), "{err:#}");

        let hollow = GeometryCollection::new(
            vec![Geometry::Point(point!(x: 15.0, y: -9.0)), GeometryCollection::empty_geometry()],
            df!("name" => ["ok", "empty"]).unwrap(),
            None,
        ).unwrap();
        let projected = reproject(hollow, Crs::UTM_33S, &CrsPolicy::default()).unwrap();
        assert_eq!(projected.crs(), Some(Crs::UTM_33S));
        assert_eq!(projected.geometries()[1], GeometryCollection::empty_geometry());
    }
}
