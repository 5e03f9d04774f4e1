use std::{collections::BTreeMap, path::PathBuf, time::Instant};

use anyhow::{anyhow, Context};
use log::{debug, info};

use crate::{
    common,
    crs::{normalize, Crs, CrsPolicy},
    pipeline::PipelineError,
    reference::{Category, ReferenceLayer},
};

/// The infrastructure layers, each normalised to the working CRS.
/// Built once and then only read, so one store can serve any number of runs.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    crs: Crs,
    layers: BTreeMap<Category, ReferenceLayer>,
}

impl ReferenceStore {
    /// Read every category's source file and reproject it to `working`.
    /// A missing or unreadable file is fatal for the whole store.
    pub fn load(
        sources: &BTreeMap<Category, PathBuf>,
        working: Crs,
        policy: &CrsPolicy,
    ) -> Result<Self, PipelineError> {
        let mut layers = BTreeMap::new();

        for category in Category::ALL {
            let reference_error = |source: anyhow::Error| PipelineError::Reference { category, source };

            let path = sources.get(&category)
                .ok_or_else(|| reference_error(anyhow!("no source file configured")))?;

            let start = Instant::now();
            let collection = common::read_shapefile(path).map_err(reference_error)?;
            let collection = normalize(collection, working, policy)
                .with_context(|| format!("Failed to reproject {}", path.display()))
                .map_err(reference_error)?;
            let layer = ReferenceLayer::new(category, collection).map_err(reference_error)?;

            info!("Loaded {category} reference layer: {} features from {}", layer.len(), path.display());
            debug!("{category} layer load took {:.2?}", start.elapsed());
            layers.insert(category, layer);
        }

        Ok(Self { crs: working, layers })
    }

    /// Assemble a store from prepared layers. Categories without a layer are simply not
    /// measured; a layer in a different CRS is rejected.
    pub fn from_layers(crs: Crs, layers: impl IntoIterator<Item = ReferenceLayer>) -> Result<Self, PipelineError> {
        let mut store = Self { crs, layers: BTreeMap::new() };
        for layer in layers {
            if layer.crs() != crs {
                return Err(PipelineError::Reference {
                    category: layer.category(),
                    source: anyhow!("layer is in {} but the store works in {crs}", layer.crs()),
                });
            }
            store.layers.insert(layer.category(), layer);
        }
        Ok(store)
    }

    /// Get the working CRS shared by all layers.
    #[inline] pub fn crs(&self) -> Crs { self.crs }

    /// Iterate layers in category order.
    pub fn layers(&self) -> impl Iterator<Item = &ReferenceLayer> {
        self.layers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::GeometryCollection;
    use geo::{point, Geometry};

    #[test]
    fn missing_source_is_fatal_for_that_category() {
        let dir = tempfile::tempdir().unwrap();
        let sources: BTreeMap<_, _> = Category::ALL.iter()
            .map(|category| (*category, dir.path().join(category.default_file())))
            .collect();

        let err = ReferenceStore::load(&sources, Crs::UTM_33S, &CrsPolicy::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Reference { category: Category::Health, .. }), "{err}");
    }

    #[test]
    fn unconfigured_category_is_fatal() {
        let err = ReferenceStore::load(&BTreeMap::new(), Crs::UTM_33S, &CrsPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("no source file configured"), "{err}");
    }

    #[test]
    fn from_layers_checks_crs() {
        let wgs84 = GeometryCollection::from_geometries(vec![Geometry::Point(point!(x: 13.2, y: -8.8))], Some(Crs::WGS84)).unwrap();
        let layer = ReferenceLayer::new(Category::Police, wgs84).unwrap();
        assert!(ReferenceStore::from_layers(Crs::UTM_33S, [layer]).is_err());

        let store = ReferenceStore::from_layers(
            Crs::UTM_33S,
            [ReferenceLayer::empty(Category::Roads, Crs::UTM_33S).unwrap()],
        ).unwrap();
        let categories = store.layers().map(|layer| layer.category()).collect::<Vec<_>>();
        assert_eq!(categories, vec![Category::Roads]);
    }
}
