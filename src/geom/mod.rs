mod bbox;
mod collection;
mod geojson;

pub(crate) use bbox::BoundingBox;
pub use collection::{GeometryCollection, FEATURE_ID};
