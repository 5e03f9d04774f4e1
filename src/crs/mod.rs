mod crs;
mod normalize;
mod prj;
mod proj;

pub use crs::Crs;
pub use normalize::{normalize, reproject, CrsPolicy};
pub use prj::{crs_from_shapefile, crs_from_wkt};
