mod fs;
mod io;
mod shp;

pub(crate) use fs::*;
pub use io::{read_collection, write_csv, write_geojson};
pub(crate) use shp::read_shapefile;
