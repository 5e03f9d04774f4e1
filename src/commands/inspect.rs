use std::collections::BTreeMap;

use anyhow::Result;
use geo::Geometry;

use crate::cli::{Cli, InspectArgs};
use crate::common::read_collection;
use crate::geom::GeometryCollection;

pub fn run(_cli: &Cli, args: &InspectArgs) -> Result<()> {
    let collection = read_collection(&args.input)?;
    print!("{}", summary(&collection));
    Ok(())
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) | Geometry::MultiPoint(_) => "Point",
        Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => "Line",
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::GeometryCollection(gc) if gc.0.is_empty() => "Empty",
        Geometry::GeometryCollection(_) => "Other",
    }
}

fn summary(collection: &GeometryCollection) -> String {
    let mut out = format!("Number of records: {}\n", collection.len());

    out += &match collection.crs() {
        Some(crs) => format!("CRS: {crs}\n"),
        None => "CRS: undefined\n".to_string(),
    };

    if let Some(bounds) = collection.bounds() {
        out += &format!(
            "Bounds: ({}, {}) - ({}, {})\n",
            bounds.min().x, bounds.min().y, bounds.max().x, bounds.max().y
        );
    }

    // Geometry-type breakdown
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for geometry in collection.geometries() {
        *counts.entry(geometry_kind(geometry)).or_default() += 1;
    }
    out += "Geometry mix:\n";
    for (kind, count) in counts {
        out += &format!("  - {kind}: {count}\n");
    }

    out += "Attribute columns:\n";
    for column in collection.attributes().get_columns() {
        out += &format!("  - {} ({})\n", column.name(), column.dtype());
    }
    out
}
