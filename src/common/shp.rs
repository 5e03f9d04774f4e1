use std::{collections::BTreeSet, path::Path};

use anyhow::{Context, Result};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use log::warn;
use polars::prelude::*;
use shapefile::{
    dbase::{FieldValue, Record},
    PolygonRing, Reader, Shape,
};

use crate::{crs::crs_from_shapefile, geom::GeometryCollection};

/// Reads all shapes and attribute records from a `.shp` file, labelled with the CRS of its
/// `.prj` sidecar (if any). Shapes that cannot be represented become empty geometries.
pub fn read_shapefile(path: &Path) -> Result<GeometryCollection> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut geometries = Vec::new();
    let mut records = Vec::new();
    for (idx, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .with_context(|| format!("Error reading shape+record {idx} in {}", path.display()))?;
        geometries.push(shape_to_geometry(shape).unwrap_or_else(|| {
            warn!("{}: feature {idx} has no usable geometry", path.display());
            GeometryCollection::empty_geometry()
        }));
        records.push(record);
    }

    let crs = crs_from_shapefile(path)?;
    let attributes = records_to_dataframe(&records)
        .with_context(|| format!("Error reading attributes of {}", path.display()))?;

    GeometryCollection::new(geometries, attributes, crs)
}

/// Convert a shapefile shape into a planar geometry (M and Z values are dropped).
/// Returns `None` for null shapes and multipatches.
pub fn shape_to_geometry(shape: Shape) -> Option<Geometry<f64>> {
    let geometry = match shape {
        Shape::Point(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointM(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::Multipoint(mp) => multipoint(mp.points(), |p| Coord { x: p.x, y: p.y }),
        Shape::MultipointM(mp) => multipoint(mp.points(), |p| Coord { x: p.x, y: p.y }),
        Shape::MultipointZ(mp) => multipoint(mp.points(), |p| Coord { x: p.x, y: p.y }),
        Shape::Polyline(pl) => polyline(pl.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolylineM(pl) => polyline(pl.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolylineZ(pl) => polyline(pl.parts(), |p| Coord { x: p.x, y: p.y }),
        Shape::Polygon(pg) => polygon(pg.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolygonM(pg) => polygon(pg.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolygonZ(pg) => polygon(pg.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::NullShape | Shape::Multipatch(_) => return None,
    };
    Some(geometry)
}

fn multipoint<P>(points: &[P], xy: impl Fn(&P) -> Coord<f64>) -> Geometry<f64> {
    match points {
        [single] => Geometry::Point(Point(xy(single))),
        _ => Geometry::MultiPoint(MultiPoint(points.iter().map(|p| Point(xy(p))).collect())),
    }
}

fn polyline<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> Coord<f64>) -> Geometry<f64> {
    let lines = parts.iter()
        .map(|part| LineString(part.iter().map(&xy).collect()))
        .collect::<Vec<_>>();
    match <[LineString<f64>; 1]>::try_from(lines) {
        Ok([line]) => Geometry::LineString(line),
        Err(lines) => Geometry::MultiLineString(MultiLineString(lines)),
    }
}

/// Group rings into polygons: each outer ring owns the inner rings that follow it,
/// which is the order shapefiles store them in.
fn polygon<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> Geometry<f64> {
    /// Ensure first and last are the same for geo::LineString coords
    fn closed(mut coords: Vec<Coord<f64>>) -> LineString<f64> {
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }
        LineString(coords)
    }

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let coords = closed(ring.points().iter().map(&xy).collect());
        match ring {
            PolygonRing::Outer(_) => {
                // flush previous polygon
                if let Some(ext) = exterior.replace(coords) {
                    polygons.push(Polygon::new(ext, std::mem::take(&mut holes)));
                }
            }
            PolygonRing::Inner(_) => holes.push(coords),
        }
    }
    if let Some(ext) = exterior {
        polygons.push(Polygon::new(ext, holes));
    }

    match <[Polygon<f64>; 1]>::try_from(polygons) {
        Ok([single]) => Geometry::Polygon(single),
        Err(polygons) => Geometry::MultiPolygon(MultiPolygon(polygons)),
    }
}

/// Kind of column a dBase field maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind { Number, Logical, Text }

fn field_kind(value: &FieldValue) -> Option<FieldKind> {
    match value {
        FieldValue::Numeric(None) | FieldValue::Float(None) | FieldValue::Logical(None)
            | FieldValue::Character(None) | FieldValue::Date(None) => None,
        FieldValue::Numeric(_) | FieldValue::Float(_) | FieldValue::Integer(_)
            | FieldValue::Double(_) | FieldValue::Currency(_) => Some(FieldKind::Number),
        FieldValue::Logical(_) => Some(FieldKind::Logical),
        _ => Some(FieldKind::Text),
    }
}

fn field_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Numeric(n) => *n,
        FieldValue::Float(f) => f.map(f64::from),
        FieldValue::Integer(i) => Some(f64::from(*i)),
        FieldValue::Double(d) | FieldValue::Currency(d) => Some(*d),
        FieldValue::Character(Some(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn field_text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(s) => s.as_ref().map(|s| s.trim().to_string()),
        FieldValue::Memo(s) => Some(s.clone()),
        other => field_number(other).map(|n| n.to_string())
            .or_else(|| field_kind(other).map(|_| format!("{other:?}"))),
    }
}

/// Convert attribute records to a DataFrame, one column per field in name order.
/// Numeric fields become Float64, logical fields Boolean, everything else String.
pub fn records_to_dataframe(records: &[Record]) -> Result<DataFrame> {
    let names = records.iter()
        .flat_map(|record| record.clone().into_iter().map(|(name, _)| name))
        .collect::<BTreeSet<_>>();

    let columns = names.iter()
        .map(|name| {
            let values = records.iter().map(|record| record.get(name)).collect::<Vec<_>>();
            let kind = values.iter().flatten().find_map(|value| field_kind(value))
                .unwrap_or(FieldKind::Text);

            match kind {
                FieldKind::Number => Column::new(
                    name.as_str().into(),
                    values.iter().map(|value| value.and_then(field_number)).collect::<Vec<_>>(),
                ),
                FieldKind::Logical => Column::new(
                    name.as_str().into(),
                    values.iter()
                        .map(|value| match value {
                            Some(FieldValue::Logical(b)) => *b,
                            _ => None,
                        })
                        .collect::<Vec<_>>(),
                ),
                FieldKind::Text => Column::new(
                    name.as_str().into(),
                    values.iter().map(|value| value.and_then(field_text)).collect::<Vec<_>>(),
                ),
            }
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}
