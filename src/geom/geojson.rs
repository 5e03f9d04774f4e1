use anyhow::Result;
use geo::{Coord, Geometry, LineString, Polygon};
use polars::prelude::{Column, DataType};
use serde_json::{json, Map, Value};

use crate::geom::GeometryCollection;

impl GeometryCollection {
    /// Export the collection as a GeoJSON FeatureCollection.
    /// Every attribute column becomes a feature property; nulls are written as JSON null.
    pub fn to_geojson(&self) -> Result<Value> {
        let columns = self.attributes().get_columns().iter()
            .map(|column| (column.name().to_string(), column_to_json(column)))
            .collect::<Vec<_>>();

        let features = self.geometries().iter().enumerate()
            .map(|(idx, geometry)| {
                let properties = columns.iter()
                    .map(|(name, values)| (name.clone(), values.get(idx).cloned().unwrap_or(Value::Null)))
                    .collect::<Map<_, _>>();

                json!({
                    "type": "Feature",
                    "geometry": geometry_to_geojson(geometry),
                    "properties": properties,
                })
            })
            .collect::<Vec<_>>();

        Ok(json!({
            "type": "FeatureCollection",
            "features": features,
        }))
    }
}

/// Convert a column to JSON scalars, one per row.
fn column_to_json(column: &Column) -> Vec<Value> {
    let values: Option<Vec<Value>> = match column.dtype() {
        DataType::String => column.str().ok()
            .map(|s| s.into_iter().map(|v| v.map_or(Value::Null, |v| json!(v))).collect()),
        DataType::Boolean => column.bool().ok()
            .map(|b| b.into_iter().map(|v| v.map_or(Value::Null, |v| json!(v))).collect()),
        dtype if dtype.is_integer() => column.cast(&DataType::Int64).ok()
            .and_then(|c| c.i64().ok().map(|v| v.into_iter().map(|v| v.map_or(Value::Null, |v| json!(v))).collect())),
        dtype if dtype.is_float() => column.cast(&DataType::Float64).ok()
            .and_then(|c| c.f64().ok().map(|v| v.into_iter().map(|v| v.map_or(Value::Null, |v| json!(v))).collect())),
        _ => column.cast(&DataType::String).ok()
            .and_then(|c| c.str().ok().map(|s| s.into_iter().map(|v| v.map_or(Value::Null, |v| json!(v))).collect())),
    };
    values.unwrap_or_else(|| vec![Value::Null; column.len()])
}

/// Convert a geometry to a GeoJSON geometry object; empty geometries become null.
pub(crate) fn geometry_to_geojson(geometry: &Geometry<f64>) -> Value {
    fn position(coord: &Coord<f64>) -> Value { json!([coord.x, coord.y]) }

    fn line(ls: &LineString<f64>) -> Value {
        Value::Array(ls.coords().map(position).collect())
    }

    fn rings(polygon: &Polygon<f64>) -> Value {
        let mut rings = vec![line(polygon.exterior())];
        rings.extend(polygon.interiors().iter().map(line));
        Value::Array(rings)
    }

    match geometry {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": position(&p.0) }),
        Geometry::Line(l) => json!({ "type": "LineString", "coordinates": [position(&l.start), position(&l.end)] }),
        Geometry::LineString(ls) => json!({ "type": "LineString", "coordinates": line(ls) }),
        Geometry::Polygon(p) => json!({ "type": "Polygon", "coordinates": rings(p) }),
        Geometry::MultiPoint(mp) => json!({
            "type": "MultiPoint",
            "coordinates": mp.0.iter().map(|p| position(&p.0)).collect::<Vec<_>>(),
        }),
        Geometry::MultiLineString(mls) => json!({
            "type": "MultiLineString",
            "coordinates": mls.0.iter().map(line).collect::<Vec<_>>(),
        }),
        Geometry::MultiPolygon(mp) => json!({
            "type": "MultiPolygon",
            "coordinates": mp.0.iter().map(rings).collect::<Vec<_>>(),
        }),
        Geometry::Rect(r) => json!({ "type": "Polygon", "coordinates": rings(&r.to_polygon()) }),
        Geometry::Triangle(t) => json!({ "type": "Polygon", "coordinates": rings(&t.to_polygon()) }),
        Geometry::GeometryCollection(gc) if gc.0.is_empty() => Value::Null,
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.0.iter().map(geometry_to_geojson).collect::<Vec<_>>(),
        }),
    }
}
