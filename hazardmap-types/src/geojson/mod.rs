//! Conversion of GeoJSON geometries into [`Geom`].
//!
//! GeoJSON positions are read as `x = position[0]`, `y = position[1]`; extra ordinates are
//! ignored. The coordinates are kept in the reference system of the document, reprojection is
//! done separately by [`CrsTransform`](crate::geo::CrsTransform).

use geojson::{FeatureCollection, JsonObject, JsonValue, LineStringType, PolygonType, Position, Value};

use crate::cartesian::Point2d;
use crate::impls::{Contour, MultiContour, MultiPoint, MultiPolygon, Polygon};
use crate::{Geom, TypesError};

impl TryFrom<&geojson::Geometry> for Geom<Point2d> {
    type Error = TypesError;

    fn try_from(value: &geojson::Geometry) -> Result<Self, Self::Error> {
        convert_value(&value.value)
    }
}

fn convert_value(value: &Value) -> Result<Geom<Point2d>, TypesError> {
    Ok(match value {
        Value::Point(p) => Geom::Point(convert_position(p)?),
        Value::MultiPoint(points) => Geom::MultiPoint(MultiPoint::from(convert_positions(points)?)),
        Value::LineString(line) => Geom::Contour(convert_line(line)?),
        Value::MultiLineString(lines) => Geom::MultiContour(MultiContour::from(
            lines
                .iter()
                .map(convert_line)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Value::Polygon(polygon) => Geom::Polygon(convert_polygon(polygon)?),
        Value::MultiPolygon(polygons) => Geom::MultiPolygon(MultiPolygon::from(
            polygons
                .iter()
                .map(convert_polygon)
                .collect::<Result<Vec<_>, _>>()?,
        )),
        Value::GeometryCollection(items) => Geom::Collection(
            items
                .iter()
                .map(Geom::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        ),
    })
}

fn convert_position(position: &Position) -> Result<Point2d, TypesError> {
    match position.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Point2d::new(*x, *y)),
        _ => Err(TypesError::Conversion(format!(
            "invalid position {position:?}"
        ))),
    }
}

fn convert_positions(positions: &[Position]) -> Result<Vec<Point2d>, TypesError> {
    positions.iter().map(convert_position).collect()
}

fn convert_line(line: &LineStringType) -> Result<Contour<Point2d>, TypesError> {
    if line.len() < 2 {
        return Err(TypesError::Conversion(
            "line string must have at least two positions".into(),
        ));
    }

    Ok(Contour::open(convert_positions(line)?))
}

fn convert_ring(ring: &LineStringType) -> Result<Contour<Point2d>, TypesError> {
    Contour::from_ring_points(convert_positions(ring)?)
        .into_closed()
        .ok_or_else(|| TypesError::Conversion("polygon ring must have at least three points".into()))
}

fn convert_polygon(polygon: &PolygonType) -> Result<Polygon<Point2d>, TypesError> {
    let Some((outer, inner)) = polygon.split_first() else {
        return Err(TypesError::Conversion("polygon without rings".into()));
    };

    Ok(Polygon::new(
        convert_ring(outer)?,
        inner.iter().map(convert_ring).collect::<Result<Vec<_>, _>>()?,
    ))
}

/// Returns the reference system name declared by the legacy `crs` member of a feature
/// collection (`{"type": "name", "properties": {"name": "EPSG:3857"}}`), if any.
pub fn declared_crs(collection: &FeatureCollection) -> Option<String> {
    collection
        .foreign_members
        .as_ref()
        .and_then(crs_from_members)
}

fn crs_from_members(members: &JsonObject) -> Option<String> {
    match members.get("crs")? {
        JsonValue::Object(crs) => crs
            .get("properties")
            .and_then(|p| p.get("name"))
            .and_then(|name| name.as_str())
            .map(str::to_string),
        _ => None,
    }
}
