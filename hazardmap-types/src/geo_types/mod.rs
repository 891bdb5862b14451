//! Conversion of `geo-types` geometries (as produced by KML and other georust readers) into
//! [`Geom`].

use geo_types::{Coord, Geometry, LineString};

use crate::cartesian::Point2d;
use crate::impls::{Contour, MultiContour, MultiPoint, MultiPolygon, Polygon};
use crate::{Geom, TypesError};

impl TryFrom<&Geometry<f64>> for Geom<Point2d> {
    type Error = TypesError;

    fn try_from(value: &Geometry<f64>) -> Result<Self, Self::Error> {
        Ok(match value {
            Geometry::Point(p) => Geom::Point(convert_coord(p.0)?),
            Geometry::Line(line) => Geom::Contour(Contour::open(vec![
                convert_coord(line.start)?,
                convert_coord(line.end)?,
            ])),
            Geometry::LineString(line) => Geom::Contour(convert_line(line)?),
            Geometry::Polygon(polygon) => Geom::Polygon(convert_polygon(polygon)?),
            Geometry::MultiPoint(points) => Geom::MultiPoint(MultiPoint::from(
                points
                    .iter()
                    .map(|p| convert_coord(p.0))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Geometry::MultiLineString(lines) => Geom::MultiContour(MultiContour::from(
                lines
                    .iter()
                    .map(convert_line)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Geometry::MultiPolygon(polygons) => Geom::MultiPolygon(MultiPolygon::from(
                polygons
                    .iter()
                    .map(convert_polygon)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Geometry::GeometryCollection(items) => Geom::Collection(
                items
                    .iter()
                    .map(Geom::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Geometry::Rect(rect) => Geom::Polygon(convert_polygon(&rect.to_polygon())?),
            Geometry::Triangle(triangle) => {
                Geom::Polygon(convert_polygon(&triangle.to_polygon())?)
            }
        })
    }
}

fn convert_coord(coord: Coord<f64>) -> Result<Point2d, TypesError> {
    if !coord.x.is_finite() || !coord.y.is_finite() {
        return Err(TypesError::Conversion(format!("invalid coordinate {coord:?}")));
    }

    Ok(Point2d::new(coord.x, coord.y))
}

fn convert_points(line: &LineString<f64>) -> Result<Vec<Point2d>, TypesError> {
    line.coords().map(|c| convert_coord(*c)).collect()
}

fn convert_line(line: &LineString<f64>) -> Result<Contour<Point2d>, TypesError> {
    Ok(Contour::from_ring_points(convert_points(line)?))
}

fn convert_ring(ring: &LineString<f64>) -> Result<Contour<Point2d>, TypesError> {
    Contour::from_ring_points(convert_points(ring)?)
        .into_closed()
        .ok_or_else(|| TypesError::Conversion("polygon ring must have at least three points".into()))
}

fn convert_polygon(polygon: &geo_types::Polygon<f64>) -> Result<Polygon<Point2d>, TypesError> {
    Ok(Polygon::new(
        convert_ring(polygon.exterior())?,
        polygon
            .interiors()
            .iter()
            .map(convert_ring)
            .collect::<Result<Vec<_>, _>>()?,
    ))
}

#[cfg(test)]
mod tests {
    use geo_types::{coord, line_string, point, polygon, Rect};

    use super::*;
    use crate::GeometryKind;

    #[test]
    fn converts_simple_geometries() {
        let geom = Geom::try_from(&Geometry::Point(point!(x: 153.0, y: -27.5))).expect("valid");
        assert_eq!(geom, Geom::Point(Point2d::new(153.0, -27.5)));

        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        let geom = Geom::try_from(&Geometry::LineString(line)).expect("valid");
        assert_eq!(geom.kind(), GeometryKind::LineString);

        let poly = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let geom = Geom::try_from(&Geometry::Polygon(poly)).expect("valid");
        assert_eq!(geom.kind(), GeometryKind::Polygon);
        assert_eq!(geom.point_count(), 3);
    }

    #[test]
    fn rect_becomes_polygon() {
        let rect = Rect::new(coord! {x: 0.0, y: 0.0}, coord! {x: 2.0, y: 1.0});
        let geom = Geom::try_from(&Geometry::Rect(rect)).expect("valid");
        assert_eq!(geom.kind(), GeometryKind::Polygon);
        assert_eq!(geom.point_count(), 4);
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let geom = Geom::try_from(&Geometry::Point(point!(x: f64::NAN, y: 0.0)));
        assert!(geom.is_err());
    }
}
