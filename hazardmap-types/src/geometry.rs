//! The closed set of geometries the viewer can display.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::cartesian::{Point2d, Rect};
use crate::impls::{Circle, Contour, MultiContour, MultiPoint, MultiPolygon, Polygon};

/// Kind of a geometry. Styles are looked up by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Single point.
    Point,
    /// Line string.
    LineString,
    /// Polygon with optional holes.
    Polygon,
    /// Set of points.
    MultiPoint,
    /// Set of line strings.
    MultiLineString,
    /// Set of polygons.
    MultiPolygon,
    /// Heterogeneous set of geometries.
    GeometryCollection,
    /// Circle with center and radius.
    Circle,
}

impl GeometryKind {
    /// All geometry kinds.
    pub const ALL: [GeometryKind; 8] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPoint,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPolygon,
        GeometryKind::GeometryCollection,
        GeometryKind::Circle,
    ];

    /// Name of the kind as it appears in GeoJSON documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
            GeometryKind::Circle => "Circle",
        }
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geometry of one of the [`GeometryKind`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Geom<P> {
    /// Point.
    Point(P),
    /// Set of points.
    MultiPoint(MultiPoint<P>),
    /// Line string.
    Contour(Contour<P>),
    /// Set of line strings.
    MultiContour(MultiContour<P>),
    /// Polygon.
    Polygon(Polygon<P>),
    /// Set of polygons.
    MultiPolygon(MultiPolygon<P>),
    /// Collection of geometries.
    Collection(Vec<Geom<P>>),
    /// Circle.
    Circle(Circle<P>),
}

impl<P> Geom<P> {
    /// Kind of the geometry.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geom::Point(_) => GeometryKind::Point,
            Geom::MultiPoint(_) => GeometryKind::MultiPoint,
            Geom::Contour(_) => GeometryKind::LineString,
            Geom::MultiContour(_) => GeometryKind::MultiLineString,
            Geom::Polygon(_) => GeometryKind::Polygon,
            Geom::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Geom::Collection(_) => GeometryKind::GeometryCollection,
            Geom::Circle(_) => GeometryKind::Circle,
        }
    }

    /// Calls `f` for every vertex of the geometry. For circles only the center is visited.
    pub fn for_each_point(&self, f: &mut impl FnMut(&P)) {
        match self {
            Geom::Point(p) => f(p),
            Geom::MultiPoint(mp) => mp.points().iter().for_each(f),
            Geom::Contour(c) => c.iter_points().for_each(f),
            Geom::MultiContour(mc) => mc
                .contours()
                .iter()
                .for_each(|c| c.iter_points().for_each(&mut *f)),
            Geom::Polygon(p) => p
                .iter_contours()
                .for_each(|c| c.iter_points().for_each(&mut *f)),
            Geom::MultiPolygon(mp) => mp.polygons().iter().for_each(|p| {
                p.iter_contours()
                    .for_each(|c| c.iter_points().for_each(&mut *f))
            }),
            Geom::Collection(items) => items.iter().for_each(|g| g.for_each_point(f)),
            Geom::Circle(c) => f(&c.center),
        }
    }

    /// Total number of vertices in the geometry.
    pub fn point_count(&self) -> usize {
        let mut count = 0;
        self.for_each_point(&mut |_| count += 1);
        count
    }

    /// Converts every point with the given function. Returns `None` if any of the points fails
    /// to convert.
    pub fn try_map<Q>(&self, f: &mut impl FnMut(&P) -> Option<Q>) -> Option<Geom<Q>> {
        Some(match self {
            Geom::Point(p) => Geom::Point(f(p)?),
            Geom::MultiPoint(mp) => Geom::MultiPoint(mp.try_map(f)?),
            Geom::Contour(c) => Geom::Contour(c.try_map(f)?),
            Geom::MultiContour(mc) => Geom::MultiContour(mc.try_map(f)?),
            Geom::Polygon(p) => Geom::Polygon(p.try_map(f)?),
            Geom::MultiPolygon(mp) => Geom::MultiPolygon(mp.try_map(f)?),
            Geom::Collection(items) => Geom::Collection(
                items
                    .iter()
                    .map(|g| g.try_map(f))
                    .collect::<Option<Vec<_>>>()?,
            ),
            Geom::Circle(c) => Geom::Circle(Circle::new(f(&c.center)?, c.radius)),
        })
    }
}

impl Geom<Point2d> {
    /// Bounding rectangle of the geometry. Returns `None` for empty geometries.
    pub fn bounding_rect(&self) -> Option<Rect> {
        let mut rect: Option<Rect> = None;
        let mut add = |r: Rect| {
            rect = Some(match rect {
                Some(v) => v.merge(r),
                None => r,
            });
        };

        match self {
            Geom::Circle(c) => add(Rect::new(
                c.center.x - c.radius,
                c.center.y - c.radius,
                c.center.x + c.radius,
                c.center.y + c.radius,
            )),
            other => other.for_each_point(&mut |p| add(Rect::from_point(p))),
        }

        rect
    }
}

impl<P> From<Contour<P>> for Geom<P> {
    fn from(value: Contour<P>) -> Self {
        Geom::Contour(value)
    }
}

impl<P> From<Polygon<P>> for Geom<P> {
    fn from(value: Polygon<P>) -> Self {
        Geom::Polygon(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon<Point2d> {
        Contour::closed(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(0.0, 10.0),
            Point2d::new(10.0, 10.0),
            Point2d::new(10.0, 0.0),
        ])
        .into()
    }

    #[test]
    fn kinds() {
        assert_eq!(Geom::Point(Point2d::new(0.0, 0.0)).kind(), GeometryKind::Point);
        assert_eq!(Geom::Polygon(square()).kind(), GeometryKind::Polygon);
        assert_eq!(
            Geom::MultiPolygon(vec![square()].into()).kind(),
            GeometryKind::MultiPolygon
        );
        assert_eq!(
            Geom::<Point2d>::Collection(vec![]).kind(),
            GeometryKind::GeometryCollection
        );
        assert_eq!(GeometryKind::MultiLineString.to_string(), "MultiLineString");
    }

    #[test]
    fn point_count_and_bbox() {
        let geom = Geom::Collection(vec![
            Geom::Polygon(square()),
            Geom::Point(Point2d::new(-5.0, 20.0)),
        ]);
        assert_eq!(geom.point_count(), 5);
        assert_eq!(geom.bounding_rect(), Some(Rect::new(-5.0, 0.0, 10.0, 20.0)));

        let circle = Geom::Circle(Circle::new(Point2d::new(1.0, 1.0), 2.0));
        assert_eq!(circle.bounding_rect(), Some(Rect::new(-1.0, -1.0, 3.0, 3.0)));
        assert_eq!(Geom::<Point2d>::Collection(vec![]).bounding_rect(), None);
    }
}
