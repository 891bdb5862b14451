use hazardmap_types::cartesian::Point2d;
use hazardmap_types::Geom;

/// Half of the width of the Web Mercator plane in meters.
pub(crate) const MERCATOR_HALF_SIZE: f64 = 20_037_508.342_789_244;

pub(crate) type NormPoint = [f64; 2];

/// Geometry flattened into plain point lists.
///
/// Inside the index the coordinates are normalized to the unit square (`[0, 0]` is the
/// north-west corner of the world). In a [`VtTile`](crate::VtTile) they are integers in
/// `0..extent` plus the tile buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum VtGeometry<P> {
    Points(Vec<P>),
    /// Open line strings.
    Lines(Vec<Vec<P>>),
    /// Polygons as lists of rings, outer ring first. Rings do not repeat the first point.
    Polygons(Vec<Vec<Vec<P>>>),
    Circle { center: P, radius: f64 },
    Collection(Vec<VtGeometry<P>>),
}

impl<P> VtGeometry<P> {
    pub fn point_count(&self) -> usize {
        match self {
            VtGeometry::Points(points) => points.len(),
            VtGeometry::Lines(lines) => lines.iter().map(Vec::len).sum(),
            VtGeometry::Polygons(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter())
                .map(Vec::len)
                .sum(),
            VtGeometry::Circle { .. } => 1,
            VtGeometry::Collection(items) => items.iter().map(VtGeometry::point_count).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            VtGeometry::Points(points) => points.is_empty(),
            VtGeometry::Lines(lines) => lines.is_empty(),
            VtGeometry::Polygons(polygons) => polygons.is_empty(),
            VtGeometry::Circle { .. } => false,
            VtGeometry::Collection(items) => items.iter().all(VtGeometry::is_empty),
        }
    }
}

impl VtGeometry<NormPoint> {
    /// Converts a geometry in Web Mercator meters. Returns `None` if the geometry has no
    /// points or any of the coordinates is not finite.
    pub(crate) fn from_mercator(geom: &Geom<Point2d>) -> Option<Self> {
        let result = match geom {
            Geom::Point(p) => VtGeometry::Points(vec![normalize(p)?]),
            Geom::MultiPoint(points) => VtGeometry::Points(
                points
                    .points()
                    .iter()
                    .map(normalize)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Geom::Contour(contour) => VtGeometry::Lines(vec![contour
                .iter_points_closing()
                .map(normalize)
                .collect::<Option<Vec<_>>>()?]),
            Geom::MultiContour(contours) => VtGeometry::Lines(
                contours
                    .contours()
                    .iter()
                    .map(|c| c.iter_points_closing().map(normalize).collect())
                    .collect::<Option<Vec<_>>>()?,
            ),
            Geom::Polygon(polygon) => VtGeometry::Polygons(vec![normalize_polygon(polygon)?]),
            Geom::MultiPolygon(polygons) => VtGeometry::Polygons(
                polygons
                    .polygons()
                    .iter()
                    .map(normalize_polygon)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Geom::Circle(circle) => VtGeometry::Circle {
                center: normalize(&circle.center)?,
                radius: circle.radius / (2.0 * MERCATOR_HALF_SIZE),
            },
            Geom::Collection(items) => VtGeometry::Collection(
                items
                    .iter()
                    .map(Self::from_mercator)
                    .collect::<Option<Vec<_>>>()?,
            ),
        };

        (!result.is_empty()).then_some(result)
    }

    /// Bounding box as `(min, max)` corners.
    pub(crate) fn bounds(&self) -> (NormPoint, NormPoint) {
        let mut min = [f64::INFINITY; 2];
        let mut max = [f64::NEG_INFINITY; 2];
        self.extend_bounds(&mut min, &mut max);
        (min, max)
    }

    fn extend_bounds(&self, min: &mut NormPoint, max: &mut NormPoint) {
        match self {
            VtGeometry::Points(points) => points.iter().for_each(|p| add_point(p, 0.0, min, max)),
            VtGeometry::Lines(lines) => lines
                .iter()
                .flatten()
                .for_each(|p| add_point(p, 0.0, min, max)),
            VtGeometry::Polygons(polygons) => polygons
                .iter()
                .flatten()
                .flatten()
                .for_each(|p| add_point(p, 0.0, min, max)),
            VtGeometry::Circle { center, radius } => add_point(center, *radius, min, max),
            VtGeometry::Collection(items) => {
                items.iter().for_each(|item| item.extend_bounds(min, max))
            }
        }
    }
}

fn add_point(p: &NormPoint, radius: f64, min: &mut NormPoint, max: &mut NormPoint) {
    for axis in 0..2 {
        min[axis] = min[axis].min(p[axis] - radius);
        max[axis] = max[axis].max(p[axis] + radius);
    }
}

fn normalize(point: &Point2d) -> Option<NormPoint> {
    if !point.x.is_finite() || !point.y.is_finite() {
        return None;
    }

    let x = 0.5 + point.x / (2.0 * MERCATOR_HALF_SIZE);
    let y = 0.5 - point.y / (2.0 * MERCATOR_HALF_SIZE);
    Some([x, y.clamp(0.0, 1.0)])
}

fn normalize_polygon(
    polygon: &hazardmap_types::impls::Polygon<Point2d>,
) -> Option<Vec<Vec<NormPoint>>> {
    polygon
        .iter_contours()
        .map(|c| c.iter_points().map(normalize).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use hazardmap_types::impls::Contour;

    use super::*;

    #[test]
    fn normalizes_to_unit_square() {
        let geom = Geom::Contour(Contour::open(vec![
            Point2d::new(-MERCATOR_HALF_SIZE, MERCATOR_HALF_SIZE),
            Point2d::new(0.0, 0.0),
            Point2d::new(MERCATOR_HALF_SIZE, -MERCATOR_HALF_SIZE),
        ]));
        let VtGeometry::Lines(lines) = VtGeometry::from_mercator(&geom).expect("valid") else {
            panic!("expected lines");
        };
        assert_relative_eq!(lines[0][0][0], 0.0);
        assert_relative_eq!(lines[0][0][1], 0.0);
        assert_relative_eq!(lines[0][1][0], 0.5);
        assert_relative_eq!(lines[0][2][1], 1.0);
    }

    #[test]
    fn closed_contour_repeats_first_point() {
        let geom = Geom::Contour(Contour::closed(vec![
            Point2d::new(0.0, 0.0),
            Point2d::new(1.0, 0.0),
            Point2d::new(1.0, 1.0),
        ]));
        let converted = VtGeometry::from_mercator(&geom).expect("valid");
        assert_eq!(converted.point_count(), 4);
    }

    #[test]
    fn empty_geometry_is_skipped() {
        let geom = Geom::<Point2d>::Collection(vec![]);
        assert!(VtGeometry::from_mercator(&geom).is_none());

        let geom = Geom::Point(Point2d::new(f64::NAN, 0.0));
        assert!(VtGeometry::from_mercator(&geom).is_none());
    }
}
