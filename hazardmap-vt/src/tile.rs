use hazardmap_types::cartesian::{Point2d, Rect};
use hazardmap_types::impls::{Circle, Contour, MultiContour, MultiPoint, MultiPolygon, Polygon};
use hazardmap_types::{Geom, GeometryKind};

use crate::geometry::{NormPoint, VtGeometry};

/// Tile coordinates in `0..extent` (plus buffer on each side).
pub type TilePoint = [i32; 2];

/// A single tile cut from a [`TileIndex`](crate::TileIndex).
#[derive(Debug, Clone)]
pub struct VtTile<T> {
    /// Zoom level of the tile.
    pub z: u32,
    /// Column of the tile, from the west.
    pub x: u32,
    /// Row of the tile, from the north.
    pub y: u32,
    /// Size of the tile side in tile coordinates.
    pub extent: u32,
    /// Parts of the source features that fall into the tile, buffer included.
    pub features: Vec<TileFeature<T>>,
}

/// Part of a source feature that falls into a tile.
#[derive(Debug, Clone)]
pub struct TileFeature<T> {
    /// Kind of the source feature. A clipped line string may consist of several lines in the
    /// tile, but it keeps the kind of the source.
    pub kind: GeometryKind,
    /// Geometry clipped to the tile, in tile coordinates.
    pub geometry: VtGeometry<TilePoint>,
    /// Properties of the source feature.
    pub properties: T,
}

impl<T> TileFeature<T> {
    /// Converts the tile coordinates back into the coordinates of `bbox`, the area covered by
    /// the tile.
    ///
    /// Single-part geometries are returned as single geometries of the source kind, split
    /// geometries are returned as multi-geometries.
    pub fn to_geometry(&self, bbox: &Rect, extent: u32) -> Geom<Point2d> {
        let scale_x = bbox.width() / extent as f64;
        let scale_y = bbox.height() / extent as f64;
        let to_point = |p: &TilePoint| {
            Point2d::new(
                bbox.x_min() + p[0] as f64 * scale_x,
                bbox.y_max() - p[1] as f64 * scale_y,
            )
        };

        convert_geometry(&self.geometry, self.kind, &to_point, scale_x)
    }
}

fn convert_geometry(
    geometry: &VtGeometry<TilePoint>,
    kind: GeometryKind,
    to_point: &impl Fn(&TilePoint) -> Point2d,
    scale: f64,
) -> Geom<Point2d> {
    match geometry {
        VtGeometry::Points(points) => {
            let mut points: Vec<Point2d> = points.iter().map(to_point).collect();
            if kind != GeometryKind::MultiPoint && points.len() == 1 {
                if let Some(p) = points.pop() {
                    return Geom::Point(p);
                }
            }
            Geom::MultiPoint(MultiPoint::from(points))
        }
        VtGeometry::Lines(lines) => {
            let mut contours: Vec<Contour<Point2d>> = lines
                .iter()
                .map(|line| Contour::open(line.iter().map(to_point).collect()))
                .collect();
            if kind != GeometryKind::MultiLineString && contours.len() == 1 {
                if let Some(c) = contours.pop() {
                    return Geom::Contour(c);
                }
            }
            Geom::MultiContour(MultiContour::from(contours))
        }
        VtGeometry::Polygons(polygons) => {
            let mut polygons: Vec<Polygon<Point2d>> = polygons
                .iter()
                .filter_map(|rings| {
                    let mut rings = rings
                        .iter()
                        .map(|ring| Contour::closed(ring.iter().map(to_point).collect()));
                    Some(Polygon::new(rings.next()?, rings.collect()))
                })
                .collect();
            if kind != GeometryKind::MultiPolygon && polygons.len() == 1 {
                if let Some(p) = polygons.pop() {
                    return Geom::Polygon(p);
                }
            }
            Geom::MultiPolygon(MultiPolygon::from(polygons))
        }
        VtGeometry::Circle { center, radius } => {
            Geom::Circle(Circle::new(to_point(center), radius * scale))
        }
        VtGeometry::Collection(items) => Geom::Collection(
            items
                .iter()
                .map(|item| {
                    let item_kind = match item {
                        VtGeometry::Points(_) => GeometryKind::Point,
                        VtGeometry::Lines(_) => GeometryKind::LineString,
                        VtGeometry::Polygons(_) => GeometryKind::Polygon,
                        VtGeometry::Circle { .. } => GeometryKind::Circle,
                        VtGeometry::Collection(_) => GeometryKind::GeometryCollection,
                    };
                    convert_geometry(item, item_kind, to_point, scale)
                })
                .collect(),
        ),
    }
}

/// Converts normalized coordinates into integer tile coordinates. Consecutive duplicate points
/// are removed; lines and rings that degenerate are dropped.
pub(crate) fn to_tile_geometry(
    geometry: &VtGeometry<NormPoint>,
    z: u32,
    x: u32,
    y: u32,
    extent: u32,
) -> Option<VtGeometry<TilePoint>> {
    let z2 = (1u64 << z) as f64;
    let extent_f = extent as f64;
    let convert = |p: &NormPoint| -> TilePoint {
        [
            ((p[0] * z2 - x as f64) * extent_f).round() as i32,
            ((p[1] * z2 - y as f64) * extent_f).round() as i32,
        ]
    };
    let convert_path = |path: &[NormPoint]| -> Vec<TilePoint> {
        let mut result: Vec<TilePoint> = Vec::with_capacity(path.len());
        for p in path.iter().map(convert) {
            if result.last() != Some(&p) {
                result.push(p);
            }
        }
        result
    };

    let result = match geometry {
        VtGeometry::Points(points) => VtGeometry::Points(points.iter().map(convert).collect()),
        VtGeometry::Lines(lines) => VtGeometry::Lines(
            lines
                .iter()
                .map(|line| convert_path(line))
                .filter(|line| line.len() >= 2)
                .collect(),
        ),
        VtGeometry::Polygons(polygons) => VtGeometry::Polygons(
            polygons
                .iter()
                .filter_map(|rings| {
                    let mut converted = rings.iter().map(|ring| {
                        let mut ring = convert_path(ring);
                        if ring.len() > 1 && ring.first() == ring.last() {
                            ring.pop();
                        }
                        ring
                    });
                    let outer = converted.next().filter(|r| r.len() >= 3)?;
                    Some(
                        std::iter::once(outer)
                            .chain(converted.filter(|r| r.len() >= 3))
                            .collect::<Vec<_>>(),
                    )
                })
                .collect(),
        ),
        VtGeometry::Circle { center, radius } => VtGeometry::Circle {
            center: convert(center),
            radius: radius * z2 * extent_f,
        },
        VtGeometry::Collection(items) => VtGeometry::Collection(
            items
                .iter()
                .filter_map(|item| to_tile_geometry(item, z, x, y, extent))
                .collect(),
        ),
    };

    (!result.is_empty()).then_some(result)
}
