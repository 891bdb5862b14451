//! Built-in style sets.

use hazardmap_types::GeometryKind;

use super::{PointMarker, StrokeStyle, StyleDescriptor, StyleSet};
use crate::color::Color;

fn circle(radius: f64, color: Color, width: f64) -> PointMarker {
    PointMarker {
        radius,
        fill: None,
        stroke: Some(StrokeStyle::solid(color, width)),
    }
}

fn area(stroke: StrokeStyle, fill: Color) -> StyleDescriptor {
    StyleDescriptor {
        stroke: Some(stroke),
        fill: Some(fill),
        point: None,
    }
}

fn line(stroke: StrokeStyle) -> StyleDescriptor {
    StyleDescriptor {
        stroke: Some(stroke),
        ..Default::default()
    }
}

fn marker(point: PointMarker) -> StyleDescriptor {
    StyleDescriptor {
        point: Some(point),
        ..Default::default()
    }
}

/// Styles for every geometry kind.
pub(super) fn default_set() -> StyleSet {
    let point = marker(circle(5.0, Color::RED, 1.0));
    let green_line = line(StrokeStyle::solid(Color::GREEN, 1.0));

    StyleSet::new()
        .with(GeometryKind::Point, point.clone())
        .with(GeometryKind::MultiPoint, point)
        .with(GeometryKind::LineString, green_line.clone())
        .with(GeometryKind::MultiLineString, green_line)
        .with(
            GeometryKind::MultiPolygon,
            area(
                StrokeStyle::solid(Color::YELLOW, 1.0),
                Color::rgba(255, 255, 0, 26),
            ),
        )
        .with(
            GeometryKind::Polygon,
            area(
                StrokeStyle::dashed(Color::BLUE, 3.0, vec![4.0]),
                Color::rgba(0, 0, 255, 26),
            ),
        )
        .with(
            GeometryKind::GeometryCollection,
            StyleDescriptor {
                stroke: Some(StrokeStyle::solid(Color::MAGENTA, 2.0)),
                fill: Some(Color::MAGENTA),
                point: Some(circle(10.0, Color::MAGENTA, 1.0)),
            },
        )
        .with(
            GeometryKind::Circle,
            area(
                StrokeStyle::solid(Color::RED, 2.0),
                Color::rgba(255, 0, 0, 51),
            ),
        )
}

pub(super) fn flood_set() -> StyleSet {
    let water = area(
        StrokeStyle::solid(Color::rgba(30, 100, 200, 255), 1.5),
        Color::rgba(30, 144, 255, 90),
    );

    StyleSet::new()
        .with(GeometryKind::Polygon, water.clone())
        .with(GeometryKind::MultiPolygon, water)
}

pub(super) fn fire_set() -> StyleSet {
    let fire = area(
        StrokeStyle::solid(Color::rgba(255, 69, 0, 255), 2.0),
        Color::rgba(255, 140, 0, 77),
    );

    StyleSet::new()
        .with(GeometryKind::Polygon, fire.clone())
        .with(GeometryKind::MultiPolygon, fire)
}

pub(super) fn roads_set() -> StyleSet {
    let road = line(StrokeStyle::solid(Color::DARK_GRAY, 2.0));

    StyleSet::new()
        .with(GeometryKind::LineString, road.clone())
        .with(GeometryKind::MultiLineString, road)
}
