use geodesy::prelude::*;

use crate::cartesian::Point2d;
use crate::geo::projection::Projection;
use crate::geo::GeoPoint2d;

/// Projection defined by a `geodesy` operator string, e.g. `utm zone=56 south` or
/// `laea lon_0=10 lat_0=52 x_0=4321000 y_0=3210000`.
pub struct GeodesyProjection {
    context: Minimal,
    op: OpHandle,
}

impl GeodesyProjection {
    /// Parses the definition. Returns `None` if the definition is not a valid operator.
    pub fn new(definition: &str) -> Option<Self> {
        let mut context = Minimal::new();
        let op = context.op(definition).ok()?;
        Some(Self { context, op })
    }
}

impl Projection for GeodesyProjection {
    type InPoint = GeoPoint2d;
    type OutPoint = Point2d;

    fn project(&self, input: &GeoPoint2d) -> Option<Point2d> {
        let mut data = [Coor2D::geo(input.lat(), input.lon())];
        self.context.apply(self.op, Fwd, &mut data).ok()?;

        if !data[0].0[0].is_finite() || !data[0].0[1].is_finite() {
            return None;
        }

        Some(Point2d::new(data[0].0[0], data[0].0[1]))
    }

    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d> {
        let mut data = [Coor2D([input.x, input.y])];
        self.context.apply(self.op, Inv, &mut data).ok()?;

        if !data[0].0[0].is_finite() || !data[0].0[1].is_finite() {
            return None;
        }

        Some(GeoPoint2d::latlon(
            data[0].0[1].to_degrees(),
            data[0].0[0].to_degrees(),
        ))
    }
}
