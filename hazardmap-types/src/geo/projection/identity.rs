use crate::cartesian::Point2d;
use crate::geo::projection::Projection;
use crate::geo::GeoPoint2d;

/// Projection of a geographic reference onto the plane without any transformation:
/// `x` is longitude and `y` is latitude, both in degrees.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    type InPoint = GeoPoint2d;
    type OutPoint = Point2d;

    fn project(&self, input: &GeoPoint2d) -> Option<Point2d> {
        Some(Point2d::new(input.lon(), input.lat()))
    }

    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d> {
        if !(-90.0..=90.0).contains(&input.y) || !input.x.is_finite() {
            return None;
        }

        Some(GeoPoint2d::lonlat(input.x, input.y))
    }
}
