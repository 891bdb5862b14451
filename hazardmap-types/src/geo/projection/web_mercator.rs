use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::cartesian::Point2d;
use crate::geo::projection::Projection;
use crate::geo::{Datum, GeoPoint2d};

/// Latitude limit of the Web Mercator square.
pub(crate) const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Spherical (Web) Mercator projection, EPSG:3857.
#[derive(Debug, Copy, Clone)]
pub struct WebMercator {
    datum: Datum,
}

impl WebMercator {
    /// Creates a new instance on the given datum.
    pub fn new(datum: Datum) -> Self {
        Self { datum }
    }
}

impl Default for WebMercator {
    fn default() -> Self {
        Self::new(Datum::WGS84)
    }
}

impl Projection for WebMercator {
    type InPoint = GeoPoint2d;
    type OutPoint = Point2d;

    fn project(&self, input: &GeoPoint2d) -> Option<Point2d> {
        let lat = input.lat().clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = self.datum.semimajor() * input.lon_rad();
        let y = self.datum.semimajor() * (FRAC_PI_4 + lat / 2.0).tan().ln();

        if x.is_finite() && y.is_finite() {
            Some(Point2d::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d> {
        let lat = 2.0 * (input.y / self.datum.semimajor()).exp().atan() - FRAC_PI_2;
        let lon = input.x / self.datum.semimajor();

        if lat.is_finite() && lon.is_finite() {
            Some(GeoPoint2d::latlon(lat.to_degrees(), lon.to_degrees()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn projects_known_point() {
        let projection = WebMercator::default();
        let projected = projection
            .project(&GeoPoint2d::latlon(-19.44, 146.48))
            .expect("projectable");
        assert_relative_eq!(projected.x, 16_306_079.011, epsilon = 0.01);
        assert_relative_eq!(projected.y, -2_206_807.907, epsilon = 0.01);
    }

    #[test]
    fn unproject_inverts_project() {
        let projection = WebMercator::default();
        let point = GeoPoint2d::latlon(-27.47, 153.02);
        let projected = projection.project(&point).expect("projectable");
        let unprojected = projection.unproject(&projected).expect("unprojectable");

        assert_relative_eq!(unprojected.lat(), point.lat(), epsilon = 1e-9);
        assert_relative_eq!(unprojected.lon(), point.lon(), epsilon = 1e-9);
    }

    #[test]
    fn clamps_polar_latitudes() {
        let projection = WebMercator::default();
        let pole = projection
            .project(&GeoPoint2d::latlon(90.0, 0.0))
            .expect("clamped");
        let limit = projection
            .project(&GeoPoint2d::latlon(MAX_LATITUDE, 0.0))
            .expect("projectable");
        assert_relative_eq!(pole.y, limit.y);
        assert_relative_eq!(pole.y, 20_037_508.342789244, epsilon = 1e-3);
    }
}
