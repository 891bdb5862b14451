use serde::{Deserialize, Serialize};

/// 2d point on the surface of the Earth.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct GeoPoint2d {
    lat: f64,
    lon: f64,
}

impl GeoPoint2d {
    /// Creates a point from latitude and longitude in degrees.
    pub fn latlon(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a point from longitude and latitude in degrees (the axis order GeoJSON and
    /// KML use).
    pub fn lonlat(lon: f64, lat: f64) -> Self {
        Self { lat, lon }
    }

    /// Latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Longitude in radians.
    pub fn lon_rad(&self) -> f64 {
        self.lon.to_radians()
    }
}

/// Creates a new GeoPoint2d from latitude and longitude values (in degrees).
///
/// ```
/// use hazardmap_types::latlon;
///
/// let point = latlon!(-27.47, 153.02);
/// assert_eq!(point.lat(), -27.47);
/// ```
#[macro_export]
macro_rules! latlon {
    ($lat:expr, $lon:expr) => {
        $crate::geo::GeoPoint2d::latlon($lat, $lon)
    };
}
