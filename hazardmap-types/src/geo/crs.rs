use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geo::datum::Datum;
use crate::geo::projection::{BoxedProjection, IdentityProjection, WebMercator};

/// Coordinate reference system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crs {
    datum: Datum,
    projection_type: ProjectionType,
}

/// Method used to project geographic coordinates onto the plane of a [`Crs`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ProjectionType {
    /// Geographic coordinates are used as is: `x` is longitude and `y` is latitude.
    None,
    /// Spherical Mercator.
    WebMercator,
    /// Projection given by a `geodesy` operator definition.
    Other(String),
}

impl Crs {
    /// Geographic coordinates on WGS84 (EPSG:4326, lon/lat axis order).
    pub const WGS84: Crs = Crs {
        datum: Datum::WGS84,
        projection_type: ProjectionType::None,
    };

    /// Web Mercator (EPSG:3857). This is the working reference of the map.
    pub const EPSG3857: Crs = Crs {
        datum: Datum::WGS84,
        projection_type: ProjectionType::WebMercator,
    };

    /// Creates a new reference system.
    pub fn new(datum: Datum, projection_type: ProjectionType) -> Self {
        Self {
            datum,
            projection_type,
        }
    }

    /// Datum of the reference system.
    pub fn datum(&self) -> Datum {
        self.datum
    }

    /// Projection method of the reference system.
    pub fn projection_type(&self) -> &ProjectionType {
        &self.projection_type
    }

    /// Returns the projection from geographic coordinates into this reference system, or
    /// `None` if the projection definition cannot be used.
    pub fn get_projection(&self) -> Option<BoxedProjection> {
        match &self.projection_type {
            ProjectionType::None => Some(Box::new(IdentityProjection)),
            ProjectionType::WebMercator => Some(Box::new(WebMercator::new(self.datum))),
            #[cfg(feature = "geodesy")]
            ProjectionType::Other(definition) => {
                crate::geo::projection::GeodesyProjection::new(definition)
                    .map(|p| Box::new(p) as BoxedProjection)
            }
            #[cfg(not(feature = "geodesy"))]
            ProjectionType::Other(_) => None,
        }
    }
}

static EPSG_URN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^urn:ogc:def:crs:epsg:[^:]*:(\d+)$").expect("valid regex")
});
static EPSG_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://www\.opengis\.net/def/crs/epsg/[^/]+/(\d+)$").expect("valid regex")
});
static CRS84: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(urn:ogc:def:crs:ogc:[^:]*:crs84|ogc:crs84|crs:84)$").expect("valid regex")
});

/// Brings the different spellings of a reference name into one form, so that
/// `urn:ogc:def:crs:EPSG::3857`, `http://www.opengis.net/def/crs/EPSG/0/3857` and `epsg:3857`
/// all become `EPSG:3857`. Names without an authority are upper-cased and trimmed.
pub fn normalize_crs_name(name: &str) -> String {
    let name = name.trim();
    if let Some(captures) = EPSG_URN
        .captures(name)
        .or_else(|| EPSG_URL.captures(name))
    {
        return format!("EPSG:{}", &captures[1]);
    }

    if CRS84.is_match(name) {
        return "CRS:84".to_string();
    }

    name.to_uppercase()
}
