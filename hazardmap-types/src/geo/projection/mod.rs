//! Implementations for the projections the viewer supports.

mod identity;
mod web_mercator;

pub use identity::IdentityProjection;
pub use web_mercator::WebMercator;

#[cfg(feature = "geodesy")]
mod geodesy;
#[cfg(feature = "geodesy")]
pub use self::geodesy::GeodesyProjection;

use crate::cartesian::Point2d;
use crate::geo::GeoPoint2d;

/// Conversion between geographic coordinates and the coordinates of a reference system.
pub trait Projection {
    /// Type of the input (geographic) point.
    type InPoint;
    /// Type of the output (projected) point.
    type OutPoint;

    /// Converts a point into the projected coordinates. Returns `None` if the point cannot be
    /// projected.
    fn project(&self, input: &Self::InPoint) -> Option<Self::OutPoint>;
    /// Converts a projected point back into geographic coordinates.
    fn unproject(&self, input: &Self::OutPoint) -> Option<Self::InPoint>;
}

/// Projection between geographic and planar coordinates as a trait object.
pub type BoxedProjection = Box<dyn Projection<InPoint = GeoPoint2d, OutPoint = Point2d>>;
