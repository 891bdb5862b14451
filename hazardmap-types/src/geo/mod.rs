//! Geographic coordinates (latitude and longitude, see [`GeoPoint2d`]) and conversion between
//! coordinate reference systems (see [`Projection`] and [`CrsRegistry`]).

mod crs;
mod datum;
mod point;
pub mod projection;
mod registry;

pub use crs::{normalize_crs_name, Crs, ProjectionType};
pub use datum::Datum;
pub use point::GeoPoint2d;
pub use projection::Projection;
pub use registry::{CrsRegistry, CrsTransform};
