//! Geometry and coordinate reference types used by the hazard map viewer.
//!
//! The crate contains:
//! * [`geometry::Geom`], a closed set of geometry kinds ([`geometry::GeometryKind`]) the viewer
//!   knows how to style;
//! * [`cartesian`] primitives for projected coordinates;
//! * [`geo`] types: geographic points, [`geo::Crs`], projections and the [`geo::CrsRegistry`]
//!   that converts coordinates from a dataset reference into the map working reference;
//! * conversions from `geojson` and `geo-types` geometries.

pub mod cartesian;
pub mod error;
pub mod geo;
pub mod geometry;
pub mod impls;

#[cfg(feature = "geo-types")]
pub mod geo_types;
#[cfg(feature = "geojson")]
pub mod geojson;

pub use error::TypesError;
pub use geometry::{Geom, GeometryKind};
