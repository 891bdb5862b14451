//! In-memory tiling of large feature sets.
//!
//! A [`TileIndex`] is built once from a set of features in Web Mercator coordinates. The
//! features are split into a tree of tiles with integer coordinates in `0..extent`, so that a
//! renderer can draw only the part of a large dataset that is visible at the current zoom.
//! Every tile feature keeps the [`GeometryKind`](hazardmap_types::GeometryKind) of the source
//! feature, so the styles of the source apply to the tiled version as well.

#![allow(missing_docs)]

mod clip;
pub mod error;
mod geometry;
mod index;
mod tile;

pub use error::TilingError;
pub use geometry::VtGeometry;
pub use index::{tile_bbox, IndexOptions, TileIndex};
pub use tile::{TileFeature, VtTile};
