//! [`TileSchema`] is used by tile layers to calculate [tile indices](TileIndex) needed for a
//! given [`MapView`].

use hazardmap_types::cartesian::{Point2d, Rect};
use hazardmap_types::geo::Crs;
use serde::{Deserialize, Serialize};

use crate::view::{MapView, TOP_RESOLUTION};

const RESOLUTION_TOLERANCE: f64 = 0.01;
const WEB_MERCATOR_HALF_SIZE: f64 = 20_037_508.342_789_244;

/// Tile index. `y == 0` is the top row of the grid.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex {
    /// Z index.
    pub z: u32,
    /// X index.
    pub x: u32,
    /// Y index.
    pub y: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Tile schema specifies how tile indices are calculated based on the map position and
/// resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TileSchema {
    /// Top-left corner of the tile `0/0/0`.
    pub origin: Point2d,
    /// Rectangle that contains all tiles of the tile scheme.
    pub bounds: Rect,
    /// Resolutions of the z-levels, starting from `z == 0`. Every next resolution must be
    /// smaller than the previous.
    pub resolutions: Vec<f64>,
    /// Width and height of a single tile in pixels.
    pub tile_size: u32,
    /// Crs of the scheme.
    pub crs: Crs,
}

impl TileSchema {
    /// Standard Web Mercator based tile scheme (used, for example, by OSM and Google maps).
    pub fn web(lods_count: u32) -> Self {
        let resolutions = (0..lods_count)
            .map(|z| TOP_RESOLUTION / (1u64 << z) as f64)
            .collect();

        TileSchema {
            origin: Point2d::new(-WEB_MERCATOR_HALF_SIZE, WEB_MERCATOR_HALF_SIZE),
            bounds: Rect::new(
                -WEB_MERCATOR_HALF_SIZE,
                -WEB_MERCATOR_HALF_SIZE,
                WEB_MERCATOR_HALF_SIZE,
                WEB_MERCATOR_HALF_SIZE,
            ),
            resolutions,
            tile_size: 256,
            crs: Crs::EPSG3857,
        }
    }

    /// Resolution of the given z-level, if exists.
    pub fn lod_resolution(&self, z: u32) -> Option<f64> {
        self.resolutions.get(z as usize).copied()
    }

    /// Maximum z-level of the schema.
    pub fn max_z(&self) -> Option<u32> {
        self.resolutions.len().checked_sub(1).map(|z| z as u32)
    }

    /// Selects the z-level for the given resolution: the first level whose resolution is not
    /// larger than the requested one (with a small tolerance), or the deepest level if all are.
    pub fn select_z(&self, resolution: f64) -> Option<u32> {
        if !resolution.is_finite() {
            return None;
        }

        self.resolutions
            .iter()
            .position(|lod_resolution| lod_resolution * (1.0 - RESOLUTION_TOLERANCE) <= resolution)
            .map(|z| z as u32)
            .or_else(|| self.max_z())
    }

    /// Iterate over tile indices that should be displayed for the given map view.
    pub fn iter_tiles(&self, view: &MapView) -> Option<impl Iterator<Item = TileIndex>> {
        if *view.crs() != self.crs {
            return None;
        }

        let z = self.select_z(view.resolution())?;
        self.iter_tiles_over_bbox(z, view.get_bbox()?)
    }

    /// Iterate over tile indices of the z-level that intersect the bbox.
    pub fn iter_tiles_over_bbox(
        &self,
        z: u32,
        bbox: Rect,
    ) -> Option<impl Iterator<Item = TileIndex>> {
        let resolution = self.lod_resolution(z)?;
        if !self.bounds.intersects(&bbox) {
            return None;
        }
        let bbox = bbox.limit(self.bounds);

        let tile_span = resolution * self.tile_size as f64;
        let max_index = ((self.bounds.width() / tile_span).ceil() as u32).saturating_sub(1);

        let index =
            |value: f64| -> u32 { ((value / tile_span).floor().max(0.0) as u32).min(max_index) };
        let x_min = index(bbox.x_min() - self.origin.x);
        let x_max = index(bbox.x_max() - self.origin.x - tile_span * 1e-9);
        let y_min = index(self.origin.y - bbox.y_max());
        let y_max = index(self.origin.y - bbox.y_min() - tile_span * 1e-9);

        Some((x_min..=x_max).flat_map(move |x| (y_min..=y_max).map(move |y| TileIndex::new(x, y, z))))
    }

    /// Area covered by the tile.
    pub fn tile_bbox(&self, index: TileIndex) -> Option<Rect> {
        let resolution = self.lod_resolution(index.z)?;
        let tile_span = resolution * self.tile_size as f64;
        let x_min = self.origin.x + index.x as f64 * tile_span;
        let y_max = self.origin.y - index.y as f64 * tile_span;

        Some(Rect::new(x_min, y_max - tile_span, x_min + tile_span, y_max))
    }
}
