//! Interface between layers and whatever draws the map.
//!
//! Layers decide *what* is drawn: which features are in view and with which
//! [`StyleDescriptor`]. Turning that into pixels is the job of a [`Canvas`] implementation
//! provided by the application.

use hazardmap_types::cartesian::{Point2d, Rect, Size};
use hazardmap_types::Geom;

use crate::style::StyleDescriptor;
use crate::tile_schema::TileIndex;

/// Drawing surface of a map.
pub trait Canvas {
    /// Size of the surface in pixels.
    fn size(&self) -> Size;

    /// Draws a geometry in the working reference of the map with the given style.
    fn draw_feature(&mut self, geometry: &Geom<Point2d>, style: &StyleDescriptor);

    /// Draws the image of a base map tile, loaded from `url`, over the `bbox` area of the map.
    fn draw_raster_tile(&mut self, index: TileIndex, bbox: Rect, url: &str);
}
