//! [Layers](Layer) specify a data source and the way the data should be rendered to the map.

use std::any::Any;

use crate::layer::attribution::Attribution;
use crate::render::Canvas;
use crate::view::MapView;

pub mod attribution;
pub mod feature_layer;
pub mod raster_tile_layer;
pub mod tiled_feature_layer;

pub use feature_layer::{Feature, FeatureLayer};
pub use raster_tile_layer::RasterTileLayer;
pub use tiled_feature_layer::TiledFeatureLayer;

/// Layers specify a data source and the way the data should be rendered to the map.
///
/// There are 3 types of layers:
/// * [`RasterTileLayer`] - base map drawn from prerendered tiles of an Internet source.
/// * [`FeatureLayer`] - in-memory set of features drawn with the styles of a dataset.
/// * [`TiledFeatureLayer`] - large feature set cut into tiles on demand, only the tiles covering
///   the view are drawn.
///
/// Layers are looked up by their logical [name](Layer::name). Names are not unique: several
/// layers may share one, and operations by name affect all of them.
pub trait Layer: Send + Sync {
    /// Logical name of the layer.
    fn name(&self) -> &str;
    /// Renders the layer to the given canvas.
    fn render(&self, view: &MapView, canvas: &mut dyn Canvas);
    /// A map stores layers as trait objects. This method can be used to convert the trait object into the concrete type.
    fn as_any(&self) -> &dyn Any;
    /// A map stores layers as trait objects. This method can be used to convert the trait object into the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Returns the attribution of the layer, if available.
    fn attribution(&self) -> Option<Attribution>;
}
