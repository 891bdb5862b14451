//! Hazardmap is the core of a hazard map viewer. It puts natural hazard datasets (flood
//! extents, fire regions, the road network) over a base map and keeps them up to date while the
//! user moves around.
//!
//! # Quick start
//!
//! ```no_run
//! use hazardmap::config::ViewerConfig;
//! use hazardmap::HazardViewer;
//!
//! # tokio_test::block_on(async {
//! let config = ViewerConfig::from_file("viewer.json").expect("valid config");
//! let viewer = HazardViewer::native(config).expect("viewer is created");
//! let handles = viewer.start().await;
//!
//! // The user hides the roads and presses "update map".
//! viewer.toggles().write().set("roads", false);
//! viewer.update_map();
//! # handles.stop();
//! # });
//! ```
//!
//! # Main components
//!
//! * [`Map`] holds the displayed [`MapView`] and the [layers](layer). It is shared between the
//!   application and the background tasks as a [`MapHandle`].
//! * The [`loader`] fetches KML and GeoJSON documents, converts their coordinates into the
//!   working reference of the map (Web Mercator) and installs layers into the map. Loads run in
//!   background and never block the user.
//! * [`style`] decides how every kind of geometry of a dataset is drawn.
//! * The [`refresh`] loop requests the road network again for the visible area every time the
//!   user stops moving the map.
//! * [`visibility`] toggles show and hide layers by their names.
//! * [`HazardViewer`] assembles all of the above from a [`config::ViewerConfig`].
//!
//! Drawing pixels is outside of the crate: layers draw into a [`render::Canvas`] the
//! application provides.

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

mod color;
pub mod config;
pub mod error;
pub mod layer;
pub mod loader;
mod map;
mod messenger;
pub mod platform;
pub mod refresh;
pub mod render;
pub mod style;
mod tile_schema;
mod view;
pub mod viewer;
pub mod visibility;

#[cfg(test)]
mod tests;

pub use color::Color;
pub use map::{LayerCollection, Map, MapBuilder, MapHandle};
pub use messenger::Messenger;
pub use tile_schema::{TileIndex, TileSchema};
pub use view::{resolution_for_zoom, zoom_for_resolution, MapView, ViewConstraints};
pub use viewer::{HazardViewer, ViewerHandles};

// Reexport dependent crates
pub use hazardmap_types;
pub use hazardmap_vt;
