use hazardmap_types::cartesian::{Point2d, Size};
use hazardmap_types::geo::{Crs, GeoPoint2d};

use super::Map;
use crate::layer::Layer;
use crate::messenger::Messenger;
use crate::view::{resolution_for_zoom, MapView, ViewConstraints};

// z-level 4 on the standard web tile scheme
const DEFAULT_ZOOM: f64 = 4.0;

/// Builder for a [`Map`].
///
/// ```
/// use hazardmap::MapBuilder;
///
/// let map = MapBuilder::default()
///     .with_lonlat(153.02, -27.47)
///     .with_zoom(6.1)
///     .build();
///
/// assert!((map.view().zoom_level() - 6.1).abs() < 1e-9);
/// ```
#[derive(Default)]
pub struct MapBuilder {
    position: Option<GeoPoint2d>,
    projected_position: Option<Point2d>,
    resolution: Option<f64>,
    size: Option<Size>,
    constraints: ViewConstraints,
    layers: Vec<Box<dyn Layer>>,
    messenger: Option<Box<dyn Messenger>>,
}

impl MapBuilder {
    /// Sets the center of the map in geographic coordinates.
    pub fn with_position(mut self, position: GeoPoint2d) -> Self {
        self.position = Some(position);
        self.projected_position = None;
        self
    }

    /// Sets the center of the map by its longitude and latitude.
    pub fn with_lonlat(self, lon: f64, lat: f64) -> Self {
        self.with_position(GeoPoint2d::lonlat(lon, lat))
    }

    /// Sets the center of the map in the working reference (Web Mercator meters).
    pub fn with_projected_position(mut self, position: Point2d) -> Self {
        self.projected_position = Some(position);
        self.position = None;
        self
    }

    /// Sets the resolution of the map (meters per pixel).
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Sets the resolution by a fractional zoom level.
    pub fn with_zoom(self, zoom: f64) -> Self {
        self.with_resolution(resolution_for_zoom(zoom))
    }

    /// Sets the size of the map in pixels.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the limits of the map view.
    pub fn with_constraints(mut self, constraints: ViewConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Adds a layer to the end of the layer list.
    pub fn with_layer(mut self, layer: impl Layer + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Sets the messenger of the map.
    pub fn with_messenger(mut self, messenger: impl Messenger + 'static) -> Self {
        self.messenger = Some(Box::new(messenger));
        self
    }

    /// Creates the map.
    pub fn build(self) -> Map {
        let MapBuilder {
            position,
            projected_position,
            resolution,
            size,
            constraints,
            layers,
            messenger,
        } = self;

        let center = match position {
            Some(position) => Crs::EPSG3857
                .get_projection()
                .and_then(|projection| projection.project(&position))
                .unwrap_or_else(|| {
                    log::warn!("Map position {position:?} cannot be projected, using the origin");
                    Point2d::origin()
                }),
            None => projected_position.unwrap_or_else(Point2d::origin),
        };

        let mut view = MapView::new(
            center,
            resolution.unwrap_or_else(|| resolution_for_zoom(DEFAULT_ZOOM)),
        );
        if let Some(size) = size {
            view = view.with_size(size);
        }

        let mut map = Map::new(view, layers, messenger);
        map.set_constraints(constraints);

        map
    }
}
