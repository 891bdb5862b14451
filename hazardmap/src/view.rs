//! [`MapView`] specifies the part of the map that is displayed.

use hazardmap_types::cartesian::{Point2d, Rect, Size};
use hazardmap_types::geo::{Crs, GeoPoint2d};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Resolution of zoom level 0 of the Web Mercator tile grid (meters per pixel).
pub const TOP_RESOLUTION: f64 = 156_543.033_928_000_14;

/// Center, resolution and size of the displayed area in the working reference of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    center: Point2d,
    resolution: f64,
    size: Size,
    crs: Crs,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Point2d::new(0.0, 0.0),
            resolution: TOP_RESOLUTION,
            size: Size::new(0.0, 0.0),
            crs: Crs::EPSG3857,
        }
    }
}

impl MapView {
    /// Creates a view in Web Mercator with the given center and resolution (map units per
    /// pixel). The view has zero size until [`MapView::with_size`] is called.
    pub fn new(center: Point2d, resolution: f64) -> Self {
        Self {
            center,
            resolution,
            ..Default::default()
        }
    }

    /// Creates a view with a fractional zoom level, as used by web maps: zoom `0` shows the whole
    /// world in a single 256 px tile, every next level halves the resolution.
    pub fn from_zoom(center: Point2d, zoom: f64) -> Self {
        Self::new(center, resolution_for_zoom(zoom))
    }

    /// Center of the view.
    pub fn center(&self) -> Point2d {
        self.center
    }

    /// Map units per pixel.
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Fractional zoom level corresponding to the resolution.
    pub fn zoom_level(&self) -> f64 {
        zoom_for_resolution(self.resolution)
    }

    /// Size of the view in pixels.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Reference system of the view.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Copy of the view with a different center.
    pub fn with_center(&self, center: Point2d) -> Self {
        Self {
            center,
            ..self.clone()
        }
    }

    /// Copy of the view with a different resolution.
    pub fn with_resolution(&self, resolution: f64) -> Self {
        Self {
            resolution,
            ..self.clone()
        }
    }

    /// Copy of the view with a different fractional zoom level.
    pub fn with_zoom(&self, zoom: f64) -> Self {
        self.with_resolution(resolution_for_zoom(zoom))
    }

    /// Copy of the view with a different size.
    pub fn with_size(&self, size: Size) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Area of the map covered by the view. Returns `None` if the view has zero size.
    pub fn get_bbox(&self) -> Option<Rect> {
        if self.size.is_zero() || !self.resolution.is_finite() {
            return None;
        }

        let half_width = self.size.half_width() * self.resolution;
        let half_height = self.size.half_height() * self.resolution;
        Some(Rect::new(
            self.center.x - half_width,
            self.center.y - half_height,
            self.center.x + half_width,
            self.center.y + half_height,
        ))
    }

    /// Area covered by the view in geographic coordinates: `x` is longitude and `y` is latitude
    /// in degrees.
    pub fn geo_bbox(&self) -> Option<Rect> {
        let bbox = self.get_bbox()?;
        let projection = self.crs.get_projection()?;
        let south_west: GeoPoint2d =
            projection.unproject(&Point2d::new(bbox.x_min(), bbox.y_min()))?;
        let north_east: GeoPoint2d =
            projection.unproject(&Point2d::new(bbox.x_max(), bbox.y_max()))?;

        Some(Rect::new(
            south_west.lon(),
            south_west.lat(),
            north_east.lon(),
            north_east.lat(),
        ))
    }

    /// Moves the view by `delta` map units.
    pub fn translate(&self, delta: Vector2<f64>) -> Self {
        self.with_center(self.center + delta)
    }

    /// Multiplies the resolution by `factor` keeping `base_point` (in map coordinates) at the same
    /// place on the screen.
    pub fn zoom(&self, factor: f64, base_point: Point2d) -> Self {
        let center = base_point + (self.center - base_point) * factor;
        Self {
            center,
            resolution: self.resolution * factor,
            ..self.clone()
        }
    }
}

/// Resolution of the fractional zoom level.
pub fn resolution_for_zoom(zoom: f64) -> f64 {
    TOP_RESOLUTION / 2f64.powf(zoom)
}

/// Fractional zoom level of the resolution.
pub fn zoom_for_resolution(resolution: f64) -> f64 {
    (TOP_RESOLUTION / resolution).log2()
}

/// Limits for the views a map accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewConstraints {
    /// Minimum zoom level.
    pub min_zoom: Option<f64>,
    /// Maximum zoom level.
    pub max_zoom: Option<f64>,
    /// Area the view must stay in.
    pub extent: Option<Rect>,
    /// If true, only the center of the view is kept inside `extent`, otherwise the whole view
    /// area is.
    #[serde(default)]
    pub constrain_only_center: bool,
}

impl ViewConstraints {
    /// Returns the view adjusted to satisfy the constraints.
    pub fn constrain(&self, view: MapView) -> MapView {
        let mut view = view;
        let zoom = view.zoom_level();
        if let Some(min_zoom) = self.min_zoom.filter(|min| zoom < *min) {
            view = view.with_zoom(min_zoom);
        } else if let Some(max_zoom) = self.max_zoom.filter(|max| zoom > *max) {
            view = view.with_zoom(max_zoom);
        }

        let Some(extent) = self.extent else {
            return view;
        };

        let (half_width, half_height) = if self.constrain_only_center {
            (0.0, 0.0)
        } else {
            (
                view.size.half_width() * view.resolution,
                view.size.half_height() * view.resolution,
            )
        };

        let clamp = |value: f64, min: f64, max: f64| {
            if min > max {
                (min + max) / 2.0
            } else {
                value.clamp(min, max)
            }
        };

        let center = Point2d::new(
            clamp(
                view.center.x,
                extent.x_min() + half_width,
                extent.x_max() - half_width,
            ),
            clamp(
                view.center.y,
                extent.y_min() + half_height,
                extent.y_max() - half_height,
            ),
        );

        view.with_center(center)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn zoom_and_resolution() {
        let view = MapView::from_zoom(Point2d::new(0.0, 0.0), 0.0);
        assert_relative_eq!(view.resolution(), TOP_RESOLUTION);

        let view = view.with_zoom(6.1);
        assert_relative_eq!(view.zoom_level(), 6.1, epsilon = 1e-9);
        assert_relative_eq!(view.resolution(), TOP_RESOLUTION / 2f64.powf(6.1));
    }

    #[test]
    fn bbox() {
        let view = MapView::new(Point2d::new(100.0, 200.0), 2.0).with_size(Size::new(100.0, 50.0));
        assert_eq!(view.get_bbox(), Some(Rect::new(0.0, 150.0, 200.0, 250.0)));

        assert_eq!(MapView::new(Point2d::new(0.0, 0.0), 1.0).get_bbox(), None);
    }

    #[test]
    fn geo_bbox_of_the_world() {
        let view = MapView::from_zoom(Point2d::new(0.0, 0.0), 0.0).with_size(Size::new(256.0, 256.0));
        let bbox = view.geo_bbox().expect("view has size");
        assert_relative_eq!(bbox.x_min(), -180.0, epsilon = 1e-6);
        assert_relative_eq!(bbox.x_max(), 180.0, epsilon = 1e-6);
        assert_relative_eq!(bbox.y_max(), 85.051_128_78, epsilon = 1e-6);
    }

    #[test]
    fn zoom_keeps_base_point() {
        let view = MapView::new(Point2d::new(10.0, 10.0), 4.0);
        let zoomed = view.zoom(0.5, Point2d::new(0.0, 0.0));
        assert_eq!(zoomed.center(), Point2d::new(5.0, 5.0));
        assert_relative_eq!(zoomed.resolution(), 2.0);
    }

    #[test]
    fn constraints() {
        let constraints = ViewConstraints {
            min_zoom: Some(6.0),
            max_zoom: Some(10.0),
            extent: Some(Rect::new(0.0, 0.0, 1000.0, 1000.0)),
            constrain_only_center: true,
        };

        let view = constraints.constrain(MapView::from_zoom(Point2d::new(-50.0, 500.0), 3.0));
        assert_relative_eq!(view.zoom_level(), 6.0, epsilon = 1e-9);
        assert_eq!(view.center(), Point2d::new(0.0, 500.0));

        let view = constraints.constrain(MapView::from_zoom(Point2d::new(10.0, 20.0), 12.0));
        assert_relative_eq!(view.zoom_level(), 10.0, epsilon = 1e-9);
        assert_eq!(view.center(), Point2d::new(10.0, 20.0));

        let whole_view = ViewConstraints {
            constrain_only_center: false,
            min_zoom: None,
            max_zoom: None,
            ..constraints
        };
        let view = whole_view.constrain(
            MapView::new(Point2d::new(10.0, 990.0), 1.0).with_size(Size::new(100.0, 100.0)),
        );
        assert_eq!(view.center(), Point2d::new(50.0, 950.0));
    }
}
