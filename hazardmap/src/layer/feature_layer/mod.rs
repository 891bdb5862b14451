//! [`FeatureLayer`] draws an in-memory set of features.

use std::any::Any;
use std::sync::Arc;

use hazardmap_types::cartesian::{Point2d, Rect};
use hazardmap_types::GeometryKind;

use crate::layer::attribution::Attribution;
use crate::layer::Layer;
use crate::render::Canvas;
use crate::style::{StyleRegistry, StyleSelector};
use crate::view::MapView;

mod feature;
pub(crate) mod styler;

pub use feature::{Feature, Properties};
use styler::FeatureStyler;

/// Layer with a set of features stored in memory.
///
/// Features are drawn in the order they are stored, each with the style its geometry kind has in
/// the layer's dataset style set. Only features whose bounding box intersects the view are
/// drawn.
#[derive(Debug)]
pub struct FeatureLayer {
    name: String,
    features: Vec<Feature>,
    bboxes: Vec<Option<Rect>>,
    styler: FeatureStyler,
    attribution: Option<Attribution>,
}

impl FeatureLayer {
    /// Creates a new layer. Features must be in the working reference of the map.
    pub fn new(
        name: impl Into<String>,
        features: Vec<Feature>,
        styles: Arc<StyleRegistry>,
        selector: StyleSelector,
    ) -> Self {
        let bboxes = features.iter().map(Feature::bbox).collect();
        Self {
            name: name.into(),
            features,
            bboxes,
            styler: FeatureStyler::new(styles, selector),
            attribution: None,
        }
    }

    /// Sets the attribution of the data source.
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = Some(attribution);
        self
    }

    /// Features of the layer.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Style set the layer uses.
    pub fn selector(&self) -> &StyleSelector {
        self.styler.selector()
    }

    /// Bounding rectangle of all features.
    pub fn bbox(&self) -> Option<Rect> {
        self.bboxes
            .iter()
            .flatten()
            .copied()
            .reduce(|acc, bbox| acc.merge(bbox))
    }

    /// Returns features whose bounding box is within `tolerance` from the point, with their
    /// indices.
    pub fn features_at(&self, point: &Point2d, tolerance: f64) -> Vec<(usize, &Feature)> {
        self.features
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                self.bboxes[*index].is_some_and(|bbox| bbox.expand(tolerance).contains(point))
            })
            .collect()
    }

    /// Geometry kinds that were skipped during rendering because no style is defined for them.
    pub fn unstyled_kinds(&self) -> Vec<GeometryKind> {
        self.styler.missing_kinds()
    }
}

impl Layer for FeatureLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, view: &MapView, canvas: &mut dyn Canvas) {
        let Some(view_bbox) = view.get_bbox() else {
            return;
        };

        for (feature, bbox) in self.features.iter().zip(&self.bboxes) {
            if bbox.is_some_and(|bbox| bbox.intersects(&view_bbox)) {
                self.styler.draw(&self.name, &feature.geometry, canvas);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn attribution(&self) -> Option<Attribution> {
        self.attribution.clone()
    }
}
