use std::collections::HashSet;
use std::sync::Arc;

use hazardmap_types::cartesian::Point2d;
use hazardmap_types::{Geom, GeometryKind};
use parking_lot::Mutex;

use crate::render::Canvas;
use crate::style::{StyleRegistry, StyleSelector};

/// Resolves styles of a layer's features and draws them.
///
/// A feature of a kind the registry has no style for is skipped. The problem is reported once
/// per layer and kind, not on every frame.
pub(crate) struct FeatureStyler {
    styles: Arc<StyleRegistry>,
    selector: StyleSelector,
    reported_missing: Mutex<HashSet<GeometryKind>>,
}

impl FeatureStyler {
    pub(crate) fn new(styles: Arc<StyleRegistry>, selector: StyleSelector) -> Self {
        Self {
            styles,
            selector,
            reported_missing: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn selector(&self) -> &StyleSelector {
        &self.selector
    }

    /// Returns `false` if the feature was not drawn.
    pub(crate) fn draw(
        &self,
        layer_name: &str,
        geometry: &Geom<Point2d>,
        canvas: &mut dyn Canvas,
    ) -> bool {
        self.draw_as(layer_name, geometry.kind(), geometry, canvas)
    }

    /// Draws the geometry with the style of `kind` instead of the style of its own kind.
    pub(crate) fn draw_as(
        &self,
        layer_name: &str,
        kind: GeometryKind,
        geometry: &Geom<Point2d>,
        canvas: &mut dyn Canvas,
    ) -> bool {
        match self.styles.resolve(kind, &self.selector) {
            Ok(style) => {
                canvas.draw_feature(geometry, style);
                true
            }
            Err(err) => {
                if self.reported_missing.lock().insert(kind) {
                    log::warn!("Layer '{layer_name}': {err}, such features are not drawn");
                }

                false
            }
        }
    }

    pub(crate) fn missing_kinds(&self) -> Vec<GeometryKind> {
        let mut kinds: Vec<_> = self.reported_missing.lock().iter().copied().collect();
        kinds.sort();
        kinds
    }
}

impl std::fmt::Debug for FeatureStyler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureStyler")
            .field("selector", &self.selector)
            .finish()
    }
}
