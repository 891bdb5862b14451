//! Styles of features: what stroke, fill and point marker a feature is drawn with.
//!
//! Styles are looked up by [`GeometryKind`] in a [`StyleRegistry`]. A registry holds a default
//! [`StyleSet`] and any number of dataset-specific sets. A dataset set only needs to define the
//! kinds it wants to change, the rest fall back to the default set.

use std::collections::{BTreeMap, HashMap};

use hazardmap_types::GeometryKind;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::HazardMapError;

mod palette;

/// Name of the style set that overrides the default set in [`StyleRegistry::with_overrides`].
pub const DEFAULT_SET_NAME: &str = "default";

/// Line drawing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Color of the line.
    pub color: Color,
    /// Width of the line in pixels.
    #[serde(default = "default_width")]
    pub width: f64,
    /// Dash pattern in pixels: lengths of dashes and gaps. Empty for solid lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
}

fn default_width() -> f64 {
    1.0
}

impl StrokeStyle {
    /// Solid line.
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            dash: vec![],
        }
    }

    /// Dashed line.
    pub fn dashed(color: Color, width: f64, dash: Vec<f64>) -> Self {
        Self { color, width, dash }
    }
}

/// Circle marker drawn at point positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    /// Radius in pixels.
    pub radius: f64,
    /// Fill of the circle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    /// Outline of the circle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeStyle>,
}

/// Style of a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    /// Lines and outlines of areas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeStyle>,
    /// Fill of areas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    /// Marker for points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<PointMarker>,
}

/// Styles by geometry kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSet(BTreeMap<GeometryKind, StyleDescriptor>);

impl StyleSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a style for the kind, replacing the previous one.
    pub fn with(mut self, kind: GeometryKind, style: StyleDescriptor) -> Self {
        self.insert(kind, style);
        self
    }

    /// Adds a style for the kind, replacing the previous one.
    pub fn insert(&mut self, kind: GeometryKind, style: StyleDescriptor) {
        self.0.insert(kind, style);
    }

    /// Style for the kind.
    pub fn get(&self, kind: GeometryKind) -> Option<&StyleDescriptor> {
        self.0.get(&kind)
    }

    /// Returns true if the set has a style for the kind.
    pub fn contains(&self, kind: GeometryKind) -> bool {
        self.0.contains_key(&kind)
    }

    /// Copies all styles of `other` into this set.
    pub fn merge(&mut self, other: &StyleSet) {
        for (kind, style) in &other.0 {
            self.0.insert(*kind, style.clone());
        }
    }
}

/// Which dataset style set a layer uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSelector {
    dataset: Option<String>,
}

impl StyleSelector {
    /// Use only the default set.
    pub fn default_set() -> Self {
        Self { dataset: None }
    }

    /// Use the set of the dataset, falling back to the default set.
    pub fn dataset(name: impl Into<String>) -> Self {
        Self {
            dataset: Some(name.into()),
        }
    }

    /// Name of the dataset set.
    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset.as_deref()
    }
}

/// Set of styles the viewer draws features with.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    default: StyleSet,
    datasets: HashMap<String, StyleSet>,
}

impl Default for StyleRegistry {
    /// Registry with the built-in palette: the default set and the `flood`, `fire` and `roads`
    /// dataset sets.
    fn default() -> Self {
        Self {
            default: palette::default_set(),
            datasets: HashMap::from([
                ("flood".to_string(), palette::flood_set()),
                ("fire".to_string(), palette::fire_set()),
                ("roads".to_string(), palette::roads_set()),
            ]),
        }
    }
}

impl StyleRegistry {
    /// Creates a registry with the given default set and no dataset sets.
    pub fn new(default: StyleSet) -> Self {
        Self {
            default,
            datasets: HashMap::new(),
        }
    }

    /// Applies overrides from configuration: every set is merged into the dataset set with the
    /// same name (created if missing). The set named [`DEFAULT_SET_NAME`] is merged into the
    /// default set.
    pub fn with_overrides<'a>(
        mut self,
        overrides: impl IntoIterator<Item = (&'a String, &'a StyleSet)>,
    ) -> Self {
        for (name, set) in overrides {
            if name == DEFAULT_SET_NAME {
                self.default.merge(set);
            } else {
                self.datasets.entry(name.clone()).or_default().merge(set);
            }
        }

        self
    }

    /// The default set.
    pub fn default_set(&self) -> &StyleSet {
        &self.default
    }

    /// Style set of the dataset.
    pub fn dataset_set(&self, name: &str) -> Option<&StyleSet> {
        self.datasets.get(name)
    }

    /// Finds the style for a feature of the given kind.
    ///
    /// The dataset set of the selector is checked first, then the default set. If neither
    /// defines the kind, [`HazardMapError::MissingStyle`] is returned.
    pub fn resolve(
        &self,
        kind: GeometryKind,
        selector: &StyleSelector,
    ) -> Result<&StyleDescriptor, HazardMapError> {
        selector
            .dataset_name()
            .and_then(|name| self.datasets.get(name))
            .and_then(|set| set.get(kind))
            .or_else(|| self.default.get(kind))
            .ok_or_else(|| HazardMapError::MissingStyle {
                kind,
                dataset: selector.dataset.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn builtin_registry_resolves_every_kind() {
        let registry = StyleRegistry::default();
        for kind in GeometryKind::ALL {
            assert!(registry.resolve(kind, &StyleSelector::default_set()).is_ok());
            for dataset in ["flood", "fire", "roads", "unknown"] {
                assert!(registry.resolve(kind, &StyleSelector::dataset(dataset)).is_ok());
            }
        }
    }

    #[test]
    fn missing_kind_is_an_error() {
        let registry = StyleRegistry::new(StyleSet::new().with(
            GeometryKind::Point,
            StyleDescriptor::default(),
        ));
        assert!(registry
            .resolve(GeometryKind::Point, &StyleSelector::default_set())
            .is_ok());
        assert_matches!(
            registry.resolve(GeometryKind::Polygon, &StyleSelector::dataset("flood")),
            Err(HazardMapError::MissingStyle { kind: GeometryKind::Polygon, dataset: Some(d) }) if d == "flood"
        );
    }

    #[test]
    fn flood_polygons_use_flood_styles() {
        let registry = StyleRegistry::default();
        let flood = StyleSelector::dataset("flood");
        for kind in [GeometryKind::Polygon, GeometryKind::MultiPolygon] {
            let resolved = registry.resolve(kind, &flood).expect("style exists");
            let flood_style = registry
                .dataset_set("flood")
                .and_then(|set| set.get(kind))
                .expect("flood style exists");
            assert_eq!(resolved, flood_style);
            assert_ne!(Some(resolved), registry.default_set().get(kind));
        }

        let line = registry
            .resolve(GeometryKind::LineString, &flood)
            .expect("style exists");
        assert_eq!(Some(line), registry.default_set().get(GeometryKind::LineString));
    }

    #[test]
    fn overrides_are_merged() {
        let overrides = HashMap::from([
            (
                DEFAULT_SET_NAME.to_string(),
                StyleSet::new().with(
                    GeometryKind::Point,
                    StyleDescriptor {
                        fill: Some(Color::BLACK),
                        ..Default::default()
                    },
                ),
            ),
            (
                "rest_stops".to_string(),
                StyleSet::new().with(GeometryKind::Point, StyleDescriptor::default()),
            ),
        ]);

        let registry = StyleRegistry::default().with_overrides(&overrides);
        let point = registry
            .resolve(GeometryKind::Point, &StyleSelector::default_set())
            .expect("style exists");
        assert_eq!(point.fill, Some(Color::BLACK));
        assert!(registry.dataset_set("rest_stops").is_some());
        assert!(registry
            .resolve(GeometryKind::Polygon, &StyleSelector::dataset("rest_stops"))
            .is_ok());
    }

    #[test]
    fn style_set_from_json() {
        let set: StyleSet = serde_json::from_str(
            r##"{
                "Polygon": {"stroke": {"color": "rgba(0, 0, 255, 1)", "width": 2, "dash": [4]}, "fill": "#0000FF1A"},
                "Point": {"point": {"radius": 5, "stroke": {"color": "red"}}}
            }"##,
        )
        .expect("valid style set");

        let polygon = set.get(GeometryKind::Polygon).expect("polygon style");
        assert_eq!(
            polygon.stroke,
            Some(StrokeStyle::dashed(Color::BLUE, 2.0, vec![4.0]))
        );
        let point = set.get(GeometryKind::Point).expect("point style");
        assert_eq!(point.point.as_ref().map(|p| p.radius), Some(5.0));
        assert_eq!(
            point.point.as_ref().and_then(|p| p.stroke.as_ref()).map(|s| s.width),
            Some(1.0)
        );
    }
}
