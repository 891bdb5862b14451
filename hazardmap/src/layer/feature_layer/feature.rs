use hazardmap_types::cartesian::{Point2d, Rect};
use hazardmap_types::{Geom, GeometryKind};
use serde_json::{Map, Value};

/// Attribute record of a feature.
pub type Properties = Map<String, Value>;

/// One geometry with its attributes, as read from a KML or GeoJSON document.
///
/// The geometry is stored in the working reference of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifier of the feature in the source document.
    pub id: Option<String>,
    /// Geometry of the feature.
    pub geometry: Geom<Point2d>,
    /// Attributes of the feature.
    pub properties: Properties,
}

impl Feature {
    /// Creates a feature without attributes.
    pub fn new(geometry: Geom<Point2d>) -> Self {
        Self {
            id: None,
            geometry,
            properties: Properties::new(),
        }
    }

    /// Sets the attributes of the feature.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Kind of the feature geometry.
    pub fn kind(&self) -> GeometryKind {
        self.geometry.kind()
    }

    /// Attribute value by name.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Bounding rectangle of the geometry.
    pub fn bbox(&self) -> Option<Rect> {
        self.geometry.bounding_rect()
    }
}
