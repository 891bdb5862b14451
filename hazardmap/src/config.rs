//! Configuration of the viewer.
//!
//! The configuration is a JSON document deserialized into [`ViewerConfig`]. Every field is
//! optional, missing fields take the values of [`ViewerConfig::default`], which reproduce the
//! hazard viewer of South East Queensland: OpenStreetMap base tiles, the flood extent, the road
//! network refreshed for the visible area and the fire region of SEQ.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use hazardmap_types::cartesian::{Point2d, Rect, Size};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HazardMapError;
use crate::loader::{DataFormat, DatasetRequest, TilingOptions, KML_CRS};
use crate::refresh::RefreshOptions;
use crate::style::{StyleSelector, StyleSet};
use crate::view::ViewConstraints;
use crate::visibility::VisibilityToggles;

/// OpenStreetMap tile server.
pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Custom coordinate reference system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsDefinition {
    /// Name the datasets refer to the reference by, e.g. `EPSG:28356`.
    pub name: String,
    /// `longlat`, `webmerc` or a `geodesy` operator definition.
    pub definition: String,
}

impl CrsDefinition {
    fn new(name: &str, definition: &str) -> Self {
        Self {
            name: name.to_string(),
            definition: definition.to_string(),
        }
    }
}

/// Dataset loaded once at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Name of the layer. Visibility toggles refer to layers by this name.
    pub name: String,
    /// URL, relative to [`ViewerConfig::base_url`] or absolute, or a local path.
    pub url: String,
    /// Format of the document.
    pub format: DataFormat,
    /// Reference of the coordinates. Defaults to `EPSG:4326`.
    #[serde(default = "default_source_crs")]
    pub source_crs: String,
    /// Style set of the layer. Defaults to the set named as the dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

fn default_source_crs() -> String {
    KML_CRS.to_string()
}

impl DatasetConfig {
    fn new(name: &str, url: &str, format: DataFormat, source_crs: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            format,
            source_crs: source_crs.to_string(),
            style: None,
        }
    }

    /// Load request of the dataset.
    pub fn request(&self) -> DatasetRequest {
        let style = StyleSelector::dataset(self.style.as_deref().unwrap_or(&self.name));
        DatasetRequest::new(self.name.clone(), self.url.clone(), self.format)
            .with_source_crs(self.source_crs.clone())
            .with_style(style)
    }
}

/// Dataset requested again for the visible area whenever the map settles.
///
/// In a configuration document every field is optional. Missing fields take the values of
/// [`RefreshConfig::roads`] for the `roads` entry and of [`RefreshConfig::rest_stops`] for the
/// `rest_stops` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshConfig {
    /// Endpoint the bounding box is posted to.
    pub url: String,
    /// Name of the layer.
    pub name: String,
    /// Reference of the response coordinates.
    pub source_crs: String,
    /// Style set of the layer. Defaults to the set named as the dataset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Time between refreshes.
    pub interval_ms: u64,
    /// Time the view must stay unchanged before a refresh.
    pub settle_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self::roads()
    }
}

impl RefreshConfig {
    fn new(name: &str, url: &str) -> Self {
        Self {
            url: url.to_string(),
            name: name.to_string(),
            source_crs: KML_CRS.to_string(),
            style: None,
            interval_ms: 10_000,
            settle_ms: 500,
        }
    }

    /// Road network posted to `/list_roads`.
    pub fn roads() -> Self {
        Self::new("roads", "/list_roads")
    }

    /// Rest stops posted to `/get_rest_stops`.
    pub fn rest_stops() -> Self {
        Self::new("rest_stops", "/get_rest_stops")
    }

    /// Options of the refresh loop.
    pub fn options(&self) -> RefreshOptions {
        RefreshOptions {
            source_crs: self.source_crs.clone(),
            style: StyleSelector::dataset(self.style.as_deref().unwrap_or(&self.name)),
            interval: Duration::from_millis(self.interval_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
            ..RefreshOptions::new(self.name.clone(), self.url.clone())
        }
    }
}

/// Fields of a [`RefreshConfig`] as written in a configuration document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RefreshOverrides {
    url: Option<String>,
    name: Option<String>,
    source_crs: Option<String>,
    style: Option<String>,
    interval_ms: Option<u64>,
    settle_ms: Option<u64>,
}

impl RefreshOverrides {
    fn apply(self, base: RefreshConfig) -> RefreshConfig {
        RefreshConfig {
            url: self.url.unwrap_or(base.url),
            name: self.name.unwrap_or(base.name),
            source_crs: self.source_crs.unwrap_or(base.source_crs),
            style: self.style.or(base.style),
            interval_ms: self.interval_ms.unwrap_or(base.interval_ms),
            settle_ms: self.settle_ms.unwrap_or(base.settle_ms),
        }
    }
}

fn roads_refresh<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RefreshConfig>, D::Error> {
    let overrides = Option::<RefreshOverrides>::deserialize(deserializer)?;
    Ok(overrides.map(|o| o.apply(RefreshConfig::roads())))
}

fn rest_stops_refresh<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<RefreshConfig>, D::Error> {
    let overrides = Option::<RefreshOverrides>::deserialize(deserializer)?;
    Ok(overrides.map(|o| o.apply(RefreshConfig::rest_stops())))
}

/// Configuration of a [`HazardViewer`](crate::viewer::HazardViewer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// URL relative dataset locations are resolved against.
    pub base_url: Option<String>,
    /// Template of the base map tile URLs with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    /// Initial center of the map in Web Mercator meters.
    pub center: [f64; 2],
    /// Initial zoom level. Can be fractional.
    pub zoom: f64,
    /// Minimum zoom level.
    pub min_zoom: Option<f64>,
    /// Maximum zoom level.
    pub max_zoom: Option<f64>,
    /// Area the map view is kept in, in Web Mercator meters.
    pub extent: Option<Rect>,
    /// Keep only the center of the view inside `extent`.
    pub constrain_only_center: bool,
    /// Size of the map in pixels.
    pub size: Size,
    /// Delay between the start of the viewer and the dataset loads.
    pub startup_delay_ms: u64,
    /// Timeout of a single request.
    pub request_timeout_ms: u64,
    /// References in addition to the built-in `EPSG:3857` and `EPSG:4326`.
    pub crs_definitions: Vec<CrsDefinition>,
    /// Datasets loaded at start-up. A dataset named as a refreshed dataset is skipped, the
    /// refresh loop owns that layer.
    pub datasets: Vec<DatasetConfig>,
    /// Road network refreshed for the visible area.
    #[serde(deserialize_with = "roads_refresh")]
    pub roads: Option<RefreshConfig>,
    /// Rest stops refreshed for the visible area. Disabled unless configured.
    #[serde(deserialize_with = "rest_stops_refresh")]
    pub rest_stops: Option<RefreshConfig>,
    /// Style overrides by set name. `default` overrides the default set.
    pub styles: HashMap<String, StyleSet>,
    /// When datasets are tiled.
    pub tiling: TilingOptions,
    /// Initial state of the visibility toggles.
    pub toggles: VisibilityToggles,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            tile_url: OSM_TILE_URL.to_string(),
            center: [16_305_945.737_502_75, -2_206_013.719_116_517_3],
            zoom: 6.1,
            min_zoom: None,
            max_zoom: None,
            extent: None,
            constrain_only_center: false,
            size: Size::new(1024.0, 768.0),
            startup_delay_ms: 3_000,
            request_timeout_ms: 30_000,
            crs_definitions: vec![
                CrsDefinition::new("EPSG:4283", "longlat"),
                CrsDefinition::new("EPSG:28356", "utm zone=56 south"),
            ],
            datasets: vec![
                DatasetConfig::new("flood", "data/flood-extent.kml", DataFormat::Kml, KML_CRS),
                DatasetConfig::new(
                    "fire",
                    "/data/fire/SouthEastQueenslandRegion.geojson",
                    DataFormat::GeoJson,
                    "EPSG:4283",
                ),
            ],
            roads: Some(RefreshConfig::roads()),
            rest_stops: None,
            styles: HashMap::new(),
            tiling: TilingOptions::default(),
            toggles: VisibilityToggles::default(),
        }
    }
}

impl ViewerConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, HazardMapError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| HazardMapError::Config(format!("failed to parse config: {err}")))?;
        config.validate()?;

        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, HazardMapError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Initial center of the map.
    pub fn center(&self) -> Point2d {
        Point2d::new(self.center[0], self.center[1])
    }

    /// Limits of the map view.
    pub fn constraints(&self) -> ViewConstraints {
        ViewConstraints {
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            extent: self.extent,
            constrain_only_center: self.constrain_only_center,
        }
    }

    /// Delay before the datasets are loaded.
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    /// Timeout of a single request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Datasets refreshed for the visible area.
    pub fn refreshed(&self) -> impl Iterator<Item = &RefreshConfig> {
        self.roads.iter().chain(self.rest_stops.iter())
    }

    /// Start-up datasets, except those named as a refreshed dataset.
    pub fn startup_datasets(&self) -> impl Iterator<Item = &DatasetConfig> {
        self.datasets
            .iter()
            .filter(|dataset| !self.refreshed().any(|r| r.name == dataset.name))
    }

    /// Checks the values that cannot be checked by parsing.
    pub fn validate(&self) -> Result<(), HazardMapError> {
        if !self.center.iter().all(|v| v.is_finite()) || !self.zoom.is_finite() {
            return Err(HazardMapError::Config(
                "center and zoom must be finite numbers".into(),
            ));
        }

        if let (Some(min), Some(max)) = (self.min_zoom, self.max_zoom) {
            if min > max {
                return Err(HazardMapError::Config(format!(
                    "min zoom {min} is larger than max zoom {max}"
                )));
            }
        }

        if self.request_timeout_ms == 0 {
            return Err(HazardMapError::Config(
                "request timeout must be positive".into(),
            ));
        }

        let mut refreshed_names = Vec::new();
        for refresh in self.refreshed() {
            if refresh.name.is_empty() {
                return Err(HazardMapError::Config(format!(
                    "refreshed dataset at '{}' has no name",
                    refresh.url
                )));
            }
            if refreshed_names.contains(&refresh.name.as_str()) {
                return Err(HazardMapError::Config(format!(
                    "dataset '{}' is refreshed twice",
                    refresh.name
                )));
            }
            refreshed_names.push(refresh.name.as_str());

            if refresh.interval_ms == 0 || refresh.settle_ms == 0 {
                return Err(HazardMapError::Config(format!(
                    "refresh interval and settle delay of '{}' must be positive",
                    refresh.name
                )));
            }
        }

        if let Some(dataset) = self.datasets.iter().find(|d| d.name.is_empty()) {
            return Err(HazardMapError::Config(format!(
                "dataset at '{}' has no name",
                dataset.url
            )));
        }

        self.tiling
            .index
            .validate()
            .map_err(|err| HazardMapError::Config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    use hazardmap_types::GeometryKind;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.refreshed().count(), 1);
        assert_eq!(config.startup_datasets().count(), 2);
        assert!(config.datasets.iter().all(|d| d.name != "roads"));
        assert_relative_eq!(config.center().x, 16_305_945.737_502_75);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{
                "base_url": "http://localhost:8080/",
                "zoom": 8,
                "roads": {"interval_ms": 2000},
                "datasets": [{"name": "flood", "url": "flood.kml", "format": "kml"}]
            }"#,
        )
        .expect("valid config");

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/"));
        assert_relative_eq!(config.zoom, 8.0);
        assert_eq!(config.tile_url, OSM_TILE_URL);

        let roads = config.roads.as_ref().expect("roads");
        assert_eq!(roads.url, "/list_roads");
        assert_eq!(roads.options().interval, Duration::from_secs(2));
        assert_eq!(roads.options().settle_delay, Duration::from_millis(500));

        let request = config.datasets[0].request();
        assert_eq!(request.format, DataFormat::Kml);
        assert_eq!(request.source_crs, "EPSG:4326");
        assert_eq!(request.style, StyleSelector::dataset("flood"));
    }

    #[test]
    fn roads_refresh_can_be_disabled() {
        let config = ViewerConfig::from_json_str(r#"{"roads": null}"#).expect("valid config");
        assert_eq!(config.refreshed().count(), 0);
    }

    #[test]
    fn rest_stops_take_own_defaults() {
        let config = ViewerConfig::from_json_str(r#"{"rest_stops": {"interval_ms": 5000}}"#)
            .expect("valid config");

        let rest_stops = config.rest_stops.as_ref().expect("rest stops");
        assert_eq!(rest_stops.name, "rest_stops");
        assert_eq!(rest_stops.url, "/get_rest_stops");
        assert_eq!(rest_stops.interval_ms, 5000);
        assert_eq!(rest_stops.settle_ms, 500);

        let roads = config.roads.as_ref().expect("roads");
        assert_eq!(roads.name, "roads");
        assert_eq!(config.refreshed().count(), 2);
    }

    #[test]
    fn refreshed_names_must_be_unique() {
        assert_matches!(
            ViewerConfig::from_json_str(r#"{"rest_stops": {"name": "roads"}}"#),
            Err(HazardMapError::Config(msg)) if msg.contains("roads")
        );
        assert_matches!(
            ViewerConfig::from_json_str(r#"{"roads": {"name": ""}}"#),
            Err(HazardMapError::Config(_))
        );
    }

    #[test]
    fn startup_datasets_skip_refreshed_names() {
        let config = ViewerConfig::from_json_str(
            r#"{"datasets": [
                {"name": "flood", "url": "flood.kml", "format": "kml"},
                {"name": "roads", "url": "roads.geojson", "format": "geojson"}
            ]}"#,
        )
        .expect("valid config");

        let names: Vec<_> = config.startup_datasets().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["flood"]);
    }

    #[test]
    fn style_overrides_are_parsed() {
        let config = ViewerConfig::from_json_str(
            r##"{"styles": {"flood": {"Polygon": {"fill": "#00FF0080"}}}}"##,
        )
        .expect("valid config");

        assert!(config.styles["flood"].contains(GeometryKind::Polygon));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_matches!(
            ViewerConfig::from_json_str(r#"{"min_zoom": 10, "max_zoom": 5}"#),
            Err(HazardMapError::Config(_))
        );
        assert_matches!(
            ViewerConfig::from_json_str(r#"{"roads": {"settle_ms": 0}}"#),
            Err(HazardMapError::Config(_))
        );
        assert_matches!(
            ViewerConfig::from_json_str(r#"{"tiling": {"extent": 0}}"#),
            Err(HazardMapError::Config(_))
        );
        assert_matches!(
            ViewerConfig::from_json_str(r#"{"zoom": "far"}"#),
            Err(HazardMapError::Config(_))
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        assert_matches!(
            ViewerConfig::from_file("/nonexistent/hazardmap.json"),
            Err(HazardMapError::FsIo(_))
        );
    }
}
