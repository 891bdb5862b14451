//! Loading of datasets into map layers.
//!
//! [`LayerLoader`] fetches a document through the [`PlatformService`], decodes it, converts the
//! coordinates into the working reference of the map and builds a layer for it. Small datasets
//! become a [`FeatureLayer`], datasets with many vertices are tiled and become a
//! [`TiledFeatureLayer`].
//!
//! [`LayerLoader::spawn`] runs the load as a `tokio` task and installs the layer into the map
//! when it is ready. A failed load never changes the map: the error is logged and reported to
//! the [`LoadObserver`].

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use hazardmap_types::geo::CrsRegistry;
use hazardmap_vt::IndexOptions;
use log::{debug, info, warn};
use parking_lot::RwLock;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::HazardMapError;
use crate::layer::{FeatureLayer, Layer, TiledFeatureLayer};
use crate::map::MapHandle;
use crate::platform::{DataRequest, PlatformService};
use crate::style::{StyleRegistry, StyleSelector};
use crate::visibility::{VisibilityController, VisibilityToggles};

mod handle;
mod parse;

pub use handle::{LoadHandle, LoadOutcome, LoadSequence};
use handle::InFlightGuard;
use parse::{parse_geojson, parse_kml, ParsedDataset};

/// Reference the map works in.
pub const WORKING_CRS: &str = "EPSG:3857";
/// Reference of KML coordinates.
pub const KML_CRS: &str = "EPSG:4326";

/// Format of a dataset document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    /// KML document.
    Kml,
    /// GeoJSON document.
    GeoJson,
}

/// How a loaded layer is added to the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMode {
    /// Add the layer to the end of the list, even if there are layers with the same name.
    #[default]
    Append,
    /// Replace all layers with the same name.
    ReplaceByName,
}

/// Description of a dataset to load.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRequest {
    /// Logical name of the layer.
    pub name: String,
    /// URL (absolute or relative to the base URL of the loader) or local path of the document.
    pub location: String,
    /// Format of the document.
    pub format: DataFormat,
    /// Reference of the coordinates in the document. A GeoJSON document can override it with
    /// its own `crs` member.
    pub source_crs: String,
    /// Style set of the layer.
    pub style: StyleSelector,
    /// JSON body to `POST` to the location. `GET` is used if not set.
    pub body: Option<Value>,
    /// How the layer is added to the map.
    pub mode: InstallMode,
}

impl DatasetRequest {
    /// Request of a document in WGS84 coordinates, styled with the dataset style set of the same
    /// name and appended to the map.
    pub fn new(name: impl Into<String>, location: impl Into<String>, format: DataFormat) -> Self {
        let name = name.into();
        Self {
            style: StyleSelector::dataset(name.clone()),
            name,
            location: location.into(),
            format,
            source_crs: KML_CRS.to_string(),
            body: None,
            mode: InstallMode::Append,
        }
    }

    /// Sets the reference of the document coordinates.
    pub fn with_source_crs(mut self, crs: impl Into<String>) -> Self {
        self.source_crs = crs.into();
        self
    }

    /// Sets the style set.
    pub fn with_style(mut self, style: StyleSelector) -> Self {
        self.style = style;
        self
    }

    /// Sets the body to `POST`.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the install mode.
    pub fn with_mode(mut self, mode: InstallMode) -> Self {
        self.mode = mode;
        self
    }
}

/// When a dataset is tiled instead of being drawn as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingOptions {
    /// Datasets with more vertices than this are tiled.
    pub threshold: usize,
    /// Parameters of the tiling index.
    #[serde(flatten)]
    pub index: IndexOptions,
}

impl Default for TilingOptions {
    fn default() -> Self {
        Self {
            threshold: 10_000,
            index: IndexOptions::default(),
        }
    }
}

/// Receives notifications about loads. This is how the UI shows a loading indicator and errors.
pub trait LoadObserver: Send + Sync {
    /// The first load started while no other load was in progress.
    fn loading_started(&self) {}
    /// The last load in progress has ended.
    fn loading_finished(&self) {}
    /// A layer was added to the map.
    fn layer_installed(&self, _name: &str) {}
    /// A load failed. Called exactly once per failed load.
    fn load_failed(&self, name: &str, error: &HazardMapError);
}

/// Observer that ignores all notifications. Failures are still logged by the loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl LoadObserver for SilentObserver {
    fn load_failed(&self, _name: &str, _error: &HazardMapError) {}
}

/// Loads datasets into layers. Cloning is cheap, clones share all the state.
#[derive(Clone)]
pub struct LayerLoader {
    platform: Arc<dyn PlatformService>,
    crs_registry: Arc<CrsRegistry>,
    styles: Arc<StyleRegistry>,
    tiling: TilingOptions,
    base_url: Option<Url>,
    toggles: Arc<RwLock<VisibilityToggles>>,
    observer: Arc<dyn LoadObserver>,
    in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for LayerLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerLoader")
            .field("tiling", &self.tiling)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LayerLoader {
    /// Creates a loader with default tiling options, no base URL, default toggles and a
    /// [`SilentObserver`].
    pub fn new(
        platform: Arc<dyn PlatformService>,
        crs_registry: Arc<CrsRegistry>,
        styles: Arc<StyleRegistry>,
    ) -> Self {
        Self {
            platform,
            crs_registry,
            styles,
            tiling: TilingOptions::default(),
            base_url: None,
            toggles: Arc::new(RwLock::new(VisibilityToggles::default())),
            observer: Arc::new(SilentObserver),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sets the tiling options.
    pub fn with_tiling(mut self, tiling: TilingOptions) -> Self {
        self.tiling = tiling;
        self
    }

    /// Sets the URL relative dataset locations are resolved against.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, HazardMapError> {
        let url = Url::parse(base_url).map_err(|err| {
            HazardMapError::Config(format!("invalid base url '{base_url}': {err}"))
        })?;
        self.base_url = Some(url);
        Ok(self)
    }

    /// Sets the toggles applied to the map after every installed layer.
    pub fn with_toggles(mut self, toggles: Arc<RwLock<VisibilityToggles>>) -> Self {
        self.toggles = toggles;
        self
    }

    /// Sets the observer of the loads.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Toggles applied to the map after every installed layer.
    pub fn toggles(&self) -> &Arc<RwLock<VisibilityToggles>> {
        &self.toggles
    }

    /// Resolves the location of a dataset into an absolute URL or a local path.
    pub fn resolve_location(&self, location: &str) -> Result<String, HazardMapError> {
        if location.contains("://") || std::path::Path::new(location).is_absolute() {
            return Ok(location.to_string());
        }

        match &self.base_url {
            Some(base) => base.join(location).map(String::from).map_err(|err| {
                HazardMapError::Config(format!("invalid dataset location '{location}': {err}"))
            }),
            None => Ok(location.to_string()),
        }
    }

    /// Loads the dataset and builds a layer for it. The map is not changed.
    pub async fn load(&self, request: &DatasetRequest) -> Result<Box<dyn Layer>, HazardMapError> {
        let url = self.resolve_location(&request.location)?;
        let data_request = match &request.body {
            Some(body) => DataRequest::post(url, body.clone()),
            None => DataRequest::get(url),
        };

        debug!("Loading dataset '{}' from {}", request.name, data_request.url);
        let bytes = self.platform.fetch(&data_request).await?;
        self.build_layer(request, &bytes)
    }

    fn build_layer(
        &self,
        request: &DatasetRequest,
        bytes: &[u8],
    ) -> Result<Box<dyn Layer>, HazardMapError> {
        let (mut parsed, source_crs) = match request.format {
            DataFormat::Kml => (parse_kml(bytes)?, KML_CRS.to_string()),
            DataFormat::GeoJson => {
                let parsed = parse_geojson(bytes)?;
                let source_crs = self.source_crs(request, parsed.declared_crs.as_deref())?;
                (parsed, source_crs)
            }
        };

        if parsed.skipped > 0 {
            warn!(
                "Dataset '{}': skipped {} features with missing or invalid geometry",
                request.name, parsed.skipped
            );
        }

        self.reproject(request, &mut parsed, &source_crs)?;

        let vertex_count = parsed.vertex_count();
        let layer: Box<dyn Layer> = if vertex_count > self.tiling.threshold {
            debug!(
                "Dataset '{}' has {vertex_count} vertices, building tiling index",
                request.name
            );
            Box::new(TiledFeatureLayer::new(
                request.name.clone(),
                parsed.features,
                self.tiling.index,
                self.styles.clone(),
                request.style.clone(),
            )?)
        } else {
            Box::new(FeatureLayer::new(
                request.name.clone(),
                parsed.features,
                self.styles.clone(),
                request.style.clone(),
            ))
        };

        Ok(layer)
    }

    /// Reference of the document coordinates: the one declared by the document if any,
    /// otherwise the one of the request. Both must be registered.
    fn source_crs(
        &self,
        request: &DatasetRequest,
        declared: Option<&str>,
    ) -> Result<String, HazardMapError> {
        let requested = self
            .crs_registry
            .get(&request.source_crs)
            .ok_or_else(|| hazardmap_types::TypesError::UnknownCrs(request.source_crs.clone()))?;

        let Some(declared) = declared else {
            return Ok(request.source_crs.clone());
        };

        let declared_crs = self
            .crs_registry
            .get(declared)
            .ok_or_else(|| hazardmap_types::TypesError::UnknownCrs(declared.to_string()))?;
        if declared_crs != requested {
            warn!(
                "Dataset '{}' declares reference {declared}, but {} was requested. Using {declared}",
                request.name, request.source_crs
            );
        }

        Ok(declared.to_string())
    }

    fn reproject(
        &self,
        request: &DatasetRequest,
        parsed: &mut ParsedDataset,
        source_crs: &str,
    ) -> Result<(), HazardMapError> {
        let transform = self.crs_registry.transformer(source_crs, WORKING_CRS)?;
        if transform.is_identity() {
            return Ok(());
        }

        let count = parsed.features.len();
        parsed.features.retain_mut(|feature| match feature.geometry.project(&transform) {
            Ok(projected) => {
                feature.geometry = projected;
                true
            }
            Err(err) => {
                debug!("Feature of dataset '{}' dropped: {err}", request.name);
                false
            }
        });

        let dropped = count - parsed.features.len();
        if dropped > 0 {
            warn!(
                "Dataset '{}': {dropped} features cannot be converted from {source_crs} into \
                 {WORKING_CRS}",
                request.name
            );
        }

        Ok(())
    }

    /// Starts loading the dataset in background and installs the layer into the map when it is
    /// ready.
    ///
    /// Must be called within a `tokio` runtime.
    pub fn spawn(&self, map: MapHandle, request: DatasetRequest) -> LoadHandle {
        self.spawn_inner(map, request, None)
    }

    /// Same as [`LayerLoader::spawn`], but the layer is installed only if no other load of the
    /// `sequence` was started before this one completes.
    pub fn spawn_sequenced(
        &self,
        map: MapHandle,
        request: DatasetRequest,
        sequence: &LoadSequence,
    ) -> LoadHandle {
        let ticket = sequence.next();
        self.spawn_inner(map, request, Some((sequence.clone(), ticket)))
    }

    fn spawn_inner(
        &self,
        map: MapHandle,
        request: DatasetRequest,
        sequence: Option<(LoadSequence, u64)>,
    ) -> LoadHandle {
        let loader = self.clone();
        let guard = InFlightGuard::new(self.in_flight.clone(), self.observer.clone());
        let name = request.name.clone();

        let task = tokio::spawn(async move {
            let _guard = guard;
            match loader.load(&request).await {
                Ok(layer) => loader.install(&map, layer, &request, sequence),
                Err(err) => {
                    warn!("Failed to load dataset '{}': {err}", request.name);
                    loader.observer.load_failed(&request.name, &err);
                    LoadOutcome::Failed(err)
                }
            }
        });

        LoadHandle::new(name, task)
    }

    fn install(
        &self,
        map: &MapHandle,
        layer: Box<dyn Layer>,
        request: &DatasetRequest,
        sequence: Option<(LoadSequence, u64)>,
    ) -> LoadOutcome {
        let toggles = self.toggles.read().clone();
        {
            let mut map = map.write();
            if let Some((sequence, ticket)) = sequence {
                if !sequence.is_current(ticket) {
                    warn!(
                        "Discarding stale result of dataset '{}' (load {ticket} of {})",
                        request.name,
                        sequence.current()
                    );
                    return LoadOutcome::Discarded;
                }
            }

            match request.mode {
                InstallMode::Append => map.layers_mut().push(layer),
                InstallMode::ReplaceByName => map.layers_mut().replace_by_name(layer),
            }
            VisibilityController::apply(&toggles, map.layers_mut());
            map.redraw();
        }

        info!("Layer '{}' is added to the map", request.name);
        self.observer.layer_installed(&request.name);
        LoadOutcome::Installed
    }
}
