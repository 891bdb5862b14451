//! Assembling a map with its datasets from a [`ViewerConfig`].

use std::sync::Arc;

use hazardmap_types::geo::CrsRegistry;
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::config::ViewerConfig;
use crate::error::HazardMapError;
use crate::layer::RasterTileLayer;
use crate::loader::{LayerLoader, LoadHandle, LoadObserver};
use crate::map::{MapBuilder, MapHandle};
use crate::messenger::Messenger;
use crate::platform::{PlatformService, PlatformServiceImpl};
use crate::refresh::{RefreshHandle, RefreshLoop};
use crate::style::StyleRegistry;
use crate::visibility::{VisibilityController, VisibilityToggles};

/// Background tasks started by [`HazardViewer::start`].
#[derive(Debug, Default)]
pub struct ViewerHandles {
    /// Loads of the start-up datasets, in configuration order.
    pub loads: Vec<LoadHandle>,
    /// Refresh loops of the datasets requested for the visible area.
    pub refreshes: Vec<RefreshHandle>,
}

impl ViewerHandles {
    /// Stops the refresh loops and cancels loads still in progress.
    pub fn stop(&self) {
        for refresh in &self.refreshes {
            refresh.stop();
        }
        for load in &self.loads {
            load.abort();
        }
    }
}

/// Hazard map viewer: the map, its base layer and the datasets drawn over it.
///
/// ```no_run
/// use hazardmap::config::ViewerConfig;
/// use hazardmap::HazardViewer;
///
/// # async fn run() -> Result<(), hazardmap::error::HazardMapError> {
/// let viewer = HazardViewer::native(ViewerConfig::default())?;
/// let handles = viewer.start().await;
///
/// viewer.toggles().write().set("roads", false);
/// viewer.update_map();
/// # handles.stop();
/// # Ok(())
/// # }
/// ```
pub struct HazardViewer {
    config: ViewerConfig,
    map: MapHandle,
    loader: LayerLoader,
    toggles: Arc<RwLock<VisibilityToggles>>,
}

impl std::fmt::Debug for HazardViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HazardViewer")
            .field("config", &self.config)
            .field("loader", &self.loader)
            .finish()
    }
}

impl HazardViewer {
    /// Creates a viewer loading data over HTTP and from the local file system.
    pub fn native(config: ViewerConfig) -> Result<Self, HazardMapError> {
        let platform = PlatformServiceImpl::new(config.request_timeout())?;
        Self::from_config(config, Arc::new(platform))
    }

    /// Creates a viewer. Nothing is loaded until [`HazardViewer::start`] is called.
    pub fn from_config(
        config: ViewerConfig,
        platform: Arc<dyn PlatformService>,
    ) -> Result<Self, HazardMapError> {
        config.validate()?;

        let mut crs_registry = CrsRegistry::with_builtins();
        for definition in &config.crs_definitions {
            crs_registry.register(&definition.name, &definition.definition)?;
        }

        let styles = StyleRegistry::default().with_overrides(&config.styles);
        let toggles = Arc::new(RwLock::new(config.toggles.clone()));

        let mut loader = LayerLoader::new(platform, Arc::new(crs_registry), Arc::new(styles))
            .with_tiling(config.tiling.clone())
            .with_toggles(toggles.clone());
        if let Some(base_url) = &config.base_url {
            loader = loader.with_base_url(base_url)?;
        }

        let base_layer = RasterTileLayer::openstreetmap(&config.tile_url)?;
        let map = MapBuilder::default()
            .with_projected_position(config.center())
            .with_zoom(config.zoom)
            .with_size(config.size)
            .with_constraints(config.constraints())
            .with_layer(base_layer)
            .build()
            .into_handle();

        Ok(Self {
            config,
            map,
            loader,
            toggles,
        })
    }

    /// Sets the observer notified about the loads of the viewer.
    pub fn with_observer(mut self, observer: Arc<dyn LoadObserver>) -> Self {
        self.loader = self.loader.with_observer(observer);
        self
    }

    /// Sets the messenger notified when the map must be redrawn.
    pub fn with_messenger(self, messenger: impl Messenger + 'static) -> Self {
        self.map.write().set_messenger(Some(messenger));
        self
    }

    /// Waits for the start-up delay, then starts loading every configured dataset and the
    /// refresh loops.
    ///
    /// Datasets are loaded independently of each other, a failure of one of them is reported
    /// to the observer and does not affect the others. A start-up dataset named as a refreshed
    /// dataset is not loaded, so that the map holds a single layer of that name.
    pub async fn start(&self) -> ViewerHandles {
        let delay = self.config.startup_delay();
        if !delay.is_zero() {
            debug!("Waiting {delay:?} before loading datasets");
            tokio::time::sleep(delay).await;
        }

        for refresh in self.config.refreshed() {
            if self.config.datasets.iter().any(|d| d.name == refresh.name) {
                warn!(
                    "Dataset '{}' is refreshed for the visible area, its start-up load is skipped",
                    refresh.name
                );
            }
        }

        let loads = self
            .config
            .startup_datasets()
            .map(|dataset| self.loader.spawn(self.map.clone(), dataset.request()))
            .collect::<Vec<_>>();

        let refreshes = self
            .config
            .refreshed()
            .map(|refresh| {
                RefreshLoop::new(self.map.clone(), self.loader.clone(), refresh.options()).start()
            })
            .collect::<Vec<_>>();

        info!(
            "Viewer started: {} datasets loading, {} refreshed datasets",
            loads.len(),
            refreshes.len()
        );

        ViewerHandles { loads, refreshes }
    }

    /// Applies the current toggles to the layers of the map and requests a redraw. Returns the
    /// number of layers the toggles apply to.
    pub fn update_map(&self) -> usize {
        let toggles = self.toggles.read().clone();
        let mut map = self.map.write();
        let count = VisibilityController::apply(&toggles, map.layers_mut());
        map.redraw();

        count
    }

    /// Map of the viewer.
    pub fn map(&self) -> &MapHandle {
        &self.map
    }

    /// Toggles shown to the user. Changes take effect on [`HazardViewer::update_map`] and on
    /// every installed layer.
    pub fn toggles(&self) -> &Arc<RwLock<VisibilityToggles>> {
        &self.toggles
    }

    /// Loader of the viewer, for datasets loaded on demand.
    pub fn loader(&self) -> &LayerLoader {
        &self.loader
    }

    /// Configuration the viewer was created with.
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;
    use crate::config::{DatasetConfig, RefreshConfig};
    use crate::layer::FeatureLayer;
    use crate::loader::{DataFormat, LoadOutcome};
    use crate::tests::{geojson_lines, FakePlatform, RecordingObserver, RedrawCounter};

    const BASE_URL: &str = "http://localhost:8080/";
    const FLOOD_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <Placemark>
      <Polygon>
        <outerBoundaryIs>
          <LinearRing>
            <coordinates>152.9,-27.5 153.1,-27.5 153.1,-27.3 152.9,-27.5</coordinates>
          </LinearRing>
        </outerBoundaryIs>
      </Polygon>
    </Placemark>
  </Document>
</kml>"#;

    fn config() -> ViewerConfig {
        ViewerConfig {
            base_url: Some(BASE_URL.to_string()),
            startup_delay_ms: 0,
            datasets: vec![
                DatasetConfig {
                    name: "flood".into(),
                    url: "data/flood-extent.kml".into(),
                    format: DataFormat::Kml,
                    source_crs: "EPSG:4326".into(),
                    style: None,
                },
                DatasetConfig {
                    name: "fire".into(),
                    url: "/data/fire/missing.geojson".into(),
                    format: DataFormat::GeoJson,
                    source_crs: "EPSG:4283".into(),
                    style: None,
                },
            ],
            roads: Some(RefreshConfig {
                interval_ms: 60_000,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn platform() -> Arc<FakePlatform> {
        Arc::new(
            FakePlatform::default()
                .with_response("http://localhost:8080/data/flood-extent.kml", FLOOD_KML)
                .with_response("http://localhost:8080/list_roads", geojson_lines(2, 3)),
        )
    }

    #[test]
    fn map_is_assembled_from_config() {
        let viewer = HazardViewer::from_config(config(), platform()).expect("valid config");
        let map = viewer.map().read();

        assert_eq!(map.layers().len(), 1);
        assert_eq!(map.layers()[0].name(), "base");
        assert!((map.view().zoom_level() - 6.1).abs() < 1e-9);
        assert_eq!(map.view().center(), viewer.config().center());
        let attributions = map.attributions();
        assert_eq!(attributions.len(), 1);
        assert_eq!(
            attributions[0].get_url(),
            Some("https://www.openstreetmap.org/copyright")
        );
    }

    #[test]
    fn invalid_crs_definition_is_rejected() {
        let mut config = config();
        config.crs_definitions.push(crate::config::CrsDefinition {
            name: "EPSG:3577".into(),
            definition: "no_such_operator lat_1=-18".into(),
        });

        assert_matches!(
            HazardViewer::from_config(config, platform()),
            Err(HazardMapError::Crs(_))
        );
    }

    #[test]
    fn invalid_tile_url_is_rejected() {
        let config = ViewerConfig {
            tile_url: "https://tiles.example.com/{z}.png".into(),
            ..config()
        };

        assert!(HazardViewer::from_config(config, platform()).is_err());
    }

    #[tokio::test]
    async fn failing_dataset_does_not_stop_others() {
        let observer = Arc::new(RecordingObserver::default());
        let viewer = HazardViewer::from_config(config(), platform())
            .expect("valid config")
            .with_observer(observer.clone());

        let mut handles = viewer.start().await;
        let fire = handles.loads.pop().expect("fire load");
        let flood = handles.loads.pop().expect("flood load");

        assert_matches!(flood.wait().await, LoadOutcome::Installed);
        assert_matches!(
            fire.wait().await,
            LoadOutcome::Failed(HazardMapError::HttpStatus { status: 404, .. })
        );
        assert_eq!(observer.failures(), vec!["fire".to_string()]);
        assert!(observer.installed().contains(&"flood".to_string()));

        let map = viewer.map().read();
        assert_eq!(map.layers().count_named("flood"), 1);
        assert_eq!(map.layers().count_named("fire"), 0);
        let flood = map
            .layers()
            .iter()
            .find(|layer| layer.name() == "flood")
            .and_then(|layer| layer.as_any().downcast_ref::<FeatureLayer>())
            .expect("flood feature layer");
        assert_eq!(flood.features().len(), 1);

        handles.stop();
    }

    #[tokio::test]
    async fn roads_are_refreshed_at_start() {
        let platform = platform();
        let viewer = HazardViewer::from_config(config(), platform.clone()).expect("valid config");

        let handles = viewer.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let roads_requests = platform
            .requests()
            .into_iter()
            .filter(|request| request.url.ends_with("/list_roads"))
            .collect::<Vec<_>>();
        assert_eq!(roads_requests.len(), 1);
        assert!(roads_requests[0].body.is_some());
        assert_eq!(viewer.map().read().layers().count_named("roads"), 1);

        handles.stop();
    }

    #[tokio::test]
    async fn startup_dataset_does_not_duplicate_refreshed_layer() {
        let static_roads = "http://localhost:8080/data/roads.geojson";
        let platform = Arc::new(
            FakePlatform::default()
                .with_response("http://localhost:8080/data/flood-extent.kml", FLOOD_KML)
                .with_response("http://localhost:8080/list_roads", geojson_lines(2, 3))
                .with_response(static_roads, geojson_lines(5, 3))
                .with_delay_for(static_roads, Duration::from_millis(200)),
        );
        let mut config = config();
        config.datasets.push(DatasetConfig {
            name: "roads".into(),
            url: "/data/roads.geojson".into(),
            format: DataFormat::GeoJson,
            source_crs: "EPSG:4326".into(),
            style: None,
        });
        let viewer = HazardViewer::from_config(config, platform.clone()).expect("valid config");

        let handles = viewer.start().await;
        assert_eq!(handles.loads.len(), 2);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(viewer.map().read().layers().count_named("roads"), 1);
        assert!(platform
            .requests()
            .iter()
            .all(|request| request.url != static_roads));

        handles.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn loads_wait_for_startup_delay() {
        let platform = platform();
        let config = ViewerConfig {
            startup_delay_ms: 3_000,
            roads: None,
            ..config()
        };
        let viewer = HazardViewer::from_config(config, platform.clone()).expect("valid config");

        let start = tokio::time::Instant::now();
        let handles = viewer.start().await;
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(handles.loads.len(), 2);
        assert!(handles.refreshes.is_empty());
    }

    #[tokio::test]
    async fn update_map_applies_toggles() {
        let counter = Arc::new(RedrawCounter::default());
        let viewer = HazardViewer::from_config(
            ViewerConfig {
                roads: None,
                ..config()
            },
            platform(),
        )
        .expect("valid config")
        .with_messenger(counter.clone());

        let handles = viewer.start().await;
        for load in handles.loads {
            load.wait().await;
        }

        viewer.toggles().write().set("flood", false);
        let redraws = counter.0.load(std::sync::atomic::Ordering::SeqCst);
        assert_eq!(viewer.update_map(), 1);
        assert!(counter.0.load(std::sync::atomic::Ordering::SeqCst) > redraws);

        let map = viewer.map().read();
        let layers = map.layers();
        let flood_hidden = (0..layers.len())
            .filter(|&index| layers[index].name() == "flood")
            .all(|index| !layers.is_visible(index));
        assert!(flood_hidden);
        assert!(map.layers().is_visible(0));
    }
}
