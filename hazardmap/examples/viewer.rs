//! This example runs the hazard viewer without a window: datasets are loaded, the map is
//! panned a few times and every layer is drawn into a canvas that only counts what it is asked
//! to draw.
//!
//! Run it with an optional path to a JSON configuration. Without it the default configuration
//! is used, which expects the data server at `http://localhost:8080/`.
//!
//! ```shell
//! cargo run --example viewer -- ./viewer.json
//! ```

use std::sync::Arc;
use std::time::Duration;

use hazardmap::config::ViewerConfig;
use hazardmap::error::HazardMapError;
use hazardmap::hazardmap_types::cartesian::{Point2d, Rect, Size};
use hazardmap::hazardmap_types::Geom;
use hazardmap::loader::LoadObserver;
use hazardmap::render::Canvas;
use hazardmap::style::StyleDescriptor;
use hazardmap::{HazardViewer, TileIndex};

/// Canvas that counts the drawn primitives.
#[derive(Debug, Default)]
struct CountingCanvas {
    size: Size,
    features: usize,
    tiles: usize,
}

impl Canvas for CountingCanvas {
    fn size(&self) -> Size {
        self.size
    }

    fn draw_feature(&mut self, _geometry: &Geom<Point2d>, _style: &StyleDescriptor) {
        self.features += 1;
    }

    fn draw_raster_tile(&mut self, _index: TileIndex, _bbox: Rect, _url: &str) {
        self.tiles += 1;
    }
}

/// Shows the loading indicator as log messages.
struct LoadingIndicator;

impl LoadObserver for LoadingIndicator {
    fn loading_started(&self) {
        log::info!("Loading...");
    }

    fn loading_finished(&self) {
        log::info!("Loading done");
    }

    fn load_failed(&self, name: &str, error: &HazardMapError) {
        log::error!("Dataset '{name}' is not available: {error}");
    }
}

#[tokio::main]
async fn main() -> Result<(), HazardMapError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => ViewerConfig::from_file(path)?,
        None => ViewerConfig {
            base_url: Some("http://localhost:8080/".to_string()),
            ..Default::default()
        },
    };

    let viewer = HazardViewer::native(config)?.with_observer(Arc::new(LoadingIndicator));
    let handles = viewer.start().await;

    // Pan east a few times, waiting long enough for the view to settle in between.
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(12)).await;
        let mut map = viewer.map().write();
        let view = map.view().translate(nalgebra::Vector2::new(20_000.0, 0.0));
        map.set_view(view);
    }

    tokio::time::sleep(Duration::from_secs(2)).await;
    viewer.toggles().write().set("fire", false);
    viewer.update_map();

    let map = viewer.map().read();
    let mut canvas = CountingCanvas {
        size: map.view().size(),
        ..Default::default()
    };
    map.render(&mut canvas);

    log::info!(
        "Drawn {} features and {} base tiles from {} layers",
        canvas.features,
        canvas.tiles,
        map.layers().len()
    );
    for attribution in map.attributions() {
        match attribution.get_url() {
            Some(url) => log::info!("Data: {} ({url})", attribution.get_text()),
            None => log::info!("Data: {}", attribution.get_text()),
        }
    }

    handles.stop();
    Ok(())
}
