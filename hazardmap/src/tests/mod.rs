//! Test doubles shared by the unit tests of the crate.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hazardmap_types::cartesian::{Point2d, Rect, Size};
use hazardmap_types::Geom;
use parking_lot::Mutex;
use serde_json::json;

use crate::error::HazardMapError;
use crate::layer::attribution::Attribution;
use crate::layer::Layer;
use crate::loader::LoadObserver;
use crate::messenger::Messenger;
use crate::platform::{DataRequest, PlatformService};
use crate::render::Canvas;
use crate::style::StyleDescriptor;
use crate::tile_schema::TileIndex;
use crate::view::MapView;

static NEXT_LAYER_ID: AtomicUsize = AtomicUsize::new(0);

/// Layer that draws one raster tile with its name as the url.
pub(crate) struct TestLayer {
    pub name: String,
    pub id: usize,
}

impl TestLayer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: NEXT_LAYER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn boxed(name: &str) -> Box<dyn Layer> {
        Box::new(Self::new(name))
    }
}

impl Layer for TestLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, _view: &MapView, canvas: &mut dyn Canvas) {
        canvas.draw_raster_tile(
            TileIndex::new(0, 0, 0),
            Rect::new(0.0, 0.0, 1.0, 1.0),
            &self.name,
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn attribution(&self) -> Option<Attribution> {
        None
    }
}

#[derive(Default)]
pub(crate) struct RecordingCanvas {
    pub size: Size,
    pub features: Vec<(Geom<Point2d>, StyleDescriptor)>,
    pub tiles: Vec<(TileIndex, Rect, String)>,
}

impl RecordingCanvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }
}

impl Canvas for RecordingCanvas {
    fn size(&self) -> Size {
        self.size
    }

    fn draw_feature(&mut self, geometry: &Geom<Point2d>, style: &StyleDescriptor) {
        self.features.push((geometry.clone(), style.clone()));
    }

    fn draw_raster_tile(&mut self, index: TileIndex, bbox: Rect, url: &str) {
        self.tiles.push((index, bbox, url.to_string()));
    }
}

#[derive(Default)]
pub(crate) struct RedrawCounter(pub AtomicUsize);

impl Messenger for RedrawCounter {
    fn request_redraw(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub(crate) struct RecordingObserver {
    started: AtomicUsize,
    finished: AtomicUsize,
    installed: Mutex<Vec<String>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn installed(&self) -> Vec<String> {
        self.installed.lock().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().clone()
    }
}

impl LoadObserver for RecordingObserver {
    fn loading_started(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn loading_finished(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn layer_installed(&self, name: &str) {
        self.installed.lock().push(name.to_string());
    }

    fn load_failed(&self, name: &str, _error: &HazardMapError) {
        self.failures.lock().push(name.to_string());
    }
}

/// In-memory platform service. Unknown urls answer with 404.
#[derive(Default)]
pub(crate) struct FakePlatform {
    responses: HashMap<String, Bytes>,
    delay: Option<Duration>,
    url_delays: HashMap<String, Duration>,
    requests: Mutex<Vec<DataRequest>>,
}

impl FakePlatform {
    pub fn with_response(mut self, url: &str, body: impl Into<Bytes>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delays only the responses of `url`.
    pub fn with_delay_for(mut self, url: &str, delay: Duration) -> Self {
        self.url_delays.insert(url.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<DataRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PlatformService for FakePlatform {
    async fn fetch(&self, request: &DataRequest) -> Result<Bytes, HazardMapError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay.or_else(|| self.url_delays.get(&request.url).copied()) {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(&request.url)
            .cloned()
            .ok_or_else(|| HazardMapError::HttpStatus {
                url: request.url.clone(),
                status: 404,
            })
    }
}

/// GeoJSON collection of `features` road lines with `vertices` points each, near Brisbane.
pub(crate) fn geojson_lines(features: usize, vertices: usize) -> String {
    let features = (0..features)
        .map(|i| {
            let coordinates = (0..vertices)
                .map(|j| {
                    [
                        152.5 + i as f64 * 0.01 + j as f64 * 0.001,
                        -27.5 + j as f64 * 0.001,
                    ]
                })
                .collect::<Vec<_>>();
            json!({
                "type": "Feature",
                "id": i,
                "geometry": {"type": "LineString", "coordinates": coordinates},
                "properties": {"highway": "primary"}
            })
        })
        .collect::<Vec<_>>();

    json!({
        "type": "FeatureCollection",
        "copyright": "OpenStreetMap contributors",
        "features": features
    })
    .to_string()
}
