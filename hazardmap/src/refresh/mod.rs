//! Re-requesting a dataset for the visible area when the user stops moving the map.
//!
//! The [`RefreshLoop`] is a two-state scheduler:
//!
//! * in [`RefreshState::Idle`] it waits for the refresh interval;
//! * in [`RefreshState::Armed`] it waits until the map view changes and then stays unchanged for
//!   the settle delay.
//!
//! When the view settles, the layers of the dataset are removed and the dataset is requested
//! again with the geographic bounding box of the view. Then the loop becomes idle again. Views
//! published while the user is still moving the map never cause a request.

use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::loader::{
    DataFormat, DatasetRequest, InstallMode, LayerLoader, LoadHandle, LoadSequence,
};
use crate::map::MapHandle;
use crate::style::StyleSelector;
use crate::view::MapView;

mod query;

pub use query::BboxQuery;

/// Parameters of a [`RefreshLoop`].
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOptions {
    /// Name of the refreshed layers.
    pub name: String,
    /// Location the bounding box is `POST`ed to. The response must be a GeoJSON document.
    pub location: String,
    /// Reference of the response coordinates.
    pub source_crs: String,
    /// Style set of the layers.
    pub style: StyleSelector,
    /// Time the loop stays idle after a refresh.
    pub interval: Duration,
    /// Time the view must stay unchanged to be considered settled.
    pub settle_delay: Duration,
}

impl RefreshOptions {
    /// Options for the dataset of the given name, with WGS84 coordinates, a 10 s interval and a
    /// 500 ms settle delay.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            style: StyleSelector::dataset(name.clone()),
            name,
            location: location.into(),
            source_crs: crate::loader::KML_CRS.to_string(),
            interval: Duration::from_secs(10),
            settle_delay: Duration::from_millis(500),
        }
    }
}

/// State of a [`RefreshLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshState {
    /// Waiting for the interval timer.
    Idle,
    /// Waiting for the view to settle.
    Armed,
}

/// Scheduler re-requesting a dataset for the visible area of the map.
pub struct RefreshLoop {
    map: MapHandle,
    loader: LayerLoader,
    options: RefreshOptions,
    views: watch::Receiver<MapView>,
    sequence: LoadSequence,
    state: Arc<Mutex<RefreshState>>,
    current: Option<LoadHandle>,
}

impl std::fmt::Debug for RefreshLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshLoop")
            .field("options", &self.options)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl RefreshLoop {
    /// Creates an idle loop.
    pub fn new(map: MapHandle, loader: LayerLoader, options: RefreshOptions) -> Self {
        let views = map.read().subscribe_view();
        Self {
            map,
            loader,
            options,
            views,
            sequence: LoadSequence::default(),
            state: Arc::new(Mutex::new(RefreshState::Idle)),
            current: None,
        }
    }

    /// Current state of the loop.
    pub fn state(&self) -> RefreshState {
        *self.state.lock()
    }

    /// Runs a single refresh: removes the layers of the dataset and requests it for the bounding
    /// box of the current view. A previous refresh still in progress is cancelled.
    ///
    /// Returns `None` if the view has no area (e.g. the map has zero size), nothing is done in
    /// this case.
    pub fn refresh(&mut self) -> Option<&LoadHandle> {
        let Some(bbox) = self.map.read().view().geo_bbox() else {
            debug!("Refresh of '{}' skipped: view has no area", self.options.name);
            return None;
        };

        if let Some(previous) = self.current.take() {
            previous.abort();
        }

        let removed = self.map.write().layers_mut().remove_by_name(&self.options.name);
        let query = BboxQuery::from_geo_bbox(&bbox);
        debug!(
            "Refreshing '{}' for {query:?}, {removed} old layers removed",
            self.options.name
        );

        let request = DatasetRequest::new(
            self.options.name.clone(),
            self.options.location.clone(),
            DataFormat::GeoJson,
        )
        .with_source_crs(self.options.source_crs.clone())
        .with_style(self.options.style.clone())
        .with_body(query.to_json())
        .with_mode(InstallMode::ReplaceByName);

        let handle = self
            .loader
            .spawn_sequenced(self.map.clone(), request, &self.sequence);
        self.current = Some(handle);
        self.current.as_ref()
    }

    /// Starts the loop as a `tokio` task. The first refresh is done immediately.
    pub fn start(self) -> RefreshHandle {
        let state = self.state.clone();
        let task = tokio::spawn(self.run());
        RefreshHandle { task, state }
    }

    async fn run(mut self) {
        self.refresh();

        let period = self.options.interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            self.set_state(RefreshState::Armed);

            if !self.wait_for_settle().await {
                debug!("Map is dropped, refresh of '{}' stops", self.options.name);
                break;
            }

            self.refresh();
            self.set_state(RefreshState::Idle);
        }
    }

    /// Waits until the view changes and then stays unchanged for the settle delay. Returns
    /// false if the map is gone.
    async fn wait_for_settle(&mut self) -> bool {
        // Only changes made after arming count.
        self.views.borrow_and_update();
        if self.views.changed().await.is_err() {
            return false;
        }

        loop {
            match tokio::time::timeout(self.options.settle_delay, self.views.changed()).await {
                Err(_elapsed) => return true,
                Ok(Ok(())) => continue,
                Ok(Err(_closed)) => return false,
            }
        }
    }

    fn set_state(&self, state: RefreshState) {
        debug!("Refresh of '{}': {state:?}", self.options.name);
        *self.state.lock() = state;
    }
}

/// Handle of a running [`RefreshLoop`].
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshHandle {
    /// Stops the loop. A load already started is not cancelled.
    pub fn stop(&self) {
        self.task.abort();
    }

    /// True if the loop is still running.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Current state of the loop.
    pub fn state(&self) -> RefreshState {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use hazardmap_types::cartesian::{Point2d, Size};
    use hazardmap_types::geo::CrsRegistry;

    use super::*;
    use crate::loader::LoadOutcome;
    use crate::map::Map;
    use crate::style::StyleRegistry;
    use crate::tests::{geojson_lines, FakePlatform};

    const ROADS_URL: &str = "http://localhost:8080/list_roads";

    fn setup() -> (MapHandle, Arc<FakePlatform>, LayerLoader) {
        let center = Point2d::new(16_305_945.737_502_75, -2_206_013.719_116_517_3);
        let view = MapView::from_zoom(center, 8.0).with_size(Size::new(800.0, 600.0));
        let map = Map::new(view, vec![], None).into_handle();
        let platform =
            Arc::new(FakePlatform::default().with_response(ROADS_URL, geojson_lines(3, 2)));
        let loader = LayerLoader::new(
            platform.clone(),
            Arc::new(CrsRegistry::default()),
            Arc::new(StyleRegistry::default()),
        );

        (map, platform, loader)
    }

    fn options() -> RefreshOptions {
        RefreshOptions {
            interval: Duration::from_secs(1),
            settle_delay: Duration::from_millis(200),
            ..RefreshOptions::new("roads", ROADS_URL)
        }
    }

    fn expected_body(map: &MapHandle) -> serde_json::Value {
        let bbox = map.read().view().geo_bbox().expect("view has area");
        BboxQuery::from_geo_bbox(&bbox).to_json()
    }

    #[tokio::test]
    async fn single_refresh_replaces_layers() {
        let (map, platform, loader) = setup();
        let mut refresh = RefreshLoop::new(map.clone(), loader, options());

        for _ in 0..3 {
            let handle = refresh.refresh().expect("view has area");
            assert_eq!(handle.name(), "roads");
            refresh.current.take().expect("handle").wait().await;
        }

        assert_eq!(map.read().layers().count_named("roads"), 1);
        assert_eq!(platform.requests().len(), 3);
        assert_eq!(refresh.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn superseded_refresh_is_not_installed() {
        let (map, _platform, loader) = setup();
        let mut refresh = RefreshLoop::new(map.clone(), loader, options());

        refresh.refresh();
        let first = refresh.current.take().expect("handle");
        refresh.refresh();
        let second = refresh.current.take().expect("handle");

        assert_matches::assert_matches!(
            first.wait().await,
            LoadOutcome::Cancelled | LoadOutcome::Discarded
        );
        assert_matches::assert_matches!(second.wait().await, LoadOutcome::Installed);
        assert_eq!(map.read().layers().count_named("roads"), 1);
    }

    #[tokio::test]
    async fn zero_sized_view_is_skipped() {
        let (map, platform, loader) = setup();
        map.write().set_size(Size::new(0.0, 0.0));

        let mut refresh = RefreshLoop::new(map, loader, options());
        assert!(refresh.refresh().is_none());
        assert!(platform.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_follows_settled_view() {
        let (map, platform, loader) = setup();
        let v1_body = expected_body(&map);

        let handle = RefreshLoop::new(map.clone(), loader, options()).start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(platform.requests().len(), 1);
        assert_eq!(platform.requests()[0].body.as_ref(), Some(&v1_body));
        assert_eq!(handle.state(), RefreshState::Idle);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.state(), RefreshState::Armed);
        assert_eq!(platform.requests().len(), 1);

        // A drag: several views shortly one after another.
        for step in 1..=5 {
            let delta = nalgebra::Vector2::new(10_000.0 * step as f64, 0.0);
            let view = map.read().view().translate(delta);
            map.write().set_view(view);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        let requests = platform.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].body.as_ref(), Some(&expected_body(&map)));
        assert_ne!(requests[1].body.as_ref(), Some(&v1_body));
        assert_eq!(map.read().layers().count_named("roads"), 1);
        assert_eq!(handle.state(), RefreshState::Idle);

        handle.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn view_changes_while_idle_do_not_trigger_refresh() {
        let (map, platform, loader) = setup();
        let handle = RefreshLoop::new(map.clone(), loader, options()).start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let view = map.read().view().translate(nalgebra::Vector2::new(5_000.0, 0.0));
        map.write().set_view(view);
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(platform.requests().len(), 1);
        assert_eq!(handle.state(), RefreshState::Armed);
        handle.stop();
    }
}
