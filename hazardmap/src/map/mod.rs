//! [`Map`] is the shared state of the viewer: the displayed view and the layers.

use std::sync::Arc;

use hazardmap_types::cartesian::Size;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::layer::attribution::Attribution;
use crate::layer::Layer;
use crate::messenger::Messenger;
use crate::render::Canvas;
use crate::view::{MapView, ViewConstraints};

mod builder;
mod layer_collection;

pub use builder::MapBuilder;
pub use layer_collection::LayerCollection;

/// Map shared between the application and the background tasks of the viewer.
///
/// Every mutation is a short write lock; the lock is never held across an `.await`.
pub type MapHandle = Arc<RwLock<Map>>;

/// Map specifies a set of layers, and the view that should be rendered.
pub struct Map {
    view: MapView,
    view_sender: watch::Sender<MapView>,
    constraints: ViewConstraints,
    layers: LayerCollection,
    messenger: Option<Box<dyn Messenger>>,
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("view", &self.view)
            .field("constraints", &self.constraints)
            .field("layers", &self.layers)
            .finish()
    }
}

impl Map {
    /// Creates a new map.
    pub fn new(
        view: MapView,
        layers: Vec<Box<dyn Layer>>,
        messenger: Option<Box<dyn Messenger + 'static>>,
    ) -> Self {
        let (view_sender, _) = watch::channel(view.clone());
        Self {
            view,
            view_sender,
            constraints: ViewConstraints::default(),
            layers: layers.into_iter().collect(),
            messenger,
        }
    }

    /// Wraps the map into a [`MapHandle`].
    pub fn into_handle(self) -> MapHandle {
        Arc::new(RwLock::new(self))
    }

    /// Current view of the map.
    pub fn view(&self) -> &MapView {
        &self.view
    }

    /// Limits of the views the map accepts.
    pub fn constraints(&self) -> &ViewConstraints {
        &self.constraints
    }

    /// Sets the view limits. The current view is adjusted to them.
    pub fn set_constraints(&mut self, constraints: ViewConstraints) {
        self.constraints = constraints;
        self.set_view(self.view.clone());
    }

    /// Returns the list of map's layers.
    pub fn layers(&self) -> &LayerCollection {
        &self.layers
    }

    /// Returns a mutable reference to the list of map's layers.
    pub fn layers_mut(&mut self) -> &mut LayerCollection {
        &mut self.layers
    }

    /// Changes the view of the map to the given one, adjusted to the map constraints.
    ///
    /// Subscribers of [`Map::subscribe_view`] are notified about every change.
    pub fn set_view(&mut self, view: MapView) {
        let view = self.constraints.constrain(view);
        self.view = view.clone();
        self.view_sender.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });

        self.redraw();
    }

    /// Receiver of the map view changes.
    pub fn subscribe_view(&self) -> watch::Receiver<MapView> {
        self.view_sender.subscribe()
    }

    /// Request redraw of the map.
    pub fn redraw(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_redraw()
        }
    }

    /// Set the size of the map.
    pub fn set_size(&mut self, new_size: Size) {
        self.set_view(self.view.with_size(new_size));
    }

    /// Sets the new event messenger for the map.
    pub fn set_messenger(&mut self, messenger: Option<impl Messenger + 'static>) {
        self.messenger = messenger.map(|m| Box::new(m) as Box<dyn Messenger>);
    }

    /// Draws all visible layers in their order.
    pub fn render(&self, canvas: &mut dyn Canvas) {
        for layer in self.layers.iter_visible() {
            layer.render(&self.view, canvas);
        }
    }

    /// Attributions of the visible layers, without duplicates.
    pub fn attributions(&self) -> Vec<Attribution> {
        let mut attributions: Vec<Attribution> = vec![];
        for attribution in self.layers.iter_visible().filter_map(|l| l.attribution()) {
            if !attributions.contains(&attribution) {
                attributions.push(attribution);
            }
        }

        attributions
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use hazardmap_types::cartesian::{Point2d, Rect};

    use super::*;
    use crate::tests::{RecordingCanvas, RedrawCounter, TestLayer};

    #[test]
    fn set_view_notifies_subscribers_and_messenger() {
        let counter = Arc::new(RedrawCounter::default());
        let mut map = Map::new(MapView::default(), vec![], None);
        map.set_messenger(Some(counter.clone()));

        let mut receiver = map.subscribe_view();
        assert!(!receiver.has_changed().unwrap_or(true));

        let view = map.view().with_center(Point2d::new(100.0, 100.0));
        map.set_view(view.clone());

        assert!(receiver.has_changed().unwrap_or(false));
        assert_eq!(*receiver.borrow_and_update(), view);
        assert_eq!(counter.0.load(Ordering::Relaxed), 1);

        map.set_view(view);
        assert!(!receiver.has_changed().unwrap_or(true));
    }

    #[test]
    fn set_view_applies_constraints() {
        let mut map = Map::new(MapView::from_zoom(Point2d::new(0.0, 0.0), 5.0), vec![], None);
        map.set_constraints(ViewConstraints {
            min_zoom: Some(3.0),
            max_zoom: Some(10.0),
            extent: Some(Rect::new(-100.0, -100.0, 100.0, 100.0)),
            constrain_only_center: true,
        });

        map.set_view(MapView::from_zoom(Point2d::new(500.0, -500.0), 15.0));
        assert_eq!(map.view().center(), Point2d::new(100.0, -100.0));
        approx::assert_relative_eq!(map.view().zoom_level(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn renders_only_visible_layers() {
        let mut map = Map::new(
            MapView::default(),
            vec![TestLayer::boxed("base"), TestLayer::boxed("roads")],
            None,
        );
        map.layers_mut().set_visible_by_name("roads", false);

        let mut canvas = RecordingCanvas::default();
        map.render(&mut canvas);
        let drawn: Vec<_> = canvas.tiles.iter().map(|(_, _, url)| url.as_str()).collect();
        assert_eq!(drawn, vec!["base"]);
    }
}
