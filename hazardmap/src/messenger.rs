//! Notification of the application about state changes of the map.

/// Messenger is used by the map and its layers to notify the application that the map should be
/// redrawn.
pub trait Messenger: Send + Sync {
    /// Requests redraw of the map.
    fn request_redraw(&self);
}

impl<T: Messenger> Messenger for std::sync::Arc<T> {
    fn request_redraw(&self) {
        self.as_ref().request_redraw()
    }
}
