use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::HazardMapError;
use crate::loader::LoadObserver;

/// Result of a background load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The layer was added to the map.
    Installed,
    /// The load failed, the map was not changed.
    Failed(HazardMapError),
    /// The load completed, but a newer load of the same sequence was started meanwhile, so the
    /// result was thrown away.
    Discarded,
    /// The load was aborted.
    Cancelled,
}

/// Handle of a load running in background.
///
/// Dropping the handle does not stop the load.
#[derive(Debug)]
pub struct LoadHandle {
    name: String,
    task: JoinHandle<LoadOutcome>,
}

impl LoadHandle {
    pub(crate) fn new(name: String, task: JoinHandle<LoadOutcome>) -> Self {
        Self { name, task }
    }

    /// Name of the loaded dataset.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancels the load. If the layer is already installed, does nothing.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// True if the load task has completed.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the load to complete.
    pub async fn wait(self) -> LoadOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => LoadOutcome::Cancelled,
            Err(err) => LoadOutcome::Failed(HazardMapError::Generic(format!(
                "load task of '{}' failed: {err}",
                self.name
            ))),
        }
    }
}

/// Monotonic counter of loads that replace each other. Only the result of the most recently
/// started load of a sequence is installed.
#[derive(Debug, Clone, Default)]
pub struct LoadSequence(Arc<AtomicU64>);

impl LoadSequence {
    /// Starts a new load of the sequence, making all previous ones stale.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True if no load was started after the one with the `ticket`.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }

    /// Number of loads started in the sequence.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts loads in progress, notifying the observer when the first one starts and the last one
/// ends. The count is decremented on drop, so aborted loads are accounted for too.
pub(crate) struct InFlightGuard {
    counter: Arc<AtomicUsize>,
    observer: Arc<dyn LoadObserver>,
}

impl InFlightGuard {
    pub(crate) fn new(counter: Arc<AtomicUsize>, observer: Arc<dyn LoadObserver>) -> Self {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            observer.loading_started();
        }

        Self { counter, observer }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.observer.loading_finished();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::RecordingObserver;

    #[test]
    fn sequence_tickets() {
        let sequence = LoadSequence::default();
        let first = sequence.next();
        assert!(sequence.is_current(first));

        let second = sequence.next();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));
        assert_eq!(sequence.current(), 2);
    }

    #[test]
    fn in_flight_transitions() {
        let observer = Arc::new(RecordingObserver::default());
        let counter = Arc::new(AtomicUsize::new(0));

        let first = InFlightGuard::new(counter.clone(), observer.clone());
        let second = InFlightGuard::new(counter.clone(), observer.clone());
        assert_eq!(observer.started(), 1);

        drop(first);
        assert_eq!(observer.finished(), 0);
        drop(second);
        assert_eq!(observer.finished(), 1);
    }
}
