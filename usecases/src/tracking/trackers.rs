//! Built-in trackers.

use super::Trackable;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, trace, warn, Level};

/// A tracker that discards all activity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTracker;

impl Trackable for NoOpTracker {
    fn begin_activity(&self) {}

    fn end_activity(&self) {}
}

/// A tracker that logs activity using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingTracker {
    name: String,
    level: Level,
}

impl LoggingTracker {
    /// Creates a tracker logging under `name` at `level`.
    #[must_use]
    pub fn new(name: impl Into<String>, level: Level) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }

    /// Creates a debug-level tracker.
    #[must_use]
    pub fn debug(name: impl Into<String>) -> Self {
        Self::new(name, Level::DEBUG)
    }

    /// Creates an info-level tracker.
    #[must_use]
    pub fn info(name: impl Into<String>) -> Self {
        Self::new(name, Level::INFO)
    }

    fn log(&self, phase: &str) {
        match self.level {
            Level::TRACE => trace!(activity = %self.name, phase, "Activity {}", phase),
            Level::DEBUG => debug!(activity = %self.name, phase, "Activity {}", phase),
            Level::INFO => info!(activity = %self.name, phase, "Activity {}", phase),
            _ => warn!(activity = %self.name, phase, "Activity {}", phase),
        }
    }
}

impl Trackable for LoggingTracker {
    fn begin_activity(&self) {
        self.log("began");
    }

    fn end_activity(&self) {
        self.log("ended");
    }
}

/// Counts running activities, e.g. to drive a loading indicator.
///
/// Shared between any number of decorated use cases; it reports active while
/// at least one of their subscriptions is running.
#[derive(Debug, Default)]
pub struct ActivityIndicator {
    active: AtomicUsize,
}

impl ActivityIndicator {
    /// Creates an idle indicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while any tracked subscription is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Returns the number of running subscriptions.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl Trackable for ActivityIndicator {
    fn begin_activity(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn end_activity(&self) {
        let decremented = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |active| active.checked_sub(1));
        if decremented.is_err() {
            warn!("Activity ended without a matching begin");
        }
    }
}
