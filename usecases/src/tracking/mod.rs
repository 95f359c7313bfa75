//! Activity tracking for reactive use cases.
//!
//! A [`TrackableUseCase`] reports each subscription of its pipeline to a
//! [`Trackable`]: `begin_activity` as soon as the subscription is created and
//! `end_activity` exactly once when it completes, fails or is dropped.
//! Values and failures pass through untouched.

mod trackers;

pub use trackers::{ActivityIndicator, LoggingTracker, NoOpTracker};

use crate::observable::{LifecycleHooks, Observable};
use crate::usecase::UseCase;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::trace;

/// Records the start and end of pipeline activity.
///
/// Calls are balanced per subscription, but concurrent subscriptions may
/// interleave them.
pub trait Trackable: Send + Sync {
    /// A subscription started running.
    fn begin_activity(&self);

    /// A running subscription terminated.
    fn end_activity(&self);
}

impl<T> Trackable for Arc<T>
where
    T: Trackable + ?Sized,
{
    fn begin_activity(&self) {
        (**self).begin_activity();
    }

    fn end_activity(&self) {
        (**self).end_activity();
    }
}

/// Provides the tracker a decorated use case reports to.
pub trait TrackableSource: Send + Sync {
    /// Returns the tracker.
    fn tracker(&self) -> Arc<dyn Trackable>;
}

impl<T> TrackableSource for Arc<T>
where
    T: Trackable + 'static,
{
    fn tracker(&self) -> Arc<dyn Trackable> {
        Arc::clone(self) as Arc<dyn Trackable>
    }
}

/// A reactive use case whose subscriptions are reported to a tracker.
#[derive(Clone)]
pub struct TrackableUseCase<U, S> {
    source: U,
    trackable_source: S,
}

impl<U, S> TrackableUseCase<U, S> {
    /// Wraps `source`, reporting to the tracker of `trackable_source`.
    pub const fn new(source: U, trackable_source: S) -> Self {
        Self {
            source,
            trackable_source,
        }
    }
}

impl<U: Debug, S> Debug for TrackableUseCase<U, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackableUseCase")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl<U, S, T, E> UseCase for TrackableUseCase<U, S>
where
    U: UseCase<Output = Observable<T, E>>,
    S: TrackableSource,
    T: Send + 'static,
    E: Send + 'static,
{
    type Input = U::Input;
    type Output = Observable<T, E>;

    fn execute(&self, input: Self::Input) -> Self::Output {
        let tracker = self.trackable_source.tracker();
        self.source.execute(input).handle_events(move || ActivityHooks {
            tracker: Arc::clone(&tracker),
        })
    }
}

/// Per-subscription bridge from lifecycle events to a tracker.
struct ActivityHooks {
    tracker: Arc<dyn Trackable>,
}

impl ActivityHooks {
    fn end(&self, outcome: &'static str) {
        trace!(outcome, "Tracked activity ended");
        self.tracker.end_activity();
    }
}

impl<T, E> LifecycleHooks<T, E> for ActivityHooks {
    fn on_start(&mut self) {
        trace!("Tracked activity began");
        self.tracker.begin_activity();
    }

    fn on_failure(&mut self, _failure: &E) {
        self.end("failure");
    }

    fn on_complete(&mut self) {
        self.end("complete");
    }

    fn on_cancel(&mut self) {
        self.end("cancel");
    }
}
