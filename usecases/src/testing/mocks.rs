//! Mock use cases and trackers for testing.

use futures::stream;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::observable::Observable;
use crate::tracking::Trackable;
use crate::usecase::UseCase;

struct Script<T, E> {
    outcomes: Mutex<VecDeque<Result<T, E>>>,
    executions: AtomicUsize,
}

/// A unit-input use case replaying a script of outcomes.
///
/// Every subscription takes the next outcome from the script and emits it;
/// once the script runs out, subscriptions complete without emitting. Clones
/// share the script.
pub struct ScriptedUseCase<T, E> {
    script: Arc<Script<T, E>>,
}

impl<T, E> ScriptedUseCase<T, E> {
    /// Creates a use case replaying `outcomes` in order.
    pub fn new(outcomes: impl IntoIterator<Item = Result<T, E>>) -> Self {
        Self {
            script: Arc::new(Script {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                executions: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns how many subscriptions ran so far.
    #[must_use]
    pub fn executions(&self) -> usize {
        self.script.executions.load(Ordering::SeqCst)
    }

    /// Returns how many outcomes are left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.outcomes.lock().len()
    }
}

impl<T, E> Clone for ScriptedUseCase<T, E> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
        }
    }
}

impl<T, E> Debug for ScriptedUseCase<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedUseCase")
            .field("executions", &self.executions())
            .field("remaining", &self.remaining())
            .finish()
    }
}

impl<T, E> UseCase for ScriptedUseCase<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    type Input = ();
    type Output = Observable<T, E>;

    fn execute(&self, (): ()) -> Observable<T, E> {
        let script = Arc::clone(&self.script);
        Observable::new(move || {
            script.executions.fetch_add(1, Ordering::SeqCst);
            stream::iter(script.outcomes.lock().pop_front())
        })
    }
}

/// A call recorded by [`RecordingTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerEvent {
    /// `begin_activity` was called.
    Begin,
    /// `end_activity` was called.
    End,
}

/// A tracker that records every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingTracker {
    events: RwLock<Vec<TrackerEvent>>,
}

impl RecordingTracker {
    /// Creates an empty recording tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded calls in order.
    #[must_use]
    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.read().clone()
    }

    /// Returns the number of `begin_activity` calls.
    #[must_use]
    pub fn begin_count(&self) -> usize {
        self.count(TrackerEvent::Begin)
    }

    /// Returns the number of `end_activity` calls.
    #[must_use]
    pub fn end_count(&self) -> usize {
        self.count(TrackerEvent::End)
    }

    /// True if every end follows a begin and none are outstanding.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let mut open = 0usize;
        for event in self.events.read().iter() {
            match event {
                TrackerEvent::Begin => open += 1,
                TrackerEvent::End => match open.checked_sub(1) {
                    Some(remaining) => open = remaining,
                    None => return false,
                },
            }
        }
        open == 0
    }

    fn count(&self, kind: TrackerEvent) -> usize {
        self.events.read().iter().filter(|event| **event == kind).count()
    }
}

impl Trackable for RecordingTracker {
    fn begin_activity(&self) {
        self.events.write().push(TrackerEvent::Begin);
    }

    fn end_activity(&self) {
        self.events.write().push(TrackerEvent::End);
    }
}
