//! Lifecycle hooks for observing a subscription without altering it.

use super::EventStream;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Callbacks invoked as a subscription moves through its lifecycle.
///
/// [`on_start`](Self::on_start) runs as soon as the subscription is created,
/// whether or not it is ever polled. After it, exactly one of
/// [`on_complete`](Self::on_complete), [`on_failure`](Self::on_failure) or
/// [`on_cancel`](Self::on_cancel) is called.
pub trait LifecycleHooks<T, E>: Send {
    /// Called when the subscription is created, before upstream is subscribed.
    fn on_start(&mut self) {}

    /// Called for every value passing through.
    fn on_value(&mut self, _value: &T) {}

    /// Called when the subscription fails.
    fn on_failure(&mut self, _failure: &E) {}

    /// Called when the subscription completes normally.
    fn on_complete(&mut self) {}

    /// Called when the subscription is dropped before terminating.
    fn on_cancel(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    Terminated,
}

pub(crate) struct LifecycleStream<T, E, H>
where
    H: LifecycleHooks<T, E>,
{
    upstream: EventStream<T, E>,
    hooks: H,
    phase: Phase,
}

impl<T, E, H> LifecycleStream<T, E, H>
where
    H: LifecycleHooks<T, E>,
{
    /// Calls `on_start`, then subscribes upstream.
    pub(crate) fn start(mut hooks: H, subscribe: impl FnOnce() -> EventStream<T, E>) -> Self {
        hooks.on_start();
        Self {
            upstream: subscribe(),
            hooks,
            phase: Phase::Running,
        }
    }
}

// Fields are never pinned structurally.
impl<T, E, H> Unpin for LifecycleStream<T, E, H> where H: LifecycleHooks<T, E> {}

impl<T, E, H> Stream for LifecycleStream<T, E, H>
where
    H: LifecycleHooks<T, E>,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.phase == Phase::Terminated {
            return Poll::Ready(None);
        }

        match this.upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(value))) => {
                this.hooks.on_value(&value);
                Poll::Ready(Some(Ok(value)))
            }
            Poll::Ready(Some(Err(failure))) => {
                this.phase = Phase::Terminated;
                this.hooks.on_failure(&failure);
                Poll::Ready(Some(Err(failure)))
            }
            Poll::Ready(None) => {
                this.phase = Phase::Terminated;
                this.hooks.on_complete();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E, H> Drop for LifecycleStream<T, E, H>
where
    H: LifecycleHooks<T, E>,
{
    fn drop(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Terminated;
            self.hooks.on_cancel();
        }
    }
}
