//! Subscriptions and their cancellation handles.

use super::EventStream;
use crate::errors::ExecutionError;
use futures::stream::{FusedStream, Stream, StreamExt};
use futures::task::AtomicWaker;
use parking_lot::RwLock;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

#[derive(Default)]
struct CancelState {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
    waker: AtomicWaker,
}

/// A handle that cancels a [`Subscription`] from anywhere.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
/// The subscription drops its upstream the next time it is polled, and the
/// handle wakes it so that happens promptly.
#[derive(Clone, Default)]
pub struct CancelHandle {
    state: Arc<CancelState>,
}

impl CancelHandle {
    /// Creates a new, uncancelled handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    pub fn cancel(&self, reason: impl Into<String>) {
        if self
            .state
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            *self.state.reason.write() = Some(reason.into());
            self.state.waker.wake();
        }
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.state.reason.read().clone()
    }

    fn register(&self, cx: &Context<'_>) {
        self.state.waker.register(cx.waker());
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}

/// One independent run of an [`Observable`](super::Observable).
///
/// A subscription is a stream of `Result<T, E>` items. It terminates after
/// the upstream completes, after the first `Err` item, or once cancelled.
/// Dropping a subscription cancels it and everything it drives.
pub struct Subscription<T, E> {
    upstream: Option<EventStream<T, E>>,
    handle: CancelHandle,
}

impl<T, E> Subscription<T, E> {
    pub(crate) fn new(upstream: EventStream<T, E>) -> Self {
        Self {
            upstream: Some(upstream),
            handle: CancelHandle::new(),
        }
    }

    /// Returns a handle that can cancel this subscription from another task.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// Cancels the subscription, dropping its upstream immediately.
    pub fn cancel(&mut self, reason: impl Into<String>) {
        self.handle.cancel(reason);
        self.release();
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Awaits the first value, then cancels the rest of the pipeline.
    pub async fn first(mut self) -> Result<T, ExecutionError<E>> {
        match self.next().await {
            Some(Ok(value)) => Ok(value),
            Some(Err(failure)) => Err(ExecutionError::Failed(failure)),
            None => match self.handle.reason() {
                Some(reason) => Err(ExecutionError::Cancelled(reason)),
                None => Err(ExecutionError::Empty),
            },
        }
    }

    fn release(&mut self) {
        if self.upstream.take().is_some() {
            debug!(reason = ?self.handle.reason(), "Subscription cancelled");
        }
    }
}

impl<T, E> Stream for Subscription<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.handle.register(cx);
        if this.handle.is_cancelled() {
            this.release();
            return Poll::Ready(None);
        }

        let Some(upstream) = this.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        match upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Err(failure))) => {
                this.upstream = None;
                Poll::Ready(Some(Err(failure)))
            }
            Poll::Ready(None) => {
                this.upstream = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, E> FusedStream for Subscription<T, E> {
    fn is_terminated(&self) -> bool {
        self.upstream.is_none()
    }
}

impl<T, E> std::fmt::Debug for Subscription<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("terminated", &self.upstream.is_none())
            .field("handle", &self.handle)
            .finish()
    }
}
