//! Lazy, cancellable, re-subscribable pipelines.
//!
//! An [`Observable`] describes a computation without running it. Every call to
//! [`Observable::subscribe`] creates a fresh [`Subscription`] that drives its
//! own execution; nothing is shared between subscriptions.

mod lifecycle;
mod subscription;
pub(crate) mod zip;

pub use lifecycle::LifecycleHooks;
pub use subscription::{CancelHandle, Subscription};

use crate::errors::ExecutionError;
use futures::future::Future;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use lifecycle::LifecycleStream;
use std::sync::Arc;

/// The boxed stream driven by a single subscription.
pub type EventStream<T, E> = BoxStream<'static, Result<T, E>>;

type Factory<T, E> = dyn Fn() -> EventStream<T, E> + Send + Sync;

/// A lazy description of a computation emitting values of type `T` and
/// failing with `E`.
///
/// Cloning is cheap and clones describe the same computation.
pub struct Observable<T, E> {
    factory: Arc<Factory<T, E>>,
}

impl<T, E> Clone for Observable<T, E> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T, E> std::fmt::Debug for Observable<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable").finish_non_exhaustive()
    }
}

impl<T, E> Observable<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates an observable from a stream factory.
    ///
    /// The factory runs once per subscription.
    pub fn new<F, S>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Result<T, E>> + Send + 'static,
    {
        Self::from_boxed(move || factory().boxed())
    }

    pub(crate) fn from_boxed<F>(factory: F) -> Self
    where
        F: Fn() -> EventStream<T, E> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Creates a single-shot observable from a future factory.
    ///
    /// Each subscription builds and awaits a new future.
    pub fn from_future<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::new(move || stream::once(factory()))
    }

    /// Emits `value` once per subscription, then completes.
    pub fn just(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move || stream::once(futures::future::ready(Ok(value.clone()))))
    }

    /// Fails with `failure` on every subscription.
    pub fn fail(failure: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move || stream::once(futures::future::ready(Err(failure.clone()))))
    }

    /// Completes without emitting.
    pub fn empty() -> Self {
        Self::new(stream::empty)
    }

    /// Starts a new, independent run of the pipeline.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T, E> {
        Subscription::new(self.stream())
    }

    pub(crate) fn stream(&self) -> EventStream<T, E> {
        (self.factory)()
    }

    /// Transforms every emitted value.
    pub fn map<U, F>(self, op: F) -> Observable<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let op = Arc::new(op);
        Observable::from_boxed(move || {
            let op = Arc::clone(&op);
            self.stream().map_ok(move |value| op(value)).boxed()
        })
    }

    /// Transforms the failure.
    pub fn map_err<F2, O>(self, op: O) -> Observable<T, F2>
    where
        F2: Send + 'static,
        O: Fn(E) -> F2 + Send + Sync + 'static,
    {
        let op = Arc::new(op);
        Observable::from_boxed(move || {
            let op = Arc::clone(&op);
            self.stream().map_err(move |failure| op(failure)).boxed()
        })
    }

    /// Observes lifecycle events of every subscription.
    ///
    /// `make_hooks` runs once per subscription, so each run gets its own hooks.
    pub fn handle_events<H, F>(self, make_hooks: F) -> Self
    where
        H: LifecycleHooks<T, E> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self::from_boxed(move || LifecycleStream::start(make_hooks(), || self.stream()).boxed())
    }

    /// Subscribes and collects every item until the subscription terminates.
    pub async fn collect(&self) -> Vec<Result<T, E>> {
        self.subscribe().collect().await
    }

    /// Subscribes and awaits the first value.
    pub async fn first(&self) -> Result<T, ExecutionError<E>> {
        self.subscribe().first().await
    }
}
