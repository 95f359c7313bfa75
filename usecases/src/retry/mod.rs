//! Retry decorator driven by an external decision source.
//!
//! A [`RetryableUseCase`] forwards everything its source pipeline emits. When
//! the source fails with a retry-eligible failure, the subscription asks the
//! [`UseCaseRetrySource`] for a decision and waits for it: `true` subscribes
//! to the source again from the beginning, `false` (or a decision stream that
//! completes without a value) surfaces the original failure.
//!
//! There is no attempt cap here; bounding retries is the retry source's job.
//! [`BackoffRetrySource`] is a ready-made source with a cap and backoff delays.

mod backoff;

pub use backoff::{BackoffRetrySource, BackoffStrategy, JitterStrategy, RetryConfig};

use crate::observable::{EventStream, Observable};
use crate::usecase::UseCase;
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::fmt::Debug;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::debug;

/// Decides whether a failed pipeline should run again.
///
/// Every eligible failure subscribes to a fresh [`retry_effect`] and only the
/// first decision it emits is used. Implementations are shared across all
/// subscriptions and must tolerate concurrent use.
///
/// [`retry_effect`]: UseCaseRetrySource::retry_effect
pub trait UseCaseRetrySource: Send + Sync {
    /// A pipeline emitting `true` to retry or `false` to give up.
    fn retry_effect(&self) -> Observable<bool, Infallible>;
}

impl<R> UseCaseRetrySource for Arc<R>
where
    R: UseCaseRetrySource + ?Sized,
{
    fn retry_effect(&self) -> Observable<bool, Infallible> {
        (**self).retry_effect()
    }
}

/// Decides whether a given failure may be retried at all.
pub type RetryPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// A reactive use case that re-runs its source on retry-eligible failures.
pub struct RetryableUseCase<U, R, E> {
    source: U,
    retry_source: Arc<R>,
    predicate: Option<RetryPredicate<E>>,
}

impl<U, R, E> RetryableUseCase<U, R, E> {
    /// Wraps `source`; with no predicate every failure is retry-eligible.
    pub fn new(source: U, retry_source: R, predicate: Option<RetryPredicate<E>>) -> Self {
        Self {
            source,
            retry_source: Arc::new(retry_source),
            predicate,
        }
    }
}

impl<U: Clone, R, E> Clone for RetryableUseCase<U, R, E> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            retry_source: Arc::clone(&self.retry_source),
            predicate: self.predicate.clone(),
        }
    }
}

impl<U: Debug, R, E> Debug for RetryableUseCase<U, R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryableUseCase")
            .field("source", &self.source)
            .field("has_predicate", &self.predicate.is_some())
            .finish_non_exhaustive()
    }
}

impl<U, R, T, E> UseCase for RetryableUseCase<U, R, E>
where
    U: UseCase<Output = Observable<T, E>>,
    R: UseCaseRetrySource + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    type Input = U::Input;
    type Output = Observable<T, E>;

    fn execute(&self, input: Self::Input) -> Self::Output {
        let pipeline = self.source.execute(input);
        let retry_source = Arc::clone(&self.retry_source);
        let predicate = self.predicate.clone();
        Observable::from_boxed(move || {
            RetryStream {
                pipeline: pipeline.clone(),
                retry_source: Arc::clone(&retry_source),
                predicate: predicate.clone(),
                state: RetryState::Running(pipeline.stream()),
                attempt: 0,
            }
            .boxed()
        })
    }
}

enum RetryState<T, E> {
    Running(EventStream<T, E>),
    AwaitingDecision {
        decisions: EventStream<bool, Infallible>,
        failure: E,
    },
    Finished,
}

/// One subscription's retry state machine.
struct RetryStream<T, E, R> {
    pipeline: Observable<T, E>,
    retry_source: Arc<R>,
    predicate: Option<RetryPredicate<E>>,
    state: RetryState<T, E>,
    attempt: u32,
}

// Streams are boxed, nothing is pinned structurally.
impl<T, E, R> Unpin for RetryStream<T, E, R> {}

impl<T, E, R> RetryStream<T, E, R>
where
    T: Send + 'static,
    E: Send + 'static,
    R: UseCaseRetrySource,
{
    fn is_eligible(&self, failure: &E) -> bool {
        self.predicate.as_ref().map_or(true, |predicate| predicate(failure))
    }
}

impl<T, E, R> Stream for RetryStream<T, E, R>
where
    T: Send + 'static,
    E: Send + 'static,
    R: UseCaseRetrySource,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match std::mem::replace(&mut this.state, RetryState::Finished) {
                RetryState::Running(mut upstream) => match upstream.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(value))) => {
                        this.state = RetryState::Running(upstream);
                        return Poll::Ready(Some(Ok(value)));
                    }
                    Poll::Ready(Some(Err(failure))) => {
                        drop(upstream);
                        if !this.is_eligible(&failure) {
                            debug!(attempt = this.attempt, "Failure is not retry-eligible");
                            return Poll::Ready(Some(Err(failure)));
                        }
                        debug!(attempt = this.attempt, "Awaiting retry decision");
                        this.state = RetryState::AwaitingDecision {
                            decisions: this.retry_source.retry_effect().stream(),
                            failure,
                        };
                    }
                    Poll::Ready(None) => return Poll::Ready(None),
                    Poll::Pending => {
                        this.state = RetryState::Running(upstream);
                        return Poll::Pending;
                    }
                },
                RetryState::AwaitingDecision { mut decisions, failure } => match decisions.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(true))) => {
                        this.attempt = this.attempt.saturating_add(1);
                        debug!(attempt = this.attempt, "Retrying pipeline");
                        this.state = RetryState::Running(this.pipeline.stream());
                        // Yield so an always-true source cannot starve the executor or a cancel.
                        cx.waker().wake_by_ref();
                        return Poll::Pending;
                    }
                    Poll::Ready(Some(Ok(false))) => {
                        debug!(attempt = this.attempt, "Retry declined");
                        return Poll::Ready(Some(Err(failure)));
                    }
                    Poll::Ready(Some(Err(never))) => match never {},
                    Poll::Ready(None) => {
                        debug!(attempt = this.attempt, "Retry source completed without a decision");
                        return Poll::Ready(Some(Err(failure)));
                    }
                    Poll::Pending => {
                        this.state = RetryState::AwaitingDecision { decisions, failure };
                        return Poll::Pending;
                    }
                },
                RetryState::Finished => return Poll::Ready(None),
            }
        }
    }
}
