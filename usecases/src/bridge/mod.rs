//! Bridge from asynchronous use cases to observable ones.
//!
//! An [`AsyncUseCase`] runs once per call and resolves to a `Result`.
//! [`AsyncUseCaseExt::make_reactive`] turns it into a [`ReactiveUseCase`]
//! whose pipelines are cold: every subscription spawns its own task on the
//! ambient tokio runtime, and dropping the subscription aborts that task.
//!
//! [`ReactiveUseCase`]: crate::usecase::ReactiveUseCase

mod task;

use crate::observable::Observable;
use crate::usecase::UseCase;
use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use futures::stream::{self, Stream, StreamExt};
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use task::AbortOnDrop;
use tracing::trace;

/// A use case that runs asynchronously and may fail.
#[async_trait]
pub trait AsyncUseCase: Send + Sync {
    /// The input the use case is executed with.
    type Input: Send + 'static;

    /// The value produced on success.
    type Output: Send + 'static;

    /// The domain failure.
    type Failure: Send + 'static;

    /// Executes the use case.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Failure>;
}

#[async_trait]
impl<U> AsyncUseCase for Arc<U>
where
    U: AsyncUseCase + ?Sized,
{
    type Input = U::Input;
    type Output = U::Output;
    type Failure = U::Failure;

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, Self::Failure> {
        AsyncUseCase::execute(&**self, input).await
    }
}

/// Zero-argument execution for asynchronous use cases that take no input.
pub trait AsyncUnitUseCase: AsyncUseCase<Input = ()> {
    /// Executes the use case with the unit input.
    fn run(&self) -> BoxFuture<'_, Result<Self::Output, Self::Failure>> {
        AsyncUseCase::execute(self, ())
    }
}

impl<U> AsyncUnitUseCase for U where U: AsyncUseCase<Input = ()> + ?Sized {}

/// Conversions for asynchronous use cases.
pub trait AsyncUseCaseExt: AsyncUseCase + Sized + 'static {
    /// Adapts the use case into a reactive one.
    ///
    /// Each subscription to an executed pipeline owns a copy of the input and
    /// an independent execution.
    fn make_reactive(self) -> ReactiveAsyncUseCase<Self>
    where
        Self::Input: Clone + Sync,
    {
        ReactiveAsyncUseCase::new(self)
    }
}

impl<U> AsyncUseCaseExt for U where U: AsyncUseCase + 'static {}

/// A reactive view of an [`AsyncUseCase`].
pub struct ReactiveAsyncUseCase<U> {
    source: Arc<U>,
}

impl<U> ReactiveAsyncUseCase<U> {
    /// Wraps an asynchronous use case.
    #[must_use]
    pub fn new(source: U) -> Self {
        Self {
            source: Arc::new(source),
        }
    }
}

impl<U> Clone for ReactiveAsyncUseCase<U> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<U> Debug for ReactiveAsyncUseCase<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveAsyncUseCase").finish_non_exhaustive()
    }
}

impl<U> UseCase for ReactiveAsyncUseCase<U>
where
    U: AsyncUseCase + 'static,
    U::Input: Clone + Sync,
{
    type Input = U::Input;
    type Output = Observable<U::Output, U::Failure>;

    fn execute(&self, input: Self::Input) -> Self::Output {
        let source = Arc::clone(&self.source);
        Observable::new(move || spawn_execution(Arc::clone(&source), input.clone()))
    }
}

/// One subscription's execution: spawned on first poll, aborted on drop.
fn spawn_execution<U>(source: Arc<U>, input: U::Input) -> impl Stream<Item = Result<U::Output, U::Failure>> + Send
where
    U: AsyncUseCase + 'static,
{
    stream::once(async move {
        trace!("Spawning bridged execution");
        let mut task = AbortOnDrop::spawn(async move { AsyncUseCase::execute(&*source, input).await });
        task.join().await
    })
    .filter_map(future::ready)
}

/// A closure-based asynchronous use case.
pub struct AsyncFnUseCase<I, F> {
    func: F,
    _input: PhantomData<fn(I)>,
}

impl<I, F> AsyncFnUseCase<I, F> {
    /// Creates a use case that awaits `func` on every execution.
    pub fn new<Fut, O, E>(func: F) -> Self
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<O, E>>,
    {
        Self {
            func,
            _input: PhantomData,
        }
    }
}

impl<I, F> Debug for AsyncFnUseCase<I, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnUseCase").finish_non_exhaustive()
    }
}

#[async_trait]
impl<I, F, Fut, O, E> AsyncUseCase for AsyncFnUseCase<I, F>
where
    I: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, E>> + Send,
    O: Send + 'static,
    E: Send + 'static,
{
    type Input = I;
    type Output = O;
    type Failure = E;

    async fn execute(&self, input: I) -> Result<O, E> {
        (self.func)(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExecutionError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum LookupError {
        NotFound,
    }

    struct CountingLookup {
        executions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AsyncUseCase for CountingLookup {
        type Input = u32;
        type Output = String;
        type Failure = LookupError;

        async fn execute(&self, input: u32) -> Result<String, LookupError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if input == 0 {
                Err(LookupError::NotFound)
            } else {
                Ok(format!("user-{input}"))
            }
        }
    }

    fn lookup() -> (CountingLookup, Arc<AtomicUsize>) {
        let executions = Arc::new(AtomicUsize::new(0));
        (
            CountingLookup {
                executions: Arc::clone(&executions),
            },
            executions,
        )
    }

    #[tokio::test]
    async fn test_emits_single_value() {
        let (use_case, _) = lookup();
        let reactive = use_case.make_reactive();

        let items = reactive.execute(3).collect().await;
        assert_eq!(items, vec![Ok("user-3".to_string())]);
    }

    #[tokio::test]
    async fn test_emits_single_failure() {
        let (use_case, _) = lookup();
        let reactive = use_case.make_reactive();

        let items = reactive.execute(0).collect().await;
        assert_eq!(items, vec![Err(LookupError::NotFound)]);
    }

    #[tokio::test]
    async fn test_each_subscription_executes_independently() {
        let (use_case, executions) = lookup();
        let observable = use_case.make_reactive().execute(1);

        assert_eq!(executions.load(Ordering::SeqCst), 0);

        let (first, second) = tokio::join!(observable.first(), observable.first());
        assert_eq!(first, Ok("user-1".to_string()));
        assert_eq!(second, Ok("user-1".to_string()));
        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelling_subscription_aborts_task() {
        let (started_tx, started_rx) = oneshot::channel::<()>();
        let started_tx = Arc::new(parking_lot::Mutex::new(Some(started_tx)));
        let finished = Arc::new(AtomicUsize::new(0));
        let finished_flag = Arc::clone(&finished);

        let slow = AsyncFnUseCase::new(move |(): ()| {
            let started_tx = Arc::clone(&started_tx);
            let finished = Arc::clone(&finished_flag);
            async move {
                if let Some(tx) = started_tx.lock().take() {
                    let _ = tx.send(());
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok::<_, LookupError>(())
            }
        });

        let observable = slow.make_reactive().execute(());
        let mut subscription = observable.subscribe();
        let handle = subscription.cancel_handle();

        let driver = tokio::spawn(async move { subscription.next().await });
        started_rx.await.ok();
        handle.cancel("no longer needed");

        assert_eq!(driver.await.ok(), Some(None));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_async_fn_use_case_and_run() {
        let answer = AsyncFnUseCase::new(|(): ()| async { Ok::<_, LookupError>(42) });
        assert_eq!(answer.run().await, Ok(42));

        let reactive = answer.make_reactive();
        assert_eq!(reactive.execute(()).first().await, Ok(42));
    }

    #[tokio::test]
    async fn test_first_on_failure() {
        let (use_case, _) = lookup();
        let result = use_case.make_reactive().execute(0).first().await;
        assert_eq!(result, Err(ExecutionError::Failed(LookupError::NotFound)));
    }
}
