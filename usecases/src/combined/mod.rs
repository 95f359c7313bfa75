//! Joining independent reactive use cases into one.
//!
//! [`PairedUseCase`], [`TripleUseCase`] and [`QuadrupleUseCase`] take the
//! tuple of their children's inputs and emit the tuple of their children's
//! values, zipped by index. All children are subscribed together; the first
//! child failure fails the join and cancels the remaining children.
//!
//! ```rust,ignore
//! use usecases::prelude::*;
//!
//! let profile = load_user.make_paired(load_settings);
//! let (user, settings) = profile.execute_each(user_id, ()).first().await?;
//!
//! // Positions taking `()` may be left out.
//! let profile = profile.execute_without_second(user_id);
//! ```

#[macro_use]
mod macros;

use crate::observable::Observable;
use crate::usecase::UseCase;

combined_use_case! {
    /// Two reactive use cases joined by index.
    pub struct PairedUseCase {
        use_case1: U1 => T1, input1 @ 0;
        use_case2: U2 => T2, input2 @ 1;
    }
    zip = zip2;
    omit {
        /// Executes with the first input, which is `()`, left out.
        execute_without_first: U1 (input2: U2) => ((), input2);
        /// Executes with the second input, which is `()`, left out.
        execute_without_second: U2 (input1: U1) => (input1, ());
    }
}

combined_use_case! {
    /// Three reactive use cases joined by index.
    pub struct TripleUseCase {
        use_case1: U1 => T1, input1 @ 0;
        use_case2: U2 => T2, input2 @ 1;
        use_case3: U3 => T3, input3 @ 2;
    }
    zip = zip3;
    omit {
        /// Executes with the first input, which is `()`, left out.
        execute_without_first: U1 (input2: U2, input3: U3) => ((), input2, input3);
        /// Executes with the second input, which is `()`, left out.
        execute_without_second: U2 (input1: U1, input3: U3) => (input1, (), input3);
        /// Executes with the third input, which is `()`, left out.
        execute_without_third: U3 (input1: U1, input2: U2) => (input1, input2, ());
    }
}

combined_use_case! {
    /// Four reactive use cases joined by index.
    pub struct QuadrupleUseCase {
        use_case1: U1 => T1, input1 @ 0;
        use_case2: U2 => T2, input2 @ 1;
        use_case3: U3 => T3, input3 @ 2;
        use_case4: U4 => T4, input4 @ 3;
    }
    zip = zip4;
    omit {
        /// Executes with the first input, which is `()`, left out.
        execute_without_first: U1 (input2: U2, input3: U3, input4: U4) => ((), input2, input3, input4);
        /// Executes with the second input, which is `()`, left out.
        execute_without_second: U2 (input1: U1, input3: U3, input4: U4) => (input1, (), input3, input4);
        /// Executes with the third input, which is `()`, left out.
        execute_without_third: U3 (input1: U1, input2: U2, input4: U4) => (input1, input2, (), input4);
        /// Executes with the fourth input, which is `()`, left out.
        execute_without_fourth: U4 (input1: U1, input2: U2, input3: U3) => (input1, input2, input3, ());
    }
}

impl<U1, U2> PairedUseCase<U1, U2> {
    /// Extends the pair with a third use case.
    pub fn joined_with<U3>(self, use_case3: U3) -> TripleUseCase<U1, U2, U3> {
        TripleUseCase::new(self.use_case1, self.use_case2, use_case3)
    }
}

impl<U1, U2, U3> TripleUseCase<U1, U2, U3> {
    /// Extends the triple with a fourth use case.
    pub fn joined_with<U4>(self, use_case4: U4) -> QuadrupleUseCase<U1, U2, U3, U4> {
        QuadrupleUseCase::new(self.use_case1, self.use_case2, self.use_case3, use_case4)
    }
}

/// Joins two reactive use cases sharing a failure type.
pub fn make_pair<U1, U2, T1, T2, E>(use_case1: U1, use_case2: U2) -> PairedUseCase<U1, U2>
where
    U1: UseCase<Output = Observable<T1, E>>,
    U2: UseCase<Output = Observable<T2, E>>,
{
    PairedUseCase::new(use_case1, use_case2)
}

/// Joins three reactive use cases sharing a failure type.
pub fn make_triple<U1, U2, U3, T1, T2, T3, E>(
    use_case1: U1,
    use_case2: U2,
    use_case3: U3,
) -> TripleUseCase<U1, U2, U3>
where
    U1: UseCase<Output = Observable<T1, E>>,
    U2: UseCase<Output = Observable<T2, E>>,
    U3: UseCase<Output = Observable<T3, E>>,
{
    TripleUseCase::new(use_case1, use_case2, use_case3)
}

/// Joins four reactive use cases sharing a failure type.
pub fn make_quadruple<U1, U2, U3, U4, T1, T2, T3, T4, E>(
    use_case1: U1,
    use_case2: U2,
    use_case3: U3,
    use_case4: U4,
) -> QuadrupleUseCase<U1, U2, U3, U4>
where
    U1: UseCase<Output = Observable<T1, E>>,
    U2: UseCase<Output = Observable<T2, E>>,
    U3: UseCase<Output = Observable<T3, E>>,
    U4: UseCase<Output = Observable<T4, E>>,
{
    QuadrupleUseCase::new(use_case1, use_case2, use_case3, use_case4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExecutionError;
    use crate::testing::ScriptedUseCase;
    use crate::usecase::{FnUseCase, ReactiveUseCaseExt};
    use futures::channel::mpsc;
    use futures::stream::{self, StreamExt};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum LoadError {
        Offline,
        Denied,
    }

    fn just<I, T>(value: T) -> FnUseCase<I, impl Fn(I) -> Observable<T, LoadError> + Clone>
    where
        T: Clone + Send + Sync + 'static,
    {
        FnUseCase::new(move |_: I| Observable::just(value.clone()))
    }

    fn failing<I, T>(failure: LoadError) -> FnUseCase<I, impl Fn(I) -> Observable<T, LoadError> + Clone>
    where
        T: Send + 'static,
    {
        FnUseCase::new(move |_: I| Observable::fail(failure.clone()))
    }

    fn echo<I>() -> FnUseCase<I, impl Fn(I) -> Observable<I, LoadError> + Clone>
    where
        I: Clone + Send + Sync + 'static,
    {
        FnUseCase::new(|input: I| Observable::just(input))
    }

    #[tokio::test]
    async fn test_pair_emits_tuple_once() {
        let paired = make_pair(just::<(), _>(1), just::<(), _>("one"));
        let items = paired.execute(((), ())).collect().await;
        assert_eq!(items, vec![Ok((1, "one"))]);
    }

    #[tokio::test]
    async fn test_triple_emits_in_construction_order() {
        let triple = make_triple(just::<(), _>('a'), just::<(), _>(2u8), just::<(), _>(3.5));
        let items = triple.run().collect().await;
        assert_eq!(items, vec![Ok(('a', 2u8, 3.5))]);
    }

    #[tokio::test]
    async fn test_quadruple_emits_tuple_once() {
        let quadruple = make_quadruple(echo::<i32>(), echo::<String>(), echo::<bool>(), echo::<u8>());
        let items = quadruple
            .execute_each(4, "four".to_string(), true, 8)
            .collect()
            .await;
        assert_eq!(items, vec![Ok((4, "four".to_string(), true, 8))]);
    }

    #[tokio::test]
    async fn test_child_failure_fails_join() {
        let paired = make_pair(just::<(), _>(1), failing::<(), u8>(LoadError::Offline));
        let items = paired.run().collect().await;
        assert_eq!(items, vec![Err(LoadError::Offline)]);

        let quadruple = make_quadruple(
            just::<(), _>(1),
            just::<(), _>(2),
            failing::<(), u8>(LoadError::Denied),
            just::<(), _>(4),
        );
        assert_eq!(
            quadruple.run().first().await,
            Err(ExecutionError::Failed(LoadError::Denied))
        );
    }

    #[test]
    fn test_failure_cancels_pending_children() {
        let (tx, rx) = mpsc::unbounded::<Result<u8, LoadError>>();
        let rx = Arc::new(parking_lot::Mutex::new(Some(rx)));
        let pending = FnUseCase::new(move |(): ()| {
            let rx = Arc::clone(&rx);
            Observable::new(move || rx.lock().take().map_or_else(|| stream::empty().boxed(), |rx| rx.boxed()))
        });

        let triple = make_triple(pending, failing::<(), u8>(LoadError::Offline), just::<(), _>(3));
        let mut subscription = task::spawn(triple.run().subscribe());

        assert_ready_eq!(subscription.poll_next(), Some(Err(LoadError::Offline)));
        assert!(tx.is_closed());
    }

    #[test]
    fn test_external_cancel_drops_every_child() {
        let (left_tx, left_rx) = mpsc::unbounded::<Result<u8, LoadError>>();
        let left_rx = Arc::new(parking_lot::Mutex::new(Some(left_rx)));
        let left = FnUseCase::new(move |(): ()| {
            let rx = Arc::clone(&left_rx);
            Observable::new(move || rx.lock().take().map_or_else(|| stream::empty().boxed(), |rx| rx.boxed()))
        });
        let (right_tx, right_rx) = mpsc::unbounded::<Result<char, LoadError>>();
        let right_rx = Arc::new(parking_lot::Mutex::new(Some(right_rx)));
        let right = FnUseCase::new(move |(): ()| {
            let rx = Arc::clone(&right_rx);
            Observable::new(move || rx.lock().take().map_or_else(|| stream::empty().boxed(), |rx| rx.boxed()))
        });

        let mut subscription = task::spawn(make_pair(left, right).run().subscribe());
        assert_pending!(subscription.poll_next());
        assert!(!left_tx.is_closed());
        assert!(!right_tx.is_closed());

        subscription.cancel("screen closed");

        assert!(left_tx.is_closed());
        assert!(right_tx.is_closed());
        assert_ready_eq!(subscription.poll_next(), None);
    }

    #[test]
    fn test_join_waits_for_slowest_child() {
        let (tx, rx) = mpsc::unbounded::<Result<u8, LoadError>>();
        let rx = Arc::new(parking_lot::Mutex::new(Some(rx)));
        let slow = FnUseCase::new(move |(): ()| {
            let rx = Arc::clone(&rx);
            Observable::new(move || rx.lock().take().map_or_else(|| stream::empty().boxed(), |rx| rx.boxed()))
        });

        let paired = just::<(), _>("fast").make_paired(slow);
        let mut subscription = task::spawn(paired.run().subscribe());

        assert_pending!(subscription.poll_next());
        tx.unbounded_send(Ok(7)).ok();
        assert_ready_eq!(subscription.poll_next(), Some(Ok(("fast", 7))));
    }

    #[tokio::test]
    async fn test_zips_multiple_emissions_by_index() {
        let numbers = FnUseCase::new(|(): ()| {
            Observable::<i32, LoadError>::new(|| stream::iter(vec![Ok(1), Ok(2), Ok(3)]))
        });
        let letters = FnUseCase::new(|(): ()| {
            Observable::<char, LoadError>::new(|| stream::iter(vec![Ok('a'), Ok('b')]))
        });

        let items = numbers.make_paired(letters).run().collect().await;
        assert_eq!(items, vec![Ok((1, 'a')), Ok((2, 'b'))]);
    }

    #[tokio::test]
    async fn test_omitted_unit_inputs_match_full_form() {
        let paired = make_pair(echo::<i32>(), just::<(), _>("unit"));
        assert_eq!(
            paired.execute_without_second(5).collect().await,
            paired.execute((5, ())).collect().await
        );

        let paired = make_pair(just::<(), _>("unit"), echo::<i32>());
        assert_eq!(
            paired.execute_without_first(6).collect().await,
            paired.execute(((), 6)).collect().await
        );

        let triple = make_triple(echo::<i32>(), just::<(), _>('u'), echo::<bool>());
        assert_eq!(
            triple.execute_without_second(1, false).collect().await,
            vec![Ok((1, 'u', false))]
        );

        let triple = make_triple(echo::<i32>(), echo::<bool>(), just::<(), _>('u'));
        assert_eq!(
            triple.execute_without_third(2, true).collect().await,
            vec![Ok((2, true, 'u'))]
        );

        let quadruple = make_quadruple(echo::<i32>(), echo::<u8>(), just::<(), _>('u'), echo::<bool>());
        assert_eq!(
            quadruple.execute_without_third(1, 2, true).collect().await,
            quadruple.execute((1, 2, (), true)).collect().await
        );

        let quadruple = make_quadruple(echo::<i32>(), echo::<u8>(), echo::<bool>(), just::<(), _>('u'));
        assert_eq!(
            quadruple.execute_without_fourth(1, 2, false).collect().await,
            vec![Ok((1, 2, false, 'u'))]
        );

        let quadruple = make_quadruple(just::<(), _>('u'), echo::<u8>(), echo::<bool>(), echo::<i32>());
        assert_eq!(
            quadruple.execute_without_first(3, true, 9).collect().await,
            vec![Ok(('u', 3, true, 9))]
        );
    }

    #[tokio::test]
    async fn test_fluent_composition() {
        let quadruple = just::<(), _>(1)
            .make_paired(just::<(), _>(2))
            .joined_with(just::<(), _>(3))
            .joined_with(just::<(), _>(4));
        assert_eq!(quadruple.run().first().await, Ok((1, 2, 3, 4)));

        let triple = just::<(), _>("a").make_triple(just::<(), _>("b"), just::<(), _>("c"));
        assert_eq!(triple.run().first().await, Ok(("a", "b", "c")));

        let quadruple = just::<(), _>(1u8).make_quadruple(echo::<i32>(), just::<(), _>(3u8), just::<(), _>(4u8));
        assert_eq!(quadruple.execute_without_first(2, (), ()).first().await, Ok((1, 2, 3, 4)));
    }

    #[tokio::test]
    async fn test_same_use_case_twice_runs_independently() {
        let counter = ScriptedUseCase::new(vec![Ok::<_, LoadError>(1), Ok(2)]);
        let paired = make_pair(counter.clone(), counter.clone());

        let items = paired.run().collect().await;

        assert_eq!(items, vec![Ok((1, 2))]);
        assert_eq!(counter.executions(), 2);
    }

    #[tokio::test]
    async fn test_each_subscription_resubscribes_children() {
        let executions = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&executions);
        let counting = FnUseCase::new(move |(): ()| {
            let counted = Arc::clone(&counted);
            Observable::<usize, LoadError>::from_future(move || {
                let counted = Arc::clone(&counted);
                async move { Ok(counted.fetch_add(1, Ordering::SeqCst)) }
            })
        });

        let observable = counting.make_paired(just::<(), _>(())).run();
        observable.first().await.ok();
        observable.first().await.ok();

        assert_eq!(executions.load(Ordering::SeqCst), 2);
    }
}
