//! The unit-of-work contracts.
//!
//! [`UseCase`] is the base contract: a typed input, a typed output and an
//! `execute` operation. [`ReactiveUseCase`] narrows it to use cases whose
//! output is an [`Observable`], which is what every combinator and decorator
//! in this crate consumes and produces.

use crate::combined::{make_pair, make_quadruple, make_triple, PairedUseCase, QuadrupleUseCase, TripleUseCase};
use crate::observable::Observable;
use crate::retry::{RetryPredicate, RetryableUseCase, UseCaseRetrySource};
use crate::tracking::{TrackableSource, TrackableUseCase};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// A typed unit of work.
pub trait UseCase {
    /// The input the use case is executed with.
    type Input;

    /// What executing the use case produces.
    type Output;

    /// Executes the use case.
    fn execute(&self, input: Self::Input) -> Self::Output;
}

impl<U> UseCase for Arc<U>
where
    U: UseCase + ?Sized,
{
    type Input = U::Input;
    type Output = U::Output;

    fn execute(&self, input: Self::Input) -> Self::Output {
        (**self).execute(input)
    }
}

impl<U> UseCase for Box<U>
where
    U: UseCase + ?Sized,
{
    type Input = U::Input;
    type Output = U::Output;

    fn execute(&self, input: Self::Input) -> Self::Output {
        (**self).execute(input)
    }
}

/// Zero-argument execution for use cases that take no input.
pub trait UnitUseCase: UseCase<Input = ()> {
    /// Executes the use case with the unit input.
    fn run(&self) -> Self::Output {
        self.execute(())
    }
}

impl<U> UnitUseCase for U where U: UseCase<Input = ()> + ?Sized {}

/// A use case whose output is an [`Observable`] of `T` failing with `E`.
///
/// Implemented for every matching [`UseCase`]; it is a capability bound, not
/// something to implement by hand.
pub trait ReactiveUseCase<T, E>: UseCase<Output = Observable<T, E>> {}

impl<U, T, E> ReactiveUseCase<T, E> for U where U: UseCase<Output = Observable<T, E>> + ?Sized {}

/// Fluent combinators and decorators for reactive use cases.
pub trait ReactiveUseCaseExt<T, E>: ReactiveUseCase<T, E> + Sized {
    /// Pairs this use case with another sharing the same failure type.
    fn make_paired<U2, T2>(self, other: U2) -> PairedUseCase<Self, U2>
    where
        U2: UseCase<Output = Observable<T2, E>>,
    {
        make_pair(self, other)
    }

    /// Joins this use case with two others.
    fn make_triple<U2, U3, T2, T3>(self, second: U2, third: U3) -> TripleUseCase<Self, U2, U3>
    where
        U2: UseCase<Output = Observable<T2, E>>,
        U3: UseCase<Output = Observable<T3, E>>,
    {
        make_triple(self, second, third)
    }

    /// Joins this use case with three others.
    fn make_quadruple<U2, U3, U4, T2, T3, T4>(
        self,
        second: U2,
        third: U3,
        fourth: U4,
    ) -> QuadrupleUseCase<Self, U2, U3, U4>
    where
        U2: UseCase<Output = Observable<T2, E>>,
        U3: UseCase<Output = Observable<T3, E>>,
        U4: UseCase<Output = Observable<T4, E>>,
    {
        make_quadruple(self, second, third, fourth)
    }

    /// Re-runs the pipeline on failure when `retry_source` says so.
    ///
    /// With no predicate every failure is eligible for a retry.
    fn make_retryable<R>(
        self,
        retry_source: R,
        predicate: Option<RetryPredicate<E>>,
    ) -> RetryableUseCase<Self, R, E>
    where
        R: UseCaseRetrySource,
    {
        RetryableUseCase::new(self, retry_source, predicate)
    }

    /// Like [`make_retryable`](Self::make_retryable) with a closure predicate.
    fn make_retryable_when<R, P>(self, retry_source: R, predicate: P) -> RetryableUseCase<Self, R, E>
    where
        R: UseCaseRetrySource,
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        RetryableUseCase::new(self, retry_source, Some(Arc::new(predicate)))
    }

    /// Reports the activity of every subscription to a tracker.
    fn make_trackable<S>(self, trackable_source: S) -> TrackableUseCase<Self, S>
    where
        S: TrackableSource,
    {
        TrackableUseCase::new(self, trackable_source)
    }
}

impl<U, T, E> ReactiveUseCaseExt<T, E> for U where U: UseCase<Output = Observable<T, E>> {}

/// A closure-based use case.
pub struct FnUseCase<I, F> {
    func: F,
    _input: PhantomData<fn(I)>,
}

impl<I, F> FnUseCase<I, F> {
    /// Creates a use case that runs `func` on every execution.
    pub fn new<O>(func: F) -> Self
    where
        F: Fn(I) -> O,
    {
        Self {
            func,
            _input: PhantomData,
        }
    }
}

impl<I, F: Clone> Clone for FnUseCase<I, F> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            _input: PhantomData,
        }
    }
}

impl<I, F> Debug for FnUseCase<I, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnUseCase").finish_non_exhaustive()
    }
}

impl<I, O, F> UseCase for FnUseCase<I, F>
where
    F: Fn(I) -> O,
{
    type Input = I;
    type Output = O;

    fn execute(&self, input: I) -> O {
        (self.func)(input)
    }
}
