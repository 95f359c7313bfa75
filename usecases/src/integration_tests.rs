//! End-to-end tests chaining the bridge, joins and decorators.

use crate::bridge::{AsyncFnUseCase, AsyncUseCaseExt};
use crate::observable::Observable;
use crate::retry::{BackoffRetrySource, JitterStrategy, RetryConfig};
use crate::testing::{
    assert_emits, assert_fails_with, init_test_tracing, RecordingTracker, RetrySignal, ScriptedRetrySource,
    ScriptedUseCase, TrackerEvent,
};
use crate::tracking::ActivityIndicator;
use crate::usecase::{FnUseCase, ReactiveUseCaseExt, UnitUseCase, UseCase};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::{assert_pending, task};

#[derive(Debug, Clone, PartialEq, Eq)]
enum ProfileError {
    Unavailable,
    Unauthorized,
}

fn counting_lookup(
    calls: &Arc<AtomicUsize>,
    fail_first: usize,
) -> impl AsyncUseCaseExt<Input = u32, Output = String, Failure = ProfileError> {
    let calls = Arc::clone(calls);
    AsyncFnUseCase::new(move |id: u32| {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if call < fail_first {
                Err(ProfileError::Unavailable)
            } else {
                Ok(format!("user-{id}"))
            }
        }
    })
}

#[tokio::test]
async fn test_bridged_pair_retried_and_tracked() {
    init_test_tracing();
    let user_calls = Arc::new(AtomicUsize::new(0));
    let settings_calls = Arc::new(AtomicUsize::new(0));
    let tracker = Arc::new(RecordingTracker::new());

    let settings = AsyncFnUseCase::new({
        let calls = Arc::clone(&settings_calls);
        move |(): ()| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, ProfileError>("dark-mode") }
        }
    });

    let profile = counting_lookup(&user_calls, 1)
        .make_reactive()
        .make_paired(settings.make_reactive())
        .make_retryable(ScriptedRetrySource::new([true]), None)
        .make_trackable(Arc::clone(&tracker));

    assert_emits(&profile.execute((7, ())), vec![("user-7".to_string(), "dark-mode")]).await;

    assert_eq!(user_calls.load(Ordering::SeqCst), 2);
    assert_eq!(tracker.events(), vec![TrackerEvent::Begin, TrackerEvent::End]);
}

#[tokio::test]
async fn test_retry_reexecutes_every_child_of_join() {
    let first = ScriptedUseCase::new(vec![Ok::<_, ProfileError>(1), Ok(2)]);
    let second = ScriptedUseCase::new(vec![Err(ProfileError::Unavailable), Ok('b')]);

    let joined = first
        .clone()
        .make_paired(second.clone())
        .make_retryable(ScriptedRetrySource::new([true]), None);

    assert_emits(&joined.execute(((), ())), vec![(2, 'b')]).await;
    assert_eq!(first.executions(), 2);
    assert_eq!(second.executions(), 2);
}

#[tokio::test]
async fn test_ineligible_failure_in_join_surfaces_once() {
    let retries = ScriptedRetrySource::new([true]);
    let joined = ScriptedUseCase::new(vec![Ok::<_, ProfileError>(1)])
        .make_triple(
            ScriptedUseCase::<u8, _>::new(vec![Err(ProfileError::Unauthorized)]),
            ScriptedUseCase::new(vec![Ok("c")]),
        )
        .make_retryable_when(retries.clone(), |failure: &ProfileError| *failure == ProfileError::Unavailable);

    let observable = joined.execute(((), (), ()));
    assert_fails_with(&observable, ProfileError::Unauthorized).await;
    assert_eq!(retries.subscriptions(), 0);
}

#[test]
fn test_cancelling_retried_pipeline_ends_activity_and_decision_wait() {
    let signal = RetrySignal::new();
    let tracker = Arc::new(RecordingTracker::new());
    let tracked = ScriptedUseCase::<u8, _>::new(vec![Err(ProfileError::Unavailable)])
        .make_retryable(signal.clone(), None)
        .make_trackable(Arc::clone(&tracker));

    let mut subscription = task::spawn(tracked.run().subscribe());
    assert_pending!(subscription.poll_next());
    assert_eq!(signal.subscriber_count(), 1);
    assert_eq!(tracker.events(), vec![TrackerEvent::Begin]);

    subscription.cancel("navigated away");

    assert_eq!(signal.subscriber_count(), 0);
    assert_eq!(tracker.events(), vec![TrackerEvent::Begin, TrackerEvent::End]);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_source_gives_up_after_cap() {
    let calls = Arc::new(AtomicUsize::new(0));
    let indicator = Arc::new(ActivityIndicator::new());
    let retries = BackoffRetrySource::new(
        RetryConfig::new()
            .with_max_attempts(2)
            .with_base_delay_ms(100)
            .with_jitter(JitterStrategy::None),
    );

    let lookup = counting_lookup(&calls, usize::MAX)
        .make_reactive()
        .make_retryable(retries.clone(), None)
        .make_trackable(Arc::clone(&indicator));

    assert_fails_with(&lookup.execute(1), ProfileError::Unavailable).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(retries.retries(), 2);
    assert!(!indicator.is_active());
}

#[tokio::test]
async fn test_decorators_accept_plain_reactive_use_cases() {
    let doubled = FnUseCase::new(|n: i32| Observable::<i32, ProfileError>::just(n * 2))
        .make_trackable(Arc::new(RecordingTracker::new()))
        .make_retryable(ScriptedRetrySource::default(), None)
        .make_paired(FnUseCase::new(|(): ()| Observable::just("unit")));

    assert_eq!(doubled.execute_without_second(21).first().await, Ok((42, "unit")));
}
