//! Test assertions for observable pipelines.

use crate::observable::Observable;
use std::fmt::Debug;

/// Asserts that one subscription emits exactly `expected`, then completes.
pub async fn assert_emits<T, E>(observable: &Observable<T, E>, expected: Vec<T>)
where
    T: Debug + PartialEq + Send + 'static,
    E: Debug + Send + 'static,
{
    let items = observable.collect().await;
    let values: Vec<T> = items
        .into_iter()
        .map(|item| match item {
            Ok(value) => value,
            Err(failure) => panic!("Expected values {expected:?}, got failure: {failure:?}"),
        })
        .collect();
    assert_eq!(values, expected, "Expected values {expected:?}, got {values:?}");
}

/// Asserts that one subscription fails with `expected` as its last item.
pub async fn assert_fails_with<T, E>(observable: &Observable<T, E>, expected: E)
where
    T: Debug + Send + 'static,
    E: Debug + PartialEq + Send + 'static,
{
    let items = observable.collect().await;
    match items.last() {
        Some(Err(failure)) => assert_eq!(
            failure, &expected,
            "Expected failure {expected:?}, got {failure:?}"
        ),
        other => panic!("Expected failure {expected:?}, got {other:?}"),
    }
}
