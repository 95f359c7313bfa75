//! Retry sources and tracing setup for tests.

use futures::channel::mpsc;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::observable::Observable;
use crate::retry::UseCaseRetrySource;

/// Installs a test-friendly tracing subscriber.
///
/// Honors `RUST_LOG` and defaults to `warn`. Safe to call from every test.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default)]
struct Decisions {
    queue: Mutex<VecDeque<bool>>,
    subscriptions: AtomicUsize,
}

/// A retry source answering from a fixed list of decisions.
///
/// Each subscription to a retry effect consumes one decision; once the list
/// runs out, retry effects complete without a decision.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRetrySource {
    decisions: Arc<Decisions>,
}

impl ScriptedRetrySource {
    /// Creates a source answering with `decisions` in order.
    pub fn new(decisions: impl IntoIterator<Item = bool>) -> Self {
        Self {
            decisions: Arc::new(Decisions {
                queue: Mutex::new(decisions.into_iter().collect()),
                subscriptions: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns how many times a decision was asked for.
    #[must_use]
    pub fn subscriptions(&self) -> usize {
        self.decisions.subscriptions.load(Ordering::SeqCst)
    }
}

impl UseCaseRetrySource for ScriptedRetrySource {
    fn retry_effect(&self) -> Observable<bool, Infallible> {
        let decisions = Arc::clone(&self.decisions);
        Observable::new(move || {
            decisions.subscriptions.fetch_add(1, Ordering::SeqCst);
            stream::iter(decisions.queue.lock().pop_front().map(Ok))
        })
    }
}

/// A hot retry source whose decisions are pushed by the test.
///
/// Only subscribers waiting at the time of [`send`](Self::send) see the
/// decision.
#[derive(Debug, Clone, Default)]
pub struct RetrySignal {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<bool>>>>,
}

impl RetrySignal {
    /// Creates a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `decision` to every waiting subscriber, returning how many
    /// received it.
    pub fn send(&self, decision: bool) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| subscriber.unbounded_send(decision).is_ok());
        subscribers.len()
    }

    /// Returns the number of subscribers still waiting.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|subscriber| !subscriber.is_closed());
        subscribers.len()
    }
}

impl UseCaseRetrySource for RetrySignal {
    fn retry_effect(&self) -> Observable<bool, Infallible> {
        let subscribers = Arc::clone(&self.subscribers);
        Observable::new(move || {
            let (tx, rx) = mpsc::unbounded();
            subscribers.lock().push(tx);
            rx.map(Ok)
        })
    }
}
