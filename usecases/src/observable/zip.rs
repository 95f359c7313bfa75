//! Fail-fast positional zip.
//!
//! Every arity is built from the binary [`zip2`]: `zip3` and `zip4` nest it
//! and flatten the resulting tuples, so all arities share one join algorithm.

use super::EventStream;
use futures::stream::{Stream, StreamExt, TryStreamExt};
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::trace;

struct Side<T, E> {
    upstream: Option<EventStream<T, E>>,
    buffered: VecDeque<T>,
}

impl<T, E> Side<T, E> {
    fn new(upstream: EventStream<T, E>) -> Self {
        Self {
            upstream: Some(upstream),
            buffered: VecDeque::new(),
        }
    }

    /// Polls the upstream once, buffering a value if one is ready.
    fn poll_upstream(&mut self, cx: &mut Context<'_>) -> Result<(), E> {
        let Some(upstream) = self.upstream.as_mut() else {
            return Ok(());
        };
        match upstream.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(value))) => self.buffered.push_back(value),
            Poll::Ready(Some(Err(failure))) => return Err(failure),
            Poll::Ready(None) => self.upstream = None,
            Poll::Pending => {}
        }
        Ok(())
    }

    /// No further value can come out of this side.
    fn exhausted(&self) -> bool {
        self.upstream.is_none() && self.buffered.is_empty()
    }

    fn clear(&mut self) {
        self.upstream = None;
        self.buffered.clear();
    }
}

struct Zip<A, B, E> {
    left: Side<A, E>,
    right: Side<B, E>,
    finished: bool,
}

// Fields are never pinned structurally.
impl<A, B, E> Unpin for Zip<A, B, E> {}

impl<A, B, E> Zip<A, B, E> {
    fn fail(&mut self, failure: E, side: &'static str) -> Poll<Option<Result<(A, B), E>>> {
        trace!(side, "Zipped child failed, cancelling siblings");
        self.finished = true;
        self.left.clear();
        self.right.clear();
        Poll::Ready(Some(Err(failure)))
    }
}

impl<A, B, E> Stream for Zip<A, B, E> {
    type Item = Result<(A, B), E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        if let Err(failure) = this.left.poll_upstream(cx) {
            return this.fail(failure, "left");
        }
        if let Err(failure) = this.right.poll_upstream(cx) {
            return this.fail(failure, "right");
        }

        if !this.left.buffered.is_empty() && !this.right.buffered.is_empty() {
            if let (Some(a), Some(b)) = (this.left.buffered.pop_front(), this.right.buffered.pop_front()) {
                return Poll::Ready(Some(Ok((a, b))));
            }
        }

        if this.left.exhausted() || this.right.exhausted() {
            this.finished = true;
            this.left.clear();
            this.right.clear();
            return Poll::Ready(None);
        }

        // A side with an empty buffer and a live upstream returned Pending above,
        // so a waker is registered.
        Poll::Pending
    }
}

/// Zips two pipelines by index, failing on the first failure from either.
pub(crate) fn zip2<A, B, E>(left: EventStream<A, E>, right: EventStream<B, E>) -> EventStream<(A, B), E>
where
    A: Send + 'static,
    B: Send + 'static,
    E: Send + 'static,
{
    Zip {
        left: Side::new(left),
        right: Side::new(right),
        finished: false,
    }
    .boxed()
}

pub(crate) fn zip3<A, B, C, E>(
    a: EventStream<A, E>,
    b: EventStream<B, E>,
    c: EventStream<C, E>,
) -> EventStream<(A, B, C), E>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    E: Send + 'static,
{
    zip2(zip2(a, b), c).map_ok(|((a, b), c)| (a, b, c)).boxed()
}

pub(crate) fn zip4<A, B, C, D, E>(
    a: EventStream<A, E>,
    b: EventStream<B, E>,
    c: EventStream<C, E>,
    d: EventStream<D, E>,
) -> EventStream<(A, B, C, D), E>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    D: Send + 'static,
    E: Send + 'static,
{
    zip2(zip2(zip2(a, b), c), d)
        .map_ok(|(((a, b), c), d)| (a, b, c, d))
        .boxed()
}
