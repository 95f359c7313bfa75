//! Error types for awaiting use case results.
//!
//! Domain failures travel through the `Err` items of a pipeline as the use
//! case's own failure type. [`ExecutionError`] only appears when a caller
//! collapses a pipeline into a single value and needs to tell a domain failure
//! apart from a pipeline that ended without producing anything.

use thiserror::Error;

/// Outcome of awaiting the first value of a pipeline that did not produce one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError<E> {
    /// The use case failed with a domain failure.
    #[error("use case failed: {0:?}")]
    Failed(E),

    /// The pipeline completed without emitting a value.
    #[error("pipeline completed without emitting a value")]
    Empty,

    /// The subscription was cancelled before a value arrived.
    #[error("pipeline cancelled: {0}")]
    Cancelled(String),
}

impl<E> ExecutionError<E> {
    /// Returns the domain failure, if this is one.
    #[must_use]
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Empty | Self::Cancelled(_) => None,
        }
    }

    /// Consumes the error and returns the domain failure, if this is one.
    #[must_use]
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Empty | Self::Cancelled(_) => None,
        }
    }

    /// Returns true if the subscription was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Maps the domain failure, leaving structural outcomes untouched.
    pub fn map_failure<F, O>(self, op: O) -> ExecutionError<F>
    where
        O: FnOnce(E) -> F,
    {
        match self {
            Self::Failed(failure) => ExecutionError::Failed(op(failure)),
            Self::Empty => ExecutionError::Empty,
            Self::Cancelled(reason) => ExecutionError::Cancelled(reason),
        }
    }
}
