//! # Usecases
//!
//! Typed composition of units of work ("use cases") that run synchronously,
//! asynchronously or as observable pipelines.
//!
//! Usecases provides:
//!
//! - **Contracts**: [`UseCase`](usecase::UseCase) and its observable
//!   specialization [`ReactiveUseCase`](usecase::ReactiveUseCase)
//! - **Async bridge**: any [`AsyncUseCase`](bridge::AsyncUseCase) becomes a
//!   cold, cancellable, re-subscribable pipeline
//! - **Joins**: pairs, triples and quadruples of use cases zipped into one
//!   fail-fast pipeline
//! - **Retries**: failures re-drive the pipeline when an external
//!   [`UseCaseRetrySource`](retry::UseCaseRetrySource) says so
//! - **Tracking**: balanced begin/end activity reports per subscription
//!
//! Decorators and joins consume and produce reactive use cases, so they chain
//! in any order.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use usecases::prelude::*;
//!
//! let load_profile = fetch_user
//!     .make_reactive()
//!     .make_paired(fetch_settings.make_reactive())
//!     .make_retryable(BackoffRetrySource::default(), None)
//!     .make_trackable(Arc::clone(&loading_indicator));
//!
//! let (user, settings) = load_profile.execute((user_id, ())).first().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod bridge;
pub mod combined;
pub mod errors;
pub mod observable;
pub mod retry;
pub mod testing;
pub mod tracking;
pub mod usecase;

#[cfg(test)]
mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::{AsyncFnUseCase, AsyncUnitUseCase, AsyncUseCase, AsyncUseCaseExt, ReactiveAsyncUseCase};
    pub use crate::combined::{
        make_pair, make_quadruple, make_triple, PairedUseCase, QuadrupleUseCase, TripleUseCase,
    };
    pub use crate::errors::ExecutionError;
    pub use crate::observable::{CancelHandle, LifecycleHooks, Observable, Subscription};
    pub use crate::retry::{
        BackoffRetrySource, BackoffStrategy, JitterStrategy, RetryConfig, RetryPredicate, RetryableUseCase,
        UseCaseRetrySource,
    };
    pub use crate::tracking::{
        ActivityIndicator, LoggingTracker, NoOpTracker, Trackable, TrackableSource, TrackableUseCase,
    };
    pub use crate::usecase::{FnUseCase, ReactiveUseCase, ReactiveUseCaseExt, UnitUseCase, UseCase};
}
