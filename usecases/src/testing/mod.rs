//! Testing utilities for use case pipelines.
//!
//! This module provides:
//! - Scripted use cases and retry sources
//! - A hot retry signal driven from the test body
//! - A tracker that records what it was told
//! - Assertions over observable pipelines

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_emits, assert_fails_with};
pub use fixtures::{init_test_tracing, RetrySignal, ScriptedRetrySource};
pub use mocks::{RecordingTracker, ScriptedUseCase, TrackerEvent};
