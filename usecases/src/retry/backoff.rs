//! A retry source with an attempt cap, backoff delays and jitter.

use super::UseCaseRetrySource;
use crate::observable::Observable;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// delay = base * 2^retry
    #[default]
    Exponential,
    /// delay = base * (retry + 1)
    Linear,
    /// delay = base
    Constant,
}

/// Jitter applied on top of the backoff delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to delay
    #[default]
    Full,
    /// Half fixed, half random
    Equal,
}

/// Configuration for [`BackoffRetrySource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries authorized before giving up.
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Backoff strategy.
    pub backoff_strategy: BackoffStrategy,
    /// Jitter strategy.
    pub jitter_strategy: JitterStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_strategy: BackoffStrategy::Exponential,
            jitter_strategy: JitterStrategy::Full,
        }
    }
}

impl RetryConfig {
    /// Creates a config with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff strategy.
    #[must_use]
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff_strategy = strategy;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = strategy;
        self
    }

    /// Parses a config from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not a valid config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Delay before the retry following `retry` earlier ones.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let base = self.base_delay_ms;
        let max = self.max_delay_ms;

        let delay = match self.backoff_strategy {
            BackoffStrategy::Exponential => base.saturating_mul(2u64.saturating_pow(retry)).min(max),
            BackoffStrategy::Linear => base.saturating_mul(u64::from(retry) + 1).min(max),
            BackoffStrategy::Constant => base.min(max),
        };

        let jittered = match self.jitter_strategy {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
        };

        Duration::from_millis(jittered)
    }
}

/// Authorizes up to `max_attempts` retries, each after a backoff delay.
///
/// The retry count is shared by every pipeline the source is attached to;
/// call [`reset`](Self::reset) to start counting again, e.g. after a
/// successful run. A retry is counted once its delay has elapsed, so a
/// pipeline cancelled during the backoff leaves the budget untouched.
#[derive(Debug, Clone)]
pub struct BackoffRetrySource {
    config: Arc<RetryConfig>,
    retries: Arc<AtomicU32>,
}

impl BackoffRetrySource {
    /// Creates a source with the given config.
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
            retries: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Returns the config.
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Number of retries authorized so far.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Forgets every authorized retry.
    pub fn reset(&self) {
        self.retries.store(0, Ordering::SeqCst);
    }
}

impl Default for BackoffRetrySource {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl UseCaseRetrySource for BackoffRetrySource {
    fn retry_effect(&self) -> Observable<bool, Infallible> {
        let config = Arc::clone(&self.config);
        let retries = Arc::clone(&self.retries);
        Observable::from_future(move || {
            let config = Arc::clone(&config);
            let retries = Arc::clone(&retries);
            async move {
                let pending = retries.load(Ordering::SeqCst);
                if pending < config.max_attempts {
                    let delay = config.delay_for(pending);
                    debug!(
                        retry = pending + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Backing off before retry"
                    );
                    tokio::time::sleep(delay).await;
                }

                let claimed = retries.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |retry| {
                    (retry < config.max_attempts).then_some(retry + 1)
                });
                match claimed {
                    Ok(retry) => {
                        debug!(retry = retry + 1, "Retry authorized");
                        Ok(true)
                    }
                    Err(retry) => {
                        warn!(retries = retry, "Retries exhausted");
                        Ok(false)
                    }
                }
            }
        })
    }
}
