//! Sliding-window admission control for Keygate.
//!
//! Each identity (usually a client network address) owns a queue of the
//! timestamps of its admitted requests. A request is admitted while fewer
//! than `max_requests` of those timestamps fall inside the trailing window.
//! The window boundary moves continuously with `now`; there are no fixed
//! buckets.
//!
//! Identities live in a [`DashMap`], so two identities only contend when they
//! hash to the same shard, and every prune-then-append for one identity runs
//! under that identity's entry lock.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::debug;

/// Default number of requests admitted per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

/// Default window length in seconds.
pub const DEFAULT_WINDOW_SECS: i64 = 3600;

/// Longest accepted window: 366 days.
pub const MAX_WINDOW_SECS: i64 = 366 * 24 * 3600;

/// Errors raised while building a rate limiter configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThrottleError {
    #[error("rate limit window must be between 1 and {max} seconds, got {0}", max = MAX_WINDOW_SECS)]
    InvalidWindow(i64),
}

/// Result type for throttle configuration.
pub type ThrottleResult<T> = Result<T, ThrottleError>;

/// Rate limiter configuration.
///
/// The window is always within `1..=MAX_WINDOW_SECS` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_requests: u32,
    window: Duration,
}

impl RateLimitConfig {
    /// Creates a config admitting `max_requests` per `window_secs` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ThrottleError::InvalidWindow`] if `window_secs` is outside
    /// `1..=MAX_WINDOW_SECS`.
    pub fn new(max_requests: u32, window_secs: i64) -> ThrottleResult<Self> {
        if !(1..=MAX_WINDOW_SECS).contains(&window_secs) {
            return Err(ThrottleError::InvalidWindow(window_secs));
        }
        Ok(Self {
            max_requests,
            window: Duration::seconds(window_secs),
        })
    }

    /// Requests admitted per identity within one window.
    #[must_use]
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    /// Length of the trailing window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Window length in whole seconds, used as the retry-after hint.
    #[must_use]
    pub fn window_secs(&self) -> i64 {
        self.window.num_seconds()
    }

    /// Start of the window ending at `now`. Saturates at the earliest
    /// representable instant.
    fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: Duration::seconds(DEFAULT_WINDOW_SECS),
        }
    }
}

/// Per-identity sliding-window rate limiter.
#[derive(Debug, Default)]
pub struct RateLimiter {
    config: RateLimitConfig,
    requests: DashMap<String, VecDeque<DateTime<Utc>>>,
}

impl RateLimiter {
    /// Creates a limiter with the given configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: DashMap::new(),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Decides whether a request from `identity` at `now` is admitted.
    ///
    /// Admitted requests are recorded; rejected ones are not.
    pub fn is_allowed(&self, identity: &str, now: DateTime<Utc>) -> bool {
        let window_start = self.config.window_start(now);
        let mut timestamps = self.requests.entry(identity.to_string()).or_default();

        timestamps.retain(|t| *t > window_start);

        if timestamps.len() >= self.config.max_requests as usize {
            debug!(identity, count = timestamps.len(), "rate limit reached");
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Returns how many more requests `identity` may make at `now`.
    ///
    /// Does not modify any state.
    #[must_use]
    pub fn remaining_requests(&self, identity: &str, now: DateTime<Utc>) -> u32 {
        let window_start = self.config.window_start(now);
        let used = self.requests.get(identity).map_or(0, |timestamps| {
            timestamps.iter().filter(|t| **t > window_start).count()
        });
        let used = u32::try_from(used).unwrap_or(u32::MAX);
        self.config.max_requests.saturating_sub(used)
    }

    /// Drops identities with no requests inside the window ending at `now`.
    ///
    /// Returns the number of identities removed.
    pub fn sweep_idle(&self, now: DateTime<Utc>) -> usize {
        let window_start = self.config.window_start(now);
        let before = self.requests.len();
        self.requests
            .retain(|_, timestamps| timestamps.iter().any(|t| *t > window_start));
        let evicted = before.saturating_sub(self.requests.len());
        if evicted > 0 {
            debug!(evicted, "swept idle rate limit entries");
        }
        evicted
    }

    /// Number of identities currently tracked.
    #[must_use]
    pub fn tracked_identities(&self) -> usize {
        self.requests.len()
    }
}
