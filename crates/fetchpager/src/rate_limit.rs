//! Minimum-spacing rate limiting for outbound requests
//!
//! A [`RateLimiter`] guarantees at least `min_interval` between successive
//! acquisitions. The mutex is held across the wait, so concurrent callers
//! queue behind each other and none can observe a stale timestamp.
//! [`OriginLimiters`] hands out one shared limiter per origin.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// Enforces a minimum interval between calls passing through it
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: tokio::sync::Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum spacing
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: tokio::sync::Mutex::new(None),
        }
    }

    /// Configured minimum spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until `min_interval` has passed since the previous acquisition
    ///
    /// Never fails; it only delays.
    pub async fn acquire(&self) {
        let mut last_request = self.last_request.lock().await;

        if let Some(last) = *last_request {
            let ready_at = last + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                debug!(wait_ms = (ready_at - now).as_millis() as u64, "Rate limit wait");
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_request = Some(Instant::now());
    }

    /// True if an acquisition now would not wait
    ///
    /// A limiter that is mid-acquire is never idle.
    fn is_idle(&self) -> bool {
        match self.last_request.try_lock() {
            Ok(last_request) => match *last_request {
                Some(last) => last.elapsed() >= self.min_interval,
                None => true,
            },
            Err(_) => false,
        }
    }
}

/// Registry of rate limiters, one per origin
///
/// Origins are `scheme://host:port`. Limiters are created on first use.
/// Whenever a new origin is added, limiters nobody else holds and whose
/// interval has already elapsed are dropped: a fresh limiter behaves the same
/// way, so the map stays bounded by recently active origins.
#[derive(Debug)]
pub struct OriginLimiters {
    default_interval: Duration,
    overrides: HashMap<String, Duration>,
    limiters: Mutex<HashMap<String, Arc<RateLimiter>>>,
}

impl Default for OriginLimiters {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl OriginLimiters {
    /// Create a registry where every origin gets `default_interval`
    pub fn new(default_interval: Duration) -> Self {
        Self {
            default_interval,
            overrides: HashMap::new(),
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Use a different interval for one origin
    ///
    /// `origin` may be a full URL; only its origin part is kept.
    pub fn with_origin(mut self, origin: &str, interval: Duration) -> Self {
        let key = Url::parse(origin)
            .map(|u| origin_key(&u))
            .unwrap_or_else(|_| origin.trim_end_matches('/').to_string());
        self.overrides.insert(key, interval);
        self
    }

    /// Interval that applies to limiters created without an override
    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }

    /// Shared limiter for the URL's origin
    pub fn limiter_for(&self, url: &Url) -> Arc<RateLimiter> {
        let key = origin_key(url);
        let interval = self
            .overrides
            .get(&key)
            .copied()
            .unwrap_or(self.default_interval);

        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(limiter) = limiters.get(&key) {
            return limiter.clone();
        }

        let before = limiters.len();
        limiters.retain(|_, limiter| Arc::strong_count(limiter) > 1 || !limiter.is_idle());
        if limiters.len() < before {
            debug!(pruned = before - limiters.len(), "Dropped idle rate limiters");
        }

        let limiter = Arc::new(RateLimiter::new(interval));
        limiters.insert(key, limiter.clone());
        limiter
    }

    /// Number of origins currently holding a limiter
    pub fn tracked_origins(&self) -> usize {
        self.limiters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}
