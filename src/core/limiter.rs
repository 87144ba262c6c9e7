//! Per-scope rate-limit managers.
//!
//! A [`RateLimitManager`] owns every bucket of one scope. Buckets are created
//! lazily with the manager's limit and window the first time an identifier is
//! seen, and different identifiers never share state.

use crate::core::bucket::{BucketState, RateLimitBucket};
use dashmap::{DashMap, mapref::one::RefMut};
use std::time::Duration;

/// Identifier → bucket map for a single scope.
#[derive(Debug)]
pub struct RateLimitManager {
    buckets: DashMap<String, RateLimitBucket>,
    limit: u32,
    window: Duration,
}

impl RateLimitManager {
    /// Creates a manager whose buckets allow `limit` units per `window`.
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            limit,
            window,
        }
    }

    /// Looks up (or creates) the bucket for `identifier` and reports its state.
    ///
    /// The returned handle keeps the bucket locked until it is consumed or
    /// dropped, so a check and its commit cannot interleave with another caller.
    /// Never hold it across an `.await`.
    pub fn acquire(&self, identifier: &str, now: u64) -> BucketHandle<'_> {
        let mut bucket = self
            .buckets
            .entry(identifier.to_string())
            .or_insert_with(|| RateLimitBucket::new(identifier, self.limit, self.window, now));
        let state = bucket.acquire(now);

        BucketHandle { bucket, state, now }
    }

    /// Units consumed in the current window for `identifier`, if it has a bucket.
    ///
    /// Does not apply window expiry; intended for inspection and tests.
    #[must_use]
    pub fn count(&self, identifier: &str) -> Option<u32> {
        self.buckets.get(identifier).map(|bucket| bucket.count())
    }

    /// Number of identifiers currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }
}

/// Locked view of one bucket returned by [`RateLimitManager::acquire`].
pub struct BucketHandle<'a> {
    bucket: RefMut<'a, String, RateLimitBucket>,
    state: BucketState,
    now: u64,
}

impl BucketHandle<'_> {
    /// State observed when the handle was acquired.
    #[must_use]
    pub const fn state(&self) -> BucketState {
        self.state
    }

    /// Whether the bucket was exhausted when acquired.
    #[must_use]
    pub const fn limited(&self) -> bool {
        self.state.limited
    }

    /// Consumes one unit at the acquisition timestamp and releases the lock.
    pub fn consume(mut self) {
        self.bucket.consume(self.now);
    }
}
