//! Fixed-window counter for a single rate-limit identifier.
//!
//! A bucket counts consumed units inside a window that starts when the bucket is
//! created (or last reset). Checking a bucket and consuming from it are separate
//! operations so callers can decide per scope whether a check should commit.

use std::time::Duration;
use tracing::trace;

/// Snapshot of a bucket after window expiry has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketState {
    /// Whether the current window is exhausted
    pub limited: bool,
    /// Time until the window resets. Zero unless `limited` is true.
    pub remaining: Duration,
}

/// Counter-plus-window state for one identifier within one scope.
#[derive(Debug, Clone)]
pub struct RateLimitBucket {
    identifier: String,
    count: u32,
    window_start: u64,
    limit: u32,
    window_ms: u64,
}

impl RateLimitBucket {
    /// Creates an empty bucket whose first window starts at `now`.
    #[must_use]
    pub fn new(identifier: impl Into<String>, limit: u32, window: Duration, now: u64) -> Self {
        Self {
            identifier: identifier.into(),
            count: 0,
            window_start: now,
            limit,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Units consumed in the current window, as of the last `acquire`/`consume`.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Reports whether the window is exhausted without consuming anything.
    ///
    /// Expired windows are reset first, so calling this repeatedly never changes
    /// the answer except by the passage of time.
    pub fn acquire(&mut self, now: u64) -> BucketState {
        self.expire(now);

        if self.count >= self.limit {
            BucketState {
                limited: true,
                remaining: Duration::from_millis(self.window_end().saturating_sub(now)),
            }
        } else {
            BucketState {
                limited: false,
                remaining: Duration::ZERO,
            }
        }
    }

    /// Consumes one unit. Never enforces the limit itself.
    pub fn consume(&mut self, now: u64) {
        self.expire(now);
        self.count = self.count.saturating_add(1);
    }

    fn window_end(&self) -> u64 {
        self.window_start.saturating_add(self.window_ms)
    }

    fn expire(&mut self, now: u64) {
        if now >= self.window_end() {
            if self.count > 0 {
                trace!(identifier = %self.identifier, "Rate-limit window reset");
            }
            self.count = 0;
            self.window_start = now;
        }
    }
}
