//! Process-wide request budget for the directions provider.
//!
//! Every provider call, from every planning request, draws from one
//! budget. The budget is a fixed quota per time window (one minute by
//! default). The window number and the count used in it live together in a
//! single atomic word, so reset and increment happen in one compare-and-swap
//! and concurrent callers can never overshoot the quota.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default number of provider calls allowed per minute.
pub const DEFAULT_QUOTA_PER_MINUTE: u32 = 60;

const COUNT_BITS: u32 = 32;
const COUNT_MASK: u64 = (1 << COUNT_BITS) - 1;

fn pack(window: u64, count: u32) -> u64 {
    (window << COUNT_BITS) | count as u64
}

fn unpack(packed: u64) -> (u64, u32) {
    (packed >> COUNT_BITS, (packed & COUNT_MASK) as u32)
}

/// Rolling per-window quota of provider calls.
#[derive(Debug)]
pub struct RequestBudget {
    quota: u32,
    window: Duration,
    epoch: Instant,
    /// Window number (high 32 bits) and calls used in it (low 32 bits).
    state: AtomicU64,
}

impl RequestBudget {
    /// A budget of `quota` calls per `window`.
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            quota,
            window: window.max(Duration::from_millis(1)),
            epoch: Instant::now(),
            state: AtomicU64::new(pack(0, 0)),
        }
    }

    /// A budget of `quota` calls per minute.
    pub fn per_minute(quota: u32) -> Self {
        Self::new(quota, Duration::from_secs(60))
    }

    /// Calls allowed per window.
    pub fn quota(&self) -> u32 {
        self.quota
    }

    /// Length of one window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Try to take one call from the budget.
    ///
    /// Returns `false` if the current window's quota is used up.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Calls still available in the current window.
    pub fn remaining(&self) -> u32 {
        self.remaining_at(Instant::now())
    }

    fn window_at(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.epoch).as_millis();
        let window = elapsed / self.window.as_millis().max(1);
        (window as u64) & COUNT_MASK
    }

    pub(crate) fn try_acquire_at(&self, now: Instant) -> bool {
        let current = self.window_at(now);

        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |packed| {
                let (window, used) = unpack(packed);
                // A caller that sampled the clock late may see an older window;
                // it counts against the newest one.
                let (window, used) = if current > window {
                    (current, 0)
                } else {
                    (window, used)
                };
                (used < self.quota).then(|| pack(window, used + 1))
            })
            .is_ok()
    }

    pub(crate) fn remaining_at(&self, now: Instant) -> u32 {
        let current = self.window_at(now);
        let (window, used) = unpack(self.state.load(Ordering::Acquire));
        if current > window {
            self.quota
        } else {
            self.quota.saturating_sub(used)
        }
    }

    #[cfg(test)]
    fn epoch(&self) -> Instant {
        self.epoch
    }
}

impl Default for RequestBudget {
    fn default() -> Self {
        Self::per_minute(DEFAULT_QUOTA_PER_MINUTE)
    }
}
