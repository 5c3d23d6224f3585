//! # Call Quota
//!
//! Process-wide, fixed-window call counter guarding the handler's public
//! surface.
//!
//! ## Algorithm
//!
//! - A window opens on the first call and lasts `window`
//! - Each call consumes one unit
//! - Calls are rejected once `limit` units are used in the current window
//! - The count resets when the window elapses
//!
//! The quota is a collaborator injected into services; core logic never
//! reaches for a global.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Fixed-window call quota.
pub struct CallQuota {
    /// Calls allowed per window.
    limit: u64,
    /// Window length.
    window: Duration,
    /// Calls used in the current window.
    used: AtomicU64,
    /// Start of the current window.
    window_start: Mutex<Instant>,
}

impl CallQuota {
    /// Create a new quota.
    ///
    /// # Parameters
    ///
    /// - `limit`: calls allowed per window
    /// - `window`: reset interval
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window,
            used: AtomicU64::new(0),
            window_start: Mutex::new(Instant::now()),
        }
    }

    /// Try to consume one call.
    ///
    /// Returns `true` if the call is allowed, `false` if the quota is spent.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Same as [`CallQuota::try_acquire`] with an explicit clock reading.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        self.roll_window(now);

        loop {
            let current = self.used.load(Ordering::Relaxed);
            if current >= self.limit {
                return false;
            }

            if self
                .used
                .compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Reset the counter if the current window has elapsed.
    fn roll_window(&self, now: Instant) {
        let mut start = self.window_start.lock();
        if now.saturating_duration_since(*start) >= self.window {
            *start = now;
            self.used.store(0, Ordering::SeqCst);
        }
    }

    /// Calls still available in the current window.
    pub fn remaining(&self) -> u64 {
        self.roll_window(Instant::now());
        self.limit.saturating_sub(self.used.load(Ordering::Relaxed))
    }

    /// Time until the current window resets.
    pub fn resets_in(&self) -> Duration {
        let start = *self.window_start.lock();
        self.window
            .saturating_sub(Instant::now().saturating_duration_since(start))
    }

    /// Calls allowed per window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl std::fmt::Debug for CallQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallQuota")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("used", &self.used.load(Ordering::Relaxed))
            .finish()
    }
}

/// Pre-configured quotas.
pub mod presets {
    use super::CallQuota;
    use std::time::Duration;

    /// Interactive testing calls (dry runs): 600 per minute.
    pub fn dry_run() -> CallQuota {
        CallQuota::new(600, Duration::from_secs(60))
    }
}
