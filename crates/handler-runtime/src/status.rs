//! # Status
//!
//! Rate counters and the status snapshot returned by `GetStatus`.
//!
//! ## Rate Counters
//!
//! Events land in one-second buckets of a ring covering the longest window
//! (15 minutes). A bucket is reused once its second falls out of the ring,
//! so a rate is the bucket sum over the window divided by its length.

use hd_02_payload_codec::prelude::CodecStats;
use hd_03_activation::prelude::ActivationStats;
use hd_04_dry_run::prelude::DryRunStats;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Seconds covered by the ring.
const RING_SECS: u64 = 15 * 60;

/// Events per second over the standard windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    /// Last minute.
    pub one_minute: f64,
    /// Last 5 minutes.
    pub five_minutes: f64,
    /// Last 15 minutes.
    pub fifteen_minutes: f64,
    /// Events since start.
    pub total: u64,
}

struct Ring {
    /// Second each bucket currently holds; `u64::MAX` when unused.
    stamps: Vec<u64>,
    counts: Vec<u64>,
    total: u64,
}

/// Per-second event counter with 1, 5 and 15 minute rates.
pub struct RateCounter {
    origin: Instant,
    ring: Mutex<Ring>,
}

impl Default for RateCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateCounter {
    /// Create an empty counter starting now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Create an empty counter whose first second starts at `origin`.
    pub fn starting_at(origin: Instant) -> Self {
        let len = usize::try_from(RING_SECS).unwrap_or(900);
        Self {
            origin,
            ring: Mutex::new(Ring {
                stamps: vec![u64::MAX; len],
                counts: vec![0; len],
                total: 0,
            }),
        }
    }

    /// Record one event now.
    pub fn record(&self) {
        self.record_at(Instant::now());
    }

    /// Record one event at `now`.
    pub fn record_at(&self, now: Instant) {
        let second = self.second(now);
        let slot = slot(second);
        let mut ring = self.ring.lock();
        if ring.stamps[slot] != second {
            ring.stamps[slot] = second;
            ring.counts[slot] = 0;
        }
        ring.counts[slot] += 1;
        ring.total += 1;
    }

    /// Current rates.
    pub fn rates(&self) -> Rates {
        self.rates_at(Instant::now())
    }

    /// Rates as seen at `now`.
    #[allow(clippy::cast_precision_loss)]
    pub fn rates_at(&self, now: Instant) -> Rates {
        let current = self.second(now);
        let ring = self.ring.lock();
        let window_sum = |secs: u64| -> f64 {
            let sum: u64 = ring
                .stamps
                .iter()
                .zip(&ring.counts)
                .filter(|(stamp, _)| **stamp <= current && current - **stamp < secs)
                .map(|(_, count)| *count)
                .sum();
            sum as f64 / secs as f64
        };

        Rates {
            one_minute: window_sum(60),
            five_minutes: window_sum(5 * 60),
            fifteen_minutes: window_sum(RING_SECS),
            total: ring.total,
        }
    }

    fn second(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.origin).as_secs()
    }
}

fn slot(second: u64) -> usize {
    usize::try_from(second % RING_SECS).unwrap_or(0)
}

/// Process-level facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    /// Crate version.
    pub version: String,
    /// Seconds since the service was built.
    pub uptime_secs: u64,
    /// Logical CPUs available.
    pub cpus: usize,
    /// Operating system process id.
    pub pid: u32,
}

impl SystemStats {
    /// Snapshot for a service started at `started`.
    pub fn collect(started: Instant) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            uptime_secs: started.elapsed().as_secs(),
            cpus: num_cpus::get(),
            pid: std::process::id(),
        }
    }
}

/// Counters of each subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentStats {
    /// Payload codec.
    pub codec: CodecStats,
    /// Activation coordinator.
    pub activation: ActivationStats,
    /// Dry-run engine.
    pub dry_run: DryRunStats,
    /// Testing calls left in the current quota window.
    pub quota_remaining: u64,
}

/// Full status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerStatus {
    /// Process facts.
    pub system: SystemStats,
    /// Subsystem counters.
    pub components: ComponentStats,
    /// Uplinks handled.
    pub uplinks: Rates,
    /// Downlinks handled.
    pub downlinks: Rates,
    /// Activations handled.
    pub activations: Rates,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_counter() {
        let counter = RateCounter::new();
        assert_eq!(counter.rates(), Rates::default());
    }

    #[test]
    fn test_rates_over_windows() {
        let t0 = Instant::now();
        let counter = RateCounter::starting_at(t0);

        // 60 events in the first second, 60 more ten minutes later.
        for _ in 0..60 {
            counter.record_at(t0);
        }
        let later = t0 + Duration::from_secs(600);
        for _ in 0..60 {
            counter.record_at(later);
        }

        let rates = counter.rates_at(later);
        assert!((rates.one_minute - 1.0).abs() < f64::EPSILON);
        assert!((rates.five_minutes - 0.2).abs() < 1e-9);
        assert!((rates.fifteen_minutes - 120.0 / 900.0).abs() < 1e-9);
        assert_eq!(rates.total, 120);
    }

    #[test]
    fn test_old_buckets_expire() {
        let t0 = Instant::now();
        let counter = RateCounter::starting_at(t0);
        counter.record_at(t0);

        let much_later = t0 + Duration::from_secs(RING_SECS + 5);
        let rates = counter.rates_at(much_later);
        assert_eq!(rates.fifteen_minutes, 0.0);
        assert_eq!(rates.total, 1);

        // Same slot, new second: the stale count is dropped.
        counter.record_at(t0 + Duration::from_secs(RING_SECS));
        let rates = counter.rates_at(t0 + Duration::from_secs(RING_SECS));
        assert!((rates.one_minute - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_system_stats() {
        let stats = SystemStats::collect(Instant::now());
        assert!(stats.cpus >= 1);
        assert_eq!(stats.pid, std::process::id());
        assert_eq!(stats.version, crate::VERSION);
    }
}
