//! Lock-free tracker counters.
//!
//! Both lanes bump these with relaxed atomics; nothing on the hot path takes
//! a lock or allocates. Readers take a [`TrackerMetricsSnapshot`] at their own
//! pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

pub struct TrackerMetrics {
    // Monotonic counters
    samples_recorded: AtomicU64,
    batches_harvested: AtomicU64,
    sampler_ticks_skipped: AtomicU64,
    cycles_completed: AtomicU64,
    cycle_ns_sum: AtomicU64,
    enters_dispatched: AtomicU64,
    leaves_dispatched: AtomicU64,
    events_dropped: AtomicU64,
    listener_failures: AtomicU64,

    // Diff cycle duration histogram
    hist_under_100us: AtomicU64,
    hist_100us_1ms: AtomicU64,
    hist_1_10ms: AtomicU64,
    hist_over_10ms: AtomicU64,

    // Gauges
    agents_tracked: AtomicU64,

    started_at: Instant,
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self {
            samples_recorded: AtomicU64::new(0),
            batches_harvested: AtomicU64::new(0),
            sampler_ticks_skipped: AtomicU64::new(0),
            cycles_completed: AtomicU64::new(0),
            cycle_ns_sum: AtomicU64::new(0),
            enters_dispatched: AtomicU64::new(0),
            leaves_dispatched: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            listener_failures: AtomicU64::new(0),
            hist_under_100us: AtomicU64::new(0),
            hist_100us_1ms: AtomicU64::new(0),
            hist_1_10ms: AtomicU64::new(0),
            hist_over_10ms: AtomicU64::new(0),
            agents_tracked: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub(crate) fn sample_recorded(&self) {
        self.samples_recorded.fetch_add(1, Relaxed);
    }

    pub(crate) fn batches_harvested(&self, n: u64) {
        self.batches_harvested.fetch_add(n, Relaxed);
    }

    pub(crate) fn sampler_tick_skipped(&self) {
        self.sampler_ticks_skipped.fetch_add(1, Relaxed);
    }

    pub(crate) fn record_cycle(&self, duration: Duration) {
        self.cycles_completed.fetch_add(1, Relaxed);
        self.cycle_ns_sum
            .fetch_add(duration.as_nanos() as u64, Relaxed);

        match duration.as_micros() as u64 {
            0..=99 => {
                self.hist_under_100us.fetch_add(1, Relaxed);
            }
            100..=999 => {
                self.hist_100us_1ms.fetch_add(1, Relaxed);
            }
            1_000..=9_999 => {
                self.hist_1_10ms.fetch_add(1, Relaxed);
            }
            _ => {
                self.hist_over_10ms.fetch_add(1, Relaxed);
            }
        }
    }

    pub(crate) fn enter_dispatched(&self) {
        self.enters_dispatched.fetch_add(1, Relaxed);
    }

    pub(crate) fn leave_dispatched(&self) {
        self.leaves_dispatched.fetch_add(1, Relaxed);
    }

    pub(crate) fn event_dropped(&self) {
        self.events_dropped.fetch_add(1, Relaxed);
    }

    pub(crate) fn listener_failed(&self) {
        self.listener_failures.fetch_add(1, Relaxed);
    }

    pub(crate) fn set_agents_tracked(&self, n: u64) {
        self.agents_tracked.store(n, Relaxed);
    }

    pub fn snapshot(&self) -> TrackerMetricsSnapshot {
        TrackerMetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            samples_recorded: self.samples_recorded.load(Relaxed),
            batches_harvested: self.batches_harvested.load(Relaxed),
            sampler_ticks_skipped: self.sampler_ticks_skipped.load(Relaxed),
            cycles_completed: self.cycles_completed.load(Relaxed),
            cycle_ns_sum: self.cycle_ns_sum.load(Relaxed),
            enters_dispatched: self.enters_dispatched.load(Relaxed),
            leaves_dispatched: self.leaves_dispatched.load(Relaxed),
            events_dropped: self.events_dropped.load(Relaxed),
            listener_failures: self.listener_failures.load(Relaxed),
            agents_tracked: self.agents_tracked.load(Relaxed),
            hist: [
                self.hist_under_100us.load(Relaxed),
                self.hist_100us_1ms.load(Relaxed),
                self.hist_1_10ms.load(Relaxed),
                self.hist_over_10ms.load(Relaxed),
            ],
        }
    }
}

impl Default for TrackerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable point-in-time copy of [`TrackerMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct TrackerMetricsSnapshot {
    pub uptime_secs: f64,
    pub samples_recorded: u64,
    pub batches_harvested: u64,
    pub sampler_ticks_skipped: u64,
    pub cycles_completed: u64,
    pub cycle_ns_sum: u64,
    pub enters_dispatched: u64,
    pub leaves_dispatched: u64,
    pub events_dropped: u64,
    pub listener_failures: u64,
    pub agents_tracked: u64,
    /// `[<100μs, 100μs-1ms, 1-10ms, >10ms]`
    pub hist: [u64; 4],
}
