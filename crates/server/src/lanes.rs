//! The two fixed-rate tracker lanes and the periodic metrics reporter.
//!
//! The lanes are plain tokio interval loops on blocking-friendly tasks. Each
//! lane calls into the tracker once per tick; the tracker itself decides what
//! work is ready.

use std::sync::Arc;
use std::time::Duration;

use region_engine::{MainTickReport, MoveReason, RegionTracker, TrackerError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::roster::Roster;

/// One main-lane step: disconnect departed agents, then dispatch queued
/// events and harvest samples.
pub fn main_tick(
    tracker: &RegionTracker,
    roster: &Roster,
) -> Result<MainTickReport, TrackerError> {
    for agent in roster.take_departed() {
        tracker.update_agent_disconnect(agent.as_ref(), MoveReason::QuitServer);
    }
    tracker.tick_main()
}

/// Spawn the main lane.
///
/// The task ends only if the tracker reports a broken invariant.
pub fn spawn_main(
    tracker: Arc<RegionTracker>,
    roster: Arc<Roster>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!("Main lane started (period {:?})", period);
        let mut ticks: u64 = 0;
        loop {
            interval.tick().await;
            ticks += 1;
            match main_tick(&tracker, &roster) {
                Ok(report) => {
                    if report.dispatched > 0 || report.harvested > 0 {
                        tracing::trace!(
                            tick = ticks,
                            dispatched = report.dispatched,
                            harvested = report.harvested,
                            skipped = report.skipped,
                            "main tick"
                        );
                    }
                }
                Err(e) => {
                    tracing::error!("Main lane stopped at tick {}: {}", ticks, e);
                    break;
                }
            }
        }
    })
}

/// Spawn the background lane: run a diff cycle when one is ready.
pub fn spawn_background(tracker: Arc<RegionTracker>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!("Background lane started (period {:?})", period);
        loop {
            interval.tick().await;
            let t = Arc::clone(&tracker);
            // Diffing takes the tracker lock for the whole cycle; keep it off
            // the async worker threads.
            match tokio::task::spawn_blocking(move || t.tick_background()).await {
                Ok(0) => {}
                Ok(n) => tracing::trace!("Background lane diffed {} batches", n),
                Err(e) => {
                    tracing::error!("Background lane stopped: {}", e);
                    break;
                }
            }
        }
    })
}

/// Log a JSON snapshot of the tracker metrics every `period`.
pub fn spawn_metrics_reporter(tracker: Arc<RegionTracker>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // first tick is immediate, skip it
        loop {
            interval.tick().await;
            log_metrics(&tracker);
        }
    })
}

pub fn log_metrics(tracker: &RegionTracker) {
    match serde_json::to_string(&tracker.metrics().snapshot()) {
        Ok(json) => tracing::info!("Tracker metrics: {}", json),
        Err(e) => tracing::warn!("Failed to serialize tracker metrics: {}", e),
    }
}
