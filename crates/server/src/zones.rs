//! Demo regions: a square grid of cuboid zones around the origin, plus one
//! larger "plaza" zone overlapping the middle of the grid.
//!
//! Every zone shares a [`ZoneListener`] that logs transitions and keeps
//! per-zone visit counts.

use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;
use parking_lot::Mutex;
use region_engine::region::cuboid::CuboidRegion;
use region_engine::{Agent, BlockPos, MoveReason, RegionHandle, RegionListener, RegionTracker, WorldId};
use serde::Serialize;
use uuid::Uuid;

use crate::config::DemoConfig;

/// World the demo zones live in.
pub const ZONE_WORLD: WorldId = WorldId(0);

/// Zone floor and ceiling. Bots walk at y = 64.
const ZONE_MIN_Y: i64 = 0;
const ZONE_MAX_Y: i64 = 127;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoneCounts {
    pub enters: u64,
    pub leaves: u64,
    /// Agents currently inside, as seen by the callbacks.
    pub occupants: i64,
}

/// Per-zone callback counters, keyed by zone name in registration order.
#[derive(Default)]
pub struct ZoneStats {
    zones: Mutex<IndexMap<String, ZoneCounts>>,
}

impl ZoneStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, zone: &str, enter: bool) {
        let mut zones = self.zones.lock();
        let counts = zones.entry(zone.to_owned()).or_default();
        if enter {
            counts.enters += 1;
            counts.occupants += 1;
        } else {
            counts.leaves += 1;
            counts.occupants -= 1;
        }
    }

    pub fn get(&self, zone: &str) -> Option<ZoneCounts> {
        self.zones.lock().get(zone).copied()
    }

    pub fn snapshot(&self) -> IndexMap<String, ZoneCounts> {
        self.zones.lock().clone()
    }

    pub fn total_occupants(&self) -> i64 {
        self.zones.lock().values().map(|c| c.occupants).sum()
    }
}

/// Logs every transition of one zone and feeds [`ZoneStats`].
pub struct ZoneListener {
    zone: String,
    stats: Arc<ZoneStats>,
}

impl ZoneListener {
    pub fn new(zone: impl Into<String>, stats: Arc<ZoneStats>) -> Self {
        Self {
            zone: zone.into(),
            stats,
        }
    }
}

impl RegionListener for ZoneListener {
    fn on_enter(&self, agent: &dyn Agent, reason: MoveReason) -> Result<()> {
        tracing::debug!(zone = %self.zone, agent = %agent.id(), %reason, "enter");
        self.stats.record(&self.zone, true);
        Ok(())
    }

    fn on_leave(&self, agent: &dyn Agent, reason: MoveReason) -> Result<()> {
        tracing::debug!(zone = %self.zone, agent = %agent.id(), %reason, "leave");
        self.stats.record(&self.zone, false);
        Ok(())
    }
}

/// Corner-to-corner extent of the whole grid, in blocks.
pub fn grid_extent(demo: &DemoConfig) -> i64 {
    demo.region_grid as i64 * demo.region_size
}

/// Build and register the demo zones. Returns the handles in registration
/// order.
pub fn register_zones(
    tracker: &RegionTracker,
    demo: &DemoConfig,
    stats: &Arc<ZoneStats>,
) -> Vec<RegionHandle> {
    let owner = Uuid::new_v4();
    let half = grid_extent(demo) / 2;
    let size = demo.region_size;
    let mut handles = Vec::new();

    for gx in 0..demo.region_grid as i64 {
        for gz in 0..demo.region_grid as i64 {
            let name = format!("zone-{gx}-{gz}");
            let x0 = gx * size - half;
            let z0 = gz * size - half;
            // Outer rings fire first on enter and last on leave.
            let ring = (gx - demo.region_grid as i64 / 2).abs().max((gz - demo.region_grid as i64 / 2).abs());
            let region = CuboidRegion::new(
                owner,
                &name,
                ZONE_WORLD,
                BlockPos::new(x0, ZONE_MIN_Y, z0),
                BlockPos::new(x0 + size - 1, ZONE_MAX_Y, z0 + size - 1),
            )
            .with_priorities(ring as i32, -(ring as i32))
            .with_listener(Arc::new(ZoneListener::new(&name, Arc::clone(stats))));
            if let Ok(handle) = tracker.register_region(Arc::new(region)) {
                handles.push(handle);
            }
        }
    }

    let plaza = size.max(2) / 2;
    let region = CuboidRegion::new(
        owner,
        "plaza",
        ZONE_WORLD,
        BlockPos::new(-plaza, ZONE_MIN_Y, -plaza),
        BlockPos::new(plaza, ZONE_MAX_Y, plaza),
    )
    .with_priorities(-10, 10)
    .with_listener(Arc::new(ZoneListener::new("plaza", Arc::clone(stats))));
    if let Ok(handle) = tracker.register_region(Arc::new(region)) {
        handles.push(handle);
    }

    tracing::info!(
        "Registered {} demo zones in {} ({} chunks indexed)",
        handles.len(),
        ZONE_WORLD,
        handles.iter().map(|h| h.bounds().chunk_count()).sum::<usize>()
    );
    handles
}
