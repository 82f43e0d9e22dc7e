use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use super::partition::SpatialPartitionIndex;
use crate::error::TrackerError;
use crate::region::{PriorityType, Region, RegionHandle, RegionKey, RegionKind};
use crate::world::WorldId;

/// All registered regions: one partition index per region kind, plus a count
/// of listener regions per world.
///
/// A world "has listeners" exactly while its count is non-zero; the sampler
/// skips every other world.
#[derive(Debug, Default)]
pub struct RegionRegistry {
    indexes: IndexMap<RegionKind, SpatialPartitionIndex>,
    listener_worlds: HashMap<WorldId, usize>,
    next_sequence: u64,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `region` under its kind. Undefined regions and regions in
    /// unloaded worlds are rejected and never indexed.
    ///
    /// Returns the new handle and the registration it replaced, if any.
    pub fn register(
        &mut self,
        region: Arc<dyn Region>,
    ) -> Result<(RegionHandle, Option<RegionHandle>), TrackerError> {
        let key = region.key();
        let Some(bounds) = region.bounds() else {
            return Err(TrackerError::UndefinedRegion { key });
        };
        if !region.is_world_loaded() {
            return Err(TrackerError::WorldNotLoaded {
                key,
                world: region.world(),
            });
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let handle = RegionHandle::new(region, bounds, sequence);

        // A key moving between kinds must leave its old index.
        let mut replaced = None;
        for index in self.indexes.values_mut() {
            if index.kind() != handle.kind() {
                if let Some(old) = index.unregister(&key) {
                    replaced = Some(old);
                }
            }
        }

        let index = self
            .indexes
            .entry(handle.kind())
            .or_insert_with(|| SpatialPartitionIndex::new(handle.kind()));
        let same_kind = index.register(handle.clone());
        if same_kind.lost_listener(&handle) {
            tracing::debug!(region = %key, "region is no longer a listener");
        }
        let replaced = same_kind.0.or(replaced);

        if let Some(old) = &replaced {
            if old.is_listener() {
                self.release_listener_world(old.world());
            }
        }
        if handle.is_listener() {
            *self.listener_worlds.entry(handle.world()).or_default() += 1;
        }

        Ok((handle, replaced))
    }

    /// Remove the region registered under `kind`/`key`. Unknown regions are a
    /// no-op.
    pub fn unregister(&mut self, kind: RegionKind, key: &RegionKey) -> Option<RegionHandle> {
        let removed = self.indexes.get_mut(&kind)?.unregister(key)?;
        if removed.is_listener() {
            self.release_listener_world(removed.world());
        }
        Some(removed)
    }

    fn release_listener_world(&mut self, world: WorldId) {
        if let Some(count) = self.listener_worlds.get_mut(&world) {
            *count -= 1;
            if *count == 0 {
                self.listener_worlds.remove(&world);
            }
        } else {
            debug_assert!(false, "listener count underflow for {world}");
        }
    }

    pub fn has_listeners(&self, world: WorldId) -> bool {
        self.listener_worlds.contains_key(&world)
    }

    pub fn listener_count(&self, world: WorldId) -> usize {
        self.listener_worlds.get(&world).copied().unwrap_or(0)
    }

    /// Worlds with at least one listener region, in id order.
    pub fn listener_worlds(&self) -> Vec<WorldId> {
        let mut worlds: Vec<WorldId> = self.listener_worlds.keys().copied().collect();
        worlds.sort_unstable();
        worlds
    }

    pub fn index(&self, kind: RegionKind) -> Option<&SpatialPartitionIndex> {
        self.indexes.get(&kind)
    }

    pub fn get(&self, kind: RegionKind, key: &RegionKey) -> Option<&RegionHandle> {
        self.indexes.get(&kind)?.get(key)
    }

    /// Total registered regions across kinds.
    pub fn len(&self) -> usize {
        self.indexes.values().map(SpatialPartitionIndex::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Regions of `kind` containing the point.
    pub fn query(&self, world: WorldId, x: f64, y: f64, z: f64, kind: RegionKind) -> Vec<RegionHandle> {
        self.indexes
            .get(&kind)
            .map(|index| index.query(world, x, y, z))
            .unwrap_or_default()
    }

    /// Regions of any kind containing the point, in registration order.
    pub fn query_any(&self, world: WorldId, x: f64, y: f64, z: f64) -> Vec<RegionHandle> {
        let mut hits: Vec<RegionHandle> = self
            .indexes
            .values()
            .flat_map(|index| index.query(world, x, y, z))
            .collect();
        hits.sort_unstable_by_key(RegionHandle::sequence);
        hits
    }

    /// Listener regions of every kind containing the point, in `order`.
    pub fn query_listeners(
        &mut self,
        world: WorldId,
        x: f64,
        y: f64,
        z: f64,
        order: PriorityType,
    ) -> Vec<RegionHandle> {
        let mut hits = Vec::new();
        let mut sources = 0;
        for index in self.indexes.values_mut() {
            let found = index.query_listeners(world, x, y, z, order);
            if !found.is_empty() {
                sources += 1;
                hits.extend(found);
            }
        }
        // Each index returns its hits already ordered; only a merge needs a sort.
        if sources > 1 {
            hits.sort_unstable_by_key(|r| (r.priority(order), r.sequence()));
        }
        hits
    }
}
