use std::collections::{HashMap, HashSet};

use crate::membership::OrderedMembershipSet;
use crate::region::{PriorityType, RegionHandle, RegionKey, RegionKind};
use crate::world::WorldId;
use crate::world::position::{ChunkKey, Location};

/// The registration a `register` call displaced, if any.
#[derive(Debug, Default)]
pub struct Replaced(pub Option<RegionHandle>);

impl Replaced {
    /// The key was registered before as a listener and the new registration
    /// is not one.
    pub fn lost_listener(&self, new: &RegionHandle) -> bool {
        self.0.as_ref().is_some_and(|old| old.is_listener()) && !new.is_listener()
    }
}

/// Chunk-bucketed index of the regions of one kind.
///
/// Every registered region sits in each bucket its bounds overlap, in the
/// all-regions map and, for listeners, in the ordered listener map. Buckets
/// only prune; queries still test exact containment.
#[derive(Debug)]
pub struct SpatialPartitionIndex {
    kind: RegionKind,
    regions: HashMap<RegionKey, RegionHandle>,
    all: HashMap<ChunkKey, HashSet<RegionHandle>>,
    listeners: HashMap<ChunkKey, OrderedMembershipSet<RegionHandle>>,
}

impl SpatialPartitionIndex {
    pub fn new(kind: RegionKind) -> Self {
        Self {
            kind,
            regions: HashMap::new(),
            all: HashMap::new(),
            listeners: HashMap::new(),
        }
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Insert `region` into every bucket it covers, first removing any
    /// registration with the same key.
    pub fn register(&mut self, region: RegionHandle) -> Replaced {
        let replaced = self.unregister(region.key());
        for chunk in region.bounds().chunks(region.world()) {
            self.all.entry(chunk).or_default().insert(region.clone());
            if region.is_listener() {
                self.listeners.entry(chunk).or_default().insert(region.clone());
            }
        }
        self.regions.insert(region.key().clone(), region);
        Replaced(replaced)
    }

    /// Remove the registration for `key` from every bucket it occupies.
    /// Unknown keys are a no-op.
    pub fn unregister(&mut self, key: &RegionKey) -> Option<RegionHandle> {
        let region = self.regions.remove(key)?;
        for chunk in region.bounds().chunks(region.world()) {
            if let Some(bucket) = self.all.get_mut(&chunk) {
                bucket.remove(&region);
                if bucket.is_empty() {
                    self.all.remove(&chunk);
                }
            }
            if region.is_listener() {
                if let Some(bucket) = self.listeners.get_mut(&chunk) {
                    bucket.remove(&region);
                    if bucket.is_empty() {
                        self.listeners.remove(&chunk);
                    }
                }
            }
        }
        Some(region)
    }

    pub fn get(&self, key: &RegionKey) -> Option<&RegionHandle> {
        self.regions.get(key)
    }

    pub fn regions(&self) -> impl Iterator<Item = &RegionHandle> {
        self.regions.values()
    }

    /// Regions of this kind containing the point, in registration order.
    pub fn query(&self, world: WorldId, x: f64, y: f64, z: f64) -> Vec<RegionHandle> {
        let chunk = Location::new(world, x, y, z).chunk();
        let Some(bucket) = self.all.get(&chunk) else {
            return Vec::new();
        };
        let mut hits: Vec<RegionHandle> = bucket
            .iter()
            .filter(|r| r.contains(x, y, z))
            .cloned()
            .collect();
        hits.sort_unstable_by_key(RegionHandle::sequence);
        hits
    }

    /// Listener regions containing the point, in `order`. The bucket's sorted
    /// view is cached until the bucket next changes.
    pub fn query_listeners(
        &mut self,
        world: WorldId,
        x: f64,
        y: f64,
        z: f64,
        order: PriorityType,
    ) -> Vec<RegionHandle> {
        let chunk = Location::new(world, x, y, z).chunk();
        let Some(bucket) = self.listeners.get_mut(&chunk) else {
            return Vec::new();
        };
        bucket
            .ordered(order)
            .iter()
            .filter(|r| r.contains(x, y, z))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of non-empty all-regions buckets.
    pub fn bucket_count(&self) -> usize {
        self.all.len()
    }

    /// Number of non-empty listener buckets.
    pub fn listener_bucket_count(&self) -> usize {
        self.listeners.len()
    }

    /// Regions in the all-regions bucket for `chunk`, ignoring containment.
    pub fn bucket(&self, chunk: ChunkKey) -> Vec<RegionHandle> {
        self.all
            .get(&chunk)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the listener bucket for `chunk` holds `key`.
    pub fn listener_bucket_contains(&self, chunk: ChunkKey, key: &RegionKey) -> bool {
        self.listeners
            .get(&chunk)
            .is_some_and(|b| b.iter().any(|r| r.key() == key))
    }
}
