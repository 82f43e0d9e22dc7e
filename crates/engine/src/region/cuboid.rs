use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use super::{Region, RegionKey, RegionKind, RegionListener};
use crate::world::WorldId;
use crate::world::position::{BlockBounds, BlockPos};

/// Kind tag for [`CuboidRegion`].
pub const CUBOID: RegionKind = RegionKind("cuboid");

/// An axis-aligned box of whole blocks.
///
/// A block `(bx, by, bz)` inside the bounds covers the continuous range
/// `[bx, bx + 1)` on each axis.
pub struct CuboidRegion {
    key: RegionKey,
    kind: RegionKind,
    world: WorldId,
    bounds: Option<BlockBounds>,
    enter_priority: i32,
    leave_priority: i32,
    listener: Option<Arc<dyn RegionListener>>,
    world_loaded: AtomicBool,
    disposed: AtomicBool,
}

impl CuboidRegion {
    pub fn new(owner: Uuid, name: &str, world: WorldId, a: BlockPos, b: BlockPos) -> Self {
        Self {
            key: RegionKey::new(owner, name),
            kind: CUBOID,
            world,
            bounds: Some(BlockBounds::from_corners(a, b)),
            enter_priority: 0,
            leave_priority: 0,
            listener: None,
            world_loaded: AtomicBool::new(true),
            disposed: AtomicBool::new(false),
        }
    }

    /// A region whose corners have not been selected yet.
    pub fn undefined(owner: Uuid, name: &str, world: WorldId) -> Self {
        Self {
            bounds: None,
            ..Self::new(owner, name, world, BlockPos::new(0, 0, 0), BlockPos::new(0, 0, 0))
        }
    }

    pub fn with_kind(mut self, kind: RegionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_priorities(mut self, enter: i32, leave: i32) -> Self {
        self.enter_priority = enter;
        self.leave_priority = leave;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn RegionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn set_world_loaded(&self, loaded: bool) {
        self.world_loaded.store(loaded, Ordering::Release);
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }
}

impl Region for CuboidRegion {
    fn key(&self) -> RegionKey {
        self.key.clone()
    }

    fn kind(&self) -> RegionKind {
        self.kind
    }

    fn world(&self) -> WorldId {
        self.world
    }

    fn bounds(&self) -> Option<BlockBounds> {
        self.bounds
    }

    fn is_world_loaded(&self) -> bool {
        self.world_loaded.load(Ordering::Acquire)
    }

    fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        let Some(b) = self.bounds else {
            return false;
        };
        x >= b.min.x as f64
            && x < (b.max.x + 1) as f64
            && y >= b.min.y as f64
            && y < (b.max.y + 1) as f64
            && z >= b.min.z as f64
            && z < (b.max.z + 1) as f64
    }

    fn enter_priority(&self) -> i32 {
        self.enter_priority
    }

    fn leave_priority(&self) -> i32 {
        self.leave_priority
    }

    fn listener(&self) -> Option<&dyn RegionListener> {
        self.listener.as_deref()
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
