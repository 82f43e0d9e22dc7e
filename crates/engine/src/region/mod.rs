//! The region capability and the engine's handle to a registered region.

pub mod cuboid;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use uuid::Uuid;

use crate::agent::{Agent, MoveReason};
use crate::membership::Ranked;
use crate::world::WorldId;
use crate::world::position::BlockBounds;

/// Region identity: (owner, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKey {
    pub owner: Uuid,
    pub name: Arc<str>,
}

impl RegionKey {
    pub fn new(owner: Uuid, name: impl Into<Arc<str>>) -> Self {
        Self {
            owner,
            name: name.into(),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.name)
    }
}

/// Region subtype. Each kind gets its own spatial index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionKind(pub &'static str);

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Which of the two independent priority orders to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriorityType {
    Enter,
    Leave,
}

/// Enter/leave callbacks. Errors are logged by the dispatcher and never
/// propagate into the tracker.
pub trait RegionListener: Send + Sync {
    fn on_enter(&self, agent: &dyn Agent, reason: MoveReason) -> anyhow::Result<()>;
    fn on_leave(&self, agent: &dyn Agent, reason: MoveReason) -> anyhow::Result<()>;
}

/// A 3D volume the tracker can index.
///
/// The volume must not change while the region is registered; re-register it
/// to move or reshape it.
pub trait Region: Send + Sync + 'static {
    fn key(&self) -> RegionKey;

    fn kind(&self) -> RegionKind;

    fn world(&self) -> WorldId;

    /// Block-aligned bounding box, or `None` while the region is not fully
    /// defined.
    fn bounds(&self) -> Option<BlockBounds>;

    fn is_defined(&self) -> bool {
        self.bounds().is_some()
    }

    fn is_world_loaded(&self) -> bool {
        true
    }

    fn contains(&self, x: f64, y: f64, z: f64) -> bool;

    fn enter_priority(&self) -> i32 {
        0
    }

    fn leave_priority(&self) -> i32 {
        0
    }

    fn listener(&self) -> Option<&dyn RegionListener> {
        None
    }

    fn is_event_listener(&self) -> bool {
        self.listener().is_some()
    }

    /// Set once the owner has torn the region down. Events queued for a
    /// disposed region are dropped at dispatch.
    fn is_disposed(&self) -> bool {
        false
    }
}

struct RegionEntry {
    key: RegionKey,
    kind: RegionKind,
    world: WorldId,
    bounds: BlockBounds,
    listener: bool,
    enter_priority: i32,
    leave_priority: i32,
    sequence: u64,
    region: Arc<dyn Region>,
}

/// A registered region as the engine sees it.
///
/// Captures the region's indexing attributes once at registration so the
/// index never has to re-ask the (immutable-while-registered) region. Equality
/// and hashing are by [`RegionKey`], so a replacement registration compares
/// equal to the one it replaced.
#[derive(Clone)]
pub struct RegionHandle {
    entry: Arc<RegionEntry>,
}

impl RegionHandle {
    pub(crate) fn new(region: Arc<dyn Region>, bounds: BlockBounds, sequence: u64) -> Self {
        Self {
            entry: Arc::new(RegionEntry {
                key: region.key(),
                kind: region.kind(),
                world: region.world(),
                bounds,
                listener: region.is_event_listener(),
                enter_priority: region.enter_priority(),
                leave_priority: region.leave_priority(),
                sequence,
                region,
            }),
        }
    }

    pub fn key(&self) -> &RegionKey {
        &self.entry.key
    }

    pub fn kind(&self) -> RegionKind {
        self.entry.kind
    }

    pub fn world(&self) -> WorldId {
        self.entry.world
    }

    pub fn bounds(&self) -> BlockBounds {
        self.entry.bounds
    }

    pub fn is_listener(&self) -> bool {
        self.entry.listener
    }

    pub fn priority(&self, order: PriorityType) -> i32 {
        match order {
            PriorityType::Enter => self.entry.enter_priority,
            PriorityType::Leave => self.entry.leave_priority,
        }
    }

    /// Registration order, used to break priority ties.
    pub fn sequence(&self) -> u64 {
        self.entry.sequence
    }

    pub fn region(&self) -> &Arc<dyn Region> {
        &self.entry.region
    }

    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        self.entry.region.contains(x, y, z)
    }

    /// True if both handles come from the same registration.
    pub fn same_registration(&self, other: &RegionHandle) -> bool {
        Arc::ptr_eq(&self.entry, &other.entry)
    }
}

impl PartialEq for RegionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.entry.key == other.entry.key
    }
}

impl Eq for RegionHandle {}

impl Hash for RegionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entry.key.hash(state);
    }
}

impl fmt::Debug for RegionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionHandle")
            .field("key", &self.entry.key)
            .field("kind", &self.entry.kind)
            .field("world", &self.entry.world)
            .field("listener", &self.entry.listener)
            .field("sequence", &self.entry.sequence)
            .finish()
    }
}

impl Ranked for RegionHandle {
    fn priority(&self, order: PriorityType) -> i32 {
        RegionHandle::priority(self, order)
    }

    fn sequence(&self) -> u64 {
        RegionHandle::sequence(self)
    }
}
