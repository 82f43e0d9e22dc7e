use super::WorldId;

/// Side length of a chunk column in blocks.
pub const CHUNK_SIZE: i64 = 16;

/// A point in a world, in continuous coordinates. This is what agents report
/// and what samples carry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub const fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z }
    }

    /// The block this location falls in (`floor` on each axis).
    pub fn block(&self) -> BlockPos {
        BlockPos::new(self.x.floor() as i64, self.y.floor() as i64, self.z.floor() as i64)
    }

    /// The chunk bucket that owns this location.
    pub fn chunk(&self) -> ChunkKey {
        self.block().chunk(self.world)
    }
}

/// Absolute block position in a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl BlockPos {
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// The chunk this block belongs to. Arithmetic shift is `floor(coord / 16)`
    /// for negative coordinates too.
    pub const fn chunk(&self, world: WorldId) -> ChunkKey {
        ChunkKey {
            world,
            x: (self.x >> 4) as i32,
            z: (self.z >> 4) as i32,
        }
    }
}

/// Broad-phase bucket key: (world, chunk-X, chunk-Z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub world: WorldId,
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub const fn new(world: WorldId, x: i32, z: i32) -> Self {
        Self { world, x, z }
    }

    pub const fn block_origin(&self, y: i64) -> BlockPos {
        BlockPos::new((self.x as i64) << 4, y, (self.z as i64) << 4)
    }
}

/// Inclusive block-aligned bounding box of a region volume.
///
/// Only used to decide which chunk buckets a region lands in; the exact shape
/// is answered by the region's own `contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBounds {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockBounds {
    /// Build bounds from two arbitrary corners.
    pub fn from_corners(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Every chunk key the box overlaps in `world`, X-major.
    pub fn chunks(&self, world: WorldId) -> impl Iterator<Item = ChunkKey> + use<> {
        let lo = self.min.chunk(world);
        let hi = self.max.chunk(world);
        (lo.x..=hi.x).flat_map(move |x| (lo.z..=hi.z).map(move |z| ChunkKey::new(world, x, z)))
    }

    /// Number of chunk buckets the box spans.
    pub fn chunk_count(&self) -> usize {
        let lo = self.min.chunk(WorldId::default());
        let hi = self.max.chunk(WorldId::default());
        ((hi.x - lo.x + 1) as usize) * ((hi.z - lo.z + 1) as usize)
    }
}
