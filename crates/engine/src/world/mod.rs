pub mod position;

use std::fmt;

/// Opaque world identifier. The engine never interprets it beyond equality;
/// the host maps it to whatever a "world" is (a dimension, a level, a shard).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct WorldId(pub u32);

impl WorldId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world#{}", self.0)
    }
}
