//! Spatial lookup of registered regions.

pub mod partition;
pub mod registry;

pub use partition::{Replaced, SpatialPartitionIndex};
pub use registry::RegionRegistry;
