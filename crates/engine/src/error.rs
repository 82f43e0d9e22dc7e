use thiserror::Error;

use crate::agent::AgentId;
use crate::region::RegionKey;
use crate::world::WorldId;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// The region has no volume yet. It is not indexed.
    #[error("region {key} is not fully defined")]
    UndefinedRegion { key: RegionKey },

    /// The region's world is not loaded. It is not indexed.
    #[error("region {key} belongs to {world}, which is not loaded")]
    WorldNotLoaded { key: RegionKey, world: WorldId },

    /// A second checkout before the first was recycled. The diff worker and
    /// sampler have lost their handoff ordering.
    #[error("sample snapshot for agent {agent} is still checked out")]
    SnapshotOutstanding { agent: AgentId },
}
