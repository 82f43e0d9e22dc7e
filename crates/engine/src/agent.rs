//! The agent capability: what the engine needs to know about a mobile entity.
//!
//! Agents are owned by the host. The engine keys everything it keeps by
//! [`AgentId`] and resolves the live agent through an [`AgentDirectory`] only
//! for the duration of a callback.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::world::WorldId;
use crate::world::position::Location;

/// Stable opaque agent identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why an agent's location changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MoveReason {
    #[default]
    Move,
    Teleport,
    Respawn,
    JoinServer,
    QuitServer,
    Dead,
}

impl MoveReason {
    /// Reasons after which intermediate pending positions are meaningless.
    pub const fn discards_pending(self) -> bool {
        matches!(self, Self::JoinServer | Self::Teleport)
    }
}

impl fmt::Display for MoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Move => "MOVE",
            Self::Teleport => "TELEPORT",
            Self::Respawn => "RESPAWN",
            Self::JoinServer => "JOIN_SERVER",
            Self::QuitServer => "QUIT_SERVER",
            Self::Dead => "DEAD",
        };
        f.write_str(name)
    }
}

/// A tracked mobile entity.
pub trait Agent: Send + Sync + 'static {
    fn id(&self) -> AgentId;

    /// Current location, or `None` once the agent has left the simulation.
    fn location(&self) -> Option<Location>;

    /// Synthetic actors (NPCs, bots standing in for players) are never sampled.
    fn is_synthetic(&self) -> bool {
        false
    }
}

/// World membership and identity lookup, provided by the host.
pub trait AgentDirectory: Send + Sync + 'static {
    /// Agents currently in `world`.
    fn agents_in(&self, world: WorldId) -> Vec<Arc<dyn Agent>>;

    /// Resolve a live agent by id. `None` if it has gone away.
    fn agent(&self, id: AgentId) -> Option<Arc<dyn Agent>>;
}
