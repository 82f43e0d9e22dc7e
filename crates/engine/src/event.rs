use crate::agent::{AgentId, MoveReason};
use crate::region::RegionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Enter,
    Leave,
}

/// A membership change waiting for delivery on the main lane.
#[derive(Debug, Clone)]
pub struct RegionEvent {
    pub transition: Transition,
    pub region: RegionHandle,
    pub agent: AgentId,
    /// The reason delivered to the listener. For the first move after a join
    /// this is `JoinServer`, not `Move`.
    pub reason: MoveReason,
}

impl RegionEvent {
    pub fn enter(region: RegionHandle, agent: AgentId, reason: MoveReason) -> Self {
        Self {
            transition: Transition::Enter,
            region,
            agent,
            reason,
        }
    }

    pub fn leave(region: RegionHandle, agent: AgentId, reason: MoveReason) -> Self {
        Self {
            transition: Transition::Leave,
            region,
            agent,
            reason,
        }
    }
}
