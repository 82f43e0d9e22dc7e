//! Connected agents and where they are.
//!
//! The roster is the host side of the agent capability: it owns every
//! [`BotAgent`] and answers the tracker's world-membership and id lookups.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use region_engine::{Agent, AgentDirectory, AgentId, Location, WorldId};
use uuid::Uuid;

/// A simulated player.
pub struct BotAgent {
    id: AgentId,
    name: String,
    location: RwLock<Option<Location>>,
    synthetic: bool,
}

impl BotAgent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_location(&self, location: Location) {
        *self.location.write() = Some(location);
    }

    /// The bot is gone; it has no location any more.
    pub fn clear_location(&self) {
        *self.location.write() = None;
    }
}

impl Agent for BotAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn location(&self) -> Option<Location> {
        *self.location.read()
    }

    fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

/// Thread-safe registry of all connected agents.
///
/// Every operation is brief and the access pattern is read-heavy (the sampler
/// asks for each listener world's agents every tick).
///
/// Removal comes in two steps: [`depart`](Roster::depart) takes the agent out
/// of the directory from any thread, and the main lane later collects it with
/// [`take_departed`](Roster::take_departed) to run the tracker's disconnect.
#[derive(Default)]
pub struct Roster {
    agents: RwLock<HashMap<AgentId, Arc<BotAgent>>>,
    departed: Mutex<Vec<Arc<BotAgent>>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new agent at `location`.
    pub fn register(&self, name: impl Into<String>, location: Location, synthetic: bool) -> Arc<BotAgent> {
        let agent = Arc::new(BotAgent {
            id: AgentId(Uuid::new_v4()),
            name: name.into(),
            location: RwLock::new(Some(location)),
            synthetic,
        });
        self.agents.write().insert(agent.id, Arc::clone(&agent));
        agent
    }

    /// Remove an agent. Returns it so the caller can run the disconnect path.
    pub fn deregister(&self, id: AgentId) -> Option<Arc<BotAgent>> {
        let agent = self.agents.write().remove(&id)?;
        agent.clear_location();
        Some(agent)
    }

    /// Deregister an agent and queue it for the main lane's disconnect pass.
    /// Returns `false` if it was not registered.
    pub fn depart(&self, id: AgentId) -> bool {
        let Some(agent) = self.deregister(id) else {
            return false;
        };
        self.departed.lock().push(agent);
        true
    }

    /// Agents queued by [`depart`](Roster::depart), oldest first.
    pub fn take_departed(&self) -> Vec<Arc<BotAgent>> {
        std::mem::take(&mut *self.departed.lock())
    }

    pub fn get(&self, id: AgentId) -> Option<Arc<BotAgent>> {
        self.agents.read().get(&id).cloned()
    }

    /// Snapshot of all connected agents.
    pub fn snapshot(&self) -> Vec<Arc<BotAgent>> {
        self.agents.read().values().cloned().collect()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.read().len()
    }
}

impl AgentDirectory for Roster {
    fn agents_in(&self, world: WorldId) -> Vec<Arc<dyn Agent>> {
        self.agents
            .read()
            .values()
            .filter(|a| a.location().is_some_and(|l| l.world == world))
            .map(|a| Arc::clone(a) as Arc<dyn Agent>)
            .collect()
    }

    fn agent(&self, id: AgentId) -> Option<Arc<dyn Agent>> {
        self.get(id).map(|a| a as Arc<dyn Agent>)
    }
}
