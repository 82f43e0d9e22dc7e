//! Shared fixtures: in-memory agents, a directory, and listeners that record
//! what they were told.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use region_engine::region::cuboid::CuboidRegion;
use region_engine::{
    Agent, AgentDirectory, AgentId, BlockPos, Location, MoveReason, RegionListener, RegionTracker,
    Transition, WorldId,
};
use uuid::Uuid;

pub const OVERWORLD: WorldId = WorldId(0);
pub const NETHER: WorldId = WorldId(1);

pub fn owner() -> Uuid {
    Uuid::from_u128(0xfeed)
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

pub struct TestAgent {
    id: AgentId,
    location: Mutex<Option<Location>>,
    synthetic: bool,
}

impl TestAgent {
    pub fn new(n: u128, location: Location) -> Arc<Self> {
        Arc::new(Self {
            id: AgentId(Uuid::from_u128(n)),
            location: Mutex::new(Some(location)),
            synthetic: false,
        })
    }

    pub fn synthetic(n: u128, location: Location) -> Arc<Self> {
        Arc::new(Self {
            id: AgentId(Uuid::from_u128(n)),
            location: Mutex::new(Some(location)),
            synthetic: true,
        })
    }

    pub fn set_location(&self, location: Option<Location>) {
        *self.location.lock().unwrap() = location;
    }

    pub fn move_to(&self, x: f64, y: f64, z: f64) {
        let world = self.location().map_or(OVERWORLD, |l| l.world);
        self.set_location(Some(Location::new(world, x, y, z)));
    }
}

impl Agent for TestAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn location(&self) -> Option<Location> {
        *self.location.lock().unwrap()
    }

    fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

#[derive(Default)]
pub struct TestDirectory {
    agents: Mutex<HashMap<AgentId, Arc<TestAgent>>>,
}

impl TestDirectory {
    pub fn add(&self, agent: &Arc<TestAgent>) {
        self.agents.lock().unwrap().insert(agent.id(), Arc::clone(agent));
    }

    pub fn remove(&self, id: AgentId) {
        self.agents.lock().unwrap().remove(&id);
    }
}

impl AgentDirectory for TestDirectory {
    fn agents_in(&self, world: WorldId) -> Vec<Arc<dyn Agent>> {
        self.agents
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.location().is_some_and(|l| l.world == world))
            .map(|a| Arc::clone(a) as Arc<dyn Agent>)
            .collect()
    }

    fn agent(&self, id: AgentId) -> Option<Arc<dyn Agent>> {
        self.agents
            .lock()
            .unwrap()
            .get(&id)
            .map(|a| Arc::clone(a) as Arc<dyn Agent>)
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub region: String,
    pub transition: Transition,
    pub agent: AgentId,
    pub reason: MoveReason,
}

#[derive(Default)]
pub struct Recorder {
    log: Mutex<Vec<Record>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<Record> {
        std::mem::take(&mut *self.log.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap().len()
    }
}

pub struct RecordingListener {
    name: String,
    recorder: Arc<Recorder>,
}

impl RecordingListener {
    fn push(&self, agent: &dyn Agent, transition: Transition, reason: MoveReason) {
        self.recorder.log.lock().unwrap().push(Record {
            region: self.name.clone(),
            transition,
            agent: agent.id(),
            reason,
        });
    }
}

impl RegionListener for RecordingListener {
    fn on_enter(&self, agent: &dyn Agent, reason: MoveReason) -> anyhow::Result<()> {
        self.push(agent, Transition::Enter, reason);
        Ok(())
    }

    fn on_leave(&self, agent: &dyn Agent, reason: MoveReason) -> anyhow::Result<()> {
        self.push(agent, Transition::Leave, reason);
        Ok(())
    }
}

pub fn enter(region: &str, agent: AgentId, reason: MoveReason) -> Record {
    Record {
        region: region.to_owned(),
        transition: Transition::Enter,
        agent,
        reason,
    }
}

pub fn leave(region: &str, agent: AgentId, reason: MoveReason) -> Record {
    Record {
        region: region.to_owned(),
        transition: Transition::Leave,
        agent,
        reason,
    }
}

// ---------------------------------------------------------------------------
// Regions and tracker
// ---------------------------------------------------------------------------

/// A plain (non-listener) cuboid in the overworld.
pub fn cuboid(name: &str, a: (i64, i64, i64), b: (i64, i64, i64)) -> CuboidRegion {
    CuboidRegion::new(
        owner(),
        name,
        OVERWORLD,
        BlockPos::new(a.0, a.1, a.2),
        BlockPos::new(b.0, b.1, b.2),
    )
}

/// A recording listener cuboid in the overworld.
pub fn listening(
    recorder: &Arc<Recorder>,
    name: &str,
    a: (i64, i64, i64),
    b: (i64, i64, i64),
    enter_priority: i32,
    leave_priority: i32,
) -> Arc<CuboidRegion> {
    let listener = Arc::new(RecordingListener {
        name: name.to_owned(),
        recorder: Arc::clone(recorder),
    });
    Arc::new(
        cuboid(name, a, b)
            .with_priorities(enter_priority, leave_priority)
            .with_listener(listener),
    )
}

pub fn tracker(directory: &Arc<TestDirectory>) -> RegionTracker {
    RegionTracker::new(Arc::clone(directory) as Arc<dyn AgentDirectory>, Default::default())
}

/// Harvest, diff and deliver: one full round trip through both lanes.
pub fn full_cycle(tracker: &RegionTracker) {
    tracker.tick_main().expect("sampler handoff");
    tracker.tick_background();
    tracker.dispatch_pending();
}

/// Move `agent` and record the sample.
pub fn step(tracker: &RegionTracker, agent: &TestAgent, x: f64, y: f64, z: f64, reason: MoveReason) {
    agent.move_to(x, y, z);
    tracker.update_agent_location(agent, reason);
}
