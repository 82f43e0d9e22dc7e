//! The region tracker: exposed surface and shared state of the pipeline.
//!
//! ```text
//!   producers ──add──▶ SampleBuffer (per agent)
//!                          │ take_all, main lane, only while IDLE
//!                          ▼
//!                     input queue ──▶ diff worker (background lane, RUNNING)
//!                                          │ enter/leave
//!                                          ▼
//!                                     dispatch queue ──▶ listeners (main lane)
//! ```
//!
//! `running` is the only coordination between the lanes. The main lane sets
//! it (after filling the input queue, while it is clear) and the background
//! lane clears it (after draining the queue, while it is set), so each
//! transition has a single writer.

mod diff;
mod dispatch;
mod sampler;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};

use crate::agent::{Agent, AgentDirectory, AgentId, MoveReason};
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::event::RegionEvent;
use crate::index::RegionRegistry;
use crate::membership::OrderedMembershipSet;
use crate::metrics::TrackerMetrics;
use crate::region::{PriorityType, Region, RegionHandle, RegionKey, RegionKind};
use crate::sample::{SampleBatch, SampleBuffer};
use crate::world::WorldId;
use crate::world::position::Location;

/// State guarded by the tracker-wide lock.
#[derive(Default)]
struct TrackerState {
    registry: RegionRegistry,
    memberships: HashMap<AgentId, OrderedMembershipSet<RegionHandle>>,
    /// Agents that joined and have not moved yet.
    joining: HashSet<AgentId>,
}

/// What one main-lane tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MainTickReport {
    /// Events delivered to listeners.
    pub dispatched: usize,
    /// Agent batches handed to the diff worker.
    pub harvested: usize,
    /// The diff worker was still busy, so nothing was harvested.
    pub skipped: bool,
}

/// Tracks which listener regions each agent occupies and delivers ordered
/// enter/leave callbacks.
///
/// Lock order: `delivery` first; then `state` before `buffers` or
/// `dispatch`; `input` before `buffers`. Listener callbacks run holding only
/// `delivery`, which is reentrant so a listener may call back into the
/// tracker.
pub struct RegionTracker {
    state: Mutex<TrackerState>,
    buffers: DashMap<AgentId, SampleBuffer>,
    input: Mutex<VecDeque<SampleBatch>>,
    dispatch: Mutex<VecDeque<RegionEvent>>,
    running: AtomicBool,
    /// Serializes callback delivery between the main lane and disconnects.
    delivery: ReentrantMutex<()>,
    directory: Arc<dyn AgentDirectory>,
    config: TrackerConfig,
    metrics: TrackerMetrics,
}

impl RegionTracker {
    pub fn new(directory: Arc<dyn AgentDirectory>, config: TrackerConfig) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            buffers: DashMap::new(),
            input: Mutex::new(VecDeque::new()),
            dispatch: Mutex::new(VecDeque::new()),
            running: AtomicBool::new(false),
            delivery: ReentrantMutex::new(()),
            directory,
            config,
            metrics: TrackerMetrics::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TrackerMetrics {
        &self.metrics
    }

    // ── Regions ─────────────────────────────────────────────────────────

    /// Index a region. Undefined regions and regions in unloaded worlds are
    /// logged and rejected; the tracker keeps running either way.
    pub fn register_region(&self, region: Arc<dyn Region>) -> Result<RegionHandle, TrackerError> {
        let mut state = self.state.lock();
        match state.registry.register(region) {
            Ok((handle, replaced)) => {
                // Members keep the key but pick up the new registration, so
                // later leaves reach the current listener.
                if replaced.is_some() {
                    for membership in state.memberships.values_mut() {
                        if membership.remove(&handle) {
                            membership.insert(handle.clone());
                        }
                    }
                }
                tracing::debug!(
                    region = %handle.key(),
                    kind = %handle.kind(),
                    chunks = handle.bounds().chunk_count(),
                    listener = handle.is_listener(),
                    replaced = replaced.is_some(),
                    "region registered"
                );
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!("Rejected region registration: {}", e);
                Err(e)
            }
        }
    }

    /// Remove a region from the index and from every agent's membership set.
    /// No leave events are generated. Returns `false` if it was not
    /// registered.
    pub fn unregister_region(&self, region: &dyn Region) -> bool {
        self.unregister_key(region.kind(), &region.key())
    }

    pub fn unregister_key(&self, kind: RegionKind, key: &RegionKey) -> bool {
        let mut state = self.state.lock();
        let Some(removed) = state.registry.unregister(kind, key) else {
            return false;
        };
        for membership in state.memberships.values_mut() {
            membership.remove(&removed);
        }
        tracing::debug!(region = %key, "region unregistered");
        true
    }

    pub fn region_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    pub fn has_listener_regions(&self, world: WorldId) -> bool {
        self.state.lock().registry.has_listeners(world)
    }

    // ── Agent updates ───────────────────────────────────────────────────

    /// Record the agent's current location. An agent with no location has
    /// left, and is handled as a disconnect.
    pub fn update_agent_location(&self, agent: &dyn Agent, reason: MoveReason) {
        match agent.location() {
            Some(location) => self.update_agent_location_at(agent, location, reason),
            None => self.update_agent_disconnect(agent, MoveReason::QuitServer),
        }
    }

    /// Record an explicit location for the agent.
    ///
    /// Samples for agents the directory no longer resolves are ignored; a
    /// buffer created for them would never be harvested.
    pub fn update_agent_location_at(&self, agent: &dyn Agent, location: Location, reason: MoveReason) {
        if agent.is_synthetic() {
            return;
        }
        let id = agent.id();
        if self.directory.agent(id).is_none() {
            tracing::trace!(agent = %id, %reason, "ignoring sample for departed agent");
            return;
        }
        {
            let mut buffer = self
                .buffers
                .entry(id)
                .or_insert_with(|| SampleBuffer::new(id, self.config.max_pending_samples));
            *buffer.add(reason) = location;
        }
        self.metrics.sample_recorded();
        self.metrics.set_agents_tracked(self.buffers.len() as u64);
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Point-in-time copy of the regions the agent is in, by enter priority.
    pub fn agent_regions(&self, agent: AgentId) -> Vec<RegionHandle> {
        let mut state = self.state.lock();
        state
            .memberships
            .get_mut(&agent)
            .map(|m| m.to_ordered_vec(PriorityType::Enter))
            .unwrap_or_default()
    }

    /// Regions of `kind` containing the point. Bypasses agent tracking.
    pub fn regions_at(&self, world: WorldId, x: f64, y: f64, z: f64, kind: RegionKind) -> Vec<RegionHandle> {
        self.state.lock().registry.query(world, x, y, z, kind)
    }

    /// Regions of any kind containing the point.
    pub fn regions_at_any(&self, world: WorldId, x: f64, y: f64, z: f64) -> Vec<RegionHandle> {
        self.state.lock().registry.query_any(world, x, y, z)
    }

    /// Listener regions containing the point, in `order`.
    pub fn listener_regions_at(
        &self,
        world: WorldId,
        x: f64,
        y: f64,
        z: f64,
        order: PriorityType,
    ) -> Vec<RegionHandle> {
        self.state
            .lock()
            .registry
            .query_listeners(world, x, y, z, order)
    }

    // ── Lanes ───────────────────────────────────────────────────────────

    /// One main-lane tick: deliver queued events, then harvest samples.
    pub fn tick_main(&self) -> Result<MainTickReport, TrackerError> {
        let dispatched = self.dispatch_pending();
        let skipped = self.is_running();
        let harvested = self.sample()?;
        Ok(MainTickReport {
            dispatched,
            harvested,
            skipped,
        })
    }

    /// One background-lane tick. Returns the number of batches diffed.
    pub fn tick_background(&self) -> usize {
        self.run_diff_cycle()
    }

    /// True while a diff cycle is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn queued_batches(&self) -> usize {
        self.input.lock().len()
    }

    pub fn pending_events(&self) -> usize {
        self.dispatch.lock().len()
    }

    /// Pending sample count for an agent's buffer, if it has one.
    pub fn pending_samples(&self, agent: AgentId) -> Option<usize> {
        self.buffers.get(&agent).map(|b| b.pending())
    }

    /// Allocated sample slots for an agent's buffer, if it has one.
    pub fn sample_pool_capacity(&self, agent: AgentId) -> Option<usize> {
        self.buffers.get(&agent).map(|b| b.pool_capacity())
    }
}
