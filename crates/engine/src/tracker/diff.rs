use std::collections::{HashMap, HashSet};
use std::sync::atomic::Ordering;
use std::time::Instant;

use super::{RegionTracker, TrackerState};
use crate::agent::{AgentId, MoveReason};
use crate::event::RegionEvent;
use crate::index::RegionRegistry;
use crate::membership::OrderedMembershipSet;
use crate::region::{PriorityType, RegionHandle};
use crate::sample::SampleBatch;
use crate::world::position::Location;

impl RegionTracker {
    /// Background-lane diff cycle. Runs only while the sampler has flagged
    /// work, drains the input queue completely and then clears the flag.
    ///
    /// There is no way to stop a cycle part-way: a half-applied batch would
    /// leave membership sets and emitted events out of step.
    pub fn run_diff_cycle(&self) -> usize {
        if !self.running.load(Ordering::Acquire) {
            return 0;
        }

        let started = Instant::now();
        let mut batches = 0;
        let mut events = 0;
        loop {
            let Some(batch) = self.input.lock().pop_front() else {
                break;
            };
            events += self.diff_batch(batch);
            batches += 1;
        }
        self.running.store(false, Ordering::Release);

        let elapsed = started.elapsed();
        self.metrics.record_cycle(elapsed);
        tracing::debug!(batches, events, ?elapsed, "diff cycle complete");
        batches
    }

    /// Apply one agent's samples to its membership set and queue the
    /// resulting events. Returns the number of events queued.
    fn diff_batch(&self, batch: SampleBatch) -> usize {
        let id = batch.agent();
        let mut state = self.state.lock();

        // The agent disconnected (and maybe came back) since the harvest.
        let current = self.buffers.get(&id).is_some_and(|b| b.is_checked_out());
        if !current {
            tracing::debug!(agent = %id, "dropping batch for disconnected agent");
            return 0;
        }

        let TrackerState {
            registry,
            memberships,
            joining,
        } = &mut *state;

        let mut events = Vec::new();
        for sample in batch.samples() {
            let Some(reason) = self.effective_reason(joining, id, sample.reason) else {
                continue;
            };
            diff_sample(registry, memberships, id, sample.location, reason, &mut events);
        }

        let queued = events.len();
        // Queued under the state lock so a disconnect cannot slip between the
        // membership change and its events.
        self.dispatch.lock().extend(events);
        drop(state);

        if let Some(mut buffer) = self.buffers.get_mut(&id) {
            buffer.recycle(batch);
        }
        queued
    }

    /// The reason a sample is diffed under, or `None` to skip it.
    ///
    /// A join parks the agent until its first move, which is then reported as
    /// the join.
    fn effective_reason(
        &self,
        joining: &mut HashSet<AgentId>,
        id: AgentId,
        reason: MoveReason,
    ) -> Option<MoveReason> {
        if reason == MoveReason::JoinServer && self.config.join_grace {
            joining.insert(id);
            return None;
        }
        if joining.contains(&id) {
            if reason != MoveReason::Move {
                return None;
            }
            joining.remove(&id);
            return Some(MoveReason::JoinServer);
        }
        Some(reason)
    }
}

/// Diff one sample: enters first (enter priority order), then leaves (leave
/// priority order). A dead agent enters nothing and leaves everything.
fn diff_sample(
    registry: &mut RegionRegistry,
    memberships: &mut HashMap<AgentId, OrderedMembershipSet<RegionHandle>>,
    id: AgentId,
    location: Location,
    reason: MoveReason,
    events: &mut Vec<RegionEvent>,
) {
    let containing = if reason == MoveReason::Dead {
        Vec::new()
    } else {
        registry.query_listeners(
            location.world,
            location.x,
            location.y,
            location.z,
            PriorityType::Enter,
        )
    };

    // Membership sets are only created once there is something to hold.
    if containing.is_empty() && !memberships.contains_key(&id) {
        return;
    }
    let membership = memberships.entry(id).or_default();

    for region in &containing {
        if membership.insert(region.clone()) {
            events.push(RegionEvent::enter(region.clone(), id, reason));
        }
    }

    let left = membership.remove_ordered_where(PriorityType::Leave, |r| !containing.contains(r));
    events.extend(left.into_iter().map(|r| RegionEvent::leave(r, id, reason)));
}
