use std::collections::{HashSet, VecDeque};
use std::sync::atomic::Ordering;

use super::RegionTracker;
use crate::agent::AgentId;
use crate::error::TrackerError;
use crate::sample::SampleBatch;

impl RegionTracker {
    /// Main-lane harvest. Moves every pending sample of every agent in a
    /// listener world into the diff worker's input queue.
    ///
    /// Does nothing while a diff cycle is in flight; the samples stay pending
    /// and are picked up by a later tick. Returns the number of batches
    /// queued.
    pub fn sample(&self) -> Result<usize, TrackerError> {
        if self.running.load(Ordering::Acquire) {
            self.metrics.sampler_tick_skipped();
            return Ok(0);
        }

        let (worlds, stragglers) = {
            let state = self.state.lock();
            let stragglers: Vec<AgentId> = state
                .memberships
                .iter()
                .filter(|(_, m)| !m.is_empty())
                .map(|(id, _)| *id)
                .collect();
            (state.registry.listener_worlds(), stragglers)
        };

        let mut candidates = Vec::new();
        for world in worlds {
            for agent in self.directory.agents_in(world) {
                if !agent.is_synthetic() {
                    candidates.push(agent.id());
                }
            }
        }
        // Agents still inside a region whose world lost its listeners (or
        // who moved to another world) must still get their leaves.
        candidates.extend(stragglers);

        let mut seen = HashSet::with_capacity(candidates.len());
        let mut input = self.input.lock();
        for id in candidates {
            if seen.insert(id) {
                self.harvest(id, &mut input)?;
            }
        }

        let queued = input.len();
        drop(input);
        self.release_departed();
        if queued > 0 {
            self.metrics.batches_harvested(queued as u64);
            self.running.store(true, Ordering::Release);
        }
        Ok(queued)
    }

    /// Free the buffers of agents the directory no longer knows. A sample
    /// that races its agent's disconnect can leave one behind.
    fn release_departed(&self) {
        let before = self.buffers.len();
        self.buffers
            .retain(|id, buffer| buffer.is_checked_out() || self.directory.agent(*id).is_some());
        let released = before - self.buffers.len();
        if released > 0 {
            tracing::debug!(released, "released buffers of departed agents");
            self.metrics.set_agents_tracked(self.buffers.len() as u64);
        }
    }

    fn harvest(&self, id: AgentId, input: &mut VecDeque<SampleBatch>) -> Result<(), TrackerError> {
        let Some(mut buffer) = self.buffers.get_mut(&id) else {
            return Ok(());
        };
        if let Some(batch) = buffer.take_all()? {
            input.push_back(batch);
        }
        Ok(())
    }
}
