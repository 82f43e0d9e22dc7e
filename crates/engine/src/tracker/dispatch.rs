use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::RegionTracker;
use crate::agent::{Agent, MoveReason};
use crate::event::{RegionEvent, Transition};
use crate::region::PriorityType;

impl RegionTracker {
    /// Main-lane delivery of queued events, oldest first, up to the configured
    /// budget. Returns the number of callbacks invoked.
    ///
    /// Events for disposed regions are dropped. Events for agents the
    /// directory no longer resolves stay queued for that agent's disconnect,
    /// which delivers them ahead of its leaves. A failing or panicking
    /// listener is logged and the drain carries on.
    pub fn dispatch_pending(&self) -> usize {
        let _delivery = self.delivery.lock();
        let mut delivered = 0;
        for (event, agent) in self.take_ready() {
            if self.deliver(&event, agent.as_ref()) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Pop up to the budget of events whose agent is still live. Once one
    /// event of an agent is held back, so are all its later ones.
    fn take_ready(&self) -> Vec<(RegionEvent, Arc<dyn Agent>)> {
        let budget = self.config.dispatch_budget.unwrap_or(usize::MAX);
        let mut queue = self.dispatch.lock();
        let mut ready = Vec::new();
        let mut held = VecDeque::new();
        let mut departed = HashSet::new();

        while ready.len() < budget {
            let Some(event) = queue.pop_front() else {
                break;
            };
            if !departed.contains(&event.agent) {
                if let Some(agent) = self.directory.agent(event.agent) {
                    ready.push((event, agent));
                    continue;
                }
                departed.insert(event.agent);
            }
            held.push_back(event);
        }

        if !held.is_empty() {
            tracing::debug!(
                events = held.len(),
                agents = departed.len(),
                "holding events for departed agents"
            );
            held.append(&mut queue);
            *queue = held;
        }
        ready
    }

    /// The agent has left the simulation. Runs synchronously on the caller:
    /// first any events still queued for the agent, then a leave for every
    /// region it is in (by leave priority), then its membership set and sample
    /// buffer are discarded.
    ///
    /// Serialized with [`dispatch_pending`](Self::dispatch_pending), so a
    /// concurrent drain can never deliver a stale enter after these leaves.
    pub fn update_agent_disconnect(&self, agent: &dyn Agent, reason: MoveReason) {
        let _delivery = self.delivery.lock();
        let id = agent.id();
        let (queued, leaving) = {
            let mut state = self.state.lock();
            state.joining.remove(&id);
            let leaving = state
                .memberships
                .remove(&id)
                .map(|mut m| m.to_ordered_vec(PriorityType::Leave))
                .unwrap_or_default();
            self.buffers.remove(&id);

            let mut queue = self.dispatch.lock();
            let (queued, rest): (VecDeque<RegionEvent>, VecDeque<RegionEvent>) =
                queue.drain(..).partition(|e| e.agent == id);
            *queue = rest;
            (queued, leaving)
        };
        self.metrics.set_agents_tracked(self.buffers.len() as u64);

        tracing::debug!(agent = %id, queued = queued.len(), regions = leaving.len(), %reason, "agent disconnected");
        for event in &queued {
            self.deliver(event, agent);
        }
        for region in leaving {
            self.deliver(&RegionEvent::leave(region, id, reason), agent);
        }
    }

    /// Invoke the listener for `event`. Returns whether a callback ran
    /// (successfully or not).
    pub(crate) fn deliver(&self, event: &RegionEvent, agent: &dyn Agent) -> bool {
        let region = event.region.region();
        if region.is_disposed() {
            self.metrics.event_dropped();
            return false;
        }
        let Some(listener) = region.listener() else {
            return false;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match event.transition {
            Transition::Enter => listener.on_enter(agent, event.reason),
            Transition::Leave => listener.on_leave(agent, event.reason),
        }));

        match event.transition {
            Transition::Enter => self.metrics.enter_dispatched(),
            Transition::Leave => self.metrics.leave_dispatched(),
        }

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.metrics.listener_failed();
                tracing::warn!(
                    region = %event.region.key(),
                    agent = %event.agent,
                    reason = %event.reason,
                    transition = ?event.transition,
                    "Region listener failed: {:#}",
                    e
                );
            }
            Err(payload) => {
                self.metrics.listener_failed();
                tracing::warn!(
                    region = %event.region.key(),
                    agent = %event.agent,
                    reason = %event.reason,
                    transition = ?event.transition,
                    "Region listener panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
        true
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
