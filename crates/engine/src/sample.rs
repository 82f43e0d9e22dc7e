//! Per-agent pooled movement samples.
//!
//! A [`SampleBuffer`] owns two slot vectors and swaps them on checkout: the
//! pending vector leaves as a [`SampleBatch`] and producers keep appending
//! into the spare one. When the batch comes back through
//! [`SampleBuffer::recycle`] its storage becomes the next spare. In steady
//! state no sample allocates; pool capacity stays at twice the high-water mark
//! of pending samples.
//!
//! ```text
//!   Empty ──add──▶ Accumulating ──take_all──▶ CheckedOut ──recycle──▶ Empty/Accumulating
//!                                                  │
//!                                            add still allowed
//! ```

use crate::agent::{AgentId, MoveReason};
use crate::error::TrackerError;
use crate::world::position::Location;

/// One recorded observation of agent movement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub location: Location,
    pub reason: MoveReason,
}

/// The checked-out, read-only snapshot of an agent's pending samples.
#[derive(Debug)]
pub struct SampleBatch {
    agent: AgentId,
    slots: Vec<Sample>,
    len: usize,
}

impl SampleBatch {
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Samples in arrival order.
    pub fn samples(&self) -> &[Sample] {
        &self.slots[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
pub struct SampleBuffer {
    agent: AgentId,
    /// Pending storage. `slots[..pool_index]` are live samples; the rest are
    /// reusable slots left over from earlier rounds.
    slots: Vec<Sample>,
    pool_index: usize,
    /// Storage returned by the last recycle, swapped in on the next checkout.
    spare: Vec<Sample>,
    checked_out: bool,
    max_pending: usize,
}

impl SampleBuffer {
    pub fn new(agent: AgentId, max_pending: usize) -> Self {
        Self {
            agent,
            slots: Vec::new(),
            pool_index: 0,
            spare: Vec::new(),
            checked_out: false,
            max_pending: max_pending.max(1),
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Append a sample and return its location slot for the caller to fill.
    ///
    /// `JoinServer` and `Teleport` discard everything still pending. Once
    /// `max_pending` samples are waiting, a `Move` following a `Move`
    /// overwrites the newest slot instead of taking a new one.
    pub fn add(&mut self, reason: MoveReason) -> &mut Location {
        if reason.discards_pending() {
            self.pool_index = 0;
        } else if reason == MoveReason::Move
            && self.pool_index >= self.max_pending
            && self.slots[self.pool_index - 1].reason == MoveReason::Move
        {
            let slot = &mut self.slots[self.pool_index - 1];
            return &mut slot.location;
        }

        if self.pool_index == self.slots.len() {
            self.slots.push(Sample::default());
        }
        let slot = &mut self.slots[self.pool_index];
        self.pool_index += 1;
        slot.reason = reason;
        &mut slot.location
    }

    /// Check out every pending sample.
    ///
    /// Returns `Ok(None)` when nothing is pending. Fails if the previous batch
    /// has not been recycled yet.
    pub fn take_all(&mut self) -> Result<Option<SampleBatch>, TrackerError> {
        if self.checked_out {
            return Err(TrackerError::SnapshotOutstanding { agent: self.agent });
        }
        if self.pool_index == 0 {
            return Ok(None);
        }
        let slots = std::mem::replace(&mut self.slots, std::mem::take(&mut self.spare));
        let len = std::mem::replace(&mut self.pool_index, 0);
        self.checked_out = true;
        Ok(Some(SampleBatch {
            agent: self.agent,
            slots,
            len,
        }))
    }

    /// Return a checked-out batch's storage to the pool.
    pub fn recycle(&mut self, batch: SampleBatch) {
        debug_assert_eq!(batch.agent, self.agent, "batch recycled into another agent's buffer");
        self.spare = batch.slots;
        self.checked_out = false;
    }

    pub fn pending(&self) -> usize {
        self.pool_index
    }

    pub fn is_checked_out(&self) -> bool {
        self.checked_out
    }

    /// Total slots allocated across pending and spare storage.
    pub fn pool_capacity(&self) -> usize {
        self.slots.len() + self.spare.len()
    }
}
