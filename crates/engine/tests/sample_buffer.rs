//! SampleBuffer: pooled slots, discard-on-teleport, and the single-checkout
//! protocol.

use region_engine::sample::SampleBuffer;
use region_engine::{AgentId, Location, MoveReason, TrackerError, WorldId};
use uuid::Uuid;

fn agent() -> AgentId {
    AgentId(Uuid::from_u128(1))
}

fn at(x: f64) -> Location {
    Location::new(WorldId(0), x, 64.0, 0.0)
}

fn push(buffer: &mut SampleBuffer, x: f64, reason: MoveReason) {
    *buffer.add(reason) = at(x);
}

fn xs(buffer: &mut SampleBuffer) -> Vec<(f64, MoveReason)> {
    let batch = buffer.take_all().unwrap().expect("pending samples");
    let out = batch
        .samples()
        .iter()
        .map(|s| (s.location.x, s.reason))
        .collect();
    buffer.recycle(batch);
    out
}

#[test]
fn empty_buffer_yields_nothing() {
    let mut buffer = SampleBuffer::new(agent(), 64);
    assert!(buffer.take_all().unwrap().is_none());
    assert!(!buffer.is_checked_out());
}

#[test]
fn samples_come_out_in_arrival_order() {
    let mut buffer = SampleBuffer::new(agent(), 64);
    push(&mut buffer, 1.0, MoveReason::Move);
    push(&mut buffer, 2.0, MoveReason::Respawn);
    push(&mut buffer, 3.0, MoveReason::Move);

    assert_eq!(
        xs(&mut buffer),
        vec![
            (1.0, MoveReason::Move),
            (2.0, MoveReason::Respawn),
            (3.0, MoveReason::Move)
        ]
    );
    assert_eq!(buffer.pending(), 0);
}

#[test]
fn teleport_and_join_discard_pending() {
    let mut buffer = SampleBuffer::new(agent(), 64);
    push(&mut buffer, 1.0, MoveReason::Move);
    push(&mut buffer, 2.0, MoveReason::Teleport);
    push(&mut buffer, 3.0, MoveReason::Move);
    assert_eq!(xs(&mut buffer), vec![(2.0, MoveReason::Teleport), (3.0, MoveReason::Move)]);

    push(&mut buffer, 4.0, MoveReason::Move);
    push(&mut buffer, 5.0, MoveReason::JoinServer);
    assert_eq!(xs(&mut buffer), vec![(5.0, MoveReason::JoinServer)]);
}

#[test]
fn second_checkout_before_recycle_fails() {
    let mut buffer = SampleBuffer::new(agent(), 64);
    push(&mut buffer, 1.0, MoveReason::Move);
    let batch = buffer.take_all().unwrap().unwrap();

    push(&mut buffer, 2.0, MoveReason::Move);
    let err = buffer.take_all().unwrap_err();
    assert!(matches!(err, TrackerError::SnapshotOutstanding { agent: a } if a == agent()));

    buffer.recycle(batch);
    assert_eq!(xs(&mut buffer), vec![(2.0, MoveReason::Move)]);
}

#[test]
fn appends_during_checkout_do_not_touch_snapshot() {
    let mut buffer = SampleBuffer::new(agent(), 64);
    push(&mut buffer, 1.0, MoveReason::Move);
    push(&mut buffer, 2.0, MoveReason::Move);
    let batch = buffer.take_all().unwrap().unwrap();

    push(&mut buffer, 10.0, MoveReason::Move);
    push(&mut buffer, 20.0, MoveReason::Teleport);

    let seen: Vec<f64> = batch.samples().iter().map(|s| s.location.x).collect();
    assert_eq!(seen, vec![1.0, 2.0]);
    buffer.recycle(batch);
}

#[test]
fn moves_coalesce_past_the_cap() {
    let mut buffer = SampleBuffer::new(agent(), 3);
    for x in 1..=10 {
        push(&mut buffer, x as f64, MoveReason::Move);
    }
    assert_eq!(buffer.pending(), 3);
    assert_eq!(
        xs(&mut buffer),
        vec![(1.0, MoveReason::Move), (2.0, MoveReason::Move), (10.0, MoveReason::Move)]
    );
}

#[test]
fn non_move_reasons_are_never_coalesced_away() {
    let mut buffer = SampleBuffer::new(agent(), 1);
    push(&mut buffer, 1.0, MoveReason::Move);
    push(&mut buffer, 2.0, MoveReason::Dead);
    push(&mut buffer, 3.0, MoveReason::Move);
    assert_eq!(
        xs(&mut buffer),
        vec![(1.0, MoveReason::Move), (2.0, MoveReason::Dead), (3.0, MoveReason::Move)]
    );
}

#[test]
fn pool_capacity_converges() {
    let mut buffer = SampleBuffer::new(agent(), 64);
    let mut capacities = Vec::new();
    for round in 0..200 {
        for k in 0..5 {
            push(&mut buffer, (round * 5 + k) as f64, MoveReason::Move);
        }
        let batch = buffer.take_all().unwrap().unwrap();
        assert_eq!(batch.len(), 5);
        buffer.recycle(batch);
        capacities.push(buffer.pool_capacity());
    }
    // Two alternating 5-slot vectors, no growth after warm-up.
    assert!(capacities[2..].iter().all(|&c| c == 10), "{capacities:?}");
}
