//! Region membership tracking for a live multi-agent simulation.
//!
//! Regions are indexed by chunk. Agents report movement samples from any
//! thread; once per main tick the samples are handed to a background diff
//! worker, which works out who entered and left which listener regions. The
//! resulting events come back to the main lane and are delivered in order.
//!
//! The host drives two lanes at a fixed rate:
//!
//! - main lane: [`RegionTracker::tick_main`] (dispatch, then sample)
//! - background lane: [`RegionTracker::tick_background`] (diff)
//!
//! Region geometry, listener behaviour and scheduling belong to the host.

pub mod agent;
pub mod config;
pub mod error;
pub mod event;
pub mod index;
pub mod membership;
pub mod metrics;
pub mod region;
pub mod sample;
pub mod tracker;
pub mod world;

pub use agent::{Agent, AgentDirectory, AgentId, MoveReason};
pub use config::TrackerConfig;
pub use error::TrackerError;
pub use event::{RegionEvent, Transition};
pub use region::{PriorityType, Region, RegionHandle, RegionKey, RegionKind, RegionListener};
pub use tracker::{MainTickReport, RegionTracker};
pub use world::WorldId;
pub use world::position::{BlockBounds, BlockPos, ChunkKey, Location};
