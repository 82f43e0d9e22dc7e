use serde::Deserialize;

/// Tuning knobs for a [`RegionTracker`](crate::tracker::RegionTracker).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Hold back enter events after a join until the agent first moves, so
    /// the client has finished loading before listeners react.
    pub join_grace: bool,

    /// Pending samples per agent before consecutive moves start coalescing.
    pub max_pending_samples: usize,

    /// Events delivered per main tick. `None` drains the queue.
    pub dispatch_budget: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            join_grace: true,
            max_pending_samples: 64,
            dispatch_budget: None,
        }
    }
}
