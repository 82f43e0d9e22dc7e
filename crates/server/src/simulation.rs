//! Movement simulation: the producer side of the tracker.
//!
//! Each [`SimulationLayer`] runs on its own tokio task and, every tick, moves
//! bots around the roster and reports the moves to the tracker. Sampling is
//! safe from any thread. Quits are the exception: layers only queue them on
//! the roster, and the main lane runs the disconnect.
//!
//! # Adding a new layer
//!
//! 1. Implement [`SimulationLayer`] for your struct.
//! 2. Push a `Box::new(YourLayer)` into the `layers` vec in `main.rs`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use region_engine::{Agent, Location, MoveReason, RegionTracker, WorldId};
use tokio::task::JoinHandle;

use crate::config::DemoConfig;
use crate::roster::{BotAgent, Roster};

/// Height the bots walk at.
const WALK_Y: f64 = 64.0;
/// Largest single step, in blocks per axis.
const STEP: f64 = 1.5;
/// Chance per step that a wandering bot teleports instead of walking.
const TELEPORT_CHANCE: f64 = 0.005;

/// What a layer gets to work with.
#[derive(Clone)]
pub struct SimContext {
    pub roster: Arc<Roster>,
    pub tracker: Arc<RegionTracker>,
    pub demo: DemoConfig,
}

impl SimContext {
    /// Half-width of the square the bots roam in. Slightly larger than the
    /// zone grid so bots also wander out of every zone.
    pub fn roam_radius(&self) -> f64 {
        (crate::zones::grid_extent(&self.demo) as f64 / 2.0 + self.demo.region_size as f64).max(8.0)
    }

    fn random_location(&self, rng: &mut StdRng) -> Location {
        let r = self.roam_radius();
        Location::new(
            WorldId(rng.gen_range(0..self.demo.worlds)),
            rng.gen_range(-r..r),
            WALK_Y,
            rng.gen_range(-r..r),
        )
    }

    /// Connect a new bot at a random spot and report its join.
    pub fn spawn_bot(&self, rng: &mut StdRng, name: String) -> Arc<BotAgent> {
        let bot = self.roster.register(name, self.random_location(rng), false);
        self.tracker.update_agent_location(bot.as_ref(), MoveReason::JoinServer);
        bot
    }

    /// Disconnect a bot. The roster forgets it now; the main lane flushes its
    /// leaves on its next tick.
    pub fn despawn_bot(&self, bot: &BotAgent) {
        self.roster.depart(bot.id());
    }
}

/// A pluggable producer of agent movement, ticked on a timer.
pub trait SimulationLayer: Send + Sync + 'static {
    /// Human-readable name (used for logging).
    fn name(&self) -> &'static str;

    /// How often this layer ticks.
    fn interval(&self) -> Duration;

    /// Move agents. Returns how many samples were reported.
    fn step(&self, ctx: &SimContext) -> usize;
}

// ── Wanderers ───────────────────────────────────────────────────────────

/// Random walk within the roam square, with the odd teleport to another
/// world or a far corner.
pub struct Wanderers {
    rng: Mutex<StdRng>,
    interval: Duration,
}

impl Wanderers {
    pub fn new(demo: &DemoConfig) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(demo.seed)),
            interval: Duration::from_millis(demo.step_ms),
        }
    }
}

impl SimulationLayer for Wanderers {
    fn name(&self) -> &'static str {
        "wanderers"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn step(&self, ctx: &SimContext) -> usize {
        let mut rng = self.rng.lock();
        let r = ctx.roam_radius();
        let mut reported = 0;
        for bot in ctx.roster.snapshot() {
            let Some(here) = bot.location() else { continue };
            let (next, reason) = if rng.gen_bool(TELEPORT_CHANCE) {
                (ctx.random_location(&mut rng), MoveReason::Teleport)
            } else {
                let x = (here.x + rng.gen_range(-STEP..STEP)).clamp(-r, r);
                let z = (here.z + rng.gen_range(-STEP..STEP)).clamp(-r, r);
                (Location::new(here.world, x, here.y, z), MoveReason::Move)
            };
            bot.set_location(next);
            ctx.tracker.update_agent_location(bot.as_ref(), reason);
            reported += 1;
        }
        reported
    }
}

// ── Churn ───────────────────────────────────────────────────────────────

/// Keeps the population at the configured size: bots quit and are replaced,
/// and occasionally die and respawn at the origin.
pub struct Churn {
    rng: Mutex<StdRng>,
    interval: Duration,
    spawned: Mutex<u64>,
}

impl Churn {
    pub fn new(demo: &DemoConfig) -> Self {
        Self {
            // Independent stream from the wanderers.
            rng: Mutex::new(StdRng::seed_from_u64(demo.seed.rotate_left(17) ^ 0xc4u64)),
            interval: Duration::from_millis(demo.step_ms),
            spawned: Mutex::new(0),
        }
    }

    /// Bring the roster up to `demo.bots`. Returns how many were spawned.
    pub fn fill(&self, ctx: &SimContext) -> usize {
        let mut rng = self.rng.lock();
        let mut spawned = self.spawned.lock();
        let missing = ctx.demo.bots.saturating_sub(ctx.roster.agent_count());
        for _ in 0..missing {
            *spawned += 1;
            ctx.spawn_bot(&mut rng, format!("bot-{}", *spawned));
        }
        missing
    }
}

impl SimulationLayer for Churn {
    fn name(&self) -> &'static str {
        "churn"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn step(&self, ctx: &SimContext) -> usize {
        let churn = ctx.demo.churn;
        let mut reported = 0;
        {
            let mut rng = self.rng.lock();
            for bot in ctx.roster.snapshot() {
                if rng.gen_bool(churn) {
                    tracing::debug!("{} quit", bot.name());
                    ctx.despawn_bot(&bot);
                    reported += 1;
                } else if rng.gen_bool(churn) {
                    let Some(here) = bot.location() else { continue };
                    ctx.tracker.update_agent_location(bot.as_ref(), MoveReason::Dead);
                    bot.set_location(Location::new(here.world, 0.5, WALK_Y, 0.5));
                    ctx.tracker.update_agent_location(bot.as_ref(), MoveReason::Respawn);
                    reported += 2;
                }
            }
        }
        reported + self.fill(ctx)
    }
}

/// Spawn one tokio task per simulation layer.
pub fn start(ctx: SimContext, layers: Vec<Box<dyn SimulationLayer>>) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::with_capacity(layers.len());
    for layer in layers {
        let ctx = ctx.clone();
        tasks.push(tokio::spawn(async move {
            let name = layer.name();
            let mut interval = tokio::time::interval(layer.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it so the lanes are up first.
            interval.tick().await;

            tracing::info!("Simulation layer '{}' started (interval {:?})", name, layer.interval());

            loop {
                interval.tick().await;
                let reported = layer.step(&ctx);
                tracing::trace!("Simulation '{}': {} samples reported", name, reported);
            }
        }));
    }
    tasks
}
