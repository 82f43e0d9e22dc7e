//! The roster as the tracker's agent directory, and the demo host driven
//! synchronously end to end.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use region_engine::{Agent, AgentDirectory, Location, MoveReason, RegionTracker, TrackerConfig, WorldId};
use region_server::config::DemoConfig;
use region_server::lanes;
use region_server::roster::Roster;
use region_server::simulation::{Churn, SimContext, SimulationLayer, Wanderers};
use region_server::zones::{self, ZONE_WORLD, ZoneStats};

fn at(world: u32, x: f64, z: f64) -> Location {
    Location::new(WorldId(world), x, 64.0, z)
}

fn host(demo: DemoConfig) -> (SimContext, Arc<ZoneStats>) {
    let roster = Arc::new(Roster::new());
    let tracker = Arc::new(RegionTracker::new(
        Arc::clone(&roster) as Arc<dyn AgentDirectory>,
        TrackerConfig {
            join_grace: false,
            ..TrackerConfig::default()
        },
    ));
    let stats = Arc::new(ZoneStats::new());
    zones::register_zones(&tracker, &demo, &stats);
    (SimContext { roster, tracker, demo }, stats)
}

fn settle(ctx: &SimContext) {
    lanes::main_tick(&ctx.tracker, &ctx.roster).unwrap();
    ctx.tracker.tick_background();
    lanes::main_tick(&ctx.tracker, &ctx.roster).unwrap();
}

fn assert_balanced(stats: &ZoneStats) {
    assert_eq!(stats.total_occupants(), 0);
    for (zone, counts) in stats.snapshot() {
        assert_eq!(counts.enters, counts.leaves, "{zone}");
    }
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

#[test]
fn agents_in_filters_by_world() {
    let roster = Roster::new();
    let a = roster.register("a", at(0, 1.0, 1.0), false);
    let b = roster.register("b", at(1, 1.0, 1.0), false);

    let overworld: Vec<_> = roster.agents_in(WorldId(0)).iter().map(|x| x.id()).collect();
    assert_eq!(overworld, vec![a.id()]);
    let nether: Vec<_> = roster.agents_in(WorldId(1)).iter().map(|x| x.id()).collect();
    assert_eq!(nether, vec![b.id()]);
    assert!(roster.agents_in(WorldId(2)).is_empty());

    b.set_location(at(0, 5.0, 5.0));
    assert_eq!(roster.agents_in(WorldId(0)).len(), 2);
}

#[test]
fn deregistered_agents_vanish_from_lookups() {
    let roster = Roster::new();
    let a = roster.register("a", at(0, 0.0, 0.0), false);
    assert!(roster.agent(a.id()).is_some());

    let gone = roster.deregister(a.id()).unwrap();
    assert!(gone.location().is_none());
    assert!(roster.agent(a.id()).is_none());
    assert!(roster.agents_in(WorldId(0)).is_empty());
    assert!(roster.deregister(a.id()).is_none());
    assert_eq!(roster.agent_count(), 0);
}

#[test]
fn departed_agents_are_handed_over_once() {
    let roster = Roster::new();
    let a = roster.register("a", at(0, 0.0, 0.0), false);
    let b = roster.register("b", at(0, 0.0, 0.0), false);

    assert!(roster.depart(b.id()));
    assert!(roster.depart(a.id()));
    assert!(!roster.depart(a.id()));
    assert!(roster.agent(a.id()).is_none());

    let departed: Vec<_> = roster.take_departed().iter().map(|x| x.id()).collect();
    assert_eq!(departed, vec![b.id(), a.id()]);
    assert!(roster.take_departed().is_empty());
}

#[test]
fn synthetic_flag_is_reported() {
    let roster = Roster::new();
    let npc = roster.register("npc", at(0, 0.0, 0.0), true);
    assert!(npc.is_synthetic());
    assert_eq!(npc.name(), "npc");
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

#[test]
fn grid_and_plaza_are_registered() {
    let demo = DemoConfig {
        region_grid: 3,
        ..DemoConfig::default()
    };
    let (ctx, _) = host(demo);
    assert_eq!(ctx.tracker.region_count(), 10);
    assert!(ctx.tracker.has_listener_regions(ZONE_WORLD));
    assert!(!ctx.tracker.has_listener_regions(WorldId(1)));

    let names: Vec<_> = ctx
        .tracker
        .regions_at_any(ZONE_WORLD, 0.5, 64.0, 0.5)
        .iter()
        .map(|h| h.key().name.to_string())
        .collect();
    assert!(names.contains(&"plaza".to_string()));
    assert_eq!(names.len(), 2);
}

#[test]
fn walking_into_a_zone_is_counted() {
    let (ctx, stats) = host(DemoConfig::default());
    let bot = ctx.roster.register("walker", at(0, 0.5, 0.5), false);
    ctx.tracker.update_agent_location(bot.as_ref(), MoveReason::JoinServer);
    settle(&ctx);

    let plaza = stats.get("plaza").unwrap();
    assert_eq!(plaza.enters, 1);
    assert_eq!(plaza.occupants, 1);
    assert_eq!(ctx.tracker.agent_regions(bot.id()).len(), 2);

    // Far outside the grid.
    bot.set_location(at(0, 10_000.0, 10_000.0));
    ctx.tracker.update_agent_location(bot.as_ref(), MoveReason::Move);
    settle(&ctx);
    assert_eq!(stats.get("plaza").unwrap().leaves, 1);
    assert_eq!(stats.total_occupants(), 0);
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[test]
fn churn_fills_the_roster() {
    let demo = DemoConfig {
        bots: 12,
        ..DemoConfig::default()
    };
    let (ctx, _) = host(demo.clone());
    let churn = Churn::new(&demo);
    assert_eq!(churn.fill(&ctx), 12);
    assert_eq!(ctx.roster.agent_count(), 12);
    assert_eq!(churn.fill(&ctx), 0);
}

#[test]
fn occupancy_returns_to_zero_after_everyone_quits() {
    let demo = DemoConfig {
        bots: 40,
        churn: 0.05,
        ..DemoConfig::default()
    };
    let (ctx, stats) = host(demo.clone());
    let churn = Churn::new(&demo);
    let wanderers = Wanderers::new(&demo);
    churn.fill(&ctx);

    for _ in 0..100 {
        wanderers.step(&ctx);
        churn.step(&ctx);
        settle(&ctx);
    }
    assert_eq!(ctx.roster.agent_count(), 40);
    assert!(stats.snapshot().values().any(|c| c.enters > 0));

    for bot in ctx.roster.snapshot() {
        ctx.despawn_bot(&bot);
    }
    settle(&ctx);

    assert_balanced(&stats);
    assert_eq!(ctx.tracker.pending_events(), 0);
}

#[test]
fn despawned_bots_leave_on_the_next_main_tick() {
    let (ctx, stats) = host(DemoConfig::default());
    let bot = ctx.roster.register("walker", at(0, 0.5, 0.5), false);
    ctx.tracker.update_agent_location(bot.as_ref(), MoveReason::JoinServer);
    settle(&ctx);
    assert_eq!(stats.get("plaza").unwrap().occupants, 1);

    ctx.despawn_bot(&bot);
    assert!(ctx.roster.agent(bot.id()).is_none());
    assert_eq!(stats.get("plaza").unwrap().leaves, 0);
    assert_eq!(ctx.tracker.agent_regions(bot.id()).len(), 2);

    lanes::main_tick(&ctx.tracker, &ctx.roster).unwrap();
    assert_eq!(stats.get("plaza").unwrap().leaves, 1);
    assert!(ctx.tracker.agent_regions(bot.id()).is_empty());
    assert_balanced(&stats);
}

#[test]
fn churn_running_beside_the_lanes_keeps_zones_balanced() {
    let demo = DemoConfig {
        bots: 24,
        churn: 0.1,
        region_grid: 2,
        region_size: 4,
        ..DemoConfig::default()
    };
    let (ctx, stats) = host(demo.clone());
    let churn = Churn::new(&demo);
    let wanderers = Wanderers::new(&demo);
    churn.fill(&ctx);

    let done = AtomicBool::new(false);
    std::thread::scope(|s| {
        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                lanes::main_tick(&ctx.tracker, &ctx.roster).unwrap();
            }
        });
        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                ctx.tracker.tick_background();
            }
        });
        for _ in 0..300 {
            wanderers.step(&ctx);
            churn.step(&ctx);
        }
        done.store(true, Ordering::Release);
    });

    for bot in ctx.roster.snapshot() {
        ctx.despawn_bot(&bot);
    }
    settle(&ctx);
    assert_balanced(&stats);
    assert_eq!(ctx.tracker.pending_events(), 0);
}

#[test]
fn spawned_bots_stay_inside_the_configured_worlds() {
    let demo = DemoConfig {
        worlds: 3,
        ..DemoConfig::default()
    };
    let (ctx, _) = host(demo);
    let mut rng = StdRng::seed_from_u64(1);
    for i in 0..50 {
        let bot = ctx.spawn_bot(&mut rng, format!("bot-{i}"));
        let loc = bot.location().unwrap();
        assert!(loc.world.0 < 3);
        assert!(loc.x.abs() <= ctx.roam_radius());
    }
}
