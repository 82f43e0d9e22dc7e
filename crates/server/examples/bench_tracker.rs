//! Benchmark: tracker throughput with many agents over a dense region grid.
//!
//! Every round moves every agent once, then runs one main tick, one
//! background tick and one more main tick to flush the events.
//! Run with: `cargo run --release -p region-server --example bench_tracker`

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use region_engine::{Agent, AgentDirectory, Location, MoveReason, RegionTracker, TrackerConfig};
use region_server::config::DemoConfig;
use region_server::roster::Roster;
use region_server::zones::{self, ZONE_WORLD, ZoneStats};

fn main() {
    let agents = 2_000;
    let rounds = 200;
    let demo = DemoConfig {
        bots: agents,
        region_grid: 16,
        region_size: 16,
        ..DemoConfig::default()
    };
    let half = zones::grid_extent(&demo) as f64 / 2.0;

    println!("=== Region tracker benchmark ===\n");
    println!(
        "  {} agents, {}x{} zones of {} blocks, {} rounds\n",
        agents, demo.region_grid, demo.region_grid, demo.region_size, rounds
    );

    let roster = Arc::new(Roster::new());
    let tracker = RegionTracker::new(
        Arc::clone(&roster) as Arc<dyn AgentDirectory>,
        TrackerConfig::default(),
    );
    let stats = Arc::new(ZoneStats::new());
    zones::register_zones(&tracker, &demo, &stats);

    let mut rng = StdRng::seed_from_u64(demo.seed);
    for i in 0..agents {
        let at = Location::new(ZONE_WORLD, rng.gen_range(-half..half), 64.0, rng.gen_range(-half..half));
        let bot = roster.register(format!("bot-{i}"), at, false);
        tracker.update_agent_location(bot.as_ref(), MoveReason::JoinServer);
    }

    let bots = roster.snapshot();
    let mut t_sample = Duration::ZERO;
    let mut t_main = Duration::ZERO;
    let mut t_background = Duration::ZERO;
    let mut dispatched = 0;

    for _ in 0..rounds {
        let t0 = Instant::now();
        for bot in &bots {
            let Some(here) = bot.location() else { continue };
            let x = (here.x + rng.gen_range(-2.0..2.0)).clamp(-half, half);
            let z = (here.z + rng.gen_range(-2.0..2.0)).clamp(-half, half);
            bot.set_location(Location::new(here.world, x, here.y, z));
            tracker.update_agent_location(bot.as_ref(), MoveReason::Move);
        }
        t_sample += t0.elapsed();

        let t0 = Instant::now();
        dispatched += tracker.tick_main().map(|r| r.dispatched).unwrap_or(0);
        t_main += t0.elapsed();

        let t0 = Instant::now();
        tracker.tick_background();
        t_background += t0.elapsed();
    }
    dispatched += tracker.tick_main().map(|r| r.dispatched).unwrap_or(0);

    let samples = (agents * rounds) as f64;
    println!("  Sampling:   {:>10.2?} ({:.0} ns/sample)", t_sample, t_sample.as_nanos() as f64 / samples);
    println!("  Main lane:  {:>10.2?} ({:.2?}/tick)", t_main, t_main / rounds as u32);
    println!("  Background: {:>10.2?} ({:.2?}/cycle)", t_background, t_background / rounds as u32);
    println!("  Callbacks:  {:>10}", dispatched);
    println!("  Occupants:  {:>10}", stats.total_occupants());

    let m = tracker.metrics().snapshot();
    println!(
        "\n  {} batches harvested, {} sampler ticks skipped, {} cycles",
        m.batches_harvested, m.sampler_ticks_skipped, m.cycles_completed
    );
}
