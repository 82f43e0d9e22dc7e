use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use region_engine::{Agent, AgentDirectory, RegionTracker};
use region_server::config::{ServerConfig, flag};
use region_server::lanes;
use region_server::roster::Roster;
use region_server::simulation::{self, Churn, SimContext, SimulationLayer, Wanderers};
use region_server::zones::{self, ZoneStats};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = flag(&args, "--config").map(PathBuf::from);
    let mut config = ServerConfig::load(config_path.as_deref())?;
    config.apply_args(&args)?;

    tracing::info!("Region tracker host");
    tracing::info!(
        "{} bots over {} worlds, seed {}, main tick {:?}, background tick {:?}",
        config.demo.bots,
        config.demo.worlds,
        config.demo.seed,
        config.main_tick(),
        config.background_tick()
    );

    // ── Tracker, regions, agents ─────────────────────────────────────────
    let roster = Arc::new(Roster::new());
    let tracker = Arc::new(RegionTracker::new(
        Arc::clone(&roster) as Arc<dyn AgentDirectory>,
        config.tracker.clone(),
    ));
    let stats = Arc::new(ZoneStats::new());
    zones::register_zones(&tracker, &config.demo, &stats);

    let ctx = SimContext {
        roster: Arc::clone(&roster),
        tracker: Arc::clone(&tracker),
        demo: config.demo.clone(),
    };
    let churn = Churn::new(&config.demo);
    churn.fill(&ctx);
    tracing::info!("Spawned {} bots", roster.agent_count());

    // ── Lanes ────────────────────────────────────────────────────────────
    let mut main_lane =
        lanes::spawn_main(Arc::clone(&tracker), Arc::clone(&roster), config.main_tick());
    let mut background_lane = lanes::spawn_background(Arc::clone(&tracker), config.background_tick());
    if config.metrics_interval_secs > 0 {
        lanes::spawn_metrics_reporter(
            Arc::clone(&tracker),
            Duration::from_secs(config.metrics_interval_secs),
        );
    }

    let layers: Vec<Box<dyn SimulationLayer>> =
        vec![Box::new(Wanderers::new(&config.demo)), Box::new(churn)];
    let sim_tasks = simulation::start(ctx, layers);

    tokio::select! {
        _ = &mut main_lane => tracing::error!("Main lane exited"),
        _ = &mut background_lane => tracing::error!("Background lane exited"),
        _ = tokio::signal::ctrl_c() => tracing::info!("Ctrl+C received, shutting down..."),
    }

    // ── Disconnect everyone so every listener sees its leaves ────────────
    for task in sim_tasks {
        task.abort();
    }
    main_lane.abort();
    background_lane.abort();
    let bots = roster.snapshot();
    for bot in &bots {
        roster.depart(bot.id());
    }
    if let Err(e) = lanes::main_tick(&tracker, &roster) {
        tracing::error!("Final main tick failed: {}", e);
    }
    tracing::info!(
        "Disconnected {} bots, {} still inside a zone",
        bots.len(),
        stats.total_occupants()
    );
    for (zone, counts) in stats.snapshot() {
        tracing::info!("{}: {} enters, {} leaves", zone, counts.enters, counts.leaves);
    }
    lanes::log_metrics(&tracker);
    Ok(())
}
