//! Host configuration: an optional JSON file, then command-line overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use region_engine::TrackerConfig;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Main lane period (dispatch + sampling).
    pub main_tick_ms: u64,
    /// Background lane period (diffing).
    pub background_tick_ms: u64,
    /// How often tracker metrics are logged. 0 disables.
    pub metrics_interval_secs: u64,
    pub tracker: TrackerConfig,
    pub demo: DemoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            main_tick_ms: 50,
            background_tick_ms: 50,
            metrics_interval_secs: 30,
            tracker: TrackerConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

/// The built-in movement simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Wandering agents kept alive at any time.
    pub bots: usize,
    /// Worlds the bots are spread over. Only world 0 gets regions.
    pub worlds: u32,
    /// Side length, in regions, of the square region grid around the origin.
    pub region_grid: u32,
    /// Side length of each grid region, in blocks.
    pub region_size: i64,
    pub seed: u64,
    /// How often the bots move.
    pub step_ms: u64,
    /// Chance per step that a given bot quits and is replaced.
    pub churn: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            bots: 32,
            worlds: 2,
            region_grid: 4,
            region_size: 24,
            seed: 0x5eed,
            step_ms: 50,
            churn: 0.002,
        }
    }
}

impl ServerConfig {
    /// Read a config file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply `--bots`, `--seed`, `--tick-ms` and `--background-tick-ms`.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(v) = flag(args, "--bots") {
            self.demo.bots = v.parse().with_context(|| format!("--bots {v}"))?;
        }
        if let Some(v) = flag(args, "--seed") {
            self.demo.seed = v.parse().with_context(|| format!("--seed {v}"))?;
        }
        if let Some(v) = flag(args, "--tick-ms") {
            self.main_tick_ms = v.parse().with_context(|| format!("--tick-ms {v}"))?;
        }
        if let Some(v) = flag(args, "--background-tick-ms") {
            self.background_tick_ms = v
                .parse()
                .with_context(|| format!("--background-tick-ms {v}"))?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.main_tick_ms == 0 || self.background_tick_ms == 0 {
            bail!("lane periods must be at least 1 ms");
        }
        if self.tracker.dispatch_budget == Some(0) {
            bail!("tracker.dispatch_budget must be at least 1 (or absent to drain fully)");
        }
        if self.demo.step_ms == 0 {
            bail!("demo.step_ms must be at least 1 ms");
        }
        if self.demo.worlds == 0 {
            bail!("demo.worlds must be at least 1");
        }
        if self.demo.region_size <= 0 {
            bail!("demo.region_size must be positive");
        }
        if !(0.0..=1.0).contains(&self.demo.churn) {
            bail!("demo.churn must be within 0..=1");
        }
        Ok(())
    }

    pub fn main_tick(&self) -> Duration {
        Duration::from_millis(self.main_tick_ms)
    }

    pub fn background_tick(&self) -> Duration {
        Duration::from_millis(self.background_tick_ms)
    }
}

/// The value following `name` on the command line, if present.
pub fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .skip_while(|a| *a != name)
        .nth(1)
        .map(String::as_str)
}
