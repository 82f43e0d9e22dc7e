//! Host configuration: file loading, defaults and command-line overrides.

use std::io::Write;

use region_server::config::{ServerConfig, flag};

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[test]
fn no_file_means_defaults() {
    let config = ServerConfig::load(None).unwrap();
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.main_tick_ms, 50);
    assert!(config.tracker.join_grace);
    assert_eq!(config.tracker.dispatch_budget, None);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "background_tick_ms": 10,
            "tracker": {{ "dispatch_budget": 100, "join_grace": false }},
            "demo": {{ "bots": 5 }}
        }}"#
    )
    .unwrap();

    let config = ServerConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.background_tick_ms, 10);
    assert_eq!(config.main_tick_ms, 50);
    assert_eq!(config.tracker.dispatch_budget, Some(100));
    assert!(!config.tracker.join_grace);
    assert_eq!(config.tracker.max_pending_samples, 64);
    assert_eq!(config.demo.bots, 5);
    assert_eq!(config.demo.region_grid, 4);
}

#[test]
fn missing_file_is_an_error_naming_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.json");
    let err = ServerConfig::load(Some(path.as_path())).unwrap_err();
    assert!(format!("{:#}", err).contains("nope.json"));
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ \"main_tick_ms\": \"fast\" }}").unwrap();
    let err = ServerConfig::load(Some(file.path())).unwrap_err();
    assert!(format!("{:#}", err).contains("parsing config"));
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[test]
fn flag_reads_the_following_value() {
    let a = args(&["server", "--bots", "12", "--seed", "7"]);
    assert_eq!(flag(&a, "--bots"), Some("12"));
    assert_eq!(flag(&a, "--seed"), Some("7"));
    assert_eq!(flag(&a, "--tick-ms"), None);
    assert_eq!(flag(&args(&["server", "--bots"]), "--bots"), None);
}

#[test]
fn overrides_apply_on_top_of_file_values() {
    let mut config = ServerConfig::default();
    config
        .apply_args(&args(&["server", "--bots", "3", "--seed", "99", "--tick-ms", "20"]))
        .unwrap();
    assert_eq!(config.demo.bots, 3);
    assert_eq!(config.demo.seed, 99);
    assert_eq!(config.main_tick_ms, 20);
    assert_eq!(config.background_tick_ms, 50);
}

#[test]
fn bad_override_is_rejected() {
    let mut config = ServerConfig::default();
    let err = config.apply_args(&args(&["server", "--bots", "many"])).unwrap_err();
    assert!(format!("{:#}", err).contains("--bots"));
}

#[test]
fn zero_period_fails_validation() {
    let mut config = ServerConfig::default();
    assert!(config.apply_args(&args(&["server", "--tick-ms", "0"])).is_err());

    let mut config = ServerConfig::default();
    config.demo.worlds = 0;
    assert!(config.validate().is_err());
}

#[test]
fn zero_dispatch_budget_fails_validation() {
    let mut config = ServerConfig::default();
    config.tracker.dispatch_budget = Some(0);
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("dispatch_budget"), "{err}");

    config.tracker.dispatch_budget = Some(1);
    assert!(config.validate().is_ok());
    config.tracker.dispatch_budget = None;
    assert!(config.validate().is_ok());
}
