//! Common E2E Test Infrastructure

use fl_e2e::config::Config;
use fl_e2e::gate::{EnvironmentGate, GateDecision};
use std::sync::Once;

static LOGGING: Once = Once::new();

/// Configuration for live runs
///
/// `FL_E2E_DEPLOY=false` reuses an already running platform instead of
/// deploying one through Docker.
pub fn live_config() -> Config {
    LOGGING.call_once(|| {
        let _ = fl_e2e::logging::init_subscriber("info", false);
    });

    let mut config = Config::default();
    if let Ok(deploy) = std::env::var("FL_E2E_DEPLOY") {
        config.deploy.enabled = deploy != "false" && deploy != "0";
    }
    config
}

/// Host to test against, or `None` when the suite should skip
pub fn live_host(config: &Config) -> Option<String> {
    match EnvironmentGate::new(&config.gate).check() {
        GateDecision::Run(host) => Some(host),
        GateDecision::Skip(reason) => {
            eprintln!("Skipping: {}", reason);
            None
        }
    }
}
