//! Environment gate
//!
//! Decides whether a suite runs at all. The decision depends on one
//! environment variable holding the platform address; when it is missing the
//! suite is reported as skipped instead of failed.

use crate::config::GateConfig;

/// Outcome of evaluating the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Run against this host
    Run(String),
    /// Do not run; the reason is meant for the test log
    Skip(String),
}

/// Reads the host variable named in [`GateConfig`]
#[derive(Debug, Clone)]
pub struct EnvironmentGate {
    host_env: String,
}

impl EnvironmentGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            host_env: config.host_env.clone(),
        }
    }

    /// Name of the variable this gate reads
    pub fn variable(&self) -> &str {
        &self.host_env
    }

    /// Evaluate against the process environment
    pub fn check(&self) -> GateDecision {
        self.evaluate(std::env::var(&self.host_env).ok())
    }

    /// Evaluate against an explicit value
    pub fn evaluate(&self, value: Option<String>) -> GateDecision {
        match value {
            Some(host) if !host.trim().is_empty() => GateDecision::Run(host.trim().to_string()),
            _ => GateDecision::Skip(format!("set {} to run this test", self.host_env)),
        }
    }
}

/// Turn a configured host into a base URL.
///
/// Hosts may come without a scheme (`localhost:4000`); those get `http://`.
pub fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
