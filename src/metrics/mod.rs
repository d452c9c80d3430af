//! Metrics module
//!
//! Prometheus counters and histograms describing a harness run.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Scenario metrics
    pub static ref STEPS_TOTAL: CounterVec = register_counter_vec!(
        "fl_e2e_steps_total",
        "Scenario steps executed",
        &["scenario", "status"]
    ).unwrap();

    // API client metrics
    pub static ref API_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "fl_e2e_api_requests_total",
        "Requests sent to the platform API",
        &["operation", "status"]
    ).unwrap();

    pub static ref API_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "fl_e2e_api_request_duration_seconds",
        "Platform API round-trip time in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // Deployment metrics
    pub static ref DEPLOY_ACTIONS_TOTAL: CounterVec = register_counter_vec!(
        "fl_e2e_deploy_actions_total",
        "Deployment lifecycle actions",
        &["action", "status"]  // action: acquire, bring_up, tear_down
    ).unwrap();
}

fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

/// Record the outcome of one scenario step
pub fn record_step(scenario: &str, passed: bool) {
    let status = if passed { "passed" } else { "failed" };
    STEPS_TOTAL.with_label_values(&[scenario, status]).inc();
}

/// Record one API round trip
pub fn record_api_request(operation: &str, success: bool, duration_secs: f64) {
    API_REQUESTS_TOTAL
        .with_label_values(&[operation, status_label(success)])
        .inc();
    API_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Record a deployment lifecycle action
pub fn record_deploy_action(action: &str, success: bool) {
    DEPLOY_ACTIONS_TOTAL
        .with_label_values(&[action, status_label(success)])
        .inc();
}

/// Render the default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
