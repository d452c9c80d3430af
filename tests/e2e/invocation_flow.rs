//! E2E Invocation Flow Tests
//!
//! The full lifecycle of the `hellojs` function on a live platform:
//!
//! 1. Create the function from `functions/hello.js`
//! 2. Invoke it with `{"name": "Test"}` (twice)
//! 3. Invoke it without arguments
//! 4. Delete it

use super::common::{live_config, live_host};
use fl_e2e::scenario::StepOutcome;
use fl_e2e::scenarios::{INVOCATION_FAILURE, INVOCATION_SUCCESS};
use fl_e2e::suite::{Suite, SuiteOutcome};
use serial_test::serial;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Upper bound for the whole suite, deployment included
const SUITE_TIMEOUT: Duration = Duration::from_secs(300);

#[tokio::test]
#[serial]
async fn test_invocation_success() {
    let config = live_config();
    if live_host(&config).is_none() {
        return;
    }

    let cancel = CancellationToken::new();
    let watchdog = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SUITE_TIMEOUT).await;
            cancel.cancel();
        })
    };

    let report = Suite::from_config(config).run(&cancel).await;
    watchdog.abort();

    assert_eq!(report.outcome, SuiteOutcome::Completed);

    let scenario = report
        .scenario(INVOCATION_SUCCESS)
        .expect("invocation_success ran");
    for step in &scenario.steps {
        assert_eq!(
            step.outcome,
            StepOutcome::Passed,
            "step '{}' failed",
            step.name
        );
    }
    assert_eq!(scenario.steps.len(), 5);
}

/// Placeholder until invocation error paths get their own steps
#[tokio::test]
#[serial]
async fn test_invocation_failure() {
    let config = live_config();
    if live_host(&config).is_none() {
        return;
    }

    let report = Suite::from_config(config)
        .retain_scenarios(&[INVOCATION_FAILURE.to_string()])
        .unwrap()
        .run(&CancellationToken::new())
        .await;

    assert!(report.is_success());
}
