//! Suite Runner Integration Tests
//!
//! Runs the built-in scenarios against a mock platform with a mock deployer.
//!
//! ## Test Coverage
//!
//! - Happy path: create, invoke (args / no args), delete
//! - Skipping when no host is configured
//! - Teardown runs exactly once, even after failed steps
//! - Best-effort bring-up and teardown
//! - Setup failures (fixture, deployer)

mod common;

use common::{
    lifecycle_deployer, mount_greeting, mount_hello_platform, request_count, test_config,
    MockDeployer, FUNCTION_NAME,
};
use fl_e2e::deploy::{BestEffort, DeployError, DeploymentHandle};
use fl_e2e::scenario::StepOutcome;
use fl_e2e::scenarios::{INVOCATION_FAILURE, INVOCATION_SUCCESS};
use fl_e2e::suite::{Suite, SuiteOutcome};
use serde_json::json;
use serial_test::serial;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOST_ENV: &str = "FL_E2E_SUITE_TEST_HOST";

fn point_gate_at(server: &MockServer) {
    std::env::set_var(HOST_ENV, server.uri());
}

#[tokio::test]
#[serial]
async fn test_invocation_success_against_mock_platform() {
    let server = MockServer::start().await;
    mount_hello_platform(&server).await;
    point_gate_at(&server);

    let suite = Suite::new(test_config(HOST_ENV), Box::new(lifecycle_deployer()));
    let report = suite.run(&CancellationToken::new()).await;

    assert_eq!(report.outcome, SuiteOutcome::Completed);
    assert!(report.is_success(), "report: {:#?}", report);
    assert_eq!(report.bring_up, Some(BestEffort::Completed));
    assert_eq!(report.teardown, Some(BestEffort::Completed));

    let scenario = report.scenario(INVOCATION_SUCCESS).unwrap();
    assert_eq!(scenario.steps.len(), 5);
    assert!(scenario.steps.iter().all(|s| s.outcome == StepOutcome::Passed));

    // The placeholder scenario runs and reports nothing
    let placeholder = report.scenario(INVOCATION_FAILURE).unwrap();
    assert!(placeholder.steps.is_empty());
    assert!(placeholder.passed());

    assert_eq!(request_count(&server, "/create").await, 1);
    assert_eq!(request_count(&server, "/invoke").await, 3);
    assert_eq!(request_count(&server, "/delete").await, 1);

    std::env::remove_var(HOST_ENV);
}

#[tokio::test]
#[serial]
async fn test_skips_without_host() {
    let server = MockServer::start().await;
    mount_hello_platform(&server).await;
    std::env::remove_var(HOST_ENV);

    let mut deployer = MockDeployer::new();
    deployer.expect_acquire().times(0);
    deployer.expect_bring_up().times(0);
    deployer.expect_tear_down().times(0);

    let mut config = test_config(HOST_ENV);
    // A skipped suite must not even look at the fixture
    config.function.source = "does/not/exist.js".into();

    let report = Suite::new(config, Box::new(deployer))
        .run(&CancellationToken::new())
        .await;

    assert!(report.is_skipped());
    assert!(report.is_success());
    assert_eq!(
        report.outcome,
        SuiteOutcome::Skipped {
            reason: format!("set {} to run this test", HOST_ENV)
        }
    );
    assert!(report.scenarios.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_teardown_runs_once_after_failed_steps() {
    let server = MockServer::start().await;
    point_gate_at(&server);

    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": FUNCTION_NAME})))
        .mount(&server)
        .await;
    // Wrong greeting for every invocation
    mount_greeting(&server, "Nobody", None).await;
    Mock::given(method("POST"))
        .and(path("/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": FUNCTION_NAME})))
        .mount(&server)
        .await;

    let suite = Suite::new(test_config(HOST_ENV), Box::new(lifecycle_deployer()));
    let report = suite.run(&CancellationToken::new()).await;

    assert!(!report.is_success());
    assert_eq!(report.teardown, Some(BestEffort::Completed));

    let scenario = report.scenario(INVOCATION_SUCCESS).unwrap();
    let outcomes: Vec<bool> = scenario.steps.iter().map(|s| s.passed()).collect();
    assert_eq!(outcomes, vec![true, true, false, false, true]);

    match &scenario.steps[2].outcome {
        StepOutcome::Failed(message) => {
            assert!(message.contains(r#"expected: {"payload":"Hello Test!"}"#));
            assert!(message.contains(r#"actual  : {"payload":"Hello Nobody!"}"#));
        }
        other => panic!("Expected failure, got {:?}", other),
    }

    // Delete still ran after the failures
    assert_eq!(request_count(&server, "/delete").await, 1);

    std::env::remove_var(HOST_ENV);
}

#[tokio::test]
#[serial]
async fn test_api_error_fails_only_that_step() {
    let server = MockServer::start().await;
    point_gate_at(&server);

    Mock::given(method("POST"))
        .and(path("/create"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "worker unavailable"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_hello_platform(&server).await;

    let suite = Suite::new(test_config(HOST_ENV), Box::new(lifecycle_deployer()));
    let report = suite.run(&CancellationToken::new()).await;

    let scenario = report.scenario(INVOCATION_SUCCESS).unwrap();
    match &scenario.steps[0].outcome {
        StepOutcome::Failed(message) => assert!(message.contains("worker unavailable")),
        other => panic!("Expected failure, got {:?}", other),
    }
    assert!(scenario.steps[1..].iter().all(|s| s.passed()));

    std::env::remove_var(HOST_ENV);
}

#[tokio::test]
#[serial]
async fn test_bring_up_failure_is_best_effort() {
    let server = MockServer::start().await;
    mount_hello_platform(&server).await;
    point_gate_at(&server);

    let mut deployer = MockDeployer::new();
    deployer
        .expect_acquire()
        .times(1)
        .returning(|_| Ok(DeploymentHandle::detached()));
    deployer
        .expect_bring_up()
        .times(1)
        .returning(|_, _| Err(DeployError::Cancelled));
    deployer
        .expect_tear_down()
        .times(1)
        .returning(|_, _| Err(DeployError::Cancelled));

    let report = Suite::new(test_config(HOST_ENV), Box::new(deployer))
        .run(&CancellationToken::new())
        .await;

    assert_eq!(report.outcome, SuiteOutcome::Completed);
    assert_eq!(
        report.bring_up,
        Some(BestEffort::Failed("Deployment cancelled".into()))
    );
    assert!(matches!(report.teardown, Some(BestEffort::Failed(_))));
    // Scenarios still ran and passed against the already running platform
    assert!(report.is_success());

    std::env::remove_var(HOST_ENV);
}

#[tokio::test]
#[serial]
async fn test_missing_fixture_fails_setup_but_tears_down() {
    let server = MockServer::start().await;
    mount_hello_platform(&server).await;
    point_gate_at(&server);

    let mut deployer = MockDeployer::new();
    deployer
        .expect_acquire()
        .times(1)
        .returning(|_| Ok(DeploymentHandle::detached()));
    deployer.expect_bring_up().times(0);
    deployer.expect_tear_down().times(1).returning(|_, _| Ok(()));

    let mut config = test_config(HOST_ENV);
    config.function.source = "functions/missing.js".into();

    let report = Suite::new(config, Box::new(deployer))
        .run(&CancellationToken::new())
        .await;

    match &report.outcome {
        SuiteOutcome::SetupFailed { error } => assert!(error.contains("functions/missing.js")),
        other => panic!("Expected SetupFailed, got {:?}", other),
    }
    assert!(!report.is_success());
    assert_eq!(report.bring_up, None);
    assert_eq!(report.teardown, Some(BestEffort::Completed));
    assert!(server.received_requests().await.unwrap().is_empty());

    std::env::remove_var(HOST_ENV);
}

#[tokio::test]
#[serial]
async fn test_acquire_failure_skips_teardown() {
    let server = MockServer::start().await;
    point_gate_at(&server);

    let mut deployer = MockDeployer::new();
    deployer.expect_acquire().times(1).returning(|_| {
        Err(DeployError::CommandFailed {
            command: "docker version".into(),
            status: "exit status: 1".into(),
            stderr: "Cannot connect to the Docker daemon".into(),
        })
    });
    deployer.expect_bring_up().times(0);
    deployer.expect_tear_down().times(0);

    let report = Suite::new(test_config(HOST_ENV), Box::new(deployer))
        .run(&CancellationToken::new())
        .await;

    match &report.outcome {
        SuiteOutcome::SetupFailed { error } => {
            assert!(error.contains("Cannot connect to the Docker daemon"))
        }
        other => panic!("Expected SetupFailed, got {:?}", other),
    }
    assert_eq!(report.teardown, None);

    std::env::remove_var(HOST_ENV);
}

#[tokio::test]
#[serial]
async fn test_cancelled_run_still_tears_down() {
    let server = MockServer::start().await;
    mount_hello_platform(&server).await;
    point_gate_at(&server);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let mut deployer = MockDeployer::new();
    deployer
        .expect_acquire()
        .times(1)
        .returning(|_| Ok(DeploymentHandle::detached()));
    deployer.expect_bring_up().times(1).returning(move |_, _| {
        // Interrupt arrives while the platform is coming up
        trigger.cancel();
        Ok(())
    });
    deployer
        .expect_tear_down()
        .times(1)
        .withf(|cancel, _| !cancel.is_cancelled())
        .returning(|_, _| Ok(()));

    let report = Suite::new(test_config(HOST_ENV), Box::new(deployer))
        .run(&cancel)
        .await;

    let scenario = report.scenario(INVOCATION_SUCCESS).unwrap();
    assert!(scenario
        .steps
        .iter()
        .all(|s| s.outcome == StepOutcome::Failed("Step cancelled".into())));
    assert_eq!(report.teardown, Some(BestEffort::Completed));
    assert!(server.received_requests().await.unwrap().is_empty());

    std::env::remove_var(HOST_ENV);
}
