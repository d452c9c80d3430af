//! Shared test infrastructure
//!
//! - Mock FunLess platform (wiremock) that greets like `functions/hello.js`
//! - Mock deployer (mockall)
//! - Test configuration

#![allow(dead_code)]

use async_trait::async_trait;
use fl_e2e::config::Config;
use fl_e2e::deploy::{DeployError, Deployer, DeploymentHandle};
use mockall::mock;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FUNCTION_NAME: &str = "hellojs";
pub const FUNCTION_NAMESPACE: &str = "helloNS";

mock! {
    pub Deployer {}

    #[async_trait]
    impl Deployer for Deployer {
        async fn acquire(&self, cancel: &CancellationToken) -> Result<DeploymentHandle, DeployError>;
        async fn bring_up(
            &self,
            cancel: &CancellationToken,
            handle: &DeploymentHandle,
        ) -> Result<(), DeployError>;
        async fn tear_down(
            &self,
            cancel: &CancellationToken,
            handle: &DeploymentHandle,
        ) -> Result<(), DeployError>;
    }
}

/// Deployer expecting one full lifecycle
pub fn lifecycle_deployer() -> MockDeployer {
    let mut deployer = MockDeployer::new();
    deployer
        .expect_acquire()
        .times(1)
        .returning(|_| Ok(DeploymentHandle::detached()));
    deployer.expect_bring_up().times(1).returning(|_, _| Ok(()));
    deployer.expect_tear_down().times(1).returning(|_, _| Ok(()));
    deployer
}

/// Configuration that reads the host from `host_env` and never sleeps
pub fn test_config(host_env: &str) -> Config {
    let mut config = Config::default();
    config.gate.host_env = host_env.to_string();
    config.deploy.settle_delay_ms = 0;
    config.client.timeout_seconds = 5;
    config
}

/// Mount create/invoke/delete endpoints behaving like the hello function
pub async fn mount_hello_platform(server: &MockServer) {
    let code = std::fs::read_to_string("functions/hello.js").expect("fixture present");

    Mock::given(method("POST"))
        .and(path("/create"))
        .and(body_partial_json(json!({
            "name": FUNCTION_NAME,
            "namespace": FUNCTION_NAMESPACE,
            "image": "nodejs",
            "code": code
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": FUNCTION_NAME
        })))
        .named("create")
        .mount(server)
        .await;

    mount_greeting(server, "Test", Some("Test")).await;
    mount_greeting(server, "World", None).await;

    Mock::given(method("POST"))
        .and(path("/delete"))
        .and(body_partial_json(json!({
            "name": FUNCTION_NAME,
            "namespace": FUNCTION_NAMESPACE
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": FUNCTION_NAME
        })))
        .named("delete")
        .mount(server)
        .await;
}

/// Greeting for invocations carrying `args.name`, or the no-args fallback
pub async fn mount_greeting(server: &MockServer, greeted: &str, arg_name: Option<&str>) {
    let body = json!({"result": {"payload": format!("Hello {}!", greeted)}});

    let (mock, priority) = match arg_name {
        Some(name) => (
            Mock::given(method("POST"))
                .and(path("/invoke"))
                .and(body_partial_json(json!({"args": {"name": name}}))),
            1,
        ),
        None => (Mock::given(method("POST")).and(path("/invoke")), 2),
    };

    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .with_priority(priority)
        .mount(server)
        .await;
}

/// Number of requests the mock server saw on `route`
pub async fn request_count(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}
