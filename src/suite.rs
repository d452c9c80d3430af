//! Suite runner
//!
//! Gate, setup, scenarios, teardown. Teardown runs exactly once for every
//! acquired deployment, whatever happened in between.

use crate::client::{FunctionClient, FunctionIdentity};
use crate::config::Config;
use crate::context::SuiteContext;
use crate::deploy::{
    BestEffort, DeployError, Deployer, DeploymentHandle, DockerDeployer, NoopDeployer,
};
use crate::fixture::FunctionSource;
use crate::gate::{EnvironmentGate, GateDecision};
use crate::metrics;
use crate::scenario::{Scenario, ScenarioReport, ScenarioRunner};
use crate::scenarios;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Suite construction errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SuiteError {
    #[error("Unknown scenario(s): {}", .0.join(", "))]
    UnknownScenarios(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SuiteOutcome {
    /// The gate said no; nothing was touched
    Skipped { reason: String },
    /// Setup did not finish; no scenario ran
    SetupFailed { error: String },
    Completed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub outcome: SuiteOutcome,
    pub scenarios: Vec<ScenarioReport>,
    /// `None` when bring-up was never attempted
    pub bring_up: Option<BestEffort>,
    /// `None` when there was nothing to tear down
    pub teardown: Option<BestEffort>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SuiteReport {
    fn new(started_at: DateTime<Utc>, outcome: SuiteOutcome) -> Self {
        Self {
            outcome,
            scenarios: Vec::new(),
            bring_up: None,
            teardown: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Skipped, or completed with every step passing
    pub fn is_success(&self) -> bool {
        match self.outcome {
            SuiteOutcome::Skipped { .. } => true,
            SuiteOutcome::SetupFailed { .. } => false,
            SuiteOutcome::Completed => self.scenarios.iter().all(ScenarioReport::passed),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, SuiteOutcome::Skipped { .. })
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

/// A configured suite ready to run
pub struct Suite {
    config: Config,
    deployer: Box<dyn Deployer>,
    scenarios: Vec<Scenario>,
}

impl Suite {
    /// Suite with the built-in scenarios and the given deployer
    pub fn new(config: Config, deployer: Box<dyn Deployer>) -> Self {
        let scenarios = scenarios::builtin(&config.function);
        Self {
            config,
            deployer,
            scenarios,
        }
    }

    /// Suite whose deployer follows `deploy.enabled`
    pub fn from_config(config: Config) -> Self {
        let deployer: Box<dyn Deployer> = if config.deploy.enabled {
            Box::new(DockerDeployer::new(config.deploy.clone()))
        } else {
            Box::new(NoopDeployer)
        };
        Self::new(config, deployer)
    }

    /// Replace the scenarios to run
    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    /// Keep only the named scenarios, preserving order
    ///
    /// Every name must match a scenario of this suite.
    pub fn retain_scenarios(mut self, names: &[String]) -> Result<Self, SuiteError> {
        let unknown: Vec<String> = names
            .iter()
            .filter(|name| !self.scenarios.iter().any(|s| s.name() == name.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SuiteError::UnknownScenarios(unknown));
        }

        self.scenarios
            .retain(|s| names.iter().any(|name| name.as_str() == s.name()));
        Ok(self)
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub async fn run(&self, cancel: &CancellationToken) -> SuiteReport {
        let span = tracing::info_span!(
            "suite",
            function = %self.config.function.name,
            namespace = %self.config.function.namespace
        );
        self.run_inner(cancel).instrument(span).await
    }

    async fn run_inner(&self, cancel: &CancellationToken) -> SuiteReport {
        let started_at = Utc::now();

        let gate = EnvironmentGate::new(&self.config.gate);
        let host = match gate.check() {
            GateDecision::Run(host) => host,
            GateDecision::Skip(reason) => {
                tracing::warn!(variable = gate.variable(), "Skipping suite: {}", reason);
                return SuiteReport::new(started_at, SuiteOutcome::Skipped { reason });
            }
        };

        let client = match FunctionClient::new(&host, self.config.client.timeout()) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build API client");
                return SuiteReport::new(
                    started_at,
                    SuiteOutcome::SetupFailed {
                        error: e.to_string(),
                    },
                );
            }
        };

        let (source, handle) = tokio::join!(
            FunctionSource::load(&self.config.function.source),
            self.acquire(cancel)
        );

        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                let mut error = format!("Error during deployer creation: {}", e);
                if let Err(fixture) = &source {
                    error = format!("{}; {}", error, fixture);
                }
                tracing::error!(error = %error, "Suite setup failed");
                return SuiteReport::new(started_at, SuiteOutcome::SetupFailed { error });
            }
        };

        let source = match source {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(error = %e, "Suite setup failed");
                let mut report = SuiteReport::new(
                    started_at,
                    SuiteOutcome::SetupFailed {
                        error: e.to_string(),
                    },
                );
                report.teardown = Some(self.tear_down(&handle).await);
                report.finished_at = Utc::now();
                return report;
            }
        };

        let bring_up =
            BestEffort::settle("bring_up", self.deployer.bring_up(cancel, &handle).await);

        // Deployed services are not ready for traffic the moment bring-up returns
        let delay = self.config.deploy.settle_delay();
        tracing::debug!(
            delay_ms = delay.as_millis() as u64,
            "Waiting for platform to settle"
        );
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }

        let ctx = SuiteContext {
            client,
            identity: FunctionIdentity::new(
                self.config.function.name.as_str(),
                self.config.function.namespace.as_str(),
            ),
            source,
            image: self.config.function.image.clone(),
            handle,
            cancel: cancel.clone(),
        };

        let mut reports = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            reports.push(ScenarioRunner::run(scenario, &ctx).await);
        }

        let teardown = self.tear_down(&ctx.handle).await;

        let report = SuiteReport {
            outcome: SuiteOutcome::Completed,
            scenarios: reports,
            bring_up: Some(bring_up),
            teardown: Some(teardown),
            started_at,
            finished_at: Utc::now(),
        };

        tracing::info!(
            success = report.is_success(),
            scenarios = report.scenarios.len(),
            "Suite finished"
        );
        report
    }

    async fn acquire(&self, cancel: &CancellationToken) -> Result<DeploymentHandle, DeployError> {
        let result = self.deployer.acquire(cancel).await;
        metrics::record_deploy_action("acquire", result.is_ok());
        result
    }

    /// Teardown gets its own token so an interrupted run still cleans up
    async fn tear_down(&self, handle: &DeploymentHandle) -> BestEffort {
        let cancel = CancellationToken::new();
        BestEffort::settle("tear_down", self.deployer.tear_down(&cancel, handle).await)
    }
}
