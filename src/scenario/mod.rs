//! Scenario runner
//!
//! A scenario is an ordered list of named steps sharing one [`SuiteContext`].
//! Steps run strictly one after another and each is reported on its own: a
//! failing or panicking step never stops the steps after it.

use crate::client::ApiError;
use crate::context::SuiteContext;
use crate::metrics;
use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use thiserror::Error;
use tracing::Instrument;

pub mod steps;

pub use steps::{CreateFunction, DeleteFunction, Expectation, InvokeFunction};

/// Why a step failed
#[derive(Error, Debug)]
pub enum StepFailure {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Not equal:\n  expected: {expected}\n  actual  : {actual}")]
    Mismatch { expected: String, actual: String },

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Platform returned no result")]
    MissingResult,

    #[error("Step panicked: {0}")]
    Panicked(String),

    #[error("Step cancelled")]
    Cancelled,
}

/// Fail with a literal expected-vs-actual diff unless both sides match
pub fn ensure_eq(expected: &str, actual: &str) -> Result<(), StepFailure> {
    if expected == actual {
        Ok(())
    } else {
        Err(StepFailure::Mismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

/// One unit of a scenario
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, ctx: &SuiteContext) -> Result<(), StepFailure>;
}

struct NamedStep {
    name: String,
    step: Box<dyn Step>,
}

/// Ordered, named steps
pub struct Scenario {
    name: String,
    steps: Vec<NamedStep>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn step(mut self, name: impl Into<String>, step: impl Step + 'static) -> Self {
        self.steps.push(NamedStep {
            name: name.into(),
            step: Box::new(step),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("steps", &self.step_names().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
    pub duration_ms: u64,
}

impl StepReport {
    pub fn passed(&self) -> bool {
        self.outcome == StepOutcome::Passed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    /// An empty scenario counts as passed
    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepReport::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| !s.passed())
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }
}

/// Runs scenarios against a prepared context
pub struct ScenarioRunner;

impl ScenarioRunner {
    pub async fn run(scenario: &Scenario, ctx: &SuiteContext) -> ScenarioReport {
        let span = tracing::info_span!("scenario", scenario = %scenario.name);
        Self::run_steps(scenario, ctx).instrument(span).await
    }

    async fn run_steps(scenario: &Scenario, ctx: &SuiteContext) -> ScenarioReport {
        let mut reports = Vec::with_capacity(scenario.steps.len());

        for named in &scenario.steps {
            let started = Instant::now();

            let outcome = if ctx.cancel.is_cancelled() {
                StepOutcome::Failed(StepFailure::Cancelled.to_string())
            } else {
                match AssertUnwindSafe(named.step.run(ctx)).catch_unwind().await {
                    Ok(Ok(())) => StepOutcome::Passed,
                    Ok(Err(failure)) => StepOutcome::Failed(failure.to_string()),
                    Err(panic) => {
                        StepOutcome::Failed(StepFailure::Panicked(panic_message(panic)).to_string())
                    }
                }
            };

            let duration_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                StepOutcome::Passed => {
                    tracing::info!(step = %named.name, duration_ms, "Step passed")
                }
                StepOutcome::Failed(message) => {
                    tracing::error!(step = %named.name, duration_ms, error = %message, "Step failed")
                }
            }
            metrics::record_step(&scenario.name, outcome == StepOutcome::Passed);

            reports.push(StepReport {
                name: named.name.clone(),
                outcome,
                duration_ms,
            });
        }

        ScenarioReport {
            name: scenario.name.clone(),
            steps: reports,
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
