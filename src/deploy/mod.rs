//! Deployment lifecycle
//!
//! Brings a disposable platform instance up before a suite and tears it down
//! afterwards. Bring-up and teardown are best-effort: their failures are
//! logged and recorded, never propagated, because the environment is thrown
//! away at the end of the run anyway.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub mod docker;

pub use docker::DockerDeployer;

use crate::metrics;

/// Deployment errors
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to spawn {program}: {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Deployment cancelled")]
    Cancelled,
}

/// Reference to a provisioned platform instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentHandle {
    pub run_id: Uuid,
    /// Docker network the containers are attached to; empty when unused
    pub network: String,
    pub containers: Vec<String>,
}

impl DeploymentHandle {
    /// Handle for an environment that owns no resources
    pub fn detached() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            network: String::new(),
            containers: Vec::new(),
        }
    }
}

/// Deploy/destroy capability used by the suite runner
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Check the deployer is usable and reserve a handle
    async fn acquire(&self, cancel: &CancellationToken) -> Result<DeploymentHandle, DeployError>;

    /// Start the platform described by `handle`
    async fn bring_up(
        &self,
        cancel: &CancellationToken,
        handle: &DeploymentHandle,
    ) -> Result<(), DeployError>;

    /// Remove everything `bring_up` created
    async fn tear_down(
        &self,
        cancel: &CancellationToken,
        handle: &DeploymentHandle,
    ) -> Result<(), DeployError>;
}

/// Deployer for an already running platform
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDeployer;

#[async_trait]
impl Deployer for NoopDeployer {
    async fn acquire(&self, _cancel: &CancellationToken) -> Result<DeploymentHandle, DeployError> {
        Ok(DeploymentHandle::detached())
    }

    async fn bring_up(
        &self,
        _cancel: &CancellationToken,
        _handle: &DeploymentHandle,
    ) -> Result<(), DeployError> {
        Ok(())
    }

    async fn tear_down(
        &self,
        _cancel: &CancellationToken,
        _handle: &DeploymentHandle,
    ) -> Result<(), DeployError> {
        Ok(())
    }
}

/// Outcome of a lifecycle call whose failure must not stop the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum BestEffort {
    Completed,
    Failed(String),
}

impl BestEffort {
    /// Log and record `result` without propagating it
    pub fn settle(action: &str, result: Result<(), DeployError>) -> Self {
        match result {
            Ok(()) => {
                metrics::record_deploy_action(action, true);
                tracing::info!(action, "Deployment action completed");
                Self::Completed
            }
            Err(e) => {
                metrics::record_deploy_action(action, false);
                tracing::warn!(action, error = %e, "Deployment action failed, continuing");
                Self::Failed(e.to_string())
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}
