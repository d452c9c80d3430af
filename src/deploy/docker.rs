//! Docker CLI deployer
//!
//! Provisions a core and a worker container on a private network by shelling
//! out to the `docker` binary. Every command is killed when the cancellation
//! token fires.

use super::{DeployError, Deployer, DeploymentHandle};
use crate::config::DeployConfig;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

const DOCKER_SOCKET: &str = "/var/run/docker.sock";
const RUN_LABEL: &str = "fl-e2e.run";

#[derive(Debug, Clone)]
pub struct DockerDeployer {
    config: DeployConfig,
}

impl DockerDeployer {
    pub fn new(config: DeployConfig) -> Self {
        Self { config }
    }

    /// Commands `bring_up` runs, in order
    pub fn bring_up_commands(&self, handle: &DeploymentHandle) -> Vec<Vec<String>> {
        let label = format!("{}={}", RUN_LABEL, handle.run_id);
        let port = format!("{0}:{0}", self.config.core_port);
        let socket = format!("{0}:{0}", DOCKER_SOCKET);

        vec![
            args(&["network", "create", &handle.network]),
            args(&["pull", &self.config.core_image]),
            args(&["pull", &self.config.worker_image]),
            args(&[
                "run",
                "-d",
                "--name",
                &self.config.core_container,
                "--network",
                &handle.network,
                "--label",
                &label,
                "-p",
                &port,
                &self.config.core_image,
            ]),
            args(&[
                "run",
                "-d",
                "--name",
                &self.config.worker_container,
                "--network",
                &handle.network,
                "--label",
                &label,
                "-v",
                &socket,
                &self.config.worker_image,
            ]),
        ]
    }

    /// `ps` filter matching the containers started for `handle`
    pub fn run_filter(&self, handle: &DeploymentHandle) -> String {
        format!("label={}={}", RUN_LABEL, handle.run_id)
    }

    /// Commands that clear resources left behind by an earlier run
    ///
    /// A killed run never tears down, and the fixed names would make the
    /// next `network create` or `run --name` fail.
    pub fn stale_cleanup_commands(&self) -> Vec<Vec<String>> {
        vec![
            args(&[
                "rm",
                "-f",
                &self.config.core_container,
                &self.config.worker_container,
            ]),
            args(&["network", "rm", &self.config.network]),
        ]
    }

    /// Commands `tear_down` runs once the run's containers are known
    pub fn tear_down_commands(
        &self,
        handle: &DeploymentHandle,
        container_ids: &[String],
    ) -> Vec<Vec<String>> {
        let mut commands = Vec::new();
        if !container_ids.is_empty() {
            let mut rm = args(&["rm", "-f"]);
            rm.extend(container_ids.iter().cloned());
            commands.push(rm);
        }
        if !handle.network.is_empty() {
            commands.push(args(&["network", "rm", &handle.network]));
        }
        commands
    }

    /// Ids of the containers labelled with this run
    async fn run_containers(
        &self,
        cancel: &CancellationToken,
        handle: &DeploymentHandle,
    ) -> Result<Vec<String>, DeployError> {
        if handle.containers.is_empty() {
            return Ok(Vec::new());
        }
        let filter = self.run_filter(handle);
        let output = self
            .docker(cancel, &args(&["ps", "-aq", "--filter", &filter]))
            .await?;
        Ok(output.split_whitespace().map(str::to_string).collect())
    }

    async fn docker(
        &self,
        cancel: &CancellationToken,
        args: &[String],
    ) -> Result<String, DeployError> {
        let program = &self.config.docker_bin;
        tracing::debug!(program = %program, args = ?args, "Running docker command");

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DeployError::Cancelled),
            output = command.output() => output.map_err(|source| DeployError::SpawnError {
                program: program.clone(),
                source,
            })?,
        };

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl Deployer for DockerDeployer {
    async fn acquire(&self, cancel: &CancellationToken) -> Result<DeploymentHandle, DeployError> {
        let version = self
            .docker(
                cancel,
                &args(&["version", "--format", "{{.Server.Version}}"]),
            )
            .await?;

        let handle = DeploymentHandle {
            run_id: Uuid::new_v4(),
            network: self.config.network.clone(),
            containers: vec![
                self.config.core_container.clone(),
                self.config.worker_container.clone(),
            ],
        };

        tracing::info!(
            run_id = %handle.run_id,
            docker_version = %version,
            network = %handle.network,
            "Acquired docker deployer"
        );
        Ok(handle)
    }

    async fn bring_up(
        &self,
        cancel: &CancellationToken,
        handle: &DeploymentHandle,
    ) -> Result<(), DeployError> {
        tracing::info!(run_id = %handle.run_id, "Deploying local platform");
        for command in self.stale_cleanup_commands() {
            // Nothing to clear is the common case
            if let Err(e) = self.docker(cancel, &command).await {
                if matches!(e, DeployError::Cancelled) {
                    return Err(e);
                }
                tracing::debug!(error = %e, "No stale resources removed");
            }
        }
        for command in self.bring_up_commands(handle) {
            self.docker(cancel, &command).await?;
        }
        Ok(())
    }

    async fn tear_down(
        &self,
        cancel: &CancellationToken,
        handle: &DeploymentHandle,
    ) -> Result<(), DeployError> {
        tracing::info!(run_id = %handle.run_id, "Destroying local platform");

        // Keep going after a failure so a half-created environment is still removed
        let mut first_error = None;
        let container_ids = match self.run_containers(cancel, handle).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::debug!(error = %e, "Listing run containers failed, removing by name");
                first_error = Some(e);
                handle.containers.clone()
            }
        };
        tracing::debug!(containers = container_ids.len(), "Removing run containers");

        for command in self.tear_down_commands(handle, &container_ids) {
            if let Err(e) = self.docker(cancel, &command).await {
                tracing::debug!(error = %e, "Teardown command failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
