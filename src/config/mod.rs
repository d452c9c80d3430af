//! Configuration module for fl-e2e
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation. Every field has a default,
//! so an empty file (or no file at all) runs the stock `hellojs` scenario.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("static pattern is valid");
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let var_name = &cap[1];

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub function: FunctionConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Load from `path` when given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gate.host_env.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "gate.host_env cannot be empty".into(),
            ));
        }

        let function = &self.function;
        for (field, value) in [
            ("function.name", &function.name),
            ("function.namespace", &function.namespace),
            ("function.image", &function.image),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }
        if function.source.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "function.source cannot be empty".into(),
            ));
        }

        if self.client.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "client.timeout_seconds must be greater than zero".into(),
            ));
        }

        if self.deploy.enabled {
            for (field, value) in [
                ("deploy.docker_bin", &self.deploy.docker_bin),
                ("deploy.network", &self.deploy.network),
                ("deploy.core_image", &self.deploy.core_image),
                ("deploy.worker_image", &self.deploy.worker_image),
                ("deploy.core_container", &self.deploy.core_container),
                ("deploy.worker_container", &self.deploy.worker_container),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::ValidationError(format!(
                        "{} cannot be empty when deploy is enabled",
                        field
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Environment gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Name of the variable holding the platform address
    #[serde(default = "default_host_env")]
    pub host_env: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            host_env: default_host_env(),
        }
    }
}

fn default_host_env() -> String {
    "FL_TEST_HOST".to_string()
}

/// The function under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionConfig {
    #[serde(default = "default_function_name")]
    pub name: String,
    #[serde(default = "default_function_namespace")]
    pub namespace: String,
    /// Runtime image tag understood by the platform (e.g. "nodejs")
    #[serde(default = "default_function_image")]
    pub image: String,
    /// Path of the function source, relative to the working directory
    #[serde(default = "default_function_source")]
    pub source: PathBuf,
    #[serde(default = "default_function_args")]
    pub args: HashMap<String, String>,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            name: default_function_name(),
            namespace: default_function_namespace(),
            image: default_function_image(),
            source: default_function_source(),
            args: default_function_args(),
        }
    }
}

fn default_function_name() -> String {
    "hellojs".to_string()
}

fn default_function_namespace() -> String {
    "helloNS".to_string()
}

fn default_function_image() -> String {
    "nodejs".to_string()
}

fn default_function_source() -> PathBuf {
    PathBuf::from("functions/hello.js")
}

fn default_function_args() -> HashMap<String, String> {
    HashMap::from([("name".to_string(), "Test".to_string())])
}

/// Local deployment configuration
///
/// # Example
///
/// ```yaml
/// deploy:
///   enabled: true
///   docker_bin: "${DOCKER_BIN:-docker}"
///   core_port: 4000
///   settle_delay_ms: 1000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Provision a local platform through Docker. Default: true
    #[serde(default = "default_deploy_enabled")]
    pub enabled: bool,
    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default = "default_core_image")]
    pub core_image: String,
    #[serde(default = "default_worker_image")]
    pub worker_image: String,
    #[serde(default = "default_core_container")]
    pub core_container: String,
    #[serde(default = "default_worker_container")]
    pub worker_container: String,
    #[serde(default = "default_core_port")]
    pub core_port: u16,
    /// Wait after bring-up before the first API call. Default: 1000
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl DeployConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            enabled: default_deploy_enabled(),
            docker_bin: default_docker_bin(),
            network: default_network(),
            core_image: default_core_image(),
            worker_image: default_worker_image(),
            core_container: default_core_container(),
            worker_container: default_worker_container(),
            core_port: default_core_port(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

fn default_deploy_enabled() -> bool {
    true
}

fn default_docker_bin() -> String {
    "docker".to_string()
}

fn default_network() -> String {
    "fl-e2e-net".to_string()
}

fn default_core_image() -> String {
    "ghcr.io/funlessdev/fl-core:latest".to_string()
}

fn default_worker_image() -> String {
    "ghcr.io/funlessdev/fl-worker:latest".to_string()
}

fn default_core_container() -> String {
    "fl-e2e-core".to_string()
}

fn default_worker_container() -> String {
    "fl-e2e-worker".to_string()
}

fn default_core_port() -> u16 {
    4000
}

fn default_settle_delay_ms() -> u64 {
    1000
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-request timeout in seconds. Default: 30
    #[serde(default = "default_client_timeout")]
    pub timeout_seconds: u64,
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_client_timeout(),
        }
    }
}

fn default_client_timeout() -> u64 {
    30
}
