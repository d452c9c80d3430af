//! Shared suite state
//!
//! Built once during setup and handed to every step by reference. Nothing in
//! here changes after setup.

use crate::client::{FunctionClient, FunctionIdentity};
use crate::deploy::DeploymentHandle;
use crate::fixture::FunctionSource;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SuiteContext {
    pub client: FunctionClient,
    pub identity: FunctionIdentity,
    pub source: FunctionSource,
    /// Runtime image tag sent on creation
    pub image: String,
    pub handle: DeploymentHandle,
    pub cancel: CancellationToken,
}
