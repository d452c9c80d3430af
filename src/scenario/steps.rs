//! Steps that call the platform API

use super::{ensure_eq, Step, StepFailure};
use crate::context::SuiteContext;
use async_trait::async_trait;
use std::collections::HashMap;

/// Create the suite's function and expect its name echoed back
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateFunction;

#[async_trait]
impl Step for CreateFunction {
    async fn run(&self, ctx: &SuiteContext) -> Result<(), StepFailure> {
        let request = ctx.identity.creation(ctx.source.code(), ctx.image.as_str());
        let response = ctx.client.create(&ctx.cancel, &request).await?;
        ensure_eq(&ctx.identity.name, &response.result.result)
    }
}

/// Delete the suite's function and expect its name echoed back
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteFunction;

#[async_trait]
impl Step for DeleteFunction {
    async fn run(&self, ctx: &SuiteContext) -> Result<(), StepFailure> {
        let response = ctx
            .client
            .delete(&ctx.cancel, &ctx.identity.deletion())
            .await?;
        ensure_eq(&ctx.identity.name, &response.result.result)
    }
}

/// What an invocation must produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// Any successful response
    Succeeds,
    /// The JSON-encoded result must equal this literal
    Payload(String),
}

impl Expectation {
    /// `{"payload":"Hello <name>!"}`
    pub fn greeting(name: &str) -> Self {
        let expected = serde_json::json!({ "payload": format!("Hello {}!", name) });
        Self::Payload(expected.to_string())
    }
}

/// Invoke the suite's function
#[derive(Debug, Clone)]
pub struct InvokeFunction {
    pub args: Option<HashMap<String, String>>,
    pub expect: Expectation,
}

impl InvokeFunction {
    pub fn new(args: Option<HashMap<String, String>>, expect: Expectation) -> Self {
        Self { args, expect }
    }
}

#[async_trait]
impl Step for InvokeFunction {
    async fn run(&self, ctx: &SuiteContext) -> Result<(), StepFailure> {
        let request = ctx.identity.invocation(self.args.clone());
        let response = ctx.client.invoke(&ctx.cancel, &request).await?;

        match &self.expect {
            Expectation::Succeeds => Ok(()),
            Expectation::Payload(expected) => {
                let result = response.result.result.ok_or(StepFailure::MissingResult)?;
                let actual = serde_json::to_string(&result)?;
                ensure_eq(expected, &actual)
            }
        }
    }
}
