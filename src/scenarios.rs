//! Built-in scenarios

use crate::config::FunctionConfig;
use crate::scenario::{CreateFunction, DeleteFunction, Expectation, InvokeFunction, Scenario};

pub const INVOCATION_SUCCESS: &str = "invocation_success";
pub const INVOCATION_FAILURE: &str = "invocation_failure";

/// Default argument the platform substitutes when `name` is missing
const DEFAULT_GREETING_NAME: &str = "World";

/// Create, invoke three times, delete
pub fn invocation_success(function: &FunctionConfig) -> Scenario {
    let args = function.args.clone();
    let name = args.get("name").cloned().unwrap_or_default();

    Scenario::new(INVOCATION_SUCCESS)
        .step("should successfully create function", CreateFunction)
        .step(
            "should return no error when invoking an existing function",
            InvokeFunction::new(Some(args.clone()), Expectation::Succeeds),
        )
        .step(
            "should return the correct result when invoking hellojs with args",
            InvokeFunction::new(Some(args), Expectation::greeting(&name)),
        )
        .step(
            "should return the correct result when invoking hellojs with no args",
            InvokeFunction::new(None, Expectation::greeting(DEFAULT_GREETING_NAME)),
        )
        .step("should successfully delete function", DeleteFunction)
}

/// Placeholder for invocation error paths; intentionally has no steps yet
pub fn invocation_failure() -> Scenario {
    Scenario::new(INVOCATION_FAILURE)
}

/// Every built-in scenario, in run order
pub fn builtin(function: &FunctionConfig) -> Vec<Scenario> {
    vec![invocation_success(function), invocation_failure()]
}
