//! End-to-End Tests for fl-e2e
//!
//! - `invocation_flow`: create, invoke, delete against a live platform

pub mod common;
pub mod invocation_flow;
