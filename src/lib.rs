//! fl-e2e Library
//!
//! End-to-end scenario harness for FunLess-style function platforms.
//!
//! # Features
//!
//! - **Environment Gate**: Suites skip cleanly when no platform host is set
//! - **Disposable Deployments**: Brings a local platform up through the Docker CLI
//! - **Typed Client**: create, invoke, delete and list over JSON/HTTP
//! - **Isolated Steps**: A failing step never hides the steps after it
//!
//! # Example
//!
//! ```no_run
//! use fl_e2e::{config::Config, suite::Suite};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("fl-e2e.yaml")?;
//!     let report = Suite::from_config(config).run(&CancellationToken::new()).await;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod deploy;
pub mod fixture;
pub mod gate;
pub mod logging;
pub mod metrics;
pub mod scenario;
pub mod scenarios;
pub mod suite;

// Re-export commonly used types
pub use config::Config;
pub use suite::{Suite, SuiteError, SuiteReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
