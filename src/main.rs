//! fl-e2e - End-to-end scenario runner for FunLess-style function platforms
//!
//! Deploys a local platform, runs the built-in scenarios and tears it down.

use anyhow::Context;
use clap::Parser;
use fl_e2e::{config::Config, logging, metrics, suite::Suite, SuiteReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// fl-e2e - Run end-to-end scenarios against a function platform
#[derive(Parser, Debug)]
#[command(name = "fl-e2e")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs and the final report as JSON
    #[arg(long)]
    json: bool,

    /// Write Prometheus metrics to this file after the run
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Only run the named scenarios (repeatable)
    #[arg(short, long = "scenario")]
    scenarios: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    logging::init_subscriber(&args.log_level, args.json)?;

    info!("Starting fl-e2e v{}", fl_e2e::VERSION);

    let config = Config::load_or_default(args.config.as_deref())
        .with_context(|| format!("Failed to load configuration {:?}", args.config))?;

    let mut suite = Suite::from_config(config);
    if !args.scenarios.is_empty() {
        suite = suite
            .retain_scenarios(&args.scenarios)
            .context("Invalid --scenario")?;
    }

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let report = suite.run(&cancel).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(path) = &args.metrics_out {
        let text = metrics::render()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install ctrl+c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::warn!("Interrupted, cancelling outstanding requests");
    cancel.cancel();
}

fn print_report(report: &SuiteReport) {
    use fl_e2e::scenario::StepOutcome;
    use fl_e2e::suite::SuiteOutcome;

    match &report.outcome {
        SuiteOutcome::Skipped { reason } => {
            println!("--- SKIP: {}", reason);
            return;
        }
        SuiteOutcome::SetupFailed { error } => {
            println!("--- FAIL: suite setup: {}", error);
        }
        SuiteOutcome::Completed => {}
    }

    for scenario in &report.scenarios {
        println!("=== RUN   {}", scenario.name);
        for step in &scenario.steps {
            match &step.outcome {
                StepOutcome::Passed => {
                    println!("    --- PASS: {} ({}ms)", step.name, step.duration_ms)
                }
                StepOutcome::Failed(message) => {
                    println!("    --- FAIL: {} ({}ms)", step.name, step.duration_ms);
                    for line in message.lines() {
                        println!("        {}", line);
                    }
                }
            }
        }
        let verdict = if scenario.passed() { "PASS" } else { "FAIL" };
        println!("--- {}: {}", verdict, scenario.name);
    }

    if report.is_success() {
        println!("ok");
    } else {
        println!("FAIL");
    }
}
