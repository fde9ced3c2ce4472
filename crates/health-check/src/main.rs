//! Cluster health check CLI.
//!
//! Audits control-plane operators, cluster version, machines and nodes, and
//! prints a JUnit report to stdout. The process exits successfully whatever
//! the checks find; failures are carried in the report.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cluster_health_check::{runner, HealthCheckOptions};

/// Cluster Health Check - dependency-aware operator health auditor.
#[derive(Parser)]
#[command(
    name = "cluster-health-check",
    version,
    about = "Audit cluster operator, machine and node health",
    long_about = "Audit cluster operator, machine and node health.\n\n\
                  Operators are checked in dependency order; an operator whose\n\
                  prerequisite failed is reported as skipped. Results are printed\n\
                  as a JUnit report and optionally written to --junit-dir."
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    options: HealthCheckOptions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info,cluster_health_check=debug")
    } else {
        EnvFilter::new("warn,cluster_health_check=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    runner::execute(&cli.options).await;
    Ok(())
}
