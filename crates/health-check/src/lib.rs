//! Cluster health auditor.
//!
//! Inspects a cluster's operator conditions, cluster version, machines and
//! nodes, and produces a JUnit report of pass, fail and skip outcomes.
//!
//! Operators are evaluated along a dependency graph: when a prerequisite
//! operator fails, its dependents are skipped rather than failed.
//!
//! # Example
//!
//! ```ignore
//! use cluster_health_check::{HealthCheck, KubeClusterSource};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = KubeClusterSource::connect(None, "openshift-machine-api").await?;
//!     let suite = HealthCheck::default().run(&source).await?;
//!     println!("{}", suite.to_junit_xml());
//!     Ok(())
//! }
//! ```

pub mod cluster_version;
pub mod conditions;
pub mod config;
pub mod dependencies;
pub mod error;
pub mod machines;
pub mod operators;
pub mod report;
pub mod runner;
pub mod source;
pub mod topology;
pub mod ui;

// Re-export commonly used types at the crate root
pub use config::HealthCheckOptions;
pub use dependencies::{DependencyGraph, DirectDependencies, OPERATOR_DEPENDENCIES};
pub use error::{HealthCheckError, Result};
pub use report::{Outcome, TestCase, TestSuite};
pub use runner::HealthCheck;
pub use source::{ClusterSource, KubeClusterSource};
