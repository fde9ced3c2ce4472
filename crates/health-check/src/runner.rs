//! A single health check run: fetch, evaluate, report.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::cluster_version::check_cluster_version_stable;
use crate::conditions::NodeRecord;
use crate::config::HealthCheckOptions;
use crate::dependencies::{DependencyGraph, DirectDependencies};
use crate::error::Result;
use crate::machines::{check_machine_node_consistency, is_node_schedulable};
use crate::operators::{CascadingEvaluator, OperatorVerdict};
use crate::report::{self, TestSuite};
use crate::source::{ClusterSource, KubeClusterSource};
use crate::ui;

/// Configured health check.
pub struct HealthCheck {
    dependencies: DirectDependencies,
    is_schedulable: fn(&NodeRecord) -> bool,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self::new(DirectDependencies::core())
    }
}

impl HealthCheck {
    pub fn new(dependencies: DirectDependencies) -> Self {
        Self {
            dependencies,
            is_schedulable: is_node_schedulable,
        }
    }

    /// Replace the node readiness-and-schedulability predicate.
    #[must_use]
    pub fn with_node_predicate(mut self, predicate: fn(&NodeRecord) -> bool) -> Self {
        self.is_schedulable = predicate;
        self
    }

    /// Expand the dependency table and compute the operator evaluation order.
    ///
    /// # Errors
    ///
    /// Fails with `CycleDetected` if the table is cyclic.
    pub fn plan(&self) -> Result<(DependencyGraph, Vec<String>)> {
        let graph = DependencyGraph::expand(&self.dependencies);
        let order = crate::topology::topological_sort(&graph.operators(), &graph)?;
        Ok((graph, order))
    }

    /// Run every check against `source`.
    ///
    /// Cluster version instability and machine/node listing failures are
    /// recorded or logged and the run continues.
    ///
    /// # Errors
    ///
    /// Fails if cluster operators cannot be listed or the dependency graph
    /// has a cycle. No operator test cases are produced in either case.
    pub async fn run<S>(&self, source: &S) -> Result<TestSuite>
    where
        S: ClusterSource + ?Sized,
    {
        info!("Check ClusterVersion Stability...");
        match source.cluster_version().await {
            Ok(cv) => {
                if let Err(e) = check_cluster_version_stable(&cv) {
                    warn!("Continue though cluster version stability check failed ({e})");
                }
            }
            Err(e) => {
                error!(error = %e, "Fail to get cluster version");
                warn!("Continue though cluster version stability check failed ({e})");
            }
        }

        let mut suite = TestSuite::default();

        let machines = source.list_machines().await;
        let nodes = source.list_nodes().await;
        check_machine_node_consistency(machines, nodes, self.is_schedulable, &mut suite);

        info!("Checking Cluster Operators...");
        let operators = source.list_cluster_operators().await?;

        let (graph, order) = self.plan()?;
        info!(
            "Core operators will be checked in order:\n{}",
            order.join("\n")
        );

        let verdicts = CascadingEvaluator::new(&graph).evaluate(&order, operators, &mut suite);
        log_verdicts(&verdicts);

        Ok(suite)
    }
}

fn log_verdicts(verdicts: &[OperatorVerdict]) {
    let extras = verdicts.iter().filter(|v| v.extra).count();
    info!(
        operators = verdicts.len(),
        additional = extras,
        "Operator evaluation complete"
    );
}

/// Serialize `suite`, print it to stdout, and persist it when `options`
/// names a report directory.
///
/// A failed write is logged; the serialized report is returned either way.
pub fn emit_report(suite: &TestSuite, options: &HealthCheckOptions) -> String {
    let xml = suite.to_junit_xml();
    println!("{xml}");

    if let Some(dir) = options.report_dir() {
        if let Err(e) = report::write_report(dir, &xml, Utc::now()) {
            error!(error = %e, "Failed to persist JUnit report");
        }
    }

    xml
}

/// Run the health check against a source and emit its report.
///
/// Never fails: problems that stop the run are logged and the run ends
/// early. Check failures live in the report, not in the return value.
pub async fn run_with_source<S>(check: &HealthCheck, source: &S, options: &HealthCheckOptions)
where
    S: ClusterSource + ?Sized,
{
    match check.run(source).await {
        Ok(suite) => {
            emit_report(&suite, options);
            ui::print_summary(&suite);
        }
        Err(e) => error!(error = %e, "Cluster health check stopped early"),
    }
}

/// Connect to the cluster described by `options` and run the full check.
///
/// A missing or unusable cluster configuration is logged and ends the run
/// without an error.
pub async fn execute(options: &HealthCheckOptions) {
    let source =
        match KubeClusterSource::connect(options.kubeconfig.as_deref(), &options.machine_namespace)
            .await
        {
            Ok(source) => source,
            Err(e) => {
                error!(error = %e, "Cluster client unavailable");
                return;
            }
        };

    run_with_source(&HealthCheck::default(), &source, options).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthCheckError;

    #[test]
    fn test_plan_core_table() {
        let (graph, order) = HealthCheck::default().plan().unwrap();

        assert_eq!(order.len(), graph.len());
        assert_eq!(order[0], "etcd");
        assert_eq!(order[1], "network");
    }

    #[test]
    fn test_plan_rejects_cycle() {
        let check = HealthCheck::new(DirectDependencies::from_table(&[
            ("A", &["B"]),
            ("B", &["A"]),
        ]));
        assert!(matches!(
            check.plan(),
            Err(HealthCheckError::CycleDetected { .. })
        ));
    }
}
