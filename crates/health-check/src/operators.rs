//! Dependency-aware operator health evaluation.
//!
//! Operators are visited in dependency order. Once an operator fails, every
//! operator downstream of it is reported as skipped instead of failed, so a
//! single broken prerequisite shows up as one failure rather than a cascade.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::conditions::{condition_status, ClusterOperatorRecord, AVAILABLE, DEGRADED, PROGRESSING};
use crate::dependencies::DependencyGraph;
use crate::report::{Outcome, TestSuite};

/// Prefix of every operator test-case name.
pub const TEST_CASE_PREFIX: &str = "operator conditions";

/// Test-case name for an operator.
pub fn test_case_name(operator: &str) -> String {
    format!("{TEST_CASE_PREFIX} {operator}")
}

/// Terminal classification of one operator in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorState {
    /// Listed in the dependency table but absent from the cluster.
    NotFound,
    /// Present, but a prerequisite already failed.
    SkippedByDependency { failed_dependency: String },
    /// Available, not degraded, not progressing.
    Passed,
    /// Any other condition combination.
    Failed {
        available: String,
        degraded: String,
        progressing: String,
    },
}

impl OperatorState {
    /// Report outcome for `operator` in this state.
    pub fn outcome(&self, operator: &str) -> Outcome {
        match self {
            Self::NotFound => Outcome::Skipped(format!(
                "Operator {operator:?} not found in the cluster, skipping"
            )),
            Self::SkippedByDependency { failed_dependency } => Outcome::Skipped(format!(
                "Precondition operator {failed_dependency:?} failed, skipping"
            )),
            Self::Passed => Outcome::Passed,
            Self::Failed {
                available,
                degraded,
                progressing,
            } => Outcome::Failed(format!(
                "Operator {operator:?} - Available={available}, Degraded={degraded}, Progressing={progressing}"
            )),
        }
    }
}

/// Classification of a single operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorVerdict {
    pub name: String,
    pub state: OperatorState,
    /// Whether the operator is outside the dependency table.
    pub extra: bool,
}

/// Healthy iff Available is exactly "True" and Degraded and Progressing are
/// exactly "False". Missing conditions count as unhealthy.
pub fn assess_conditions(record: &ClusterOperatorRecord) -> OperatorState {
    let available = condition_status(&record.conditions, AVAILABLE);
    let degraded = condition_status(&record.conditions, DEGRADED);
    let progressing = condition_status(&record.conditions, PROGRESSING);

    if available == "True" && degraded == "False" && progressing == "False" {
        OperatorState::Passed
    } else {
        OperatorState::Failed {
            available: available.to_string(),
            degraded: degraded.to_string(),
            progressing: progressing.to_string(),
        }
    }
}

/// Walks operators in evaluation order, tracking which ones failed.
pub struct CascadingEvaluator<'a> {
    graph: &'a DependencyGraph,
    failed: HashSet<String>,
}

impl<'a> CascadingEvaluator<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self {
            graph,
            failed: HashSet::new(),
        }
    }

    /// Operators classified as failed so far.
    pub fn failed(&self) -> &HashSet<String> {
        &self.failed
    }

    /// Classify one operator. `record` is `None` when the operator is not
    /// present in the cluster.
    pub fn classify(&mut self, name: &str, record: Option<&ClusterOperatorRecord>) -> OperatorState {
        let Some(record) = record else {
            return OperatorState::NotFound;
        };

        // first failed prerequisite in the graph's iteration order
        if let Some(dep) = self
            .graph
            .dependencies(name)
            .iter()
            .find(|dep| self.failed.contains(dep.as_str()))
        {
            return OperatorState::SkippedByDependency {
                failed_dependency: dep.clone(),
            };
        }

        let state = assess_conditions(record);
        if matches!(state, OperatorState::Failed { .. }) && self.graph.contains(name) {
            self.failed.insert(name.to_string());
        }
        state
    }

    /// Evaluate `order` against the cluster's operators, then every cluster
    /// operator not covered by `order`.
    ///
    /// Extras come out in map iteration order, which is unspecified. One test
    /// case per operator is appended to `suite`.
    pub fn evaluate(
        &mut self,
        order: &[String],
        operators: Vec<ClusterOperatorRecord>,
        suite: &mut TestSuite,
    ) -> Vec<OperatorVerdict> {
        let mut remaining: HashMap<String, ClusterOperatorRecord> = operators
            .into_iter()
            .map(|record| (record.name.clone(), record))
            .collect();

        let mut plan: Vec<(String, Option<ClusterOperatorRecord>, bool)> = order
            .iter()
            .map(|name| (name.clone(), remaining.remove(name), false))
            .collect();
        let extras = remaining.len();
        plan.extend(
            remaining
                .into_iter()
                .map(|(name, record)| (name, Some(record), true)),
        );

        info!(
            total = plan.len(),
            core = order.len(),
            additional = extras,
            "Final operator list assembled"
        );

        plan.into_iter()
            .map(|(name, record, extra)| {
                info!(operator = %name, "Checking operator");
                let state = self.classify(&name, record.as_ref());
                let outcome = state.outcome(&name);
                match &outcome {
                    Outcome::Passed => info!(operator = %name, "Operator passed"),
                    Outcome::Failed(msg) | Outcome::Skipped(msg) => {
                        info!(operator = %name, "{msg}");
                    }
                }
                suite.push(test_case_name(&name), outcome);
                OperatorVerdict { name, state, extra }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::Condition;
    use crate::dependencies::DirectDependencies;
    use crate::topology::topological_sort;

    fn operator(name: &str, available: &str, degraded: &str, progressing: &str) -> ClusterOperatorRecord {
        ClusterOperatorRecord::new(
            name,
            vec![
                Condition::new(AVAILABLE, available),
                Condition::new(DEGRADED, degraded),
                Condition::new(PROGRESSING, progressing),
            ],
        )
    }

    fn healthy(name: &str) -> ClusterOperatorRecord {
        operator(name, "True", "False", "False")
    }

    fn run(
        table: &[(&str, &[&str])],
        operators: Vec<ClusterOperatorRecord>,
    ) -> (Vec<OperatorVerdict>, TestSuite) {
        let graph = DependencyGraph::expand(&DirectDependencies::from_table(table));
        let order = topological_sort(&graph.operators(), &graph).unwrap();
        let mut suite = TestSuite::default();
        let verdicts = CascadingEvaluator::new(&graph).evaluate(&order, operators, &mut suite);
        (verdicts, suite)
    }

    fn state_of<'v>(verdicts: &'v [OperatorVerdict], name: &str) -> &'v OperatorState {
        &verdicts.iter().find(|v| v.name == name).unwrap().state
    }

    #[test]
    fn test_assess_conditions_requires_exact_values() {
        assert_eq!(assess_conditions(&healthy("a")), OperatorState::Passed);
        assert_eq!(
            assess_conditions(&operator("a", "True", "False", "Unknown")),
            OperatorState::Failed {
                available: "True".to_string(),
                degraded: "False".to_string(),
                progressing: "Unknown".to_string(),
            }
        );
        assert!(matches!(
            assess_conditions(&operator("a", "true", "False", "False")),
            OperatorState::Failed { .. }
        ));
    }

    #[test]
    fn test_missing_conditions_fail() {
        let record = ClusterOperatorRecord::new("a", vec![Condition::new(AVAILABLE, "True")]);
        assert_eq!(
            assess_conditions(&record),
            OperatorState::Failed {
                available: "True".to_string(),
                degraded: String::new(),
                progressing: String::new(),
            }
        );
    }

    #[test]
    fn test_cascading_skip_along_chain() {
        let (verdicts, suite) = run(
            &[("A", &[]), ("B", &["A"]), ("C", &["B"])],
            vec![
                operator("A", "False", "True", "False"),
                healthy("B"),
                healthy("C"),
            ],
        );

        assert!(matches!(state_of(&verdicts, "A"), OperatorState::Failed { .. }));
        assert_eq!(
            state_of(&verdicts, "B"),
            &OperatorState::SkippedByDependency {
                failed_dependency: "A".to_string()
            }
        );
        assert_eq!(
            state_of(&verdicts, "C"),
            &OperatorState::SkippedByDependency {
                failed_dependency: "A".to_string()
            }
        );
        assert_eq!(suite.num_failed(), 1);
        assert_eq!(suite.num_skipped(), 2);
        assert_eq!(
            suite.case("operator conditions B").and_then(|c| c.outcome.message()),
            Some(r#"Precondition operator "A" failed, skipping"#)
        );
    }

    #[test]
    fn test_not_found_does_not_block_dependents() {
        let (verdicts, suite) = run(
            &[("A", &[]), ("B", &["A"])],
            vec![healthy("B")],
        );

        assert_eq!(state_of(&verdicts, "A"), &OperatorState::NotFound);
        assert_eq!(state_of(&verdicts, "B"), &OperatorState::Passed);
        assert_eq!(
            suite.case("operator conditions A").and_then(|c| c.outcome.message()),
            Some(r#"Operator "A" not found in the cluster, skipping"#)
        );
    }

    #[test]
    fn test_failure_message_embeds_raw_statuses() {
        let outcome = OperatorState::Failed {
            available: "True".to_string(),
            degraded: "True".to_string(),
            progressing: "False".to_string(),
        }
        .outcome("etcd");

        assert_eq!(
            outcome,
            Outcome::Failed(
                r#"Operator "etcd" - Available=True, Degraded=True, Progressing=False"#.to_string()
            )
        );
    }

    #[test]
    fn test_end_to_end_etcd_failure() {
        let (verdicts, suite) = run(
            &[
                ("etcd", &[]),
                ("network", &["etcd"]),
                ("kube-apiserver", &["etcd", "network"]),
            ],
            vec![
                operator("etcd", "True", "True", "False"),
                healthy("network"),
                healthy("kube-apiserver"),
            ],
        );

        let names: Vec<_> = verdicts.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["etcd", "network", "kube-apiserver"]);
        assert!(matches!(state_of(&verdicts, "etcd"), OperatorState::Failed { .. }));
        assert_eq!(
            state_of(&verdicts, "network"),
            &OperatorState::SkippedByDependency {
                failed_dependency: "etcd".to_string()
            }
        );
        assert!(matches!(
            state_of(&verdicts, "kube-apiserver"),
            OperatorState::SkippedByDependency { .. }
        ));
        assert_eq!(suite.num_tests(), 3);
    }

    #[test]
    fn test_extra_operator_appended_once() {
        let (verdicts, suite) = run(&[("etcd", &[])], vec![healthy("etcd"), healthy("foo")]);

        let foo: Vec<_> = verdicts.iter().filter(|v| v.name == "foo").collect();
        assert_eq!(foo.len(), 1);
        assert!(foo[0].extra);
        assert_eq!(foo[0].state, OperatorState::Passed);
        assert_eq!(verdicts[0].name, "etcd");
        assert!(suite.case("operator conditions foo").unwrap().outcome.is_passed());
    }

    #[test]
    fn test_failed_extra_operator_not_tracked() {
        let graph = DependencyGraph::expand(&DirectDependencies::from_table(&[("etcd", &[])]));
        let mut evaluator = CascadingEvaluator::new(&graph);

        let state = evaluator.classify("foo", Some(&operator("foo", "False", "True", "True")));
        assert!(matches!(state, OperatorState::Failed { .. }));
        assert!(evaluator.failed().is_empty());
    }

    #[test]
    fn test_skipped_operator_not_added_to_failed() {
        let graph = DependencyGraph::expand(&DirectDependencies::from_table(&[
            ("A", &[]),
            ("B", &["A"]),
        ]));
        let mut evaluator = CascadingEvaluator::new(&graph);

        evaluator.classify("A", Some(&operator("A", "False", "False", "False")));
        evaluator.classify("B", Some(&operator("B", "False", "False", "False")));

        assert_eq!(evaluator.failed().len(), 1);
        assert!(evaluator.failed().contains("A"));
    }
}
