//! Evaluation order for operators.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::dependencies::DependencyGraph;
use crate::error::{HealthCheckError, Result};

/// Order `operators` so that every prerequisite comes before its dependents.
///
/// Kahn's algorithm restricted to `operators`: dependencies outside the set
/// do not count toward in-degree. Ready operators are queued FIFO, seeded in
/// ascending name order, which makes the result deterministic for a given
/// input.
///
/// # Errors
///
/// Returns [`HealthCheckError::CycleDetected`] if the restricted graph has a
/// cycle. No partial order is returned.
pub fn topological_sort(operators: &[String], graph: &DependencyGraph) -> Result<Vec<String>> {
    let ordered: Vec<&str> = operators
        .iter()
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let members: BTreeSet<&str> = ordered.iter().copied().collect();

    let mut in_degree: HashMap<&str, usize> = ordered
        .iter()
        .map(|op| {
            let degree = graph
                .dependencies(op)
                .iter()
                .filter(|dep| members.contains(dep.as_str()))
                .count();
            (*op, degree)
        })
        .collect();

    let mut queue: VecDeque<&str> = ordered
        .iter()
        .copied()
        .filter(|op| in_degree.get(op) == Some(&0))
        .collect();

    let mut sorted = Vec::with_capacity(ordered.len());
    while let Some(node) = queue.pop_front() {
        sorted.push(node.to_string());

        // every operator that lists `node` upstream loses one pending prerequisite
        for op in &ordered {
            if graph.dependencies(op).iter().any(|dep| dep == node) {
                if let Some(degree) = in_degree.get_mut(op) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(*op);
                    }
                }
            }
        }
    }

    if sorted.len() != ordered.len() {
        return Err(HealthCheckError::CycleDetected {
            sequenced: sorted.len(),
            total: ordered.len(),
        });
    }

    Ok(sorted)
}
