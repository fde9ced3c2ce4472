//! Operator dependency table and transitive expansion.
//!
//! The table lists, for each core operator, the operators that must be
//! healthy before it can be. Expansion turns it into the full set of
//! upstream operators for every operator mentioned anywhere in the table.

use std::collections::{BTreeMap, BTreeSet};

/// Known direct dependencies between core cluster operators.
///
/// key: operator name
/// value: operators required by it
pub const OPERATOR_DEPENDENCIES: &[(&str, &[&str])] = &[
    ("etcd", &[]),
    ("network", &["etcd"]),
    ("kube-apiserver", &["etcd", "network"]),
    ("kube-controller-manager", &["kube-apiserver"]),
    ("kube-scheduler", &["kube-apiserver"]),
    ("service-ca", &["kube-apiserver"]),
    ("cloud-credential", &["network"]),
    ("dns", &["kube-apiserver"]),
    ("openshift-apiserver", &["kube-apiserver"]),
    (
        "openshift-controller-manager",
        &["openshift-apiserver", "kube-apiserver"],
    ),
    (
        "cloud-controller-manager",
        &["kube-apiserver", "cloud-credential"],
    ),
    (
        "machine-api",
        &["cloud-controller-manager", "cloud-credential", "kube-apiserver"],
    ),
    (
        "machine-config",
        &["kube-apiserver", "openshift-apiserver", "machine-api"],
    ),
    (
        "ingress",
        &["network", "machine-api", "cloud-credential", "dns"],
    ),
    ("storage", &["cloud-credential", "machine-api"]),
    ("image-registry", &["ingress", "cloud-credential"]),
    ("authentication", &["ingress"]),
    ("console", &["authentication", "ingress"]),
    ("monitoring", &["storage"]),
];

/// Direct dependency map: operator -> its immediate prerequisites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectDependencies {
    deps: BTreeMap<String, Vec<String>>,
}

impl DirectDependencies {
    /// Build from a static `(operator, prerequisites)` table.
    pub fn from_table(table: &[(&str, &[&str])]) -> Self {
        table
            .iter()
            .map(|(op, deps)| (*op, deps.iter().copied()))
            .collect()
    }

    /// The compiled-in core operator table.
    pub fn core() -> Self {
        Self::from_table(OPERATOR_DEPENDENCIES)
    }

    /// Direct prerequisites of `op`, or `None` if `op` is not a key.
    pub fn get(&self, op: &str) -> Option<&[String]> {
        self.deps.get(op).map(Vec::as_slice)
    }

    pub fn contains_key(&self, op: &str) -> bool {
        self.deps.contains_key(op)
    }

    /// Every operator that appears as a key or as a prerequisite.
    pub fn domain(&self) -> BTreeSet<&str> {
        self.deps
            .iter()
            .flat_map(|(op, deps)| std::iter::once(op).chain(deps))
            .map(String::as_str)
            .collect()
    }
}

impl<'a, I> FromIterator<(&'a str, I)> for DirectDependencies
where
    I: IntoIterator<Item = &'a str>,
{
    fn from_iter<T: IntoIterator<Item = (&'a str, I)>>(iter: T) -> Self {
        let deps = iter
            .into_iter()
            .map(|(op, deps)| {
                (
                    op.to_string(),
                    deps.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();
        Self { deps }
    }
}

/// Expanded dependency map: every operator in the domain mapped to all of
/// its transitive prerequisites, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    expanded: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Expand a direct dependency map into transitive closures.
    ///
    /// Operators that only ever appear as prerequisites get an empty set.
    /// Cycles in `direct` do not hang the traversal; they surface later when
    /// the graph is sequenced.
    pub fn expand(direct: &DirectDependencies) -> Self {
        let expanded = direct
            .domain()
            .into_iter()
            .map(|op| {
                let upstream = if direct.contains_key(op) {
                    upstream_dependencies(op, direct)
                } else {
                    Vec::new()
                };
                (op.to_string(), upstream)
            })
            .collect();

        Self { expanded }
    }

    /// All transitive prerequisites of `op`; empty for unknown operators.
    pub fn dependencies(&self, op: &str) -> &[String] {
        self.expanded.get(op).map_or(&[], Vec::as_slice)
    }

    /// Whether `op` is part of the dependency domain.
    pub fn contains(&self, op: &str) -> bool {
        self.expanded.contains_key(op)
    }

    /// The operator domain in ascending order.
    pub fn operators(&self) -> Vec<String> {
        self.expanded.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.expanded
            .iter()
            .map(|(op, deps)| (op.as_str(), deps.as_slice()))
    }
}

fn upstream_dependencies(op: &str, direct: &DirectDependencies) -> Vec<String> {
    let mut visited = BTreeSet::new();
    let mut result = BTreeSet::new();
    visit(op, direct, &mut visited, &mut result);
    result.into_iter().map(str::to_string).collect()
}

fn visit<'a>(
    current: &'a str,
    direct: &'a DirectDependencies,
    visited: &mut BTreeSet<&'a str>,
    result: &mut BTreeSet<&'a str>,
) {
    if !visited.insert(current) {
        return;
    }

    if let Some(deps) = direct.get(current) {
        for dep in deps {
            result.insert(dep.as_str());
            visit(dep, direct, visited, result);
        }
    }
}
