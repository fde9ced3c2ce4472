//! Error types for the cluster health check.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HealthCheckError>;

/// Errors that can occur while auditing a cluster.
#[derive(Debug, Error)]
pub enum HealthCheckError {
    /// No usable cluster configuration (kubeconfig or in-cluster env).
    #[error("Cluster configuration not found: {0}")]
    ClientConfig(String),

    /// The Kubernetes client could not be built from the configuration.
    #[error("Failed to create cluster client: {0}")]
    Client(#[source] kube::Error),

    /// Listing or fetching a resource failed.
    #[error("Failed to list {resource}: {source}")]
    List {
        resource: &'static str,
        #[source]
        source: kube::Error,
    },

    /// A fetched record could not be decoded into its typed form.
    #[error("Failed to decode {resource}: {source}")]
    Decode {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The operator dependency graph contains a cycle.
    #[error("Dependency graph has a cycle ({sequenced} of {total} operators could be ordered)")]
    CycleDetected { sequenced: usize, total: usize },

    /// The cluster version is not stable.
    #[error("ClusterVersion is not stable: {0}")]
    ClusterVersion(#[from] ClusterVersionIssue),

    /// Writing the report file failed.
    #[error("Failed to write report to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why the cluster version was judged unstable.
///
/// Each variant carries the `status | reason | message` of the offending
/// condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterVersionIssue {
    #[error("clusterversion not available (Available={0})")]
    NotAvailable(String),

    #[error("clusterversion is failing (Failing={0})")]
    Failing(String),

    #[error("clusterversion is progressing (Progressing={0})")]
    Progressing(String),
}
