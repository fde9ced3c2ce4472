//! Cluster data source.
//!
//! [`ClusterSource`] is the seam between the checks and the API server.
//! [`KubeClusterSource`] talks to a live cluster; tests supply their own
//! in-memory implementation.

use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, DynamicObject, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::discovery::ApiResource;
use kube::{Client, Config, ResourceExt};
use tracing::debug;

use crate::conditions::{
    ClusterOperatorRecord, ClusterVersionRecord, Condition, MachineRecord, NodeRecord,
    StatusConditions,
};
use crate::error::{HealthCheckError, Result};

/// Namespace machine records live in by default.
pub const DEFAULT_MACHINE_NAMESPACE: &str = "openshift-machine-api";

/// Name of the singleton cluster version record.
const CLUSTER_VERSION_NAME: &str = "version";

/// Read-only access to the cluster records the health check consumes.
#[async_trait]
pub trait ClusterSource: Send + Sync {
    /// Fetch the singleton cluster version record.
    async fn cluster_version(&self) -> Result<ClusterVersionRecord>;

    /// List every cluster operator.
    async fn list_cluster_operators(&self) -> Result<Vec<ClusterOperatorRecord>>;

    /// List machines from the machine API.
    async fn list_machines(&self) -> Result<Vec<MachineRecord>>;

    /// List every node.
    async fn list_nodes(&self) -> Result<Vec<NodeRecord>>;
}

/// `config.openshift.io/v1` ClusterOperator.
fn cluster_operator_api() -> ApiResource {
    ApiResource {
        group: "config.openshift.io".to_string(),
        version: "v1".to_string(),
        api_version: "config.openshift.io/v1".to_string(),
        kind: "ClusterOperator".to_string(),
        plural: "clusteroperators".to_string(),
    }
}

/// `config.openshift.io/v1` ClusterVersion.
fn cluster_version_api() -> ApiResource {
    ApiResource {
        group: "config.openshift.io".to_string(),
        version: "v1".to_string(),
        api_version: "config.openshift.io/v1".to_string(),
        kind: "ClusterVersion".to_string(),
        plural: "clusterversions".to_string(),
    }
}

/// `machine.openshift.io/v1beta1` Machine.
fn machine_api() -> ApiResource {
    ApiResource {
        group: "machine.openshift.io".to_string(),
        version: "v1beta1".to_string(),
        api_version: "machine.openshift.io/v1beta1".to_string(),
        kind: "Machine".to_string(),
        plural: "machines".to_string(),
    }
}

/// [`ClusterSource`] backed by a Kubernetes client.
#[derive(Clone)]
pub struct KubeClusterSource {
    client: Client,
    machine_namespace: String,
}

impl KubeClusterSource {
    pub fn new(client: Client, machine_namespace: impl Into<String>) -> Self {
        Self {
            client,
            machine_namespace: machine_namespace.into(),
        }
    }

    /// Connect using an explicit kubeconfig, or infer the configuration
    /// (in-cluster env, then `~/.kube/config`) when `kubeconfig` is `None`.
    pub async fn connect(kubeconfig: Option<&Path>, machine_namespace: &str) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    HealthCheckError::ClientConfig(format!(
                        "failed to read kubeconfig from {}: {e}",
                        path.display()
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .map_err(|e| HealthCheckError::ClientConfig(e.to_string()))?
            }
            None => Config::infer()
                .await
                .map_err(|e| HealthCheckError::ClientConfig(e.to_string()))?,
        };

        debug!(cluster_url = %config.cluster_url, "Using cluster configuration");
        let client = Client::try_from(config).map_err(HealthCheckError::Client)?;

        Ok(Self::new(client, machine_namespace))
    }
}

#[async_trait]
impl ClusterSource for KubeClusterSource {
    async fn cluster_version(&self) -> Result<ClusterVersionRecord> {
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &cluster_version_api());
        let obj = api
            .get(CLUSTER_VERSION_NAME)
            .await
            .map_err(|source| HealthCheckError::List {
                resource: "clusterversion",
                source,
            })?;

        Ok(ClusterVersionRecord {
            conditions: status_conditions(&obj, "clusterversion")?,
        })
    }

    async fn list_cluster_operators(&self) -> Result<Vec<ClusterOperatorRecord>> {
        let api: Api<DynamicObject> =
            Api::all_with(self.client.clone(), &cluster_operator_api());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|source| HealthCheckError::List {
                resource: "clusteroperators",
                source,
            })?;

        list.items
            .iter()
            .map(|item| {
                Ok(ClusterOperatorRecord {
                    name: item.name_any(),
                    conditions: status_conditions(item, "clusteroperator")?,
                })
            })
            .collect()
    }

    async fn list_machines(&self) -> Result<Vec<MachineRecord>> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &self.machine_namespace, &machine_api());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|source| HealthCheckError::List {
                resource: "machines",
                source,
            })?;

        Ok(list
            .items
            .iter()
            .map(|item| {
                let phase = item
                    .data
                    .get("status")
                    .and_then(|s| s.get("phase"))
                    .and_then(|p| p.as_str())
                    .unwrap_or_default();
                MachineRecord::new(item.name_any(), phase)
            })
            .collect())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|source| HealthCheckError::List {
                resource: "nodes",
                source,
            })?;

        Ok(list.items.iter().map(node_record).collect())
    }
}

/// Decode `status.conditions` from an untyped object.
fn status_conditions(obj: &DynamicObject, resource: &'static str) -> Result<Vec<Condition>> {
    let Some(status) = obj.data.get("status") else {
        return Ok(Vec::new());
    };
    let status: StatusConditions = serde_json::from_value(status.clone())
        .map_err(|source| HealthCheckError::Decode { resource, source })?;
    Ok(status.conditions)
}

fn node_record(node: &Node) -> NodeRecord {
    let unschedulable = node
        .spec
        .as_ref()
        .and_then(|s| s.unschedulable)
        .unwrap_or(false);
    let conditions = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| {
            conds
                .iter()
                .map(|c| Condition {
                    condition_type: c.type_.clone(),
                    status: c.status.clone(),
                    reason: c.reason.clone(),
                    message: c.message.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    NodeRecord {
        name: node.name_any(),
        unschedulable,
        conditions,
    }
}
