//! Typed status conditions and the cluster records that carry them.
//!
//! Records arrive from the API server as semi-structured payloads. They are
//! decoded once into these types so callers look conditions up by type
//! instead of walking JSON.

use serde::{Deserialize, Serialize};

/// Condition type reporting that an operator or cluster version is usable.
pub const AVAILABLE: &str = "Available";
/// Condition type reporting that an operator is running in a degraded state.
pub const DEGRADED: &str = "Degraded";
/// Condition type reporting that a rollout is in flight.
pub const PROGRESSING: &str = "Progressing";
/// Condition type reporting that a cluster version update is failing.
pub const FAILING: &str = "Failing";

/// A single entry of `status.conditions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition type: "Available", "Degraded", "Progressing", etc.
    #[serde(rename = "type")]
    pub condition_type: String,
    /// Status: "True", "False", "Unknown"
    #[serde(default)]
    pub status: String,
    /// Machine-readable reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Human-readable message with details
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    /// Build a condition with only type and status set.
    pub fn new(condition_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: status.into(),
            reason: None,
            message: None,
        }
    }
}

/// Find the condition of the given type.
pub fn condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions
        .iter()
        .find(|c| c.condition_type == condition_type)
}

/// Status string of the given condition type, or `""` when it is missing.
pub fn condition_status<'a>(conditions: &'a [Condition], condition_type: &str) -> &'a str {
    condition(conditions, condition_type).map_or("", |c| c.status.as_str())
}

/// Render a condition as `status | reason | message` for log output.
pub fn condition_info(cond: Option<&Condition>) -> String {
    match cond {
        Some(c) => format!(
            "{} | {} | {}",
            c.status,
            c.reason.as_deref().unwrap_or(""),
            c.message.as_deref().unwrap_or("")
        ),
        None => " |  | ".to_string(),
    }
}

/// A `ClusterOperator` as reported by the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterOperatorRecord {
    pub name: String,
    pub conditions: Vec<Condition>,
}

impl ClusterOperatorRecord {
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            conditions,
        }
    }

    /// Typed accessor for one of the operator's conditions.
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        condition(&self.conditions, condition_type)
    }
}

/// The singleton `ClusterVersion` record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterVersionRecord {
    pub conditions: Vec<Condition>,
}

impl ClusterVersionRecord {
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        condition(&self.conditions, condition_type)
    }
}

/// A `Machine` from the machine API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineRecord {
    pub name: String,
    /// `status.phase`, empty when unset.
    pub phase: String,
}

impl MachineRecord {
    pub fn new(name: impl Into<String>, phase: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phase: phase.into(),
        }
    }

    /// Whether the machine reports phase "Running" (case-insensitive).
    pub fn is_running(&self) -> bool {
        self.phase.eq_ignore_ascii_case("running")
    }
}

/// A `Node`, reduced to what the readiness predicate needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: String,
    /// `spec.unschedulable` (cordoned).
    pub unschedulable: bool,
    pub conditions: Vec<Condition>,
}

impl NodeRecord {
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        condition(&self.conditions, condition_type)
    }
}

/// Helper for decoding `status.conditions` out of an untyped payload.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatusConditions {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}
