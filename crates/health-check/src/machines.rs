//! Machine and node consistency checks.
//!
//! Three independent test cases:
//! 1. every machine is Running
//! 2. every node is ready and schedulable
//! 3. there are at least as many ready, schedulable nodes as running machines

use tracing::{info, warn};

use crate::conditions::{MachineRecord, NodeRecord};
use crate::error::HealthCheckError;
use crate::report::TestSuite;

pub const MACHINES_RUNNING: &str = "all machines should be in Running state";
pub const NODES_READY: &str = "all nodes should be ready";
pub const NODE_COUNT: &str = "node count should match or exceed machine count";

/// Node condition reporting kubelet readiness.
const NODE_READY: &str = "Ready";
/// Node condition reporting that the node network is not configured.
const NODE_NETWORK_UNAVAILABLE: &str = "NetworkUnavailable";

/// A node is schedulable when it is Ready, not cordoned, and its network is
/// not reported unavailable.
pub fn is_node_schedulable(node: &NodeRecord) -> bool {
    let ready = node
        .condition(NODE_READY)
        .is_some_and(|c| c.status == "True");
    let network_ready = node
        .condition(NODE_NETWORK_UNAVAILABLE)
        .map_or(true, |c| c.status == "False");

    !node.unschedulable && ready && network_ready
}

/// Run the three machine/node checks, appending one test case per check.
///
/// A machine listing error is recorded as a failure and the remaining checks
/// still run. That failure is the only machine case recorded: no "No Machines
/// found" skip is added under the same name, so each check yields exactly one
/// test case. A node listing error is recorded as a failure and the node
/// count check is not run.
pub fn check_machine_node_consistency<F>(
    machines: Result<Vec<MachineRecord>, HealthCheckError>,
    nodes: Result<Vec<NodeRecord>, HealthCheckError>,
    is_schedulable: F,
    suite: &mut TestSuite,
) where
    F: Fn(&NodeRecord) -> bool,
{
    info!("Starting Machine and Node consistency check");

    let (listed, machines) = match machines {
        Ok(machines) => (true, machines),
        Err(e) => {
            suite.fail(
                MACHINES_RUNNING,
                format!("Could not list machines: {e}. The Machine API might not be available."),
            );
            (false, Vec::new())
        }
    };
    let running: Vec<&MachineRecord> = machines.iter().filter(|m| m.is_running()).collect();

    if !listed {
        // listing failure already recorded
    } else if machines.is_empty() {
        suite.skip(
            MACHINES_RUNNING,
            "No Machines found or could not retrieve list. Skipping Machine check.",
        );
    } else {
        let not_running: Vec<String> = machines
            .iter()
            .filter(|m| !m.is_running())
            .map(|m| format!("Machine {:?} is in {:?} state", m.name, m.phase))
            .collect();

        if not_running.is_empty() {
            suite.pass(MACHINES_RUNNING);
        } else {
            warn!(
                count = not_running.len(),
                "Proceeding with node count check despite non-Running machines"
            );
            suite.fail(
                MACHINES_RUNNING,
                format!(
                    "Found {} out of {} Machines not in Running state: {}",
                    not_running.len(),
                    machines.len(),
                    not_running.join(" ")
                ),
            );
        }
    }

    let nodes = match nodes {
        Ok(nodes) => nodes,
        Err(e) => {
            suite.fail(NODES_READY, format!("Failed to list nodes: {e}."));
            return;
        }
    };

    let (ready, not_ready): (Vec<&NodeRecord>, Vec<&NodeRecord>) =
        nodes.iter().partition(|n| is_schedulable(n));

    if not_ready.is_empty() {
        suite.pass(NODES_READY);
    } else {
        let names: Vec<&str> = not_ready.iter().map(|n| n.name.as_str()).collect();
        suite.fail(
            NODES_READY,
            format!(
                "Found {} out of {} Nodes not Ready or unschedulable: {}",
                not_ready.len(),
                nodes.len(),
                names.join(" ")
            ),
        );
    }

    info!(
        ready = ready.len(),
        total = nodes.len(),
        "Counted Ready and schedulable Nodes"
    );

    if ready.len() >= running.len() {
        info!(
            nodes = ready.len(),
            machines = running.len(),
            "Ready and schedulable Node count covers Running Machine count"
        );
        suite.pass(NODE_COUNT);
    } else {
        let node_names: Vec<&str> = ready.iter().map(|n| n.name.as_str()).collect();
        let machine_names: Vec<&str> = running.iter().map(|m| m.name.as_str()).collect();
        suite.fail(
            NODE_COUNT,
            format!(
                "Ready and schedulable Nodes count ({}) is less than Running Machine count ({}): \
                 Ready and schedulable Nodes: {}; Running Machines: {}",
                ready.len(),
                running.len(),
                node_names.join(" "),
                machine_names.join(" ")
            ),
        );
    }
}
