//! Input records describing the current cluster and the pending pod batch.

use serde::{Deserialize, Serialize};

use crate::core::node::Node;
use crate::core::pod::Pod;

/// Cluster contents at the moment the simulation starts. Every pod listed
/// here is already running and must carry its node assignment (or at least a
/// nomination).
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ClusterState {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub pods: Vec<Pod>,
}

/// Pods waiting for placement, in submission order.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct WorkloadBatch {
    #[serde(default)]
    pub pods: Vec<Pod>,
}
