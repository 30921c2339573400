//! Type definitions for node specification and state used in cluster state formats

use serde::{Deserialize, Serialize};

use crate::core::common::{ObjectMeta, RuntimeResources};

/// Taint key attached to nodes whose ready condition is false.
pub const NOT_READY_TAINT_KEY: &str = "node.kubernetes.io/not-ready";

fn default_max_pods() -> u32 {
    110
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Taint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    pub effect: TaintEffect,
}

impl Taint {
    pub fn not_ready() -> Self {
        Self {
            key: NOT_READY_TAINT_KEY.to_string(),
            value: Default::default(),
            effect: TaintEffect::NoSchedule,
        }
    }

    /// Hard taints forbid placement; PreferNoSchedule only biases scoring.
    pub fn is_hard(&self) -> bool {
        matches!(self.effect, TaintEffect::NoSchedule | TaintEffect::NoExecute)
    }
}

#[derive(Default, Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeSpec {
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub unschedulable: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub enum NodeConditionType {
    NodeReady,
    // taken from https://kubernetes.io/docs/reference/node/node-status/#condition
    DiskPressure,
    MemoryPressure,
    PIDPressure,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeCondition {
    // True, False or Unknown
    pub status: String,
    pub condition_type: NodeConditionType,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NodeStatus {
    // How much resources are available for pods, defaults to capacity.
    #[serde(default)]
    pub allocatable: RuntimeResources,
    // Total amount of resources
    pub capacity: RuntimeResources,
    // Upper bound on the number of pods bound to this node.
    #[serde(default = "default_max_pods")]
    pub max_pods: u32,
    #[serde(default)]
    pub conditions: Vec<NodeCondition>,
}

impl Default for NodeStatus {
    fn default() -> Self {
        Self {
            allocatable: Default::default(),
            capacity: Default::default(),
            max_pods: default_max_pods(),
            conditions: Default::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Node {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: NodeSpec,
    pub status: NodeStatus,
}

impl Node {
    pub fn update_condition(&mut self, status: String, condition_type: NodeConditionType) {
        let conditions = &mut self.status.conditions;
        match conditions
            .iter_mut()
            .find(|elem| elem.condition_type == condition_type)
        {
            Some(condition) => condition.status = status,
            None => {
                conditions.push(NodeCondition {
                    status,
                    condition_type,
                });
            }
        }
    }

    pub fn get_condition(&self, condition_type: NodeConditionType) -> Option<&NodeCondition> {
        self.status
            .conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// A node with no ready condition reported is treated as ready.
    pub fn is_ready(&self) -> bool {
        match self.get_condition(NodeConditionType::NodeReady) {
            Some(condition) => condition.status == "True",
            None => true,
        }
    }
}
