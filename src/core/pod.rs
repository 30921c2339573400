//! Type definitions for pod primitives in the cluster model

use serde::{Deserialize, Serialize};

use crate::core::common::{ObjectMeta, OwnerReference, RuntimeResources};
use crate::core::node::{Taint, TaintEffect};

#[derive(Default, Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct Resources {
    #[serde(default)]
    pub limits: RuntimeResources,
    #[serde(default)]
    pub requests: RuntimeResources,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct VolumeMount {
    pub name: String,
    #[serde(default)]
    pub mount_path: String,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub enum VolumeSource {
    EmptyDir,
    HostPath { path: String },
    ConfigMap { name: String },
    Secret { name: String },
    // Service account tokens and the like, injected by admission rather than
    // authored in the workload template.
    Projected,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct Volume {
    pub name: String,
    pub source: VolumeSource,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub resources: Resources,
    #[serde(default)]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum TolerationOperator {
    Equal,
    Exists,
}

impl Default for TolerationOperator {
    fn default() -> Self {
        TolerationOperator::Equal
    }
}

#[derive(Default, Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct Toleration {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub operator: TolerationOperator,
    #[serde(default)]
    pub value: String,
    // None tolerates the taint regardless of its effect.
    #[serde(default)]
    pub effect: Option<TaintEffect>,
}

impl Toleration {
    /// An empty key with the Exists operator matches every taint.
    pub fn tolerates(&self, taint: &Taint) -> bool {
        if let Some(effect) = self.effect {
            if effect != taint.effect {
                return false;
            }
        }
        if !self.key.is_empty() && self.key != taint.key {
            return false;
        }
        match self.operator {
            TolerationOperator::Equal => self.value == taint.value,
            TolerationOperator::Exists => true,
        }
    }
}

#[derive(Default, Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct PodSpec {
    pub containers: Vec<Container>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub node_selector: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    #[serde(default)]
    pub hostname: Option<String>,
    // Explicit node assignment, set once the pod is bound.
    #[serde(default)]
    pub node_name: Option<String>,
}

#[derive(Default, Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct PodStatus {
    // Node chosen by a scheduling pass which has not bound the pod yet.
    #[serde(default)]
    pub nominated_node_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
    #[serde(default)]
    pub status: PodStatus,
}

impl Pod {
    /// Total resources requested across all containers.
    pub fn requests(&self) -> RuntimeResources {
        let mut total = RuntimeResources::default();
        for container in &self.spec.containers {
            total.cpu += container.resources.requests.cpu;
            total.ram += container.resources.requests.ram;
        }
        total
    }

    pub fn controller_ref(&self) -> Option<&OwnerReference> {
        self.metadata.controller_ref()
    }

    pub fn is_daemon_set_pod(&self) -> bool {
        self.controller_ref()
            .map_or(false, |r| r.kind == "DaemonSet")
    }

    /// Node this pod is already placed on: the explicit assignment if set,
    /// otherwise the node nominated for it.
    pub fn target_node(&self) -> Option<&str> {
        self.spec
            .node_name
            .as_deref()
            .or(self.status.nominated_node_name.as_deref())
    }
}
