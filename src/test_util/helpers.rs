//! Builders for nodes, pods and configs used across unit and integration tests.

use std::collections::HashMap;

use crate::config::SimulationConfig;
use crate::core::common::{ObjectMeta, OwnerReference, RuntimeResources};
use crate::core::node::{Node, NodeConditionType, NodeStatus, Taint};
use crate::core::pod::{Container, Pod, PodSpec, Resources};

pub fn build_test_node(name: &str, cpu: u32, ram: u64) -> Node {
    Node {
        metadata: ObjectMeta {
            name: name.to_string(),
            labels: HashMap::from([("name".to_string(), name.to_string())]),
            ..Default::default()
        },
        spec: Default::default(),
        status: NodeStatus {
            capacity: RuntimeResources { cpu, ram },
            max_pods: 100,
            ..Default::default()
        },
    }
}

/// Single-container pod in the default namespace, uid equal to its name.
/// Pods built with equal resources differ only in metadata, so replicas of
/// one controller share an equivalence class.
pub fn build_test_pod(name: &str, cpu: u32, ram: u64) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: name.to_string(),
            namespace: "default".to_string(),
            uid: name.to_string(),
            ..Default::default()
        },
        spec: PodSpec {
            containers: vec![Container {
                name: "main".to_string(),
                resources: Resources {
                    requests: RuntimeResources { cpu, ram },
                    limits: RuntimeResources { cpu, ram },
                },
                volume_mounts: Default::default(),
            }],
            ..Default::default()
        },
        status: Default::default(),
    }
}

pub fn build_scheduled_pod(name: &str, cpu: u32, ram: u64, node_name: &str) -> Pod {
    let mut pod = build_test_pod(name, cpu, ram);
    pod.spec.node_name = Some(node_name.to_string());
    pod
}

/// Marking a node not ready also attaches the not-ready taint, the same way
/// the node lifecycle controller does.
pub fn set_node_ready(node: &mut Node, ready: bool) {
    if ready {
        node.update_condition("True".to_string(), NodeConditionType::NodeReady);
    } else {
        node.update_condition("False".to_string(), NodeConditionType::NodeReady);
        node.spec.taints.push(Taint::not_ready());
    }
}

pub fn with_controller(mut pod: Pod, kind: &str, uid: &str) -> Pod {
    pod.metadata.owner_references = vec![OwnerReference {
        kind: kind.to_string(),
        name: uid.to_string(),
        uid: uid.to_string(),
        controller: true,
    }];
    pod
}

pub fn default_test_simulation_config(with_suffix: Option<&str>) -> SimulationConfig {
    let mut default = r#"
    sim_name: "test_schedsim"
    "#
    .to_string();

    if !with_suffix.is_none() {
        default.push_str(with_suffix.unwrap());
    }

    serde_yaml::from_str::<SimulationConfig>(&default).unwrap()
}
