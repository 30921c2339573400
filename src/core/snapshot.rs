//! In-memory model of cluster capacity which scheduling trials mutate freely.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::core::common::RuntimeResources;
use crate::core::node::Node;
use crate::core::pod::Pod;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("node {0} is already present in the snapshot")]
    DuplicateNode(String),
    #[error("node {0} not found in the snapshot")]
    UnknownNode(String),
    #[error("cannot bind pod {pod_name}: {reason}")]
    InvalidBinding { pod_name: String, reason: String },
    #[error("no forked snapshot to {0}")]
    NoForkedSnapshot(&'static str),
}

/// A node together with the pods bound to it and their aggregated requests.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub node: Node,
    pub pods: Vec<Pod>,
    pub requested: RuntimeResources,
}

impl NodeInfo {
    fn new(node: Node) -> Self {
        Self {
            node,
            pods: Default::default(),
            requested: Default::default(),
        }
    }

    pub fn pod_count(&self) -> usize {
        self.pods.len()
    }

    /// Allocatable resources not yet claimed by bound pods. Never negative:
    /// an overcommitted node reports zero.
    pub fn free(&self) -> RuntimeResources {
        let allocatable = &self.node.status.allocatable;
        RuntimeResources {
            cpu: allocatable.cpu.saturating_sub(self.requested.cpu),
            ram: allocatable.ram.saturating_sub(self.requested.ram),
        }
    }
}

/// Forkable cluster state. All reads and writes address the most recent
/// generation; `fork` opens a new one and `revert`/`commit` close it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSnapshot {
    generations: Vec<BTreeMap<String, NodeInfo>>,
}

impl Default for ClusterSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterSnapshot {
    pub fn new() -> Self {
        Self {
            generations: vec![Default::default()],
        }
    }

    fn top(&self) -> &BTreeMap<String, NodeInfo> {
        self.generations.last().unwrap()
    }

    fn top_mut(&mut self) -> &mut BTreeMap<String, NodeInfo> {
        self.generations.last_mut().unwrap()
    }

    /// Drops all nodes, pods and forked generations.
    pub fn clear(&mut self) {
        self.generations = vec![Default::default()];
    }

    pub fn add_node(&mut self, mut node: Node) -> Result<(), SnapshotError> {
        let name = node.metadata.name.clone();
        if self.top().contains_key(&name) {
            return Err(SnapshotError::DuplicateNode(name));
        }
        if node.status.allocatable == Default::default() {
            node.status.allocatable = node.status.capacity;
        }
        self.top_mut().insert(name, NodeInfo::new(node));
        Ok(())
    }

    /// Binds a pod to the named node. The snapshot is left untouched on error.
    pub fn add_pod(&mut self, mut pod: Pod, node_name: &str) -> Result<(), SnapshotError> {
        if node_name.is_empty() {
            return Err(SnapshotError::InvalidBinding {
                pod_name: pod.metadata.name.clone(),
                reason: "empty node name".to_string(),
            });
        }
        let node_info = self
            .top_mut()
            .get_mut(node_name)
            .ok_or_else(|| SnapshotError::UnknownNode(node_name.to_string()))?;
        let requests = pod.requests();
        pod.spec.node_name = Some(node_name.to_string());
        node_info.requested.cpu += requests.cpu;
        node_info.requested.ram += requests.ram;
        node_info.pods.push(pod);
        Ok(())
    }

    /// Rebuilds the snapshot from a cluster state: all nodes first, then every
    /// already-running pod bound to its assigned node, falling back to the
    /// node nominated for it. A pod with neither is a corrupt input and fails
    /// the whole initialization.
    pub fn initialize(&mut self, nodes: Vec<Node>, pods: Vec<Pod>) -> Result<(), SnapshotError> {
        self.clear();
        for node in nodes {
            self.add_node(node)?;
        }
        for pod in pods {
            let node_name = match pod.target_node() {
                Some(name) => name.to_string(),
                None => {
                    return Err(SnapshotError::InvalidBinding {
                        pod_name: pod.metadata.name.clone(),
                        reason: "no assigned or nominated node".to_string(),
                    })
                }
            };
            self.add_pod(pod, &node_name)?;
        }
        Ok(())
    }

    /// Opens a new generation; subsequent mutations are invisible to the
    /// parent until committed.
    pub fn fork(&mut self) {
        let top = self.top().clone();
        self.generations.push(top);
    }

    /// Discards the current generation, restoring the state as of `fork`.
    pub fn revert(&mut self) -> Result<(), SnapshotError> {
        if self.generations.len() == 1 {
            return Err(SnapshotError::NoForkedSnapshot("revert"));
        }
        self.generations.pop();
        Ok(())
    }

    /// Collapses the current generation into its parent, keeping mutations.
    pub fn commit(&mut self) -> Result<(), SnapshotError> {
        if self.generations.len() == 1 {
            return Err(SnapshotError::NoForkedSnapshot("commit"));
        }
        let top = self.generations.pop().unwrap();
        *self.generations.last_mut().unwrap() = top;
        Ok(())
    }

    pub fn node_info(&self, name: &str) -> Option<&NodeInfo> {
        self.top().get(name)
    }

    /// Node infos in stable name order, so repeated scans visit nodes
    /// identically.
    pub fn node_infos(&self) -> impl Iterator<Item = &NodeInfo> {
        self.top().values()
    }

    pub fn node_count(&self) -> usize {
        self.top().len()
    }

    pub fn pod_count(&self) -> usize {
        self.top().values().map(|info| info.pods.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::helpers::{build_test_node, build_test_pod};

    #[test]
    fn test_free_saturates_at_zero() {
        let mut snapshot = ClusterSnapshot::new();
        snapshot.add_node(build_test_node("n1", 1000, 1000)).unwrap();
        snapshot
            .add_pod(build_test_pod("heavy", 5000, 5000), "n1")
            .unwrap();
        let free = snapshot.node_info("n1").unwrap().free();
        assert_eq!(free, RuntimeResources { cpu: 0, ram: 0 });
    }

    #[test]
    fn test_fork_isolates_mutations_until_commit() {
        let mut snapshot = ClusterSnapshot::new();
        snapshot.add_node(build_test_node("n1", 1000, 1000)).unwrap();

        snapshot.fork();
        snapshot.add_pod(build_test_pod("p1", 100, 100), "n1").unwrap();
        assert_eq!(snapshot.pod_count(), 1);

        snapshot.revert().unwrap();
        assert_eq!(snapshot.pod_count(), 0);

        snapshot.fork();
        snapshot.add_pod(build_test_pod("p1", 100, 100), "n1").unwrap();
        snapshot.commit().unwrap();
        assert_eq!(snapshot.pod_count(), 1);
    }

    #[test]
    fn test_revert_without_fork_fails() {
        let mut snapshot = ClusterSnapshot::new();
        assert_eq!(
            snapshot.revert(),
            Err(SnapshotError::NoForkedSnapshot("revert"))
        );
        assert_eq!(
            snapshot.commit(),
            Err(SnapshotError::NoForkedSnapshot("commit"))
        );
    }

    #[test]
    fn test_node_infos_iterate_in_name_order() {
        let mut snapshot = ClusterSnapshot::new();
        for name in ["zeta", "alpha", "mid"] {
            snapshot.add_node(build_test_node(name, 1000, 1000)).unwrap();
        }
        let names: Vec<&str> = snapshot
            .node_infos()
            .map(|info| info.node.metadata.name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
