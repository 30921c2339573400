//! Filter plugins deciding whether a single node can admit a pod.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::core::pod::Pod;
use crate::core::snapshot::NodeInfo;

/// Checks one pod against one node. `Err` carries the rejection reason.
pub trait FilterPlugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn filter(&self, pod: &Pod, node_info: &NodeInfo) -> Result<(), String>;
}

lazy_static! {
    pub static ref FILTER_REGISTRY: HashMap<&'static str, Box<dyn FilterPlugin>> = {
        let plugins: Vec<Box<dyn FilterPlugin>> = vec![
            Box::new(Fit {}),
            Box::new(MatchNodeSelector {}),
            Box::new(TaintToleration {}),
            Box::new(NodeUnschedulable {}),
            Box::new(NodeReady {}),
        ];
        plugins.into_iter().map(|p| (p.name(), p)).collect()
    };
}

// Fit checks that the node has enough free cpu and ram for the pod's requests
// and has not reached its pod count ceiling.
pub struct Fit {}
impl FilterPlugin for Fit {
    fn name(&self) -> &'static str {
        "Fit"
    }

    fn filter(&self, pod: &Pod, node_info: &NodeInfo) -> Result<(), String> {
        if node_info.pod_count() + 1 > node_info.node.status.max_pods as usize {
            return Err("too many pods".to_string());
        }
        let requests = pod.requests();
        let free = node_info.free();
        if requests.cpu > free.cpu {
            return Err("insufficient cpu".to_string());
        }
        if requests.ram > free.ram {
            return Err("insufficient ram".to_string());
        }
        Ok(())
    }
}

// MatchNodeSelector requires every selector entry to be present verbatim in
// the node's labels. An empty selector matches any node.
pub struct MatchNodeSelector {}
impl FilterPlugin for MatchNodeSelector {
    fn name(&self) -> &'static str {
        "MatchNodeSelector"
    }

    fn filter(&self, pod: &Pod, node_info: &NodeInfo) -> Result<(), String> {
        let labels = &node_info.node.metadata.labels;
        for (key, value) in &pod.spec.node_selector {
            if labels.get(key) != Some(value) {
                return Err("node selector mismatch".to_string());
            }
        }
        Ok(())
    }
}

// TaintToleration rejects nodes carrying a hard taint the pod does not
// tolerate. PreferNoSchedule taints are advisory and never filter.
pub struct TaintToleration {}
impl FilterPlugin for TaintToleration {
    fn name(&self) -> &'static str {
        "TaintToleration"
    }

    fn filter(&self, pod: &Pod, node_info: &NodeInfo) -> Result<(), String> {
        for taint in &node_info.node.spec.taints {
            if !taint.is_hard() {
                continue;
            }
            if !pod.spec.tolerations.iter().any(|t| t.tolerates(taint)) {
                return Err(format!("untolerated taint {}", taint.key));
            }
        }
        Ok(())
    }
}

pub struct NodeUnschedulable {}
impl FilterPlugin for NodeUnschedulable {
    fn name(&self) -> &'static str {
        "NodeUnschedulable"
    }

    fn filter(&self, _pod: &Pod, node_info: &NodeInfo) -> Result<(), String> {
        if node_info.node.spec.unschedulable {
            return Err("node is unschedulable".to_string());
        }
        Ok(())
    }
}

pub struct NodeReady {}
impl FilterPlugin for NodeReady {
    fn name(&self) -> &'static str {
        "NodeReady"
    }

    fn filter(&self, _pod: &Pod, node_info: &NodeInfo) -> Result<(), String> {
        if !node_info.node.is_ready() {
            return Err("node is not ready".to_string());
        }
        Ok(())
    }
}
