//! Config fields definitions for the scheduling simulation

use serde::Deserialize;

use crate::core::node::Node;

use crate::metrics::printer::MetricsPrinterConfig;

/// Filter plugins the admissibility checker runs when the config names none.
pub fn default_filters() -> Vec<String> {
    [
        "Fit",
        "MatchNodeSelector",
        "TaintToleration",
        "NodeUnschedulable",
        "NodeReady",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub sim_name: String,
    /// If not set default output of logs is stdout/stderr
    pub logs_filepath: Option<String>,
    /// Filter plugin chain for the admissibility checker, applied in order.
    #[serde(default = "default_filters")]
    pub filters: Vec<String>,
    /// Stop the batch at the first unschedulable pod instead of evaluating
    /// the remaining ones.
    #[serde(default)]
    pub break_on_first_failure: bool,
    pub metrics_printer: Option<MetricsPrinterConfig>,
    pub default_cluster: Option<Vec<NodeGroup>>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NodeGroup {
    // If node count is not none and node's metadata has name, then it's taken as a prefix of all nodes
    // in a group.
    // If node count is none or 1 and node's metadata has name, then it's a single node and its name is set
    // to metadata name.
    // If metadata has got no name, then prefix default_node(_<idx>)? is used.
    pub node_count: Option<u64>,
    pub node_template: Node,
}
