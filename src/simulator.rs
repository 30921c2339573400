//! Represents entry point for the simulation and wires its components.

use log::info;
use std::time::Instant;
use std::{cell::RefCell, rc::Rc};

use thiserror::Error;

use crate::config::SimulationConfig;
use crate::core::predicate::{BasicPredicateChecker, PredicateError};
use crate::core::scheduling::hinting_simulator::{
    schedule_anywhere, HintingSimulator, ScheduleStatus,
};
use crate::core::snapshot::{ClusterSnapshot, NodeInfo, SnapshotError};
use crate::metrics::collector::MetricsCollector;
use crate::state::{ClusterState, WorkloadBatch};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid cluster state: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("invalid filter chain: {0}")]
    FilterChain(#[from] PredicateError),
}

/// Drives one simulation: builds the snapshot from the cluster state plus the
/// configured default cluster, then trial-schedules pending batches against
/// it. Batches run back to back over the same snapshot, so placements
/// accumulate.
pub struct SchedulingSimulation {
    config: Rc<SimulationConfig>,
    pub snapshot: ClusterSnapshot,
    pub metrics_collector: Rc<RefCell<MetricsCollector>>,
}

impl SchedulingSimulation {
    pub fn new(config: Rc<SimulationConfig>) -> Self {
        info!(
            "Creating scheduling simulation {:?} with config: {:?}",
            config.sim_name, config
        );
        Self {
            config,
            snapshot: ClusterSnapshot::new(),
            metrics_collector: Rc::new(RefCell::new(MetricsCollector::new())),
        }
    }

    /// Populates the snapshot: cluster-state nodes, then default-cluster node
    /// groups, then the already-running pods bound to their nodes.
    pub fn initialize(&mut self, cluster_state: ClusterState) -> Result<(), SimulationError> {
        self.snapshot.clear();
        for node in cluster_state.nodes {
            self.snapshot.add_node(node)?;
        }
        self.initialize_default_cluster()?;
        for pod in cluster_state.pods {
            let node_name = match pod.target_node() {
                Some(name) => name.to_string(),
                None => {
                    return Err(SnapshotError::InvalidBinding {
                        pod_name: pod.metadata.name.clone(),
                        reason: "no assigned or nominated node".to_string(),
                    }
                    .into())
                }
            };
            self.snapshot.add_pod(pod, &node_name)?;
        }
        self.metrics_collector.borrow_mut().total_nodes = self.snapshot.node_count() as u64;
        info!(
            "Initialized snapshot with {} nodes and {} bound pods",
            self.snapshot.node_count(),
            self.snapshot.pod_count()
        );
        Ok(())
    }

    pub fn initialize_default_cluster(&mut self) -> Result<(), SimulationError> {
        if self.config.default_cluster.is_none()
            || self.config.default_cluster.as_ref().unwrap().is_empty()
        {
            return Ok(());
        }
        let mut total_nodes = 0;
        for node_group in self
            .config
            .default_cluster
            .as_ref()
            .unwrap()
            .clone()
            .into_iter()
        {
            let name_prefix: String;
            let node_count_in_group = node_group.node_count.unwrap_or(1);

            if node_count_in_group == 1 && !node_group.node_template.metadata.name.is_empty() {
                // use name prefix as-is without suffix
                self.snapshot.add_node(node_group.node_template)?;
                continue;
            } else if !node_group.node_template.metadata.name.is_empty() {
                name_prefix = node_group.node_template.metadata.name.clone();
            } else {
                name_prefix = "default_node".to_string();
            }

            for _ in 0..node_count_in_group {
                let mut node = node_group.node_template.clone();
                node.metadata.name = format!("{}_{}", name_prefix, total_nodes);
                self.snapshot.add_node(node)?;
                total_nodes += 1;
            }
        }
        Ok(())
    }

    /// Schedules the batch with every node eligible.
    pub fn run(
        &mut self,
        batch: &WorkloadBatch,
    ) -> Result<(Vec<ScheduleStatus>, usize), SimulationError> {
        self.run_matching(batch, schedule_anywhere)
    }

    /// Schedules the batch considering only nodes accepted by the predicate,
    /// e.g. the nodes of one group when sizing a scale-up.
    pub fn run_matching<F>(
        &mut self,
        batch: &WorkloadBatch,
        is_node_eligible: F,
    ) -> Result<(Vec<ScheduleStatus>, usize), SimulationError>
    where
        F: Fn(&NodeInfo) -> bool,
    {
        let checker = BasicPredicateChecker::new(&self.config.filters)?;
        let mut simulator =
            HintingSimulator::new(Box::new(checker), self.metrics_collector.clone());

        self.metrics_collector.borrow_mut().total_pending_pods += batch.pods.len() as u64;

        let t = Instant::now();
        let result = simulator.try_schedule_pods(
            &mut self.snapshot,
            &batch.pods,
            is_node_eligible,
            self.config.break_on_first_failure,
        )?;
        let duration = t.elapsed().as_secs_f64();
        info!(
            "Processed {} pods in {:.2?}s ({:.0} pods/s)",
            result.0.len(),
            duration,
            result.0.len() as f64 / duration
        );

        Ok(result)
    }
}
