//! Trial scheduling of a pending pod batch against a cluster snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::core::pod::Pod;
use crate::core::predicate::{PredicateChecker, PredicateError};
use crate::core::scheduling::equivalence::EquivalenceCache;
use crate::core::scheduling::hints::Hints;
use crate::core::snapshot::{ClusterSnapshot, NodeInfo, SnapshotError};
use crate::metrics::collector::MetricsCollector;

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleVerdict {
    Scheduled { node_name: String },
    Unschedulable { reasons: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleStatus {
    pub pod_name: String,
    pub verdict: ScheduleVerdict,
}

impl ScheduleStatus {
    pub fn is_scheduled(&self) -> bool {
        matches!(self.verdict, ScheduleVerdict::Scheduled { .. })
    }
}

/// Node eligibility predicate admitting every node.
pub fn schedule_anywhere(_node_info: &NodeInfo) -> bool {
    true
}

/// Places pending pods one at a time, consulting the negative cache and the
/// hint table before falling back to a full scan in snapshot order. Every
/// successful placement mutates the snapshot, so later pods see the capacity
/// consumed by earlier ones.
pub struct HintingSimulator {
    checker: Box<dyn PredicateChecker>,
    hints: Hints,
    metrics: Rc<RefCell<MetricsCollector>>,
}

impl HintingSimulator {
    pub fn new(checker: Box<dyn PredicateChecker>, metrics: Rc<RefCell<MetricsCollector>>) -> Self {
        Self {
            checker,
            hints: Hints::new(),
            metrics,
        }
    }

    /// Tries to schedule each pod in input order. Returns one status per
    /// processed pod plus the number of controllers whose negative cache
    /// overflowed. With `break_on_failure` the batch stops at the first
    /// unschedulable pod and the remaining pods get no status at all.
    ///
    /// Only a snapshot inconsistency (a bind failing after the checker
    /// accepted the node) is an error; pods which fit nowhere are ordinary
    /// outcomes.
    pub fn try_schedule_pods<F>(
        &mut self,
        snapshot: &mut ClusterSnapshot,
        pods: &[Pod],
        is_node_eligible: F,
        break_on_failure: bool,
    ) -> Result<(Vec<ScheduleStatus>, usize), SnapshotError>
    where
        F: Fn(&NodeInfo) -> bool,
    {
        let mut cache = EquivalenceCache::new();
        let mut statuses = Vec::with_capacity(pods.len());

        for pod in pods {
            let verdict = self.schedule_one(snapshot, pod, &mut cache, &is_node_eligible)?;
            let failed = matches!(verdict, ScheduleVerdict::Unschedulable { .. });
            statuses.push(ScheduleStatus {
                pod_name: pod.metadata.name.clone(),
                verdict,
            });
            if failed && break_on_failure {
                debug!(
                    "pod {} is unschedulable, stopping the batch early",
                    pod.metadata.name
                );
                break;
            }
        }

        let overflow_count = cache.overflowing_controller_count();
        self.metrics.borrow_mut().overflowing_controllers = overflow_count as u64;
        Ok((statuses, overflow_count))
    }

    fn schedule_one<F>(
        &mut self,
        snapshot: &mut ClusterSnapshot,
        pod: &Pod,
        cache: &mut EquivalenceCache,
        is_node_eligible: &F,
    ) -> Result<ScheduleVerdict, SnapshotError>
    where
        F: Fn(&NodeInfo) -> bool,
    {
        self.metrics.borrow_mut().pods_processed += 1;

        if cache.is_known_unschedulable(pod) {
            debug!(
                "pod {} hit a cached negative result, skipping node scan",
                pod.metadata.name
            );
            let mut metrics = self.metrics.borrow_mut();
            metrics.equivalence_cache_hits += 1;
            metrics.pods_unschedulable += 1;
            return Ok(ScheduleVerdict::Unschedulable {
                reasons: vec!["cached negative result for an equivalent pod".to_string()],
            });
        }

        let mut checks: u64 = 0;
        if let Some(node_name) = self.try_hinted_node(snapshot, pod, is_node_eligible, &mut checks)
        {
            self.record_pod_checks(checks, true);
            self.metrics.borrow_mut().hint_hits += 1;
            debug!("scheduled pod {} on hinted node {}", pod.metadata.name, node_name);
            return Ok(ScheduleVerdict::Scheduled { node_name });
        }

        // Full scan in the snapshot's stable node order: first fit wins.
        let eligible: Vec<String> = snapshot
            .node_infos()
            .filter(|info| is_node_eligible(info))
            .map(|info| info.node.metadata.name.clone())
            .collect();

        let mut last_reasons = vec!["no eligible nodes to try".to_string()];
        let mut chosen: Option<String> = None;
        for node_name in &eligible {
            checks += 1;
            match self.checker.check_predicates(snapshot, pod, node_name) {
                Ok(()) => {
                    chosen = Some(node_name.clone());
                    break;
                }
                Err(err) => {
                    if let PredicateError::Internal { message } = &err {
                        warn!(
                            "checker failed on node {} for pod {}: {}",
                            node_name, pod.metadata.name, message
                        );
                    }
                    last_reasons = err.reasons();
                }
            }
        }

        match chosen {
            Some(node_name) => {
                // The checker accepted this node against the same snapshot
                // state, so a failing bind means the snapshot is corrupt.
                snapshot.add_pod(pod.clone(), &node_name)?;
                self.hints.set(pod, node_name.clone());
                self.record_pod_checks(checks, true);
                debug!("scheduled pod {} on node {}", pod.metadata.name, node_name);
                Ok(ScheduleVerdict::Scheduled { node_name })
            }
            None => {
                cache.mark_unschedulable(pod);
                self.record_pod_checks(checks, false);
                debug!(
                    "pod {} does not fit on any eligible node: {}",
                    pod.metadata.name,
                    last_reasons.join("; ")
                );
                Ok(ScheduleVerdict::Unschedulable {
                    reasons: last_reasons,
                })
            }
        }
    }

    /// Attempts the remembered node for this pod's class. Any miss, including
    /// a bind rejected by the snapshot, sends the pod to the full scan.
    fn try_hinted_node<F>(
        &mut self,
        snapshot: &mut ClusterSnapshot,
        pod: &Pod,
        is_node_eligible: &F,
        checks: &mut u64,
    ) -> Option<String>
    where
        F: Fn(&NodeInfo) -> bool,
    {
        let hinted = self.hints.get(pod)?;
        let node_info = snapshot.node_info(&hinted)?;
        if !is_node_eligible(node_info) {
            return None;
        }
        *checks += 1;
        if self.checker.check_predicates(snapshot, pod, &hinted).is_err() {
            return None;
        }
        if let Err(err) = snapshot.add_pod(pod.clone(), &hinted) {
            warn!(
                "hinted bind of pod {} to node {} failed: {}",
                pod.metadata.name, hinted, err
            );
            return None;
        }
        self.hints.set(pod, hinted.clone());
        Some(hinted)
    }

    /// Ages the hint table; placements older than two runs stop being tried.
    pub fn drop_old_hints(&mut self) {
        self.hints.drop_old();
    }

    fn record_pod_checks(&self, checks: u64, scheduled: bool) {
        let mut metrics = self.metrics.borrow_mut();
        metrics.predicate_checks_total += checks;
        metrics.increment_predicate_checks_per_pod(checks as f64);
        if scheduled {
            metrics.pods_scheduled += 1;
        } else {
            metrics.pods_unschedulable += 1;
        }
    }
}
