//! Implements centralized storage for metrics. Any component may access this component to
//! report metrics about the scheduling trial.

use average::{concatenate, Estimate, Max, Mean, Min, Variance};

concatenate!(
    Estimator,
    [Min, min],
    [Max, max],
    [Mean, mean],
    [Variance, population_variance]
);

#[derive(Debug, Default)]
pub struct EstimatorWrapper {
    estimator: Estimator,
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("mean", &self.mean)
            .field("population_variance", &self.population_variance)
            .finish()
    }
}

impl EstimatorWrapper {
    pub fn new() -> Self {
        Self {
            estimator: Estimator::new(),
        }
    }

    pub fn add(&mut self, value: f64) {
        self.estimator.add(value);
    }

    pub fn min(&self) -> f64 {
        self.estimator.min()
    }

    pub fn max(&self) -> f64 {
        self.estimator.max()
    }

    pub fn mean(&self) -> f64 {
        self.estimator.mean()
    }

    pub fn population_variance(&self) -> f64 {
        self.estimator.population_variance()
    }
}

impl PartialEq for EstimatorWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.min() == other.min()
            && self.max() == other.max()
            && self.mean() == other.mean()
            && self.population_variance() == other.population_variance()
    }
}

#[derive(Default)]
pub struct MetricsCollector {
    /// The number of nodes in the snapshot. Calculated before the trial starts.
    pub total_nodes: u64,
    /// The number of pending pods handed to the trial. Calculated before the trial starts.
    pub total_pending_pods: u64,
    /// The number of pods the trial actually processed. Smaller than
    /// `total_pending_pods` when the batch stops on a failure.
    pub pods_processed: u64,
    /// The number of pods which got a node assigned.
    pub pods_scheduled: u64,
    /// The number of pods which fit no eligible node, including cached negatives.
    pub pods_unschedulable: u64,
    /// The number of pods placed via the hint table without a full node scan.
    pub hint_hits: u64,
    /// The number of pods rejected straight from the negative cache.
    pub equivalence_cache_hits: u64,
    /// Controllers whose negative cache overflowed during the last trial.
    pub overflowing_controllers: u64,
    /// Admissibility checks issued across the whole batch.
    pub predicate_checks_total: u64,

    /// Estimations for the number of admissibility checks spent per pod.
    pub predicate_checks_per_pod_stats: EstimatorWrapper,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn increment_predicate_checks_per_pod(&mut self, value: f64) {
        self.predicate_checks_per_pod_stats.add(value);
    }
}
