//! Admissibility checking: can this pod run on that node right now?

use thiserror::Error;

use crate::core::filter::{FilterPlugin, FILTER_REGISTRY};
use crate::core::pod::Pod;
use crate::core::snapshot::ClusterSnapshot;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredicateError {
    #[error("pod cannot be placed: {}", reasons.join("; "))]
    Unschedulable { reasons: Vec<String> },
    #[error("predicate checker failure: {message}")]
    Internal { message: String },
}

impl PredicateError {
    /// Human-readable reasons, usable for both variants.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            PredicateError::Unschedulable { reasons } => reasons.clone(),
            PredicateError::Internal { message } => vec![message.clone()],
        }
    }
}

/// Decides whether a node can admit a pod given the current snapshot state.
/// Implementations must not mutate anything; two calls with the same
/// arguments give the same verdict.
pub trait PredicateChecker {
    fn check_predicates(
        &self,
        snapshot: &ClusterSnapshot,
        pod: &Pod,
        node_name: &str,
    ) -> Result<(), PredicateError>;
}

/// Runs a configured chain of named filter plugins, failing on the first
/// rejection. Filter names are resolved against the registry up front so a
/// typo fails construction instead of every check.
pub struct BasicPredicateChecker {
    filters: Vec<&'static dyn FilterPlugin>,
}

impl BasicPredicateChecker {
    pub fn new(filter_names: &[String]) -> Result<Self, PredicateError> {
        let mut filters = Vec::with_capacity(filter_names.len());
        for name in filter_names {
            match FILTER_REGISTRY.get(name.as_str()) {
                Some(plugin) => filters.push(plugin.as_ref()),
                None => {
                    return Err(PredicateError::Internal {
                        message: format!("unknown filter plugin {:?}", name),
                    })
                }
            }
        }
        Ok(Self { filters })
    }
}

impl PredicateChecker for BasicPredicateChecker {
    fn check_predicates(
        &self,
        snapshot: &ClusterSnapshot,
        pod: &Pod,
        node_name: &str,
    ) -> Result<(), PredicateError> {
        let node_info = snapshot.node_info(node_name).ok_or_else(|| {
            PredicateError::Internal {
                message: format!("node {} not present in snapshot", node_name),
            }
        })?;
        for filter in &self.filters {
            if let Err(reason) = filter.filter(pod, node_info) {
                return Err(PredicateError::Unschedulable {
                    reasons: vec![reason],
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_filters;
    use crate::test_util::helpers::{build_test_node, build_test_pod};

    #[test]
    fn test_unknown_filter_fails_construction() {
        let result = BasicPredicateChecker::new(&["NoSuchFilter".to_string()]);
        assert!(matches!(result, Err(PredicateError::Internal { .. })));
    }

    #[test]
    fn test_default_chain_accepts_fitting_pod() {
        let checker = BasicPredicateChecker::new(&default_filters()).unwrap();
        let mut snapshot = ClusterSnapshot::new();
        snapshot.add_node(build_test_node("n1", 1000, 1000)).unwrap();

        let pod = build_test_pod("p", 500, 500);
        assert!(checker.check_predicates(&snapshot, &pod, "n1").is_ok());
    }

    #[test]
    fn test_first_rejection_wins() {
        let checker = BasicPredicateChecker::new(&default_filters()).unwrap();
        let mut snapshot = ClusterSnapshot::new();
        let mut node = build_test_node("n1", 1000, 1000);
        node.spec.unschedulable = true;
        snapshot.add_node(node).unwrap();

        let err = checker
            .check_predicates(&snapshot, &build_test_pod("p", 5000, 5000), "n1")
            .unwrap_err();
        // Fit runs before NodeUnschedulable in the default chain
        assert_eq!(
            err.reasons(),
            vec!["insufficient cpu".to_string()]
        );
    }

    #[test]
    fn test_unknown_node_is_internal_error() {
        let checker = BasicPredicateChecker::new(&default_filters()).unwrap();
        let snapshot = ClusterSnapshot::new();
        let err = checker
            .check_predicates(&snapshot, &build_test_pod("p", 1, 1), "ghost")
            .unwrap_err();
        assert!(matches!(err, PredicateError::Internal { .. }));
    }
}
