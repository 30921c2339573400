//! Negative-result cache over equivalence classes of controller-managed pods.
//!
//! A pod which could not be placed anywhere makes its whole equivalence class
//! (same controller, same labels, same sanitized spec) known-unschedulable,
//! so a batch of hundreds of replicas pays the full scan cost once.

use std::collections::{HashMap, HashSet};

use crate::core::pod::{Pod, PodSpec, VolumeSource};

/// Signature cap per controller. Past it the controller is flagged as
/// overflowing and no further signatures are stored.
pub const MAX_CLASSES_PER_CONTROLLER: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceClass {
    labels: HashMap<String, String>,
    spec: PodSpec,
}

impl EquivalenceClass {
    fn of(pod: &Pod) -> Self {
        Self {
            labels: pod.metadata.labels.clone(),
            spec: sanitize_pod_spec(pod.spec.clone()),
        }
    }

    /// Labels must be exactly equal; specs are compared after sanitization.
    pub fn matches(&self, pod: &Pod) -> bool {
        self.labels == pod.metadata.labels && self.spec == sanitize_pod_spec(pod.spec.clone())
    }
}

/// Strips spec fields injected per pod rather than authored per workload, so
/// replicas of one controller collapse into one signature: projected volumes
/// (and the mounts referring to them) and the per-pod hostname.
pub fn sanitize_pod_spec(mut spec: PodSpec) -> PodSpec {
    drop_projected_volumes_and_mounts(&mut spec);
    spec.hostname = None;
    spec
}

fn drop_projected_volumes_and_mounts(spec: &mut PodSpec) {
    let projected: HashSet<&str> = spec
        .volumes
        .iter()
        .filter(|v| matches!(v.source, VolumeSource::Projected))
        .map(|v| v.name.as_str())
        .collect();
    if projected.is_empty() {
        return;
    }
    let projected: HashSet<String> = projected.into_iter().map(str::to_string).collect();
    spec.volumes
        .retain(|v| !matches!(v.source, VolumeSource::Projected));
    for container in &mut spec.containers {
        container
            .volume_mounts
            .retain(|mount| !projected.contains(&mount.name));
    }
}

#[derive(Debug, Default)]
pub struct EquivalenceCache {
    classes: HashMap<String, Vec<EquivalenceClass>>,
    overflowing: HashSet<String>,
}

impl EquivalenceCache {
    pub fn new() -> Self {
        Default::default()
    }

    /// True when a pod of the same equivalence class already failed to place.
    /// Pods without a controller reference are never cached, so always false.
    pub fn is_known_unschedulable(&self, pod: &Pod) -> bool {
        let controller = match pod.controller_ref() {
            Some(controller) => controller,
            None => return false,
        };
        match self.classes.get(&controller.uid) {
            Some(classes) => classes.iter().any(|class| class.matches(pod)),
            None => false,
        }
    }

    /// Records the pod's equivalence class as unschedulable. Skips pods with
    /// no controller and daemon set pods, whose placement is per-node rather
    /// than per-class.
    pub fn mark_unschedulable(&mut self, pod: &Pod) {
        let controller = match pod.controller_ref() {
            Some(controller) => controller,
            None => return,
        };
        if pod.is_daemon_set_pod() {
            return;
        }
        let classes = self.classes.entry(controller.uid.clone()).or_default();
        if classes.len() >= MAX_CLASSES_PER_CONTROLLER {
            self.overflowing.insert(controller.uid.clone());
            return;
        }
        classes.push(EquivalenceClass::of(pod));
    }

    /// Controllers which hit the signature cap. A high count means the cache
    /// is ineffective for this workload shape.
    pub fn overflowing_controller_count(&self) -> usize {
        self.overflowing.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pod::{Volume, VolumeMount};
    use crate::test_util::helpers::{build_test_pod, with_controller};

    #[test]
    fn test_pod_without_controller_is_never_cached() {
        let mut cache = EquivalenceCache::new();
        let pod = build_test_pod("standalone", 100, 100);
        cache.mark_unschedulable(&pod);
        assert!(!cache.is_known_unschedulable(&pod));
    }

    #[test]
    fn test_replicas_share_negative_result() {
        let mut cache = EquivalenceCache::new();
        let first = with_controller(build_test_pod("rs-a", 100, 100), "ReplicaSet", "rs-uid");
        let second = with_controller(build_test_pod("rs-b", 100, 100), "ReplicaSet", "rs-uid");

        assert!(!cache.is_known_unschedulable(&first));
        cache.mark_unschedulable(&first);
        assert!(cache.is_known_unschedulable(&second));
    }

    #[test]
    fn test_label_difference_splits_classes() {
        let mut cache = EquivalenceCache::new();
        let plain = with_controller(build_test_pod("rs-a", 100, 100), "ReplicaSet", "rs-uid");
        let mut labeled = with_controller(build_test_pod("rs-b", 100, 100), "ReplicaSet", "rs-uid");
        labeled
            .metadata
            .labels
            .insert("canary".to_string(), "true".to_string());

        cache.mark_unschedulable(&plain);
        assert!(!cache.is_known_unschedulable(&labeled));
    }

    #[test]
    fn test_projected_volumes_and_hostname_are_ignored() {
        let mut cache = EquivalenceCache::new();
        let base = with_controller(build_test_pod("rs-a", 100, 100), "ReplicaSet", "rs-uid");

        let mut decorated = with_controller(build_test_pod("rs-a", 100, 100), "ReplicaSet", "rs-uid");
        decorated.spec.hostname = Some("rs-a-host".to_string());
        decorated.spec.volumes.push(Volume {
            name: "kube-api-access".to_string(),
            source: VolumeSource::Projected,
        });
        decorated.spec.containers[0].volume_mounts.push(VolumeMount {
            name: "kube-api-access".to_string(),
            mount_path: "/var/run/secrets".to_string(),
        });

        cache.mark_unschedulable(&base);
        assert!(cache.is_known_unschedulable(&decorated));
    }

    #[test]
    fn test_non_projected_volume_differences_matter() {
        let mut cache = EquivalenceCache::new();
        let base = with_controller(build_test_pod("rs-a", 100, 100), "ReplicaSet", "rs-uid");

        let mut with_volume = with_controller(build_test_pod("rs-a", 100, 100), "ReplicaSet", "rs-uid");
        with_volume.spec.volumes.push(Volume {
            name: "data".to_string(),
            source: VolumeSource::EmptyDir,
        });

        cache.mark_unschedulable(&base);
        assert!(!cache.is_known_unschedulable(&with_volume));
    }

    #[test]
    fn test_daemon_set_pods_are_not_cached() {
        let mut cache = EquivalenceCache::new();
        let pod = with_controller(build_test_pod("ds-a", 100, 100), "DaemonSet", "ds-uid");
        cache.mark_unschedulable(&pod);
        assert!(!cache.is_known_unschedulable(&pod));
    }

    #[test]
    fn test_controller_overflows_at_cap() {
        let mut cache = EquivalenceCache::new();
        for i in 0..MAX_CLASSES_PER_CONTROLLER {
            let pod = with_controller(
                build_test_pod(&format!("rs-{}", i), 100 + i as u32, 100),
                "ReplicaSet",
                "rs-uid",
            );
            cache.mark_unschedulable(&pod);
        }
        assert_eq!(cache.overflowing_controller_count(), 0);

        let overflow = with_controller(build_test_pod("rs-extra", 9999, 100), "ReplicaSet", "rs-uid");
        cache.mark_unschedulable(&overflow);
        assert_eq!(cache.overflowing_controller_count(), 1);
        // the signature was not stored
        assert!(!cache.is_known_unschedulable(&overflow));
        // previously stored signatures are still live
        let known = with_controller(build_test_pod("rs-0", 100, 100), "ReplicaSet", "rs-uid");
        assert!(cache.is_known_unschedulable(&known));
    }
}
