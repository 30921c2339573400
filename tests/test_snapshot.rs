use schedsim::core::common::RuntimeResources;
use schedsim::core::snapshot::{ClusterSnapshot, SnapshotError};

use schedsim::test_util::helpers::{build_scheduled_pod, build_test_node, build_test_pod};

#[test]
fn test_initialize_binds_assigned_and_nominated_pods() {
    let mut snapshot = ClusterSnapshot::new();

    let mut nominated = build_test_pod("nominated", 500, 500);
    nominated.status.nominated_node_name = Some("node_b".to_string());

    snapshot
        .initialize(
            vec![
                build_test_node("node_a", 4000, 4000),
                build_test_node("node_b", 4000, 4000),
            ],
            vec![
                build_scheduled_pod("assigned", 1000, 1000, "node_a"),
                nominated,
            ],
        )
        .unwrap();

    assert_eq!(snapshot.node_count(), 2);
    assert_eq!(snapshot.pod_count(), 2);

    let node_a = snapshot.node_info("node_a").unwrap();
    assert_eq!(node_a.pods.len(), 1);
    assert_eq!(node_a.pods[0].metadata.name, "assigned");
    assert_eq!(node_a.requested, RuntimeResources { cpu: 1000, ram: 1000 });

    let node_b = snapshot.node_info("node_b").unwrap();
    assert_eq!(node_b.pods.len(), 1);
    assert_eq!(node_b.pods[0].metadata.name, "nominated");
    // the binding is recorded on the stored pod
    assert_eq!(node_b.pods[0].spec.node_name.as_deref(), Some("node_b"));
}

#[test]
fn test_initialize_rejects_pod_without_any_target() {
    let mut snapshot = ClusterSnapshot::new();
    let err = snapshot
        .initialize(
            vec![build_test_node("node_a", 4000, 4000)],
            vec![build_test_pod("floating", 100, 100)],
        )
        .unwrap_err();

    assert_eq!(
        err,
        SnapshotError::InvalidBinding {
            pod_name: "floating".to_string(),
            reason: "no assigned or nominated node".to_string(),
        }
    );
}

#[test]
fn test_duplicate_node_registration_fails() {
    let mut snapshot = ClusterSnapshot::new();
    snapshot.add_node(build_test_node("twin", 1000, 1000)).unwrap();
    assert_eq!(
        snapshot.add_node(build_test_node("twin", 2000, 2000)),
        Err(SnapshotError::DuplicateNode("twin".to_string()))
    );
}

#[test]
fn test_failed_add_pod_leaves_snapshot_untouched() {
    let mut snapshot = ClusterSnapshot::new();
    snapshot.add_node(build_test_node("node_a", 1000, 1000)).unwrap();
    snapshot
        .add_pod(build_test_pod("resident", 200, 200), "node_a")
        .unwrap();

    let before = snapshot.clone();

    assert_eq!(
        snapshot.add_pod(build_test_pod("lost", 100, 100), "ghost"),
        Err(SnapshotError::UnknownNode("ghost".to_string()))
    );
    assert_eq!(
        snapshot.add_pod(build_test_pod("unbound", 100, 100), ""),
        Err(SnapshotError::InvalidBinding {
            pod_name: "unbound".to_string(),
            reason: "empty node name".to_string(),
        })
    );

    assert_eq!(snapshot, before);
}

#[test]
fn test_bound_pod_is_visible_under_exactly_one_node() {
    let mut snapshot = ClusterSnapshot::new();
    snapshot
        .initialize(
            vec![
                build_test_node("node_a", 4000, 4000),
                build_test_node("node_b", 4000, 4000),
            ],
            vec![],
        )
        .unwrap();
    snapshot
        .add_pod(build_test_pod("solo", 100, 100), "node_b")
        .unwrap();

    let holders: Vec<&str> = snapshot
        .node_infos()
        .filter(|info| info.pods.iter().any(|p| p.metadata.name == "solo"))
        .map(|info| info.node.metadata.name.as_str())
        .collect();
    assert_eq!(holders, vec!["node_b"]);
}

#[test]
fn test_reinitialization_is_idempotent() {
    let nodes = vec![
        build_test_node("node_a", 4000, 4000),
        build_test_node("node_b", 2000, 2000),
    ];
    let pods = vec![
        build_scheduled_pod("first", 500, 500, "node_a"),
        build_scheduled_pod("second", 300, 300, "node_b"),
    ];

    let mut snapshot = ClusterSnapshot::new();
    snapshot.initialize(nodes.clone(), pods.clone()).unwrap();
    let first_pass = snapshot.clone();

    // extra state which must vanish on reinitialization
    snapshot
        .add_pod(build_test_pod("transient", 100, 100), "node_a")
        .unwrap();

    snapshot.initialize(nodes, pods).unwrap();
    assert_eq!(snapshot, first_pass);
}

#[test]
fn test_allocatable_defaults_to_capacity_but_stays_when_set() {
    let mut snapshot = ClusterSnapshot::new();

    snapshot.add_node(build_test_node("plain", 8000, 8000)).unwrap();
    assert_eq!(
        snapshot.node_info("plain").unwrap().node.status.allocatable,
        RuntimeResources { cpu: 8000, ram: 8000 }
    );

    let mut reserved = build_test_node("reserved", 8000, 8000);
    reserved.status.allocatable = RuntimeResources { cpu: 6000, ram: 7000 };
    snapshot.add_node(reserved).unwrap();
    assert_eq!(
        snapshot.node_info("reserved").unwrap().node.status.allocatable,
        RuntimeResources { cpu: 6000, ram: 7000 }
    );
}
