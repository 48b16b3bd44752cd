//! Integration tests for topic spec validation
//!
//! These tests verify that structurally consistent specs are accepted and
//! inconsistent ones are rejected before any broker call would be made.

use std::collections::BTreeMap;

use kafka_topic_provisioner::{Error, TopicSpec};

// ============================================================================
// Test Helpers
// ============================================================================

fn valid_spec() -> TopicSpec {
    TopicSpec::builder("orders")
        .partitions(2)
        .replication_factor(1)
        .config("cleanup.policy", "compact")
        .build()
        .unwrap()
}

fn assert_invalid(spec: TopicSpec, expected_fragment: &str) {
    let err = spec.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidSpec { .. }));
    assert!(
        err.to_string().contains(expected_fragment),
        "expected '{}' in '{}'",
        expected_fragment,
        err
    );
}

// ============================================================================
// Valid Specs
// ============================================================================

#[test]
fn full_spec_passes_validation() {
    assert!(valid_spec().validate().is_ok());
}

#[test]
fn minimal_spec_passes_validation() {
    // Name only: partitions and replication deferred to the broker.
    let spec = TopicSpec::builder("logs").build().unwrap();
    assert!(spec.validate().is_ok());
    assert_eq!(spec.declared_partitions(), None);
}

#[test]
fn assignment_only_spec_passes_validation() {
    let spec = TopicSpec::builder("events")
        .replica_assignments(BTreeMap::from([(0, vec![0, 1]), (1, vec![1, 2])]))
        .config("compression.type", "zstd")
        .build()
        .unwrap();
    assert!(spec.validate().is_ok());
    assert_eq!(spec.declared_partitions(), Some(2));
}

#[test]
fn dotted_and_dashed_names_pass_validation() {
    for name in ["orders.v2", "orders-v2", "orders_v2", "ORDERS2"] {
        assert!(
            TopicSpec::builder(name).build().is_ok(),
            "name {:?} should be valid",
            name
        );
    }
}

// ============================================================================
// Invalid Specs
// ============================================================================

#[test]
fn empty_name_fails_validation() {
    let mut spec = valid_spec();
    spec.name = String::new();
    assert_invalid(spec, "empty");
}

#[test]
fn illegal_name_characters_fail_validation() {
    for name in ["has space", "has/slash", "has*star", "ümlaut"] {
        let mut spec = valid_spec();
        spec.name = name.to_string();
        assert_invalid(spec, "illegal character");
    }
}

#[test]
fn overlong_name_fails_validation() {
    let mut spec = valid_spec();
    spec.name = "a".repeat(250);
    assert_invalid(spec, "249");
}

#[test]
fn non_positive_partitions_fail_validation() {
    for partitions in [0, -1, -100] {
        let mut spec = valid_spec();
        spec.partitions = Some(partitions);
        assert_invalid(spec, "partitions must be positive");
    }
}

#[test]
fn non_positive_replication_factor_fails_validation() {
    for factor in [0, -3] {
        let mut spec = valid_spec();
        spec.replication_factor = Some(factor);
        assert_invalid(spec, "replication factor must be positive");
    }
}

#[test]
fn assignment_combined_with_partitions_fails_validation() {
    let mut spec = valid_spec();
    spec.replica_assignments = Some(BTreeMap::from([(0, vec![0]), (1, vec![0])]));
    assert_invalid(spec, "cannot be combined");
}

#[test]
fn empty_assignment_fails_validation() {
    let mut spec = valid_spec();
    spec.partitions = None;
    spec.replication_factor = None;
    spec.replica_assignments = Some(BTreeMap::new());
    assert_invalid(spec, "empty");
}

#[test]
fn assignment_not_starting_at_zero_fails_validation() {
    let mut spec = valid_spec();
    spec.partitions = None;
    spec.replication_factor = None;
    spec.replica_assignments = Some(BTreeMap::from([(1, vec![0])]));
    assert_invalid(spec, "contiguously");
}

#[test]
fn assignment_with_gap_fails_validation() {
    let mut spec = valid_spec();
    spec.partitions = None;
    spec.replication_factor = None;
    spec.replica_assignments = Some(BTreeMap::from([(0, vec![0]), (2, vec![0])]));
    assert_invalid(spec, "contiguously");
}

#[test]
fn assignment_with_empty_replica_list_fails_validation() {
    let mut spec = valid_spec();
    spec.partitions = None;
    spec.replication_factor = None;
    spec.replica_assignments = Some(BTreeMap::from([(0, vec![])]));
    assert_invalid(spec, "no replicas");
}

#[test]
fn assignment_with_uneven_replica_counts_fails_validation() {
    let mut spec = valid_spec();
    spec.partitions = None;
    spec.replication_factor = None;
    spec.replica_assignments = Some(BTreeMap::from([(0, vec![0]), (1, vec![0, 1])]));
    assert_invalid(spec, "replicas");
}

#[test]
fn assignment_with_duplicate_broker_fails_validation() {
    let mut spec = valid_spec();
    spec.partitions = None;
    spec.replication_factor = None;
    spec.replica_assignments = Some(BTreeMap::from([(0, vec![2, 2])]));
    assert_invalid(spec, "duplicate broker");
}
