//! Prometheus metrics definitions
//!
//! Registered against the default registry so embedders that already export
//! one pick these up for free. The one-shot binary does not serve them.

use prometheus::{
    register_counter, register_counter_vec, register_histogram, Counter, CounterVec, Histogram,
};

lazy_static::lazy_static! {
    /// Total number of reconciliation passes
    pub static ref RECONCILIATIONS: Counter = register_counter!(
        "kafka_topic_provisioner_reconciliations_total",
        "Total number of reconciliation passes"
    ).unwrap();

    /// Total number of failed reconciliation passes
    pub static ref RECONCILIATION_ERRORS: Counter = register_counter!(
        "kafka_topic_provisioner_reconciliation_errors_total",
        "Total number of failed reconciliation passes"
    ).unwrap();

    /// Reconciliation duration histogram
    pub static ref RECONCILE_DURATION: Histogram = register_histogram!(
        "kafka_topic_provisioner_reconcile_duration_seconds",
        "Duration of reconciliation passes in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    /// Topics created
    pub static ref TOPICS_CREATED: Counter = register_counter!(
        "kafka_topic_provisioner_topics_created_total",
        "Total number of topics created"
    ).unwrap();

    /// Partition counts raised
    pub static ref PARTITIONS_INCREASED: Counter = register_counter!(
        "kafka_topic_provisioner_partitions_increased_total",
        "Total number of partition-count increases applied"
    ).unwrap();

    /// Benign races tolerated, by operation
    pub static ref BENIGN_RACES: CounterVec = register_counter_vec!(
        "kafka_topic_provisioner_benign_races_total",
        "Broker races tolerated because the desired state was already satisfied",
        &["operation"]
    ).unwrap();
}
