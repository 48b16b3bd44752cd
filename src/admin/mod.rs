//! Admin-client capability consumed by the reconciler
//!
//! The reconciler never talks to a broker directly; it drives this trait.
//! Per-topic results are tagged variants inspected by value so that benign
//! races ("already exists", "already at or above the requested size") can
//! be told apart from real failures without string-matching error messages.

mod rdkafka;

pub use self::rdkafka::RdKafkaTopicAdmin;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use async_trait::async_trait;

use crate::error::Result;
use crate::spec::{BrokerTopicState, TopicSpec};

/// Minimal broker admin capability set
///
/// Every method is one batched round trip; a method-level `Err` means the
/// round trip itself failed (connectivity, timeout) and applies to all
/// topics in the batch. Per-topic outcomes are reported in the `Ok` value.
#[async_trait]
pub trait TopicAdmin: Send + Sync {
    /// Names of all topics currently present on the broker
    async fn list_topic_names(&self) -> Result<BTreeSet<String>>;

    /// Current state of the named topics
    ///
    /// Names unknown to the broker are absent from the result rather than
    /// an error; the caller decides what absence means.
    async fn describe_topics(&self, names: &[String])
        -> Result<BTreeMap<String, BrokerTopicState>>;

    /// Create all given topics in one batched request
    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<Vec<(String, CreateOutcome)>>;

    /// Raise partition counts, topic name to target count, in one batched
    /// request
    async fn increase_partitions(
        &self,
        requests: &BTreeMap<String, i32>,
    ) -> Result<Vec<(String, AlterOutcome)>>;
}

/// Per-topic result of a batched create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Topic was created
    Created,
    /// A concurrent creator won the race; the topic is present
    AlreadyExists,
    /// The broker rejected this member of the batch
    Failed(AdminFailure),
}

/// Per-topic result of a batched partition increase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterOutcome {
    /// Partition count was raised to the requested target
    Widened,
    /// The count already meets or exceeds the target, possibly because a
    /// concurrent reconciler got there first
    AlreadyAtOrAbove,
    /// The broker rejected this member of the batch
    Failed(AdminFailure),
}

/// Broker-reported failure for one member of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminFailure {
    /// Failure classification
    pub kind: FailureKind,
    /// Broker-reported detail
    pub message: String,
}

impl AdminFailure {
    /// Create a broker-rejected failure
    pub fn rejected(message: impl Into<String>) -> Self {
        AdminFailure {
            kind: FailureKind::Rejected,
            message: message.into(),
        }
    }
}

impl fmt::Display for AdminFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Classification of a per-topic broker failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Broker or partition leadership not reachable for this topic
    Unavailable,
    /// The broker did not answer for this topic in time
    Timeout,
    /// Authorization or broker-side policy rejection
    Rejected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unavailable => write!(f, "unavailable"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Rejected => write!(f, "rejected"),
        }
    }
}
