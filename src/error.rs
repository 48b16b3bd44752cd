//! Error types for the Kafka Topic Provisioner

use std::fmt;

use thiserror::Error;

/// Result type alias using the provisioner's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Provisioner error types
///
/// Benign broker races ("topic already exists", "partition count already at
/// or above the requested size") are deliberately absent: they are tagged
/// outcomes on the admin-client capability, swallowed by the reconciler.
#[derive(Error, Debug)]
pub enum Error {
    /// Structurally inconsistent topic specification, rejected before any
    /// broker call
    #[error("invalid spec for topic '{topic}': {reason}")]
    InvalidSpec { topic: String, reason: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Broker could not be reached for a batched admin call
    #[error("broker unavailable during {operation}: {message}")]
    BrokerUnavailable { operation: String, message: String },

    /// A batched admin call did not complete within the operation timeout
    #[error("timed out during {operation}")]
    Timeout { operation: String },

    /// Aggregated non-benign per-topic failures from one reconciliation pass
    #[error(
        "reconciliation failed for {} topic(s): {}",
        .failures.len(),
        format_failures(.failures)
    )]
    Reconcile { failures: Vec<TopicFailure> },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid-spec error
    pub fn invalid_spec(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidSpec {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Create a broker-unavailable error for the named batched operation
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::BrokerUnavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// True for transient transport failures (connectivity, timeout) where
    /// the pass may be safely retried by the caller
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::BrokerUnavailable { .. } | Error::Timeout { .. }
        )
    }
}

/// One non-benign per-topic failure, with enough context to diagnose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFailure {
    /// Topic the operation targeted
    pub topic: String,
    /// Operation that was attempted
    pub operation: TopicOperation,
    /// Broker-reported cause
    pub message: String,
}

impl fmt::Display for TopicFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.topic, self.operation, self.message)
    }
}

/// Broker operation attempted for a topic
///
/// Only the two mutating operations appear here: the read-only lookups
/// (list, describe) fail at the round-trip level, never per topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicOperation {
    /// Batched topic creation
    Create,
    /// Batched partition-count increase
    IncreasePartitions,
}

impl fmt::Display for TopicOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicOperation::Create => write!(f, "create"),
            TopicOperation::IncreasePartitions => write!(f, "increase partitions"),
        }
    }
}

fn format_failures(failures: &[TopicFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_spec_display_names_topic() {
        let err = Error::invalid_spec("orders", "partitions must be positive");
        assert!(err.to_string().contains("orders"));
        assert!(err.to_string().contains("partitions must be positive"));
    }

    #[test]
    fn reconcile_display_lists_every_topic() {
        let err = Error::Reconcile {
            failures: vec![
                TopicFailure {
                    topic: "orders".to_string(),
                    operation: TopicOperation::Create,
                    message: "policy violation".to_string(),
                },
                TopicFailure {
                    topic: "payments".to_string(),
                    operation: TopicOperation::IncreasePartitions,
                    message: "not authorized".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 topic(s)"));
        assert!(msg.contains("orders (create): policy violation"));
        assert!(msg.contains("payments (increase partitions): not authorized"));
    }

    #[test]
    fn transient_classification() {
        assert!(Error::unavailable("list topics", "connection refused").is_transient());
        assert!(Error::Timeout {
            operation: "create topics".to_string()
        }
        .is_transient());
        assert!(!Error::invalid_spec("t", "bad").is_transient());
    }
}
