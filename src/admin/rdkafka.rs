//! `TopicAdmin` implementation backed by the librdkafka admin client

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewPartitions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};

use crate::admin::{AdminFailure, AlterOutcome, CreateOutcome, FailureKind, TopicAdmin};
use crate::config::KafkaConfig;
use crate::error::{Error, Result};
use crate::spec::{BrokerTopicState, TopicSpec};

/// Broker admin client over `rdkafka::admin::AdminClient`
///
/// One metadata round trip backs both the existence probe and the describe
/// call; creates and partition increases go through the batched admin APIs.
pub struct RdKafkaTopicAdmin {
    client: Arc<AdminClient<DefaultClientContext>>,
    request_timeout: Duration,
}

impl RdKafkaTopicAdmin {
    /// Wrap an existing admin client
    pub fn new(client: AdminClient<DefaultClientContext>, request_timeout: Duration) -> Self {
        Self {
            client: Arc::new(client),
            request_timeout,
        }
    }

    /// Build an admin client from connection configuration
    pub fn from_config(config: &KafkaConfig, request_timeout: Duration) -> Result<Self> {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", config.bootstrap_servers.join(","))
            .set("security.protocol", &config.security_protocol);
        for (key, value) in &config.properties {
            client_config.set(key, value);
        }

        let client = client_config
            .create::<AdminClient<DefaultClientContext>>()
            .map_err(|e| Error::config(format!("failed to create admin client: {}", e)))?;

        Ok(Self::new(client, request_timeout))
    }

    fn admin_options(&self) -> AdminOptions {
        AdminOptions::new()
            .operation_timeout(Some(self.request_timeout))
            .request_timeout(Some(self.request_timeout))
    }

    /// Fetch cluster metadata
    ///
    /// librdkafka's metadata fetch blocks the calling thread, so it runs on
    /// the blocking pool; the surrounding future stays responsive to the
    /// caller's timeout.
    async fn fetch_all_metadata(
        &self,
        operation: &str,
    ) -> Result<BTreeMap<String, BrokerTopicState>> {
        let client = Arc::clone(&self.client);
        let request_timeout = self.request_timeout;

        let fetched = tokio::task::spawn_blocking(move || {
            let metadata = client.inner().fetch_metadata(None, request_timeout)?;

            let mut topics = BTreeMap::new();
            for topic in metadata.topics() {
                if topic.error().is_some() {
                    continue;
                }
                let mut replica_assignments = BTreeMap::new();
                for partition in topic.partitions() {
                    replica_assignments.insert(partition.id(), partition.replicas().to_vec());
                }
                topics.insert(
                    topic.name().to_string(),
                    BrokerTopicState {
                        name: topic.name().to_string(),
                        partition_count: topic.partitions().len() as i32,
                        replica_assignments,
                    },
                );
            }
            Ok::<_, KafkaError>(topics)
        })
        .await
        .map_err(|e| Error::unavailable(operation, e.to_string()))?;

        fetched.map_err(|e| map_call_error(operation, &e))
    }
}

#[async_trait]
impl TopicAdmin for RdKafkaTopicAdmin {
    async fn list_topic_names(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .fetch_all_metadata("list topics")
            .await?
            .into_keys()
            .collect())
    }

    async fn describe_topics(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, BrokerTopicState>> {
        let mut all = self.fetch_all_metadata("describe topics").await?;
        all.retain(|name, _| names.iter().any(|n| n == name));
        Ok(all)
    }

    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<Vec<(String, CreateOutcome)>> {
        // NewTopic borrows its replica assignment, so owned slices have to
        // outlive the request structs.
        let assignment_storage: Vec<Option<Vec<Vec<i32>>>> = specs
            .iter()
            .map(|spec| {
                spec.replica_assignments
                    .as_ref()
                    .map(|assignments| assignments.values().cloned().collect())
            })
            .collect();
        let assignment_slices: Vec<Option<Vec<&[i32]>>> = assignment_storage
            .iter()
            .map(|storage| {
                storage
                    .as_ref()
                    .map(|partitions| partitions.iter().map(Vec::as_slice).collect())
            })
            .collect();

        let new_topics: Vec<NewTopic<'_>> = specs
            .iter()
            .zip(assignment_slices.iter())
            .map(|(spec, slices)| {
                let replication = match slices {
                    Some(slices) => TopicReplication::Variable(slices.as_slice()),
                    // -1 defers to the broker's default.replication.factor
                    None => TopicReplication::Fixed(spec.replication_factor.unwrap_or(-1)),
                };
                let mut new_topic = NewTopic::new(
                    &spec.name,
                    spec.declared_partitions().unwrap_or(-1),
                    replication,
                );
                for (key, value) in &spec.configs {
                    new_topic = new_topic.set(key, value);
                }
                new_topic
            })
            .collect();

        let results = self
            .client
            .create_topics(new_topics.iter(), &self.admin_options())
            .await
            .map_err(|e| map_call_error("create topics", &e))?;

        Ok(results
            .into_iter()
            .map(|result| match result {
                Ok(name) => (name, CreateOutcome::Created),
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    (name, CreateOutcome::AlreadyExists)
                }
                Err((name, code)) => {
                    let outcome = CreateOutcome::Failed(AdminFailure {
                        kind: classify_code(code),
                        message: code.to_string(),
                    });
                    (name, outcome)
                }
            })
            .collect())
    }

    async fn increase_partitions(
        &self,
        requests: &BTreeMap<String, i32>,
    ) -> Result<Vec<(String, AlterOutcome)>> {
        let new_partitions: Vec<NewPartitions<'_>> = requests
            .iter()
            .map(|(name, target)| NewPartitions::new(name, *target as usize))
            .collect();

        let results = self
            .client
            .create_partitions(new_partitions.iter(), &self.admin_options())
            .await
            .map_err(|e| map_call_error("increase partitions", &e))?;

        Ok(results
            .into_iter()
            .map(|result| match result {
                Ok(name) => (name, AlterOutcome::Widened),
                // The broker reports a target at or below the current count
                // as InvalidPartitions; specs are validated before any
                // broker call, so genuinely invalid counts never get here.
                Err((name, RDKafkaErrorCode::InvalidPartitions)) => {
                    (name, AlterOutcome::AlreadyAtOrAbove)
                }
                Err((name, code)) => {
                    let outcome = AlterOutcome::Failed(AdminFailure {
                        kind: classify_code(code),
                        message: code.to_string(),
                    });
                    (name, outcome)
                }
            })
            .collect())
    }
}

/// Classify a per-topic broker error code
fn classify_code(code: RDKafkaErrorCode) -> FailureKind {
    match code {
        RDKafkaErrorCode::RequestTimedOut | RDKafkaErrorCode::OperationTimedOut => {
            FailureKind::Timeout
        }
        RDKafkaErrorCode::BrokerNotAvailable
        | RDKafkaErrorCode::LeaderNotAvailable
        | RDKafkaErrorCode::NetworkException => FailureKind::Unavailable,
        _ => FailureKind::Rejected,
    }
}

/// Map a failed batched round trip to the provisioner taxonomy
fn map_call_error(operation: &str, error: &KafkaError) -> Error {
    let timed_out = matches!(
        error,
        KafkaError::AdminOp(RDKafkaErrorCode::RequestTimedOut)
            | KafkaError::AdminOp(RDKafkaErrorCode::OperationTimedOut)
            | KafkaError::MetadataFetch(RDKafkaErrorCode::RequestTimedOut)
            | KafkaError::MetadataFetch(RDKafkaErrorCode::OperationTimedOut)
    );
    if timed_out {
        Error::Timeout {
            operation: operation.to_string(),
        }
    } else {
        Error::unavailable(operation, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_codes_classify_as_timeout() {
        assert_eq!(
            classify_code(RDKafkaErrorCode::RequestTimedOut),
            FailureKind::Timeout
        );
    }

    #[test]
    fn authorization_codes_classify_as_rejected() {
        assert_eq!(
            classify_code(RDKafkaErrorCode::TopicAuthorizationFailed),
            FailureKind::Rejected
        );
        assert_eq!(
            classify_code(RDKafkaErrorCode::PolicyViolation),
            FailureKind::Rejected
        );
    }

    #[test]
    fn metadata_timeout_maps_to_timeout_error() {
        let err = map_call_error(
            "list topics",
            &KafkaError::MetadataFetch(RDKafkaErrorCode::RequestTimedOut),
        );
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[test]
    fn admin_op_failure_maps_to_unavailable() {
        let err = map_call_error(
            "create topics",
            &KafkaError::AdminOp(RDKafkaErrorCode::AllBrokersDown),
        );
        assert!(matches!(err, Error::BrokerUnavailable { .. }));
    }
}
