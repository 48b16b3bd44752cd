//! In-memory broker admin for integration testing
//!
//! A lightweight stand-in for a real broker that:
//! - holds topic state behind a shared lock, so concurrent reconcilers race
//!   against it the way they race against a real cluster
//! - records every admin call received
//! - supports per-topic failure injection, an offline switch, and an
//!   injectable response delay

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::admin::{AdminFailure, AlterOutcome, CreateOutcome, TopicAdmin};
use crate::error::{Error, Result};
use crate::spec::{BrokerTopicState, TopicSpec};

/// A recorded admin call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    /// Batched existence lookup
    ListTopicNames,
    /// Batched describe for the given names
    DescribeTopics(Vec<String>),
    /// Batched create for the given names
    CreateTopics(Vec<String>),
    /// Batched partition increase, name to target count
    IncreasePartitions(BTreeMap<String, i32>),
}

/// In-memory implementation of [`TopicAdmin`]
pub struct InMemoryTopicAdmin {
    num_brokers: i32,
    topics: RwLock<BTreeMap<String, BrokerTopicState>>,
    configs: RwLock<BTreeMap<String, BTreeMap<String, String>>>,
    calls: Mutex<Vec<AdminCall>>,
    create_failures: RwLock<BTreeMap<String, AdminFailure>>,
    alter_failures: RwLock<BTreeMap<String, AdminFailure>>,
    offline: AtomicBool,
    delay: RwLock<Option<Duration>>,
}

impl InMemoryTopicAdmin {
    /// Create an empty broker with the given number of broker IDs
    /// (`0..num_brokers`) available for replica placement
    ///
    /// # Panics
    ///
    /// Panics when `num_brokers` is not at least 1; replica placement needs
    /// a broker to place on.
    pub fn new(num_brokers: i32) -> Self {
        assert!(num_brokers > 0, "num_brokers must be at least 1");
        Self {
            num_brokers,
            topics: RwLock::new(BTreeMap::new()),
            configs: RwLock::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
            create_failures: RwLock::new(BTreeMap::new()),
            alter_failures: RwLock::new(BTreeMap::new()),
            offline: AtomicBool::new(false),
            delay: RwLock::new(None),
        }
    }

    /// Pre-populate a topic as if it existed before the pass
    pub async fn seed_topic(&self, name: &str, partitions: i32, replication_factor: i32) {
        let state = BrokerTopicState {
            name: name.to_string(),
            partition_count: partitions,
            replica_assignments: (0..partitions)
                .map(|p| (p, round_robin(p, replication_factor, self.num_brokers)))
                .collect(),
        };
        self.topics.write().await.insert(name.to_string(), state);
    }

    /// Make every subsequent call fail as if the broker were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every subsequent call, as if the broker were stalled
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Fail every create of the named topic with the given failure
    pub async fn inject_create_failure(&self, name: &str, failure: AdminFailure) {
        self.create_failures
            .write()
            .await
            .insert(name.to_string(), failure);
    }

    /// Fail every partition increase of the named topic with the given
    /// failure
    pub async fn inject_alter_failure(&self, name: &str, failure: AdminFailure) {
        self.alter_failures
            .write()
            .await
            .insert(name.to_string(), failure);
    }

    /// All admin calls received so far
    pub async fn calls(&self) -> Vec<AdminCall> {
        self.calls.lock().await.clone()
    }

    /// Admin calls that mutate broker state (creates and increases)
    pub async fn mutation_calls(&self) -> Vec<AdminCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    AdminCall::CreateTopics(_) | AdminCall::IncreasePartitions(_)
                )
            })
            .cloned()
            .collect()
    }

    /// Current state of the named topic, if present
    pub async fn topic(&self, name: &str) -> Option<BrokerTopicState> {
        self.topics.read().await.get(name).cloned()
    }

    /// Configuration overrides the named topic was created with
    pub async fn topic_configs(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.configs.read().await.get(name).cloned()
    }

    async fn record(&self, call: AdminCall) {
        self.calls.lock().await.push(call);
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_online(&self, operation: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::unavailable(operation, "broker offline"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TopicAdmin for InMemoryTopicAdmin {
    async fn list_topic_names(&self) -> Result<BTreeSet<String>> {
        self.record(AdminCall::ListTopicNames).await;
        self.check_online("list topics")?;
        Ok(self.topics.read().await.keys().cloned().collect())
    }

    async fn describe_topics(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, BrokerTopicState>> {
        self.record(AdminCall::DescribeTopics(names.to_vec())).await;
        self.check_online("describe topics")?;
        let topics = self.topics.read().await;
        Ok(names
            .iter()
            .filter_map(|name| topics.get(name).map(|state| (name.clone(), state.clone())))
            .collect())
    }

    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<Vec<(String, CreateOutcome)>> {
        self.record(AdminCall::CreateTopics(
            specs.iter().map(|spec| spec.name.clone()).collect(),
        ))
        .await;
        self.check_online("create topics")?;

        let injected = self.create_failures.read().await;
        let mut topics = self.topics.write().await;
        let mut configs = self.configs.write().await;

        let mut results = Vec::with_capacity(specs.len());
        for spec in specs {
            if let Some(failure) = injected.get(&spec.name) {
                results.push((spec.name.clone(), CreateOutcome::Failed(failure.clone())));
                continue;
            }
            if topics.contains_key(&spec.name) {
                results.push((spec.name.clone(), CreateOutcome::AlreadyExists));
                continue;
            }

            let factor = spec.replication_factor.unwrap_or(1);
            if spec.replica_assignments.is_none() && factor > self.num_brokers {
                results.push((
                    spec.name.clone(),
                    CreateOutcome::Failed(AdminFailure::rejected(format!(
                        "replication factor {} exceeds available brokers {}",
                        factor, self.num_brokers
                    ))),
                ));
                continue;
            }

            let replica_assignments = match &spec.replica_assignments {
                Some(assignments) => assignments.clone(),
                None => {
                    let partitions = spec.partitions.unwrap_or(1);
                    (0..partitions)
                        .map(|p| (p, round_robin(p, factor, self.num_brokers)))
                        .collect()
                }
            };
            let state = BrokerTopicState {
                name: spec.name.clone(),
                partition_count: replica_assignments.len() as i32,
                replica_assignments,
            };
            topics.insert(spec.name.clone(), state);
            configs.insert(spec.name.clone(), spec.configs.clone());
            results.push((spec.name.clone(), CreateOutcome::Created));
        }

        Ok(results)
    }

    async fn increase_partitions(
        &self,
        requests: &BTreeMap<String, i32>,
    ) -> Result<Vec<(String, AlterOutcome)>> {
        self.record(AdminCall::IncreasePartitions(requests.clone()))
            .await;
        self.check_online("increase partitions")?;

        let injected = self.alter_failures.read().await;
        let mut topics = self.topics.write().await;

        let mut results = Vec::with_capacity(requests.len());
        for (name, target) in requests {
            if let Some(failure) = injected.get(name) {
                results.push((name.clone(), AlterOutcome::Failed(failure.clone())));
                continue;
            }
            let Some(state) = topics.get_mut(name) else {
                results.push((
                    name.clone(),
                    AlterOutcome::Failed(AdminFailure::rejected("unknown topic")),
                ));
                continue;
            };
            if *target <= state.partition_count {
                results.push((name.clone(), AlterOutcome::AlreadyAtOrAbove));
                continue;
            }

            let factor = state
                .replica_assignments
                .values()
                .next()
                .map(|replicas| replicas.len() as i32)
                .unwrap_or(1);
            for p in state.partition_count..*target {
                state
                    .replica_assignments
                    .insert(p, round_robin(p, factor, self.num_brokers));
            }
            state.partition_count = *target;
            results.push((name.clone(), AlterOutcome::Widened));
        }

        Ok(results)
    }
}

/// Round-robin replica placement across the available broker IDs
fn round_robin(partition: i32, factor: i32, num_brokers: i32) -> Vec<i32> {
    (0..factor.min(num_brokers))
        .map(|i| (partition + i) % num_brokers)
        .collect()
}
