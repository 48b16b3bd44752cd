//! Declared topic specifications and observed broker topic state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum topic name length accepted by Kafka brokers
const MAX_TOPIC_NAME_LEN: usize = 249;

/// Declarative specification of one Kafka topic
///
/// A spec carries either a partition count plus replication factor (both
/// optional, broker defaults apply when unset) or a full per-partition
/// replica assignment; never both. The assignment, when present, fixes both
/// the partition count and the replication factor, so combining it with
/// either scalar field is rejected by [`TopicSpec::validate`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopicSpec {
    /// Topic name (unique identifier)
    pub name: String,

    /// Number of partitions; `None` leaves the choice to the broker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<i32>,

    /// Replication factor; `None` leaves the choice to the broker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_factor: Option<i32>,

    /// Explicit replica placement: partition index to ordered broker IDs.
    /// Supersedes `partitions` and `replication_factor` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_assignments: Option<BTreeMap<i32, Vec<i32>>>,

    /// Topic configuration overrides (e.g. `cleanup.policy`,
    /// `compression.type`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configs: BTreeMap<String, String>,
}

impl TopicSpec {
    /// Start building a spec for the named topic
    pub fn builder(name: impl Into<String>) -> TopicSpecBuilder {
        TopicSpecBuilder {
            spec: TopicSpec {
                name: name.into(),
                partitions: None,
                replication_factor: None,
                replica_assignments: None,
                configs: BTreeMap::new(),
            },
        }
    }

    /// Partition count this spec asks for, if it asks for one
    ///
    /// An explicit replica assignment fixes the count to the number of
    /// assigned partitions.
    pub fn declared_partitions(&self) -> Option<i32> {
        match &self.replica_assignments {
            Some(assignments) => Some(assignments.len() as i32),
            None => self.partitions,
        }
    }

    /// Check the spec for structural consistency
    ///
    /// Performed before any broker call is attempted; a failure here is
    /// fatal for the whole reconciliation pass.
    pub fn validate(&self) -> Result<()> {
        self.validate_name()?;

        if let Some(partitions) = self.partitions {
            if partitions < 1 {
                return Err(Error::invalid_spec(
                    &self.name,
                    format!("partitions must be positive, got {}", partitions),
                ));
            }
        }

        if let Some(factor) = self.replication_factor {
            if factor < 1 {
                return Err(Error::invalid_spec(
                    &self.name,
                    format!("replication factor must be positive, got {}", factor),
                ));
            }
        }

        if let Some(assignments) = &self.replica_assignments {
            if self.partitions.is_some() || self.replication_factor.is_some() {
                return Err(Error::invalid_spec(
                    &self.name,
                    "replica assignments cannot be combined with partitions \
                     or a replication factor",
                ));
            }
            self.validate_assignments(assignments)?;
        }

        Ok(())
    }

    fn validate_name(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_spec("<unnamed>", "topic name is empty"));
        }
        if self.name == "." || self.name == ".." {
            return Err(Error::invalid_spec(
                &self.name,
                "topic name may not be '.' or '..'",
            ));
        }
        if self.name.len() > MAX_TOPIC_NAME_LEN {
            return Err(Error::invalid_spec(
                &self.name,
                format!(
                    "topic name exceeds {} characters",
                    MAX_TOPIC_NAME_LEN
                ),
            ));
        }
        if let Some(bad) = self
            .name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        {
            return Err(Error::invalid_spec(
                &self.name,
                format!("illegal character '{}' in topic name", bad),
            ));
        }
        Ok(())
    }

    fn validate_assignments(&self, assignments: &BTreeMap<i32, Vec<i32>>) -> Result<()> {
        if assignments.is_empty() {
            return Err(Error::invalid_spec(
                &self.name,
                "replica assignments are empty",
            ));
        }

        // Kafka requires assigned partition indexes to be contiguous from 0
        // and every partition to carry the same number of replicas.
        let mut replica_count = None;
        for (expected, (index, replicas)) in assignments.iter().enumerate() {
            if *index != expected as i32 {
                return Err(Error::invalid_spec(
                    &self.name,
                    format!(
                        "replica assignments must cover partitions 0..{} \
                         contiguously, found index {}",
                        assignments.len(),
                        index
                    ),
                ));
            }
            if replicas.is_empty() {
                return Err(Error::invalid_spec(
                    &self.name,
                    format!("partition {} has no replicas assigned", index),
                ));
            }
            let mut seen = replicas.clone();
            seen.sort_unstable();
            seen.dedup();
            if seen.len() != replicas.len() {
                return Err(Error::invalid_spec(
                    &self.name,
                    format!("partition {} lists a duplicate broker", index),
                ));
            }
            match replica_count {
                None => replica_count = Some(replicas.len()),
                Some(count) if count != replicas.len() => {
                    return Err(Error::invalid_spec(
                        &self.name,
                        format!(
                            "partition {} has {} replicas, expected {} as on \
                             partition 0",
                            index,
                            replicas.len(),
                            count
                        ),
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// Builder for [`TopicSpec`] values
#[derive(Clone, Debug)]
pub struct TopicSpecBuilder {
    spec: TopicSpec,
}

impl TopicSpecBuilder {
    /// Set the partition count
    pub fn partitions(mut self, partitions: i32) -> Self {
        self.spec.partitions = Some(partitions);
        self
    }

    /// Set the replication factor
    pub fn replication_factor(mut self, factor: i32) -> Self {
        self.spec.replication_factor = Some(factor);
        self
    }

    /// Set explicit per-partition replica assignments
    pub fn replica_assignments(mut self, assignments: BTreeMap<i32, Vec<i32>>) -> Self {
        self.spec.replica_assignments = Some(assignments);
        self
    }

    /// Add one topic configuration override
    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.configs.insert(key.into(), value.into());
        self
    }

    /// Shorthand for `cleanup.policy=compact`
    pub fn compact(self) -> Self {
        self.config("cleanup.policy", "compact")
    }

    /// Finish, validating the assembled spec
    pub fn build(self) -> Result<TopicSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

/// Observed state of one topic on the broker
///
/// Owned entirely by the broker; fetched fresh on every reconciliation pass
/// and never cached across passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BrokerTopicState {
    /// Topic name
    pub name: String,
    /// Current partition count
    pub partition_count: i32,
    /// Current replica placement: partition index to ordered broker IDs
    pub replica_assignments: BTreeMap<i32, Vec<i32>>,
}
