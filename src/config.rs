//! Configuration loading for the provisioner binary
//!
//! Configuration is a single YAML document: broker connection details,
//! provisioner options, and the declared topic list. Topic specs are
//! validated by the reconciler at plan time, not here.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::spec::TopicSpec;

/// Root configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProvisionerConfig {
    /// Broker connection configuration
    pub kafka: KafkaConfig,

    /// Provisioner behavior
    #[serde(default)]
    pub options: ProvisionerOptions,

    /// Declared topics
    pub topics: Vec<TopicSpec>,
}

impl ProvisionerConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let config: ProvisionerConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.kafka.bootstrap_servers.is_empty() {
            return Err(Error::config(
                "at least one bootstrap server must be specified",
            ));
        }
        if self.topics.is_empty() {
            return Err(Error::config("at least one topic must be declared"));
        }
        Ok(())
    }
}

/// Broker connection configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct KafkaConfig {
    /// Bootstrap servers
    pub bootstrap_servers: Vec<String>,

    /// Security protocol (PLAINTEXT, SSL, SASL_PLAINTEXT, SASL_SSL)
    #[serde(default = "default_security_protocol")]
    pub security_protocol: String,

    /// Additional librdkafka client properties
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_security_protocol() -> String {
    "PLAINTEXT".to_string()
}

/// Provisioner behavior options
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProvisionerOptions {
    /// Bound on each broker round trip, in seconds
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// Whether an unreachable broker fails startup
    #[serde(default = "default_true")]
    pub fatal_if_broker_unavailable: bool,
}

impl ProvisionerOptions {
    /// Operation timeout as a `Duration`
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

impl Default for ProvisionerOptions {
    fn default() -> Self {
        Self {
            operation_timeout_secs: default_operation_timeout_secs(),
            fatal_if_broker_unavailable: true,
        }
    }
}

fn default_operation_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}
