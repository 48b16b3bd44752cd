//! Kafka Topic Provisioner
//!
//! One-shot binary: loads a YAML declaration of topics, connects an admin
//! client, and reconciles the broker's topic state against the declaration.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kafka_topic_provisioner::admin::RdKafkaTopicAdmin;
use kafka_topic_provisioner::config::ProvisionerConfig;
use kafka_topic_provisioner::TopicProvisioner;

/// Default configuration file path
const DEFAULT_CONFIG_PATH: &str = "provisioner.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    info!(path = %config_path, "Loading provisioner configuration");

    let config = ProvisionerConfig::from_file(&config_path)?;
    let timeout = config.options.operation_timeout();

    let admin = RdKafkaTopicAdmin::from_config(&config.kafka, timeout)?;
    info!(
        brokers = %config.kafka.bootstrap_servers.join(","),
        topics = config.topics.len(),
        "Starting topic provisioning"
    );

    let provisioner = TopicProvisioner::new(Arc::new(admin), config.topics)
        .with_operation_timeout(timeout)
        .with_fatal_if_broker_unavailable(config.options.fatal_if_broker_unavailable);

    match provisioner.initialize().await? {
        Some(report) => {
            info!(report = %serde_json::to_string(&report)?, "Provisioning complete");
        }
        None => {
            warn!("Broker unavailable; provisioning skipped as configured");
        }
    }

    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,librdkafka=warn,rdkafka=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
