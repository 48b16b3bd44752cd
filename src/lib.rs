//! Declarative Kafka topic provisioning
//!
//! Given a set of declared [`TopicSpec`]s and a broker admin handle, a
//! reconciliation pass creates missing topics, raises partition counts that
//! fall short of their declaration, and leaves everything else untouched.
//! Broker races against concurrent provisioners ("topic already exists",
//! "partition count already sufficient") are treated as success: the pass
//! is idempotent and safe to run from several application instances
//! starting at once. Topics are never deleted and partition counts never
//! narrowed.

pub mod admin;
pub mod config;
pub mod error;
pub mod metrics;
pub mod provisioner;
pub mod reconciler;
pub mod spec;
pub mod testing;

pub use error::{Error, Result};
pub use provisioner::TopicProvisioner;
pub use reconciler::{ReconcileReport, ReconciliationPlan};
pub use spec::{BrokerTopicState, TopicSpec};
