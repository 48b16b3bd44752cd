//! Topic reconciliation
//!
//! One pass synchronizes the broker's topic state with the declared specs:
//! a batched existence lookup, one batched create for the missing topics,
//! one batched describe plus one batched partition increase for the rest.
//! "Already exists" and "already at or above the requested size" are benign
//! races against concurrent reconcilers and are swallowed; every other
//! per-topic failure is aggregated and surfaced at the end of the pass so
//! the caller sees the complete picture.

pub mod plan;

pub use plan::{build_plan, PlanWarning, PlannedAction, ReconciliationPlan};

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::admin::{AlterOutcome, CreateOutcome, TopicAdmin};
use crate::error::{Error, Result, TopicFailure, TopicOperation};
use crate::metrics;
use crate::spec::TopicSpec;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Topics created this pass
    pub created: Vec<String>,
    /// Topics whose partition count was raised this pass
    pub widened: Vec<String>,
    /// Declared topics the broker already satisfied (including creates and
    /// increases lost to a concurrent reconciler)
    pub unchanged: Vec<String>,
    /// Non-fatal findings from plan computation
    pub warnings: Vec<PlanWarning>,
}

/// Per-batch execution summary for one of the two mutating steps
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Topics the broker applied the operation to
    pub applied: Vec<String>,
    /// Topics where a concurrent actor already produced the desired state
    pub raced: Vec<String>,
    /// Non-benign per-topic failures
    pub failures: Vec<TopicFailure>,
}

/// Synchronize the broker's topic state with the declared specs
///
/// Idempotent: re-running against a broker that already satisfies the specs
/// performs no mutation. Each broker round trip is bounded by
/// `operation_timeout`; on timeout the pass fails and may be retried.
pub async fn reconcile(
    admin: &dyn TopicAdmin,
    specs: &[TopicSpec],
    operation_timeout: Duration,
) -> Result<ReconcileReport> {
    validate_specs(specs)?;

    let broker_topics = bounded(
        "list topics",
        operation_timeout,
        admin.list_topic_names(),
    )
    .await?;
    let existing: BTreeSet<String> = specs
        .iter()
        .filter(|spec| broker_topics.contains(&spec.name))
        .map(|spec| spec.name.clone())
        .collect();

    let present: Vec<String> = existing.iter().cloned().collect();
    let described = if present.is_empty() {
        BTreeMap::new()
    } else {
        bounded(
            "describe topics",
            operation_timeout,
            admin.describe_topics(&present),
        )
        .await?
    };

    let plan = build_plan(specs, &existing, &described);
    for warning in &plan.warnings {
        match warning {
            PlanWarning::AssignmentMismatch { topic } => warn!(
                topic = %topic,
                "declared replica assignment differs from broker placement; \
                 leaving topic untouched"
            ),
            PlanWarning::ShrinkIgnored {
                topic,
                declared,
                current,
            } => warn!(
                topic = %topic,
                declared,
                current,
                "declared fewer partitions than the broker holds; partition \
                 counts are never narrowed"
            ),
        }
    }

    let creates = create_missing(admin, &plan.to_create(specs), operation_timeout).await?;
    let widens = widen_partitions(admin, &plan.to_widen(), operation_timeout).await?;

    let mut failures = creates.failures;
    failures.extend(widens.failures);
    if !failures.is_empty() {
        return Err(Error::Reconcile { failures });
    }

    let touched: BTreeSet<&String> = creates.applied.iter().chain(&widens.applied).collect();
    let unchanged = specs
        .iter()
        .map(|spec| spec.name.clone())
        .filter(|name| !touched.contains(name))
        .collect();

    Ok(ReconcileReport {
        created: creates.applied,
        widened: widens.applied,
        unchanged,
        warnings: plan.warnings,
    })
}

/// Issue one batched create for all missing topics
///
/// Per-member "already exists" is a benign race and is tolerated; other
/// per-member failures are collected, not returned early.
pub async fn create_missing(
    admin: &dyn TopicAdmin,
    specs: &[&TopicSpec],
    operation_timeout: Duration,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    if specs.is_empty() {
        return Ok(outcome);
    }

    let batch: Vec<TopicSpec> = specs.iter().map(|spec| (*spec).clone()).collect();
    let results = bounded(
        "create topics",
        operation_timeout,
        admin.create_topics(&batch),
    )
    .await?;

    for (name, result) in results {
        match result {
            CreateOutcome::Created => {
                info!(topic = %name, "created topic");
                metrics::TOPICS_CREATED.inc();
                outcome.applied.push(name);
            }
            CreateOutcome::AlreadyExists => {
                debug!(topic = %name, "topic already exists, tolerating create race");
                metrics::BENIGN_RACES.with_label_values(&["create"]).inc();
                outcome.raced.push(name);
            }
            CreateOutcome::Failed(failure) => {
                outcome.failures.push(TopicFailure {
                    topic: name,
                    operation: TopicOperation::Create,
                    message: failure.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

/// Issue one batched partition increase for all under-partitioned topics
///
/// Per-member "already at or above" is a benign race and is tolerated;
/// other per-member failures are collected, not returned early.
pub async fn widen_partitions(
    admin: &dyn TopicAdmin,
    requests: &BTreeMap<String, i32>,
    operation_timeout: Duration,
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::default();
    if requests.is_empty() {
        return Ok(outcome);
    }

    let results = bounded(
        "increase partitions",
        operation_timeout,
        admin.increase_partitions(requests),
    )
    .await?;

    for (name, result) in results {
        match result {
            AlterOutcome::Widened => {
                info!(
                    topic = %name,
                    target = requests.get(&name),
                    "increased partition count"
                );
                metrics::PARTITIONS_INCREASED.inc();
                outcome.applied.push(name);
            }
            AlterOutcome::AlreadyAtOrAbove => {
                debug!(
                    topic = %name,
                    "partition count already at or above target, tolerating \
                     increase race"
                );
                metrics::BENIGN_RACES
                    .with_label_values(&["increase_partitions"])
                    .inc();
                outcome.raced.push(name);
            }
            AlterOutcome::Failed(failure) => {
                outcome.failures.push(TopicFailure {
                    topic: name,
                    operation: TopicOperation::IncreasePartitions,
                    message: failure.to_string(),
                });
            }
        }
    }

    Ok(outcome)
}

/// Reject structurally invalid or duplicate specs before any broker call
fn validate_specs(specs: &[TopicSpec]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for spec in specs {
        spec.validate()?;
        if !seen.insert(spec.name.as_str()) {
            return Err(Error::invalid_spec(
                &spec.name,
                "topic declared more than once",
            ));
        }
    }
    Ok(())
}

/// Bound one broker round trip with the caller-supplied timeout
async fn bounded<T>(
    operation: &str,
    timeout: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: operation.to_string(),
        }),
    }
}
