//! Reconciliation plan computation
//!
//! Pure decision logic: given the declared specs and the broker's observed
//! state, derive what to do per topic. The plan is transient, recomputed on
//! every pass, and never persisted.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::spec::{BrokerTopicState, TopicSpec};

/// Action derived for one declared topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum PlannedAction {
    /// Topic is absent from the broker and will be created
    Create,
    /// Topic exists with fewer partitions than declared
    IncreasePartitions { current: i32, target: i32 },
    /// Broker state already satisfies the declaration
    NoOp,
}

/// Non-fatal finding surfaced alongside the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PlanWarning {
    /// The declared replica assignment differs from the broker's existing
    /// placement; neither create nor partition increase covers
    /// reassignment, so the topic is left as is
    AssignmentMismatch { topic: String },
    /// The declaration asks for fewer partitions than the broker holds;
    /// partition counts are never narrowed, so the field is ignored
    ShrinkIgnored {
        topic: String,
        declared: i32,
        current: i32,
    },
}

/// Plan for one reconciliation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationPlan {
    /// Topic name to derived action
    pub actions: BTreeMap<String, PlannedAction>,
    /// Non-fatal findings
    pub warnings: Vec<PlanWarning>,
}

impl ReconciliationPlan {
    /// Specs whose topics are absent and must be created, in declaration
    /// order
    pub fn to_create<'a>(&self, specs: &'a [TopicSpec]) -> Vec<&'a TopicSpec> {
        specs
            .iter()
            .filter(|spec| matches!(self.actions.get(&spec.name), Some(PlannedAction::Create)))
            .collect()
    }

    /// Topic name to target partition count for every planned increase
    pub fn to_widen(&self) -> BTreeMap<String, i32> {
        self.actions
            .iter()
            .filter_map(|(name, action)| match action {
                PlannedAction::IncreasePartitions { target, .. } => {
                    Some((name.clone(), *target))
                }
                _ => None,
            })
            .collect()
    }

    /// True when no broker mutation is planned
    pub fn is_noop(&self) -> bool {
        self.actions
            .values()
            .all(|action| matches!(action, PlannedAction::NoOp))
    }
}

/// Derive the plan for one pass
///
/// `existing` comes from the batched existence lookup, `described` from the
/// batched describe of the names found to exist. A declared name missing
/// from both is planned as a create; a name listed but not describable is
/// treated as satisfied (it appeared between the two calls, i.e. a
/// concurrent creator).
pub fn build_plan(
    specs: &[TopicSpec],
    existing: &BTreeSet<String>,
    described: &BTreeMap<String, BrokerTopicState>,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    for spec in specs {
        if !existing.contains(&spec.name) {
            plan.actions.insert(spec.name.clone(), PlannedAction::Create);
            continue;
        }

        let Some(state) = described.get(&spec.name) else {
            plan.actions.insert(spec.name.clone(), PlannedAction::NoOp);
            continue;
        };

        // An explicit replica assignment that disagrees with the broker's
        // placement cannot be reconciled by create or partition increase;
        // the topic is left as is. An assignment that matches implies a
        // matching partition count, so either way no action follows.
        let action = if let Some(declared_assignments) = &spec.replica_assignments {
            if *declared_assignments != state.replica_assignments {
                plan.warnings.push(PlanWarning::AssignmentMismatch {
                    topic: spec.name.clone(),
                });
            }
            PlannedAction::NoOp
        } else {
            match spec.partitions {
                Some(declared) if declared > state.partition_count => {
                    PlannedAction::IncreasePartitions {
                        current: state.partition_count,
                        target: declared,
                    }
                }
                Some(declared) if declared < state.partition_count => {
                    plan.warnings.push(PlanWarning::ShrinkIgnored {
                        topic: spec.name.clone(),
                        declared,
                        current: state.partition_count,
                    });
                    PlannedAction::NoOp
                }
                _ => PlannedAction::NoOp,
            }
        };

        plan.actions.insert(spec.name.clone(), action);
    }

    plan
}
