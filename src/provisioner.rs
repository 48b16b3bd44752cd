//! Startup lifecycle surface around the reconciler

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::admin::TopicAdmin;
use crate::error::Result;
use crate::metrics;
use crate::reconciler::{self, ReconcileReport};
use crate::spec::TopicSpec;

/// Default bound on each broker round trip
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Reconciles a declared topic set against a broker at application startup
///
/// The declared specs are immutable once the provisioner is built.
/// [`initialize`](TopicProvisioner::initialize) is meant to be called once
/// at startup and is safe to call again: reconciliation is idempotent, so a
/// second pass against a now-consistent broker performs no mutation.
pub struct TopicProvisioner {
    admin: Arc<dyn TopicAdmin>,
    specs: Vec<TopicSpec>,
    operation_timeout: Duration,
    fatal_if_broker_unavailable: bool,
}

impl TopicProvisioner {
    /// Create a provisioner for the given admin handle and declared specs
    pub fn new(admin: Arc<dyn TopicAdmin>, specs: Vec<TopicSpec>) -> Self {
        Self {
            admin,
            specs,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            fatal_if_broker_unavailable: true,
        }
    }

    /// Bound each broker round trip with the given timeout (default 30s)
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Control whether a transient broker failure during
    /// [`initialize`](TopicProvisioner::initialize) fails startup
    /// (default true)
    pub fn with_fatal_if_broker_unavailable(mut self, fatal: bool) -> Self {
        self.fatal_if_broker_unavailable = fatal;
        self
    }

    /// The declared topic specs
    pub fn specs(&self) -> &[TopicSpec] {
        &self.specs
    }

    /// Startup hook: run one reconciliation pass
    ///
    /// Returns `Ok(None)` when the broker was unreachable and the
    /// provisioner is configured to tolerate that at startup; every other
    /// failure surfaces. Invalid specs fail regardless of the tolerance
    /// flag.
    pub async fn initialize(&self) -> Result<Option<ReconcileReport>> {
        match self.reconcile().await {
            Ok(report) => {
                info!(
                    created = report.created.len(),
                    widened = report.widened.len(),
                    unchanged = report.unchanged.len(),
                    "topic provisioning complete"
                );
                Ok(Some(report))
            }
            Err(err) if err.is_transient() && !self.fatal_if_broker_unavailable => {
                warn!(
                    error = %err,
                    "broker unavailable during startup provisioning; continuing \
                     without reconciling topics"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Run one reconciliation pass
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let _timer = metrics::RECONCILE_DURATION.start_timer();
        metrics::RECONCILIATIONS.inc();

        let result =
            reconciler::reconcile(self.admin.as_ref(), &self.specs, self.operation_timeout).await;
        if result.is_err() {
            metrics::RECONCILIATION_ERRORS.inc();
        }
        result
    }
}

impl std::fmt::Debug for TopicProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicProvisioner")
            .field("topics", &self.specs.len())
            .field("operation_timeout", &self.operation_timeout)
            .field(
                "fatal_if_broker_unavailable",
                &self.fatal_if_broker_unavailable,
            )
            .finish()
    }
}
