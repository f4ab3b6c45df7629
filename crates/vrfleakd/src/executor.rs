//! Concurrent dispatch of reconcile operations against the VRF store
//!
//! All operations of a pass are issued concurrently, optionally capped by
//! `max_in_flight`. Every operation is attempted exactly once; failures are
//! recorded per operation and never abort siblings. Cancellation stops
//! further dispatch and result collection but does not roll back anything
//! already sent to the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use sonic_vrfleak_common::{
    ImportMutator, LeakError, LeakResult, OpKind, ReconcileOperation,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::types::ReconcileReport;

/// Dispatches operation lists through an [`ImportMutator`]
#[derive(Debug, Clone, Default)]
pub struct ReconciliationExecutor {
    /// Maximum concurrent store calls, 0 for unbounded
    max_in_flight: usize,
}

impl ReconciliationExecutor {
    /// Create an executor with no concurrency cap
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor issuing at most `max_in_flight` concurrent calls
    /// (0 leaves it unbounded)
    pub fn with_max_in_flight(max_in_flight: usize) -> Self {
        Self { max_in_flight }
    }

    /// Configured cap, 0 when unbounded
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Checks structural preconditions before anything is dispatched.
    ///
    /// Rejects empty identities or RTs and any two operations touching the
    /// same VRF and RT, whether duplicated or conflicting.
    pub fn validate(operations: &[ReconcileOperation]) -> LeakResult<()> {
        let mut seen: HashMap<(&str, &str, &str), (usize, OpKind)> = HashMap::new();

        for (index, op) in operations.iter().enumerate() {
            if op.namespace.trim().is_empty() {
                return Err(LeakError::malformed(index, "empty namespace"));
            }
            if op.name.trim().is_empty() {
                return Err(LeakError::malformed(index, "empty VRF name"));
            }
            if op.rt.trim().is_empty() {
                return Err(LeakError::malformed(index, "empty route target"));
            }

            let slot = (op.namespace.as_str(), op.name.as_str(), op.rt.as_str());
            if let Some(&(first, kind)) = seen.get(&slot) {
                let reason = if kind == op.kind {
                    format!("duplicate of operation {}", first)
                } else {
                    format!("conflicts with operation {}", first)
                };
                return Err(LeakError::malformed(index, reason));
            }
            seen.insert(slot, (index, op.kind));
        }

        Ok(())
    }

    /// Execute every operation and collect the outcomes
    pub async fn execute(
        &self,
        operations: Vec<ReconcileOperation>,
        mutator: &dyn ImportMutator,
    ) -> LeakResult<ReconcileReport> {
        self.execute_with_cancel(operations, mutator, &CancellationToken::new())
            .await
    }

    /// Execute every operation until done or until `cancel` fires
    #[instrument(skip_all, fields(operations = operations.len(), max_in_flight = self.max_in_flight))]
    pub async fn execute_with_cancel(
        &self,
        operations: Vec<ReconcileOperation>,
        mutator: &dyn ImportMutator,
        cancel: &CancellationToken,
    ) -> LeakResult<ReconcileReport> {
        Self::validate(&operations)?;

        let total = operations.len();
        if total == 0 {
            debug!("No operations to execute");
            return Ok(ReconcileReport::default());
        }

        let limit = match self.max_in_flight {
            0 => total,
            cap => cap.min(total),
        };

        let dispatched: Vec<AtomicBool> = (0..total).map(|_| AtomicBool::new(false)).collect();
        let mut outcomes: Vec<Option<LeakResult<()>>> = (0..total).map(|_| None).collect();

        {
            let dispatched = &dispatched;
            let mut results = stream::iter(operations.iter().enumerate())
                .map(|(index, op)| async move {
                    dispatched[index].store(true, Ordering::Relaxed);
                    debug!(%op, "Dispatching");
                    (index, apply(mutator, op).await)
                })
                .buffer_unordered(limit);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!("Reconciliation cancelled, suppressing further dispatch");
                        break;
                    }
                    next = results.next() => match next {
                        Some((index, result)) => outcomes[index] = Some(result),
                        None => break,
                    },
                }
            }
        }

        let mut report = ReconcileReport::default();
        for ((op, outcome), was_dispatched) in operations
            .into_iter()
            .zip(outcomes)
            .zip(dispatched.iter().map(|d| d.load(Ordering::Relaxed)))
        {
            match outcome {
                Some(Ok(())) => {
                    report.attempted += 1;
                    report.succeeded += 1;
                }
                Some(Err(err)) => {
                    warn!(%op, error = %err, "Operation failed");
                    report.attempted += 1;
                    report.failed.push((op, err));
                }
                None if was_dispatched => {
                    report.attempted += 1;
                    report.abandoned.push(op);
                }
                None => report.cancelled.push(op),
            }
        }

        info!(
            status = report.status().as_str(),
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            cancelled = report.cancelled.len(),
            abandoned = report.abandoned.len(),
            "Reconciliation pass finished"
        );

        Ok(report)
    }
}

async fn apply(mutator: &dyn ImportMutator, op: &ReconcileOperation) -> LeakResult<()> {
    match op.kind {
        OpKind::Add => mutator.add_import(&op.namespace, &op.name, &op.rt).await,
        OpKind::Remove => mutator.remove_import(&op.namespace, &op.name, &op.rt).await,
    }
}

/// Execute `operations` with no concurrency cap and no cancellation
pub async fn execute_reconciliation(
    operations: Vec<ReconcileOperation>,
    mutator: &dyn ImportMutator,
) -> LeakResult<ReconcileReport> {
    ReconciliationExecutor::new().execute(operations, mutator).await
}
