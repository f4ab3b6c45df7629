//! Leak Manager - snapshot-driven leak queries and matrix reconciliation

use sonic_vrfleak_common::{LeakResult, ReconcileOperation, VrfSnapshot, VrfStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::LeakConfig;
use crate::executor::ReconciliationExecutor;
use crate::matrix::{self, LeakMatrix, MissingCellPolicy, SharedRtConflict};
use crate::resolver;
use crate::types::{PrefixVisibility, ReconcileReport};

/// Leak Manager
///
/// Fetches a fresh snapshot from the store for every call and never caches
/// it, so results always reflect the store at call time.
pub struct LeakMgr<S> {
    /// External VRF store
    store: S,

    /// Operation dispatcher
    executor: ReconciliationExecutor,

    /// Treatment of desired cells the caller did not supply
    missing_cells: MissingCellPolicy,

    /// Namespace filter applied to snapshot fetches
    namespace: Option<String>,
}

impl<S: VrfStore> LeakMgr<S> {
    /// Create a LeakMgr with default reconciliation settings
    pub fn new(store: S) -> Self {
        Self {
            store,
            executor: ReconciliationExecutor::new(),
            missing_cells: MissingCellPolicy::default(),
            namespace: None,
        }
    }

    /// Create a LeakMgr honoring the `[store]` and `[reconcile]` sections
    pub fn from_config(store: S, config: &LeakConfig) -> Self {
        Self {
            store,
            executor: ReconciliationExecutor::with_max_in_flight(config.reconcile.max_in_flight),
            missing_cells: config.reconcile.missing_cells,
            namespace: config.store.namespace.clone(),
        }
    }

    /// Set the missing-cell policy
    pub fn with_missing_cells(mut self, policy: MissingCellPolicy) -> Self {
        self.missing_cells = policy;
        self
    }

    /// Set the concurrency cap (0 for unbounded)
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.executor = ReconciliationExecutor::with_max_in_flight(max_in_flight);
        self
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch a fresh snapshot
    pub async fn snapshot(&self) -> LeakResult<VrfSnapshot> {
        self.store.fetch_snapshot(self.namespace.as_deref()).await
    }

    /// Prefixes visible in `namespace/name`
    pub async fn visible_prefixes(&self, namespace: &str, name: &str) -> LeakResult<PrefixVisibility> {
        let snapshot = self.snapshot().await?;
        resolver::resolve_visible_prefixes(&snapshot, namespace, name)
    }

    /// The leak matrix as it stands in the store
    pub async fn current_matrix(&self) -> LeakResult<LeakMatrix> {
        Ok(LeakMatrix::current(&self.snapshot().await?))
    }

    /// Operations needed to reach `desired` from the store's current state
    pub async fn plan(&self, desired: &LeakMatrix) -> LeakResult<Vec<ReconcileOperation>> {
        let snapshot = self.snapshot().await?;
        Ok(self.plan_against(&snapshot, desired))
    }

    /// Operations needed to reach `desired` from a caller-supplied snapshot
    pub fn plan_against(&self, snapshot: &VrfSnapshot, desired: &LeakMatrix) -> Vec<ReconcileOperation> {
        matrix::diff(snapshot, desired, self.missing_cells)
    }

    /// Cells of `desired` that disagree on a shared RT, see [`matrix::conflicts`]
    pub fn conflicts_against(
        &self,
        snapshot: &VrfSnapshot,
        desired: &LeakMatrix,
    ) -> Vec<SharedRtConflict> {
        matrix::conflicts(snapshot, desired, self.missing_cells)
    }

    /// Fetch, diff and execute in one pass
    ///
    /// The pass is not retried. Callers should re-fetch and reconcile again
    /// if the report is not fully successful.
    #[instrument(skip_all, fields(cells = desired.len()))]
    pub async fn reconcile(
        &self,
        desired: &LeakMatrix,
        cancel: &CancellationToken,
    ) -> LeakResult<ReconcileReport> {
        let ops = self.plan(desired).await?;
        info!(operations = ops.len(), "Reconciling leak matrix");
        self.execute(ops, cancel).await
    }

    /// Execute a precomputed operation list against the store
    pub async fn execute(
        &self,
        ops: Vec<ReconcileOperation>,
        cancel: &CancellationToken,
    ) -> LeakResult<ReconcileReport> {
        self.executor
            .execute_with_cancel(ops, &self.store, cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReconcileStatus;
    use sonic_vrfleak_common::{LeakError, Vrf, VrfKey};
    use sonic_vrfleak_test::{fixtures, MockStore};

    fn key(name: &str) -> VrfKey {
        VrfKey::new("default", name)
    }

    #[tokio::test]
    async fn test_visible_prefixes_from_store() {
        let mgr = LeakMgr::new(MockStore::with_snapshot(fixtures::blue_red()));
        let vis = mgr.visible_prefixes("default", "red").await.unwrap();
        assert!(vis.get("10.0.0.0/24").unwrap().is_learned());

        let err = mgr.visible_prefixes("default", "nope").await.unwrap_err();
        assert!(matches!(err, LeakError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reconcile_then_refetch() {
        let mgr = LeakMgr::new(MockStore::with_snapshot(fixtures::blue_red_unleaked()));
        let mut desired = mgr.current_matrix().await.unwrap();
        desired.set(key("red"), key("blue"), true);

        let report = mgr
            .reconcile(&desired, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.status(), ReconcileStatus::Succeeded);

        // Store state now matches; a second pass is a no-op
        assert_eq!(mgr.current_matrix().await.unwrap(), desired);
        assert!(mgr.plan(&desired).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_keep_policy_preserves_unlisted_leaks() {
        let store = MockStore::with_snapshot(fixtures::hub_and_spokes(3));
        let mgr = LeakMgr::new(store).with_missing_cells(MissingCellPolicy::Keep);
        assert!(mgr.plan(&LeakMatrix::new()).await.unwrap().is_empty());

        let mgr = mgr.with_missing_cells(MissingCellPolicy::Remove);
        assert_eq!(mgr.plan(&LeakMatrix::new()).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_from_config() {
        let mut config = LeakConfig::default();
        config.reconcile.max_in_flight = 2;
        config.reconcile.missing_cells = MissingCellPolicy::Keep;
        config.store.namespace = Some("tenant".to_string());

        let mgr = LeakMgr::from_config(MockStore::with_snapshot(fixtures::multi_namespace()), &config);
        let snapshot = mgr.snapshot().await.unwrap();
        assert!(snapshot.iter().all(|v| v.namespace == "tenant"));
        assert_eq!(mgr.executor.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_conflicts_follow_missing_cell_policy() {
        let snapshot = VrfSnapshot::new(vec![
            Vrf::new("default", "east", "65000:1").with_export("65000:50"),
            Vrf::new("default", "west", "65000:2").with_export("65000:50"),
            fixtures::silent_vrf("red", 3).with_import("65000:50"),
        ]);
        let mut desired = LeakMatrix::new();
        desired.set(key("red"), key("east"), true);

        // Absent (red, west) reads as "remove" and disagrees with (red, east)
        let mgr = LeakMgr::new(MockStore::with_snapshot(snapshot.clone()));
        let found = mgr.conflicts_against(&snapshot, &desired);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].changed, vec![key("west")]);
        assert_eq!(
            mgr.plan_against(&snapshot, &desired),
            vec![ReconcileOperation::remove("default", "red", "65000:50")]
        );

        let mgr = mgr.with_missing_cells(MissingCellPolicy::Keep);
        assert!(mgr.conflicts_against(&snapshot, &desired).is_empty());
        assert!(mgr.plan_against(&snapshot, &desired).is_empty());
    }
}
