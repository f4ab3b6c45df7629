//! In-memory VRF store for executor and manager tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sonic_vrfleak_common::{
    ImportMutator, LeakError, LeakResult, OpKind, ReconcileOperation, SnapshotSource, Vrf,
    VrfSnapshot,
};
use tokio_util::sync::CancellationToken;

/// In-memory VRF store
///
/// Applies import mutations to its own records so tests can re-fetch and
/// observe the result. Every call is logged, including failed ones.
#[derive(Debug, Default)]
pub struct MockStore {
    vrfs: Mutex<Vec<Vrf>>,
    calls: Mutex<Vec<ReconcileOperation>>,
    failures: Mutex<HashMap<ReconcileOperation, String>>,
    hangs: Mutex<HashMap<ReconcileOperation, CancellationToken>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the records of `snapshot`
    pub fn with_snapshot(snapshot: VrfSnapshot) -> Self {
        Self {
            vrfs: Mutex::new(snapshot.iter().cloned().collect()),
            ..Self::default()
        }
    }

    /// Delay every mutation by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail `op` with a remote error carrying `detail`
    pub fn fail_on(&self, op: ReconcileOperation, detail: impl Into<String>) {
        self.failures.lock().insert(op, detail.into());
    }

    /// When `op` is called, fire `token` and never complete the call
    pub fn cancel_when_called(&self, op: ReconcileOperation, token: CancellationToken) {
        self.hangs.lock().insert(op, token);
    }

    /// Every mutation received, in arrival order
    pub fn calls(&self) -> Vec<ReconcileOperation> {
        self.calls.lock().clone()
    }

    /// Number of mutations received
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of times `op` was received
    pub fn calls_for(&self, op: &ReconcileOperation) -> usize {
        self.calls.lock().iter().filter(|c| *c == op).count()
    }

    /// Highest number of concurrent mutations observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Current record for `namespace/name`
    pub fn vrf(&self, namespace: &str, name: &str) -> Option<Vrf> {
        self.vrfs
            .lock()
            .iter()
            .find(|v| v.namespace == namespace && v.name == name)
            .cloned()
    }

    /// Replace a stored record (or append it if new)
    pub fn upsert(&self, vrf: Vrf) {
        let mut vrfs = self.vrfs.lock();
        match vrfs
            .iter_mut()
            .find(|v| v.namespace == vrf.namespace && v.name == vrf.name)
        {
            Some(existing) => *existing = vrf,
            None => vrfs.push(vrf),
        }
    }

    async fn mutate(&self, op: ReconcileOperation) -> LeakResult<()> {
        self.calls.lock().push(op.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let hang = self.hangs.lock().get(&op).cloned();
        if let Some(token) = hang {
            token.cancel();
            std::future::pending::<()>().await;
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let result = self.apply(&op);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn apply(&self, op: &ReconcileOperation) -> LeakResult<()> {
        if let Some(detail) = self.failures.lock().get(op) {
            return Err(LeakError::remote(op.kind.as_str(), detail.clone()));
        }

        let mut vrfs = self.vrfs.lock();
        let vrf = vrfs
            .iter_mut()
            .find(|v| v.namespace == op.namespace && v.name == op.name)
            .ok_or_else(|| LeakError::remote(op.kind.as_str(), "HTTP 404: VRF not found"))?;

        match op.kind {
            OpKind::Add => {
                vrf.imports.insert(op.rt.clone());
            }
            OpKind::Remove => {
                vrf.imports.remove(&op.rt);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ImportMutator for MockStore {
    async fn add_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()> {
        self.mutate(ReconcileOperation::add(namespace, name, rt)).await
    }

    async fn remove_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()> {
        self.mutate(ReconcileOperation::remove(namespace, name, rt))
            .await
    }
}

#[async_trait]
impl SnapshotSource for MockStore {
    async fn fetch_snapshot(&self, namespace: Option<&str>) -> LeakResult<VrfSnapshot> {
        let vrfs = self.vrfs.lock();
        Ok(vrfs
            .iter()
            .filter(|v| namespace.map_or(true, |ns| v.namespace == ns))
            .cloned()
            .collect())
    }
}
