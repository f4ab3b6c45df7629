//! Capabilities the engine consumes from the external VRF store.
//!
//! The engine never owns VRF records. It reads snapshots through
//! [`SnapshotSource`] and asks the store to change RT membership through
//! [`ImportMutator`]. Both traits are object safe so callers can hand in
//! `&dyn VrfStore`.

use async_trait::async_trait;

use crate::error::LeakResult;
use crate::types::VrfSnapshot;

/// Mutation interface of the external store.
///
/// Implementations must report every failed call as an error; the executor
/// records it per operation and never retries. Adds and removes are assumed
/// idempotent at the store.
#[async_trait]
pub trait ImportMutator: Send + Sync {
    /// Adds `rt` to the import set of `namespace/name`.
    async fn add_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()>;

    /// Removes `rt` from the import set of `namespace/name`.
    async fn remove_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()>;
}

/// Read interface of the external store.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetches every VRF, optionally restricted to one namespace.
    async fn fetch_snapshot(&self, namespace: Option<&str>) -> LeakResult<VrfSnapshot>;
}

/// A store that can both be read and mutated.
pub trait VrfStore: ImportMutator + SnapshotSource {}

impl<T: ImportMutator + SnapshotSource + ?Sized> VrfStore for T {}

#[async_trait]
impl<T: ImportMutator + ?Sized> ImportMutator for std::sync::Arc<T> {
    async fn add_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()> {
        (**self).add_import(namespace, name, rt).await
    }

    async fn remove_import(&self, namespace: &str, name: &str, rt: &str) -> LeakResult<()> {
        (**self).remove_import(namespace, name, rt).await
    }
}

#[async_trait]
impl<T: SnapshotSource + ?Sized> SnapshotSource for std::sync::Arc<T> {
    async fn fetch_snapshot(&self, namespace: Option<&str>) -> LeakResult<VrfSnapshot> {
        (**self).fetch_snapshot(namespace).await
    }
}
