//! Common infrastructure for the SONiC VRF route-leak engine.
//!
//! This crate provides the pieces shared by the engine (`vrfleakd`) and its
//! test support crate:
//!
//! - [`types`]: VRF records, identities and point-in-time snapshots
//! - [`operation`]: import RT mutations produced by matrix reconciliation
//! - [`store`]: the read/mutate capabilities consumed from the VRF store
//! - [`error`]: error types for route-leak operations
//!
//! # Architecture
//!
//! The engine is stateless between calls:
//!
//! 1. The caller fetches a [`VrfSnapshot`] from the store
//! 2. Leak resolution and matrix diffing run as pure functions over it
//! 3. Diff output is a list of [`ReconcileOperation`] values
//! 4. The executor pushes those through an [`ImportMutator`]
//! 5. The caller re-fetches the snapshot to observe the new state
//!
//! # Example
//!
//! ```ignore
//! use sonic_vrfleak_common::{ImportMutator, LeakResult, ReconcileOperation};
//!
//! async fn apply_one(store: &dyn ImportMutator, op: &ReconcileOperation) -> LeakResult<()> {
//!     store.add_import(&op.namespace, &op.name, &op.rt).await
//! }
//! ```

pub mod error;
pub mod operation;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{LeakError, LeakResult};
pub use operation::{OpKind, ReconcileOperation};
pub use store::{ImportMutator, SnapshotSource, VrfStore};
pub use types::{Cidr, RouteTarget, Vrf, VrfKey, VrfSnapshot};
