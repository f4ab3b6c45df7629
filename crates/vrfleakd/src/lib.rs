//! VRF route-leak engine for SONiC EVPN fabrics
//!
//! Answers which prefixes a VRF can reach through route-target leaking and
//! reconciles a desired leak matrix against the VRF store.
//!
//! - [`resolve_visible_prefixes`]: one-hop prefix visibility for a VRF
//! - [`diff_leak_matrix`]: minimal add/remove operations for a desired matrix
//! - [`execute_reconciliation`]: concurrent dispatch with per-operation outcomes

mod commands;
mod config;
mod executor;
mod http_store;
mod leak_mgr;
mod matrix;
mod resolver;
mod rt_index;
mod tables;
mod types;

pub use commands::*;
pub use config::*;
pub use executor::{execute_reconciliation, ReconciliationExecutor};
pub use http_store::HttpVrfStore;
pub use leak_mgr::LeakMgr;
pub use matrix::{
    conflicts, diff, diff_leak_matrix, LeakCell, LeakMatrix, MatrixColumn, MissingCellPolicy,
    SharedRtConflict,
};
pub use resolver::{resolve, resolve_visible_prefixes};
pub use rt_index::RouteTargetIndex;
pub use tables::*;
pub use types::*;

pub use sonic_vrfleak_common::{
    ImportMutator, LeakError, LeakResult, OpKind, ReconcileOperation, SnapshotSource, Vrf, VrfKey,
    VrfSnapshot, VrfStore,
};
