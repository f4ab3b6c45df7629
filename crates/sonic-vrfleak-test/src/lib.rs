//! Test infrastructure for the VRF route-leak engine
//!
//! Provides:
//! - Snapshot fixtures for common fabric layouts
//! - An in-memory VRF store with failure injection and call accounting
//! - Assertion helpers for operation lists and store state

pub mod fixtures;
mod mock_store;
mod verification;

pub use fixtures::*;
pub use mock_store::MockStore;
pub use verification::*;
