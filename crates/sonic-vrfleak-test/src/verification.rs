//! Verification helpers for route-leak tests
//!
//! Provides assertion helpers for operation lists and store state

use std::collections::HashSet;

use sonic_vrfleak_common::{ReconcileOperation, VrfSnapshot};
use thiserror::Error;

use crate::MockStore;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Operation {index} leaks {vrf} into itself via RT '{rt}'")]
    SelfLeak {
        index: usize,
        vrf: String,
        rt: String,
    },

    #[error("Operations {first} and {second} both touch {vrf} RT '{rt}'")]
    Duplicate {
        first: usize,
        second: usize,
        vrf: String,
        rt: String,
    },

    #[error("VRF '{vrf}' not found in store")]
    VrfNotFound { vrf: String },

    #[error("Import mismatch for {vrf}: expected {expected:?}, got {actual:?}")]
    ImportMismatch {
        vrf: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Expected each operation exactly once, {op} was received {count} times")]
    CallCount { op: String, count: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Verify that no operation makes a VRF import its own representative RT
pub fn assert_no_self_leak(
    snapshot: &VrfSnapshot,
    ops: &[ReconcileOperation],
) -> VerifyResult<()> {
    for (index, op) in ops.iter().enumerate() {
        let own = snapshot
            .find(&op.namespace, &op.name)
            .and_then(|v| v.representative_rt());
        if own == Some(op.rt.as_str()) {
            return Err(VerificationError::SelfLeak {
                index,
                vrf: op.vrf_key().to_string(),
                rt: op.rt.clone(),
            });
        }
    }
    Ok(())
}

/// Verify that no two operations touch the same VRF and RT
pub fn assert_unique_targets(ops: &[ReconcileOperation]) -> VerifyResult<()> {
    for (second, op) in ops.iter().enumerate() {
        if let Some(first) = ops[..second]
            .iter()
            .position(|o| o.namespace == op.namespace && o.name == op.name && o.rt == op.rt)
        {
            return Err(VerificationError::Duplicate {
                first,
                second,
                vrf: op.vrf_key().to_string(),
                rt: op.rt.clone(),
            });
        }
    }
    Ok(())
}

/// Verify the import set of a stored VRF
pub fn assert_imports(
    store: &MockStore,
    namespace: &str,
    name: &str,
    expected: &[&str],
) -> VerifyResult<()> {
    let vrf_id = format!("{}/{}", namespace, name);
    let vrf = store
        .vrf(namespace, name)
        .ok_or_else(|| VerificationError::VrfNotFound { vrf: vrf_id.clone() })?;

    let expected_set: HashSet<&str> = expected.iter().copied().collect();
    let actual_set: HashSet<&str> = vrf.imports.iter().map(String::as_str).collect();
    if expected_set != actual_set {
        let mut expected: Vec<String> = expected_set.iter().map(|s| s.to_string()).collect();
        expected.sort();
        return Err(VerificationError::ImportMismatch {
            vrf: vrf_id,
            expected,
            actual: vrf.imports.iter().cloned().collect(),
        });
    }
    Ok(())
}

/// Verify that each of `ops` reached the store exactly once
pub fn assert_called_once(store: &MockStore, ops: &[ReconcileOperation]) -> VerifyResult<()> {
    for op in ops {
        let count = store.calls_for(op);
        if count != 1 {
            return Err(VerificationError::CallCount {
                op: op.to_string(),
                count,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_self_leak_detected() {
        let snapshot = fixtures::blue_red();
        let ops = vec![ReconcileOperation::add("default", "blue", "65000:1")];
        assert!(matches!(
            assert_no_self_leak(&snapshot, &ops),
            Err(VerificationError::SelfLeak { index: 0, .. })
        ));
    }

    #[test]
    fn test_duplicate_detected() {
        let ops = vec![
            ReconcileOperation::add("default", "red", "65000:1"),
            ReconcileOperation::remove("default", "red", "65000:1"),
        ];
        assert!(matches!(
            assert_unique_targets(&ops),
            Err(VerificationError::Duplicate {
                first: 0,
                second: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_assert_imports() {
        let store = MockStore::with_snapshot(fixtures::blue_red());
        assert!(assert_imports(&store, "default", "red", &["65000:1"]).is_ok());
        assert!(assert_imports(&store, "default", "red", &[]).is_err());
        assert!(assert_imports(&store, "default", "nope", &[]).is_err());
    }
}
