//! Reconcile operations emitted by the matrix diff and consumed by the executor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{RouteTarget, VrfKey};

/// Direction of an import RT mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Add the RT to the VRF's import set.
    Add,
    /// Remove the RT from the VRF's import set.
    Remove,
}

impl OpKind {
    /// Returns the store call name used in logs and remote errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpKind::Add => "add_import",
            OpKind::Remove => "remove_import",
        }
    }
}

/// A single import RT mutation against the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReconcileOperation {
    /// Add or remove.
    pub kind: OpKind,
    /// Namespace of the importing VRF.
    pub namespace: String,
    /// Name of the importing VRF.
    pub name: String,
    /// Route target to add to or remove from the VRF's imports.
    pub rt: RouteTarget,
}

impl ReconcileOperation {
    /// Creates an Add operation.
    pub fn add(namespace: impl Into<String>, name: impl Into<String>, rt: impl Into<String>) -> Self {
        Self {
            kind: OpKind::Add,
            namespace: namespace.into(),
            name: name.into(),
            rt: rt.into(),
        }
    }

    /// Creates a Remove operation.
    pub fn remove(
        namespace: impl Into<String>,
        name: impl Into<String>,
        rt: impl Into<String>,
    ) -> Self {
        Self {
            kind: OpKind::Remove,
            namespace: namespace.into(),
            name: name.into(),
            rt: rt.into(),
        }
    }

    /// Identity of the VRF this operation mutates.
    pub fn vrf_key(&self) -> VrfKey {
        VrfKey::new(self.namespace.clone(), self.name.clone())
    }
}

impl fmt::Display for ReconcileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} rt={}",
            self.kind.as_str(),
            self.namespace,
            self.name,
            self.rt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        let op = ReconcileOperation::add("default", "red", "65000:1");
        assert_eq!(op.to_string(), "add_import default/red rt=65000:1");

        let op = ReconcileOperation::remove("default", "red", "65000:1");
        assert_eq!(op.to_string(), "remove_import default/red rt=65000:1");
    }

    #[test]
    fn test_operation_json() {
        let op = ReconcileOperation::add("default", "red", "65000:1");
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""kind":"add""#));

        let back: ReconcileOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vrf_key(), VrfKey::new("default", "red"));
    }
}
