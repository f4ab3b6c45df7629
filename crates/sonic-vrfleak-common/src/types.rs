//! VRF data model shared by the leak engine and its store clients.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Route Target value (e.g. "65000:100"). Opaque join key, never parsed.
pub type RouteTarget = String;

/// CIDR prefix owned by a VRF. Opaque, never parsed.
pub type Cidr = String;

/// Globally unique VRF identity.
///
/// Ordering is by namespace, then name. Reconciliation output is sorted by it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VrfKey {
    /// Namespace the VRF lives in.
    pub namespace: String,
    /// VRF name, unique within its namespace.
    pub name: String,
}

impl VrfKey {
    /// Creates a new VRF key.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns true if this key names the given namespace/name pair.
    pub fn matches(&self, namespace: &str, name: &str) -> bool {
        self.namespace == namespace && self.name == name
    }
}

impl fmt::Display for VrfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A VRF record as held by the external store.
///
/// Field names follow the store's list/get response body, so a snapshot can
/// be decoded straight from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vrf {
    /// VRF name.
    pub name: String,
    /// VRF namespace.
    pub namespace: String,
    /// Route Distinguisher (opaque).
    #[serde(default)]
    pub rd: String,
    /// Imported route targets; order is irrelevant and duplicates collapse.
    #[serde(default)]
    pub imports: BTreeSet<RouteTarget>,
    /// Exported route targets. The first entry is the representative RT.
    #[serde(default)]
    pub exports: Vec<RouteTarget>,
    /// Prefixes owned directly by this VRF.
    #[serde(default)]
    pub prefixes: BTreeSet<Cidr>,
}

impl Vrf {
    /// Create a new VRF with no route targets and no prefixes
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, rd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            rd: rd.into(),
            imports: BTreeSet::new(),
            exports: Vec::new(),
            prefixes: BTreeSet::new(),
        }
    }

    /// Add an import RT
    pub fn with_import(mut self, rt: impl Into<RouteTarget>) -> Self {
        self.imports.insert(rt.into());
        self
    }

    /// Append an export RT (the first one appended becomes representative)
    pub fn with_export(mut self, rt: impl Into<RouteTarget>) -> Self {
        let rt = rt.into();
        if !self.exports.contains(&rt) {
            self.exports.push(rt);
        }
        self
    }

    /// Add an owned prefix
    pub fn with_prefix(mut self, cidr: impl Into<Cidr>) -> Self {
        self.prefixes.insert(cidr.into());
        self
    }

    /// Returns the identity of this VRF.
    pub fn key(&self) -> VrfKey {
        VrfKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Returns true if this VRF is identified by `key`.
    pub fn is(&self, key: &VrfKey) -> bool {
        key.matches(&self.namespace, &self.name)
    }

    /// Returns the representative export RT, if the VRF exports anything.
    pub fn representative_rt(&self) -> Option<&str> {
        self.exports.first().map(String::as_str)
    }

    /// Returns true if this VRF imports `rt`.
    pub fn imports_rt(&self, rt: &str) -> bool {
        self.imports.contains(rt)
    }
}

/// Immutable, point-in-time view of every VRF in the fabric.
///
/// Iteration follows the order the records were supplied in. Identities are
/// expected to be unique; if the store ever returns a duplicate, lookups
/// resolve to the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VrfSnapshot {
    vrfs: Vec<Vrf>,
}

impl VrfSnapshot {
    /// Creates a snapshot from VRF records in store order.
    pub fn new(vrfs: impl IntoIterator<Item = Vrf>) -> Self {
        Self {
            vrfs: vrfs.into_iter().collect(),
        }
    }

    /// Decodes a snapshot from the store's JSON list representation.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Returns the VRF identified by `key`, if present.
    pub fn get(&self, key: &VrfKey) -> Option<&Vrf> {
        self.vrfs.iter().find(|v| v.is(key))
    }

    /// Returns the VRF identified by namespace/name, if present.
    pub fn find(&self, namespace: &str, name: &str) -> Option<&Vrf> {
        self.vrfs
            .iter()
            .find(|v| v.namespace == namespace && v.name == name)
    }

    /// Iterates VRFs in snapshot order.
    pub fn iter(&self) -> std::slice::Iter<'_, Vrf> {
        self.vrfs.iter()
    }

    /// Number of VRFs in the snapshot.
    pub fn len(&self) -> usize {
        self.vrfs.len()
    }

    /// Returns true if the snapshot holds no VRFs.
    pub fn is_empty(&self) -> bool {
        self.vrfs.is_empty()
    }

    /// VRFs that export at least one RT, in snapshot order.
    pub fn exporters(&self) -> impl Iterator<Item = &Vrf> {
        self.vrfs.iter().filter(|v| !v.exports.is_empty())
    }
}

impl<'a> IntoIterator for &'a VrfSnapshot {
    type Item = &'a Vrf;
    type IntoIter = std::slice::Iter<'a, Vrf>;

    fn into_iter(self) -> Self::IntoIter {
        self.vrfs.iter()
    }
}

impl FromIterator<Vrf> for VrfSnapshot {
    fn from_iter<I: IntoIterator<Item = Vrf>>(iter: I) -> Self {
        Self::new(iter)
    }
}
