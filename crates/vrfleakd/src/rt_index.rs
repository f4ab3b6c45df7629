//! Route target to exporter lookup

use std::collections::{BTreeSet, HashMap};

use sonic_vrfleak_common::{VrfKey, VrfSnapshot};

/// Maps every exported RT in a snapshot to the VRFs exporting it
#[derive(Debug, Clone, Default)]
pub struct RouteTargetIndex {
    exporters: HashMap<String, BTreeSet<VrfKey>>,
}

impl RouteTargetIndex {
    /// Build the index from a snapshot. Every RT in any VRF's exports is indexed.
    pub fn build(snapshot: &VrfSnapshot) -> Self {
        let mut exporters: HashMap<String, BTreeSet<VrfKey>> = HashMap::new();
        for vrf in snapshot {
            for rt in &vrf.exports {
                exporters.entry(rt.clone()).or_default().insert(vrf.key());
            }
        }
        Self { exporters }
    }

    /// VRFs exporting `rt`
    pub fn exporters(&self, rt: &str) -> Option<&BTreeSet<VrfKey>> {
        self.exporters.get(rt)
    }

    /// Returns true if `vrf` exports `rt`
    pub fn is_exported_by(&self, rt: &str, vrf: &VrfKey) -> bool {
        self.exporters
            .get(rt)
            .is_some_and(|set| set.contains(vrf))
    }

    /// Union of the exporters of every RT in `imports`
    pub fn exporters_of_any<'a, I>(&self, imports: I) -> BTreeSet<&VrfKey>
    where
        I: IntoIterator<Item = &'a String>,
    {
        imports
            .into_iter()
            .filter_map(|rt| self.exporters.get(rt.as_str()))
            .flatten()
            .collect()
    }

    /// Number of distinct exported RTs
    pub fn len(&self) -> usize {
        self.exporters.len()
    }

    /// Returns true if no VRF exports anything
    pub fn is_empty(&self) -> bool {
        self.exporters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sonic_vrfleak_common::Vrf;

    fn snapshot() -> VrfSnapshot {
        VrfSnapshot::new(vec![
            Vrf::new("default", "blue", "65000:1")
                .with_export("65000:1")
                .with_export("65000:100"),
            Vrf::new("default", "green", "65000:3").with_export("65000:100"),
            Vrf::new("default", "red", "65000:2").with_import("65000:1"),
        ])
    }

    #[test]
    fn test_every_export_is_indexed() {
        let snapshot = snapshot();
        let index = RouteTargetIndex::build(&snapshot);

        for vrf in &snapshot {
            for rt in &vrf.exports {
                assert!(index.is_exported_by(rt, &vrf.key()));
            }
        }
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_shared_rt_has_all_exporters() {
        let index = RouteTargetIndex::build(&snapshot());
        let shared = index.exporters("65000:100").unwrap();
        assert_eq!(shared.len(), 2);
        assert!(shared.contains(&VrfKey::new("default", "blue")));
        assert!(shared.contains(&VrfKey::new("default", "green")));
    }

    #[test]
    fn test_imports_are_not_indexed() {
        let index = RouteTargetIndex::build(&snapshot());
        assert!(!index.is_exported_by("65000:1", &VrfKey::new("default", "red")));
        assert!(index.exporters("65000:999").is_none());
    }

    #[test]
    fn test_exporters_of_any() {
        let index = RouteTargetIndex::build(&snapshot());
        let imports = vec!["65000:1".to_string(), "65000:100".to_string()];
        let found = index.exporters_of_any(&imports);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_empty_snapshot() {
        let index = RouteTargetIndex::build(&VrfSnapshot::default());
        assert!(index.is_empty());
    }
}
