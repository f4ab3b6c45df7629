//! Test fixtures for common route-leak layouts
//!
//! Provides reusable VRF snapshots for engine testing

use sonic_vrfleak_common::{Vrf, VrfSnapshot};

/// Namespace used by single-namespace fixtures
pub const DEFAULT_NAMESPACE: &str = "default";

/// VRF in the default namespace whose RD and sole export RT are `65000:<id>`
pub fn exporting_vrf(name: &str, id: u32) -> Vrf {
    let rt = format!("65000:{}", id);
    Vrf::new(DEFAULT_NAMESPACE, name, rt.clone()).with_export(rt)
}

/// VRF in the default namespace with RD `65000:<id>` and no route targets
pub fn silent_vrf(name: &str, id: u32) -> Vrf {
    Vrf::new(DEFAULT_NAMESPACE, name, format!("65000:{}", id))
}

/// `blue` exports 65000:1 and owns 10.0.0.0/24, `red` imports 65000:1
pub fn blue_red() -> VrfSnapshot {
    VrfSnapshot::new(vec![
        exporting_vrf("blue", 1).with_prefix("10.0.0.0/24"),
        silent_vrf("red", 2).with_import("65000:1"),
    ])
}

/// Same as [`blue_red`] but `red` imports nothing yet
pub fn blue_red_unleaked() -> VrfSnapshot {
    VrfSnapshot::new(vec![
        exporting_vrf("blue", 1).with_prefix("10.0.0.0/24"),
        silent_vrf("red", 2),
    ])
}

/// `red`, `green` and `blue`, each exporting its own RT, no leaks
///
/// `red` additionally imports 65000:3 (green's RT)
pub fn rgb() -> VrfSnapshot {
    VrfSnapshot::new(vec![
        exporting_vrf("red", 2)
            .with_prefix("10.2.0.0/16")
            .with_import("65000:3"),
        exporting_vrf("green", 3).with_prefix("10.3.0.0/16"),
        exporting_vrf("blue", 1).with_prefix("10.1.0.0/16"),
    ])
}

/// Three-VRF chain: `a` imports from `b`, `b` imports from `c`
pub fn chain() -> VrfSnapshot {
    VrfSnapshot::new(vec![
        exporting_vrf("a", 10)
            .with_import("65000:11")
            .with_prefix("10.10.0.0/16"),
        exporting_vrf("b", 11)
            .with_import("65000:12")
            .with_prefix("10.11.0.0/16"),
        exporting_vrf("c", 12).with_prefix("10.12.0.0/16"),
    ])
}

/// A hub leaking both ways with `spokes` spokes; spokes do not see each other
pub fn hub_and_spokes(spokes: u32) -> VrfSnapshot {
    let mut hub = exporting_vrf("hub", 100).with_prefix("10.100.0.0/16");
    let mut vrfs = Vec::new();
    for i in 1..=spokes {
        hub = hub.with_import(format!("65000:{}", i));
        vrfs.push(
            exporting_vrf(&format!("spoke{}", i), i)
                .with_import("65000:100")
                .with_prefix(format!("10.{}.0.0/16", i)),
        );
    }
    vrfs.insert(0, hub);
    VrfSnapshot::new(vrfs)
}

/// Same VRF names in two namespaces; `tenant/blue` imports `default/blue`
pub fn multi_namespace() -> VrfSnapshot {
    VrfSnapshot::new(vec![
        exporting_vrf("blue", 1).with_prefix("10.0.0.0/24"),
        Vrf::new("tenant", "blue", "65001:1")
            .with_export("65001:1")
            .with_import("65000:1")
            .with_prefix("172.16.0.0/16"),
        Vrf::new("tenant", "red", "65001:2").with_import("65001:1"),
    ])
}

/// `count` exporting VRFs with one owned prefix each and no leaks
pub fn flat_fabric(count: u32) -> VrfSnapshot {
    (1..=count)
        .map(|i| {
            exporting_vrf(&format!("vrf{}", i), i)
                .with_prefix(format!("10.{}.{}.0/24", i / 256, i % 256))
        })
        .collect()
}
