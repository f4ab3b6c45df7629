//! Prefix visibility through route-target leaking
//!
//! A VRF sees its own prefixes plus the prefixes of every other VRF that
//! exports at least one RT the VRF imports. Leaking is exactly one hop: a
//! prefix learned by B is not forwarded again to VRFs importing from B.

use sonic_vrfleak_common::{LeakError, LeakResult, VrfKey, VrfSnapshot};
use tracing::{debug, instrument};

use crate::rt_index::RouteTargetIndex;
use crate::types::PrefixVisibility;

/// Computes the prefixes visible in `target`.
///
/// Owned prefixes always win over learned ones. When several VRFs leak the
/// same CIDR, the first in snapshot order is reported as the source.
#[instrument(skip(snapshot), fields(vrf = %target))]
pub fn resolve(snapshot: &VrfSnapshot, target: &VrfKey) -> LeakResult<PrefixVisibility> {
    let vrf = snapshot
        .get(target)
        .ok_or_else(|| LeakError::not_found(&target.namespace, &target.name))?;

    let index = RouteTargetIndex::build(snapshot);
    let sources = index.exporters_of_any(&vrf.imports);

    let mut visibility = PrefixVisibility::default();
    for cidr in &vrf.prefixes {
        visibility.insert_owned(cidr.as_str());
    }

    for other in snapshot {
        if other.is(target) {
            continue;
        }
        let other_key = other.key();
        if !sources.contains(&other_key) {
            continue;
        }
        for cidr in &other.prefixes {
            visibility.insert_learned(cidr.as_str(), &other_key);
        }
    }

    debug!(
        total = visibility.len(),
        learned = visibility.learned_count(),
        "Resolved visible prefixes"
    );

    Ok(visibility)
}

/// Namespace/name form of [`resolve`]
pub fn resolve_visible_prefixes(
    snapshot: &VrfSnapshot,
    namespace: &str,
    name: &str,
) -> LeakResult<PrefixVisibility> {
    resolve(snapshot, &VrfKey::new(namespace, name))
}
