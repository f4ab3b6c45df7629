//! Matrix diff properties over generated snapshots and desired matrices
//!
//! Snapshots draw exports and imports from a small RT pool so that shared
//! representative RTs and rows importing their own RT come up often.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use proptest::prelude::*;
use sonic_vrfleak_test::assert_unique_targets;
use sonic_vrfleakd::{
    conflicts, diff, LeakMatrix, MissingCellPolicy, OpKind, ReconcileOperation, Vrf, VrfKey,
    VrfSnapshot,
};

const RT_POOL: [&str; 4] = ["65000:1", "65000:2", "65000:3", "65000:4"];

fn arb_vrf(index: usize) -> impl Strategy<Value = Vrf> {
    (
        any::<bool>(),
        prop::collection::vec(0..RT_POOL.len(), 0..3),
        prop::collection::btree_set(0..RT_POOL.len(), 0..4),
    )
        .prop_map(move |(tenant, exports, imports)| {
            let namespace = if tenant { "tenant" } else { "default" };
            let mut vrf = Vrf::new(namespace, format!("vrf{}", index), format!("65100:{}", index));
            for rt in exports {
                vrf = vrf.with_export(RT_POOL[rt]);
            }
            for rt in imports {
                vrf = vrf.with_import(RT_POOL[rt]);
            }
            vrf
        })
}

fn arb_snapshot() -> impl Strategy<Value = VrfSnapshot> {
    (2usize..6)
        .prop_flat_map(|count| (0..count).map(arb_vrf).collect::<Vec<_>>())
        .prop_map(VrfSnapshot::new)
}

fn arb_policy() -> impl Strategy<Value = MissingCellPolicy> {
    prop_oneof![Just(MissingCellPolicy::Remove), Just(MissingCellPolicy::Keep)]
}

/// A snapshot, a desired matrix mixing set, unset and absent cells, and a policy
fn arb_case() -> impl Strategy<Value = (VrfSnapshot, LeakMatrix, MissingCellPolicy)> {
    arb_snapshot()
        .prop_flat_map(|snapshot| {
            let cells = snapshot.len() * snapshot.len();
            (
                Just(snapshot),
                prop::collection::vec(prop::option::of(any::<bool>()), cells),
                arb_policy(),
            )
        })
        .prop_map(|(snapshot, cells, policy)| {
            let keys: Vec<VrfKey> = snapshot.iter().map(Vrf::key).collect();
            let mut desired = LeakMatrix::new();
            for (i, cell) in cells.into_iter().enumerate() {
                if let Some(leak) = cell {
                    desired.set(
                        keys[i / keys.len()].clone(),
                        keys[i % keys.len()].clone(),
                        leak,
                    );
                }
            }
            (snapshot, desired, policy)
        })
}

/// The snapshot after the store has applied `ops`
fn apply(snapshot: &VrfSnapshot, ops: &[ReconcileOperation]) -> VrfSnapshot {
    snapshot
        .iter()
        .cloned()
        .map(|mut vrf| {
            let key = vrf.key();
            for op in ops.iter().filter(|op| op.vrf_key() == key) {
                match op.kind {
                    OpKind::Add => {
                        vrf.imports.insert(op.rt.clone());
                    }
                    OpKind::Remove => {
                        vrf.imports.remove(&op.rt);
                    }
                }
            }
            vrf
        })
        .collect()
}

/// Effective desired values per (row, rt), gathered from every non-self column
fn wanted_by_rt(
    snapshot: &VrfSnapshot,
    desired: &LeakMatrix,
    policy: MissingCellPolicy,
) -> BTreeMap<(VrfKey, String), BTreeSet<bool>> {
    let mut wanted: BTreeMap<(VrfKey, String), BTreeSet<bool>> = BTreeMap::new();
    for row in snapshot {
        let row_key = row.key();
        for col in LeakMatrix::columns(snapshot) {
            if col.vrf == row_key {
                continue;
            }
            let entry = wanted.entry((row_key.clone(), col.rt)).or_default();
            match (desired.get(&row_key, &col.vrf), policy) {
                (Some(leak), _) => {
                    entry.insert(leak);
                }
                (None, MissingCellPolicy::Remove) => {
                    entry.insert(false);
                }
                (None, MissingCellPolicy::Keep) => {}
            }
        }
    }
    wanted
}

proptest! {
    #[test]
    fn diff_never_targets_only_a_self_pair((snapshot, desired, policy) in arb_case()) {
        let columns = LeakMatrix::columns(&snapshot);
        for op in diff(&snapshot, &desired, policy) {
            let row = op.vrf_key();
            prop_assert!(
                columns.iter().any(|c| c.vrf != row && c.rt == op.rt),
                "{} has no non-self column for its RT",
                op
            );
        }
    }

    #[test]
    fn diff_emits_one_operation_per_row_and_rt((snapshot, desired, policy) in arb_case()) {
        let ops = diff(&snapshot, &desired, policy);
        prop_assert!(assert_unique_targets(&ops).is_ok());

        let targets: HashSet<(VrfKey, &str)> =
            ops.iter().map(|op| (op.vrf_key(), op.rt.as_str())).collect();
        prop_assert_eq!(targets.len(), ops.len());
    }

    #[test]
    fn diff_only_emits_real_changes((snapshot, desired, policy) in arb_case()) {
        for op in diff(&snapshot, &desired, policy) {
            let imports = snapshot
                .find(&op.namespace, &op.name)
                .map(|vrf| vrf.imports_rt(&op.rt));
            let expected = match op.kind {
                OpKind::Add => Some(false),
                OpKind::Remove => Some(true),
            };
            prop_assert_eq!(imports, expected, "{} is a no-op", op);
        }
    }

    #[test]
    fn applied_diff_reaches_desired_cells((snapshot, desired, policy) in arb_case()) {
        let ops = diff(&snapshot, &desired, policy);
        let before = LeakMatrix::current(&snapshot);
        let after = LeakMatrix::current(&apply(&snapshot, &ops));

        let wanted = wanted_by_rt(&snapshot, &desired, policy);
        for row in &snapshot {
            let row_key = row.key();
            for col in LeakMatrix::columns(&snapshot) {
                if col.vrf == row_key {
                    continue;
                }
                let values = &wanted[&(row_key.clone(), col.rt.clone())];
                let expected = match values.len() {
                    0 => before.get(&row_key, &col.vrf),
                    1 => values.iter().next().copied(),
                    // Conflicting cells on a shared RT
                    _ => continue,
                };
                prop_assert_eq!(
                    after.get(&row_key, &col.vrf),
                    expected,
                    "cell ({}, {})",
                    row_key,
                    col.vrf
                );
            }
        }
    }

    #[test]
    fn conflicts_are_exactly_the_disagreeing_rts((snapshot, desired, policy) in arb_case()) {
        let reported: BTreeSet<(VrfKey, String)> = conflicts(&snapshot, &desired, policy)
            .into_iter()
            .map(|c| (c.row, c.rt))
            .collect();
        let expected: BTreeSet<(VrfKey, String)> = wanted_by_rt(&snapshot, &desired, policy)
            .into_iter()
            .filter(|(_, values)| values.len() > 1)
            .map(|(target, _)| target)
            .collect();
        prop_assert_eq!(reported, expected);
    }

    #[test]
    fn conflict_free_diff_is_idempotent((snapshot, desired, policy) in arb_case()) {
        if !conflicts(&snapshot, &desired, policy).is_empty() {
            return Ok(());
        }

        let ops = diff(&snapshot, &desired, policy);
        let after = apply(&snapshot, &ops);
        prop_assert!(diff(&after, &desired, policy).is_empty());
    }

    #[test]
    fn current_matrix_needs_no_operations(snapshot in arb_snapshot(), policy in arb_policy()) {
        let current = LeakMatrix::current(&snapshot);
        prop_assert!(diff(&snapshot, &current, policy).is_empty());
        prop_assert!(conflicts(&snapshot, &current, policy).is_empty());
    }
}
