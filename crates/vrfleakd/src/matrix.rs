//! Leak matrix derivation and diffing
//!
//! Rows are all VRFs, columns are the VRFs that export at least one RT. A
//! cell `(row, col)` is set when `row` imports the representative (first)
//! export RT of `col`. Self cells are never represented.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sonic_vrfleak_common::{ReconcileOperation, RouteTarget, Vrf, VrfKey, VrfSnapshot};
use tracing::{debug, instrument, warn};

/// How to treat a desired cell that the caller did not supply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingCellPolicy {
    /// Absent means "no leak": reconcile toward removal
    #[default]
    Remove,
    /// Absent means "leave as is"
    Keep,
}

impl MissingCellPolicy {
    /// Returns the policy name as used in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingCellPolicy::Remove => "remove",
            MissingCellPolicy::Keep => "keep",
        }
    }
}

impl fmt::Display for MissingCellPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingCellPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remove" => Ok(MissingCellPolicy::Remove),
            "keep" => Ok(MissingCellPolicy::Keep),
            other => Err(format!(
                "unknown missing cell policy '{}' (expected 'remove' or 'keep')",
                other
            )),
        }
    }
}

/// An exporting VRF and the RT its column stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixColumn {
    /// Exporting VRF
    pub vrf: VrfKey,
    /// Its representative export RT
    pub rt: RouteTarget,
}

/// One cell of a leak matrix in its serialized form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakCell {
    /// Importing (destination) VRF
    pub row: VrfKey,
    /// Exporting (source) VRF
    pub col: VrfKey,
    /// Whether `row` should import `col`'s representative RT
    pub leak: bool,
}

/// Sparse row x column boolean matrix
///
/// Serialized as a list of [`LeakCell`]. Self cells are dropped on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LeakCell>", into = "Vec<LeakCell>")]
pub struct LeakMatrix {
    cells: BTreeMap<(VrfKey, VrfKey), bool>,
}

impl LeakMatrix {
    /// Create an empty matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the matrix as it stands in `snapshot`
    pub fn current(snapshot: &VrfSnapshot) -> Self {
        let columns = Self::columns(snapshot);
        let mut matrix = Self::new();
        for row in snapshot {
            let row_key = row.key();
            for col in &columns {
                matrix.set(row_key.clone(), col.vrf.clone(), row.imports_rt(&col.rt));
            }
        }
        matrix
    }

    /// Exporting VRFs with their representative RT, in snapshot order
    pub fn columns(snapshot: &VrfSnapshot) -> Vec<MatrixColumn> {
        snapshot
            .iter()
            .filter_map(|vrf| {
                vrf.representative_rt().map(|rt| MatrixColumn {
                    vrf: vrf.key(),
                    rt: rt.to_string(),
                })
            })
            .collect()
    }

    /// Set a cell. Self cells are ignored; returns false in that case.
    pub fn set(&mut self, row: VrfKey, col: VrfKey, leak: bool) -> bool {
        if row == col {
            return false;
        }
        self.cells.insert((row, col), leak);
        true
    }

    /// Flip a cell, treating an absent cell as unset
    pub fn toggle(&mut self, row: &VrfKey, col: &VrfKey) -> bool {
        let next = !self.get(row, col).unwrap_or(false);
        self.set(row.clone(), col.clone(), next) && next
    }

    /// Read a cell, `None` if the caller never supplied it
    pub fn get(&self, row: &VrfKey, col: &VrfKey) -> Option<bool> {
        // BTreeMap lookups on a tuple key need an owned tuple
        self.cells.get(&(row.clone(), col.clone())).copied()
    }

    /// Iterate cells in row, then column order
    pub fn iter(&self) -> impl Iterator<Item = (&VrfKey, &VrfKey, bool)> {
        self.cells.iter().map(|((r, c), v)| (r, c, *v))
    }

    /// Number of supplied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if no cell is supplied
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl From<Vec<LeakCell>> for LeakMatrix {
    fn from(cells: Vec<LeakCell>) -> Self {
        let mut matrix = Self::new();
        for cell in cells {
            matrix.set(cell.row, cell.col, cell.leak);
        }
        matrix
    }
}

impl From<LeakMatrix> for Vec<LeakCell> {
    fn from(matrix: LeakMatrix) -> Self {
        matrix
            .cells
            .into_iter()
            .map(|((row, col), leak)| LeakCell { row, col, leak })
            .collect()
    }
}

/// A row whose cells disagree about an RT several columns share
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedRtConflict {
    /// Importing VRF
    pub row: VrfKey,
    /// Representative RT shared by the columns
    pub rt: RouteTarget,
    /// Columns asking to keep the current state
    pub unchanged: Vec<VrfKey>,
    /// Columns asking to flip it
    pub changed: Vec<VrfKey>,
}

/// Desired state of one RT in one row, merged across columns sharing it
struct RtDecision<'a> {
    rt: &'a str,
    current: bool,
    unchanged: Vec<&'a VrfKey>,
    changed: Vec<&'a VrfKey>,
}

impl RtDecision<'_> {
    fn is_conflict(&self) -> bool {
        !self.changed.is_empty() && !self.unchanged.is_empty()
    }
}

fn sorted_rows(snapshot: &VrfSnapshot) -> Vec<&Vrf> {
    let mut rows: Vec<&Vrf> = snapshot.iter().collect();
    rows.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
    rows.dedup_by(|a, b| a.namespace == b.namespace && a.name == b.name);
    rows
}

fn sorted_columns(snapshot: &VrfSnapshot) -> Vec<MatrixColumn> {
    let mut columns = LeakMatrix::columns(snapshot);
    columns.sort_by(|a, b| a.vrf.cmp(&b.vrf));
    columns.dedup_by(|a, b| a.vrf == b.vrf);
    columns
}

/// Groups a row's non-self cells by representative RT, in first-column order
fn row_decisions<'a>(
    row: &Vrf,
    row_key: &VrfKey,
    columns: &'a [MatrixColumn],
    desired: &LeakMatrix,
    policy: MissingCellPolicy,
) -> Vec<RtDecision<'a>> {
    let mut decisions: Vec<RtDecision<'a>> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for col in columns {
        if &col.vrf == row_key {
            continue;
        }
        let wanted = match (desired.get(row_key, &col.vrf), policy) {
            (Some(wanted), _) => wanted,
            (None, MissingCellPolicy::Remove) => false,
            (None, MissingCellPolicy::Keep) => continue,
        };
        let rt = col.rt.as_str();
        let i = *slot.entry(rt).or_insert_with(|| {
            decisions.push(RtDecision {
                rt,
                current: row.imports_rt(rt),
                unchanged: Vec::new(),
                changed: Vec::new(),
            });
            decisions.len() - 1
        });
        let decision = &mut decisions[i];
        if wanted == decision.current {
            decision.unchanged.push(&col.vrf);
        } else {
            decision.changed.push(&col.vrf);
        }
    }
    decisions
}

/// Computes the operations that move `snapshot` to `desired`.
///
/// Rows and columns are visited in identity order, so the output is
/// deterministic. Columns sharing a representative RT collapse into a single
/// decision per row, so the list never holds duplicate or conflicting
/// operations. Any cell that differs from the current state flips the RT;
/// when other cells on the same RT ask to keep it, the conflict is logged
/// and listed by [`conflicts`].
#[instrument(skip_all, fields(vrfs = snapshot.len(), cells = desired.len(), policy = %policy))]
pub fn diff(
    snapshot: &VrfSnapshot,
    desired: &LeakMatrix,
    policy: MissingCellPolicy,
) -> Vec<ReconcileOperation> {
    let columns = sorted_columns(snapshot);

    let mut ops = Vec::new();
    for row in sorted_rows(snapshot) {
        let row_key = row.key();
        for decision in row_decisions(row, &row_key, &columns, desired, policy) {
            if decision.changed.is_empty() {
                continue;
            }
            if decision.is_conflict() {
                warn!(
                    vrf = %row_key,
                    rt = decision.rt,
                    changed = decision.changed.len(),
                    unchanged = decision.unchanged.len(),
                    "Cells sharing a route target disagree, applying the change"
                );
            }
            let op = if decision.current {
                ReconcileOperation::remove(&row.namespace, &row.name, decision.rt)
            } else {
                ReconcileOperation::add(&row.namespace, &row.name, decision.rt)
            };
            ops.push(op);
        }
    }

    debug!(operations = ops.len(), "Computed leak matrix diff");
    ops
}

/// Rows where cells sharing a representative RT disagree, in [`diff`] order
pub fn conflicts(
    snapshot: &VrfSnapshot,
    desired: &LeakMatrix,
    policy: MissingCellPolicy,
) -> Vec<SharedRtConflict> {
    let columns = sorted_columns(snapshot);

    let mut found = Vec::new();
    for row in sorted_rows(snapshot) {
        let row_key = row.key();
        for decision in row_decisions(row, &row_key, &columns, desired, policy) {
            if decision.is_conflict() {
                found.push(SharedRtConflict {
                    row: row_key.clone(),
                    rt: decision.rt.to_string(),
                    unchanged: decision.unchanged.into_iter().cloned().collect(),
                    changed: decision.changed.into_iter().cloned().collect(),
                });
            }
        }
    }
    found
}

/// [`diff`] with the default missing-cell policy
pub fn diff_leak_matrix(snapshot: &VrfSnapshot, desired: &LeakMatrix) -> Vec<ReconcileOperation> {
    diff(snapshot, desired, MissingCellPolicy::default())
}
