//! Type definitions for vrfleakd

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use sonic_vrfleak_common::{Cidr, LeakError, ReconcileOperation, VrfKey};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sonic/vrfleakd.conf";

/// Default VRF store endpoint
pub const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8000";

/// Default per-request timeout against the VRF store (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// How a prefix became visible in a VRF
///
/// Serialized as [`PrefixInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PrefixInfo", try_from = "PrefixInfo")]
pub enum PrefixOrigin {
    /// Owned directly by the queried VRF
    Owned,
    /// Leaked in from another VRF through a shared route target
    Learned {
        /// The VRF that owns the prefix
        source: VrfKey,
    },
}

impl PrefixOrigin {
    /// Returns true if the prefix was learned from another VRF
    pub fn is_learned(&self) -> bool {
        matches!(self, PrefixOrigin::Learned { .. })
    }

    /// Returns the VRF the prefix was learned from
    pub fn source(&self) -> Option<&VrfKey> {
        match self {
            PrefixOrigin::Owned => None,
            PrefixOrigin::Learned { source } => Some(source),
        }
    }
}

/// Wire form of a [`PrefixOrigin`], as the VRF list view consumes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefixInfo {
    /// False for owned prefixes
    pub is_learned: bool,

    /// Namespace of the source VRF, learned prefixes only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_namespace: Option<String>,

    /// Name of the source VRF, learned prefixes only
    #[serde(default, rename = "sourceVRF", skip_serializing_if = "Option::is_none")]
    pub source_vrf: Option<String>,
}

impl From<PrefixOrigin> for PrefixInfo {
    fn from(origin: PrefixOrigin) -> Self {
        match origin {
            PrefixOrigin::Owned => Self {
                is_learned: false,
                source_namespace: None,
                source_vrf: None,
            },
            PrefixOrigin::Learned { source } => Self {
                is_learned: true,
                source_namespace: Some(source.namespace),
                source_vrf: Some(source.name),
            },
        }
    }
}

impl TryFrom<PrefixInfo> for PrefixOrigin {
    type Error = String;

    fn try_from(info: PrefixInfo) -> Result<Self, Self::Error> {
        if !info.is_learned {
            return Ok(PrefixOrigin::Owned);
        }
        match (info.source_namespace, info.source_vrf) {
            (Some(namespace), Some(name)) => Ok(PrefixOrigin::Learned {
                source: VrfKey::new(namespace, name),
            }),
            _ => Err("learned prefix without sourceNamespace and sourceVRF".to_string()),
        }
    }
}

/// Every prefix a VRF can reach, one entry per CIDR
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixVisibility {
    entries: BTreeMap<Cidr, PrefixOrigin>,
}

impl PrefixVisibility {
    /// Records an owned prefix. Ownership replaces any learned entry.
    pub fn insert_owned(&mut self, cidr: impl Into<Cidr>) {
        self.entries.insert(cidr.into(), PrefixOrigin::Owned);
    }

    /// Records a learned prefix unless the CIDR is already present.
    ///
    /// Returns true if the entry was added.
    pub fn insert_learned(&mut self, cidr: impl Into<Cidr>, source: &VrfKey) -> bool {
        let mut added = false;
        self.entries.entry(cidr.into()).or_insert_with(|| {
            added = true;
            PrefixOrigin::Learned {
                source: source.clone(),
            }
        });
        added
    }

    /// Returns the origin of a CIDR, if visible
    pub fn get(&self, cidr: &str) -> Option<&PrefixOrigin> {
        self.entries.get(cidr)
    }

    /// Returns true if the CIDR is visible
    pub fn contains(&self, cidr: &str) -> bool {
        self.entries.contains_key(cidr)
    }

    /// Iterates visible prefixes in CIDR string order
    pub fn iter(&self) -> impl Iterator<Item = (&Cidr, &PrefixOrigin)> {
        self.entries.iter()
    }

    /// Number of visible prefixes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is visible
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of learned prefixes
    pub fn learned_count(&self) -> usize {
        self.entries.values().filter(|o| o.is_learned()).count()
    }
}

/// Overall result of a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    /// Nothing to do
    NoOp,
    /// Every operation succeeded
    Succeeded,
    /// Some operations succeeded and some failed
    PartiallyFailed,
    /// Every attempted operation failed
    Failed,
    /// The pass was cancelled before all outcomes were collected
    Cancelled,
}

impl ReconcileStatus {
    /// Returns the status name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileStatus::NoOp => "no_op",
            ReconcileStatus::Succeeded => "succeeded",
            ReconcileStatus::PartiallyFailed => "partially_failed",
            ReconcileStatus::Failed => "failed",
            ReconcileStatus::Cancelled => "cancelled",
        }
    }
}

/// Aggregate outcome of executing an operation list
///
/// `attempted` counts operations dispatched to the store. Every attempted
/// operation is either succeeded, failed, or abandoned (dispatched but its
/// result was not collected because the pass was cancelled). Operations that
/// were never dispatched are listed in `cancelled`.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Operations dispatched to the store
    pub attempted: usize,
    /// Operations the store acknowledged
    pub succeeded: usize,
    /// Operations the store rejected, with the error it returned
    pub failed: Vec<(ReconcileOperation, LeakError)>,
    /// Operations never dispatched because the pass was cancelled
    pub cancelled: Vec<ReconcileOperation>,
    /// Operations dispatched but not awaited because the pass was cancelled
    pub abandoned: Vec<ReconcileOperation>,
}

impl ReconcileReport {
    /// Total number of operations submitted
    pub fn total(&self) -> usize {
        self.attempted + self.cancelled.len()
    }

    /// Returns true if the pass was cut short
    pub fn is_cancelled(&self) -> bool {
        !self.cancelled.is_empty() || !self.abandoned.is_empty()
    }

    /// Classifies the pass
    pub fn status(&self) -> ReconcileStatus {
        if self.total() == 0 {
            ReconcileStatus::NoOp
        } else if self.is_cancelled() {
            ReconcileStatus::Cancelled
        } else if self.failed.is_empty() {
            ReconcileStatus::Succeeded
        } else if self.succeeded == 0 {
            ReconcileStatus::Failed
        } else {
            ReconcileStatus::PartiallyFailed
        }
    }

    /// Operations that failed, in submission order
    pub fn failed_operations(&self) -> impl Iterator<Item = &ReconcileOperation> {
        self.failed.iter().map(|(op, _)| op)
    }
}

#[derive(Serialize)]
struct FailureView<'a> {
    operation: &'a ReconcileOperation,
    error: String,
}

impl Serialize for ReconcileReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let failed: Vec<FailureView<'_>> = self
            .failed
            .iter()
            .map(|(operation, err)| FailureView {
                operation,
                error: err.to_string(),
            })
            .collect();

        let mut s = serializer.serialize_struct("ReconcileReport", 6)?;
        s.serialize_field("status", &self.status())?;
        s.serialize_field("attempted", &self.attempted)?;
        s.serialize_field("succeeded", &self.succeeded)?;
        s.serialize_field("failed", &failed)?;
        s.serialize_field("cancelled", &self.cancelled)?;
        s.serialize_field("abandoned", &self.abandoned)?;
        s.end()
    }
}
