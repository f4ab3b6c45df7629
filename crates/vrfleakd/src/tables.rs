//! VRF store REST resource and field name constants for vrfleakd

// Resource path segments
/// VRF collection resource
pub const VRFS_RESOURCE: &str = "vrfs";

/// Route target sub-resource of a VRF
pub const TARGETS_RESOURCE: &str = "targets";

/// Import direction under the targets sub-resource
pub const IMPORT_DIRECTION: &str = "import";

/// Field names used in store request and response bodies
pub mod fields {
    /// Route target field in add-import requests
    pub const RT: &str = "rt";

    /// Namespace filter on the VRF list query
    pub const NAMESPACE: &str = "namespace";

    /// Error detail field in store error responses
    pub const DETAIL: &str = "detail";
}
