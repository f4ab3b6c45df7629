//! Error types for route-leak operations.
//!
//! This module defines the error types used throughout the vrfleak crates.
//! All errors implement `std::error::Error` via `thiserror`.

use std::io;
use thiserror::Error;

/// Result type alias for route-leak operations.
pub type LeakResult<T> = Result<T, LeakError>;

/// Errors that can occur while resolving leaks or reconciling a leak matrix.
#[derive(Debug, Error)]
pub enum LeakError {
    /// The queried VRF identity is not part of the snapshot.
    #[error("VRF '{namespace}/{name}' not found")]
    NotFound {
        /// Namespace of the missing VRF.
        namespace: String,
        /// Name of the missing VRF.
        name: String,
    },

    /// A structurally invalid operation reached the executor.
    #[error("Malformed operation at index {index}: {reason}")]
    MalformedOperation {
        /// Position of the offending operation in the submitted list.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// A single add/remove call to the external VRF store failed.
    #[error("Remote store call failed: {operation}: {detail}")]
    Remote {
        /// The store call that failed (e.g., "add_import", "fetch_snapshot").
        operation: String,
        /// Error detail reported by the store or the transport.
        detail: String,
    },

    /// Configuration loading or validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// Filesystem error while reading snapshots, matrices or configuration.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON decoding error for snapshots or matrices.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LeakError {
    /// Creates a not found error.
    pub fn not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Creates a malformed operation error.
    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedOperation {
            index,
            reason: reason.into(),
        }
    }

    /// Creates a remote store error.
    pub fn remote(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on a later reconciliation pass.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LeakError::Remote { .. })
    }
}
