//! Error types for the diary_core library.

use crate::types::RecordKey;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for diary_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The log could not be read (missing permissions, corrupt file, ...)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A save or delete could not be written to the log
    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    /// Some of the requested keys were removed, others were not
    #[error("Partial delete: {} removed, {} not removed: {}", .removed.len(), .failed.len(), .reason)]
    PartialDelete {
        removed: Vec<RecordKey>,
        /// Requested keys that were already gone
        absent: Vec<RecordKey>,
        failed: Vec<RecordKey>,
        reason: String,
    },

    /// Malformed record, rejected before any I/O
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),
}

impl Error {
    /// Wrap a read-path failure.
    pub(crate) fn unavailable(err: impl std::fmt::Display) -> Self {
        Error::StorageUnavailable(err.to_string())
    }

    /// Wrap a write-path failure.
    pub(crate) fn write_failed(err: impl std::fmt::Display) -> Self {
        Error::StorageWriteFailed(err.to_string())
    }

    /// True for errors that the caller should surface as "try again later".
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::StorageUnavailable(_) | Error::StorageWriteFailed(_) | Error::PartialDelete { .. }
        )
    }
}

/// Reasons a record or user input is rejected.
///
/// Set and drop set positions are 1-based, matching how they are shown
/// to the user ("Set 1", "Drop set 2").
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("exercise name is empty")]
    EmptyName,

    #[error("set {set} has zero reps")]
    ZeroReps { set: usize },

    #[error("set {set} has invalid weight {weight}")]
    InvalidWeight { set: usize, weight: f64 },

    #[error("drop set {drop_set} of set {set} has zero reps")]
    ZeroDropSetReps { set: usize, drop_set: usize },

    #[error("drop set {drop_set} of set {set} has invalid weight {weight}")]
    InvalidDropSetWeight {
        set: usize,
        drop_set: usize,
        weight: f64,
    },

    #[error("a drop set needs a set to attach to")]
    DropSetWithoutSet,

    #[error("{field} must be a number, got {input:?}")]
    InvalidNumber { field: &'static str, input: String },
}
