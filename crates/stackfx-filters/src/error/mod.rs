//! Domain errors raised by filter discovery and attachment.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::engine::EngineError;

/// Errors arising from filter operations.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The plugin root could not be enumerated. Discovery aborts.
    #[error("cannot read plugin root '{}': {source}", path.display())]
    PluginRoot {
        /// Root directory that was scanned.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A descriptor file could not be read or failed validation.
    #[error("invalid filter descriptor '{}': {message}", path.display())]
    Descriptor {
        /// Descriptor file that was rejected.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The persisted descriptor settings could not be loaded.
    #[error("cannot load filter settings '{}': {message}", path.display())]
    Settings {
        /// Settings file that was read.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A descriptor with the same unique id is already registered.
    #[error("filter '{unique_id}' is already registered")]
    DuplicateId {
        /// Conflicting unique id.
        unique_id: String,
    },

    /// A single-instance filter is already attached to the producer.
    #[error("only one '{name}' filter is allowed (attached at index {index})")]
    Duplicate {
        /// Display name of the filter.
        name: String,
        /// Index of the existing attachment.
        index: usize,
    },

    /// No descriptor with the requested unique id was discovered.
    #[error("filter '{unique_id}' not found in registry")]
    UnknownFilter {
        /// Unique id that was looked up.
        unique_id: String,
    },

    /// An index does not refer to an attached filter.
    #[error("attachment index {index} is out of range for {len} attached filters")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of attached filters.
        len: usize,
    },

    /// Filters cannot be attached before a producer is bound.
    #[error("no producer is bound")]
    NoProducer,

    /// The media engine rejected an operation.
    #[error("media engine failed to {operation}: {source}")]
    Engine {
        /// Operation that failed.
        operation: &'static str,
        /// Error reported by the engine.
        #[source]
        source: EngineError,
    },
}

impl FilterError {
    /// Returns the index of the existing attachment for duplicate rejections.
    #[must_use]
    pub const fn duplicate_index(&self) -> Option<usize> {
        match self {
            Self::Duplicate { index, .. } => Some(*index),
            _ => None,
        }
    }
}
