//! Error types for model graph lookups.

use std::path::PathBuf;

use vdep_common::InvalidImportPath;

/// Errors raised by a [`ModelGraph`](crate::ModelGraph) or while loading a
/// [`ModelSnapshot`](crate::ModelSnapshot).
///
/// A lookup failure is fatal for the module being processed, never for the
/// whole pass.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A model was requested that the graph does not know about.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// A path in the input is not a valid dotted import path.
    #[error(transparent)]
    InvalidPath(#[from] InvalidImportPath),

    /// Two modules define the same model path.
    #[error("model '{model}' is defined by both '{first}' and '{second}'")]
    DuplicateModel {
        /// The contested model path.
        model: String,
        /// The module that registered it first.
        first: String,
        /// The module that tried to register it again.
        second: String,
    },

    /// The snapshot file could not be read.
    #[error("failed to read model snapshot {path}: {source}")]
    Io {
        /// The snapshot path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot content is not valid JSON for the snapshot schema.
    #[error("failed to parse model snapshot: {0}")]
    Parse(String),
}
