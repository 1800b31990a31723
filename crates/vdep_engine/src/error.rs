//! Error types for engine operations.

use std::path::PathBuf;

use vdep_common::{ImportPath, InvalidImportPath};
use vdep_model::ModelError;

/// Errors that can occur while generating, installing, or combining
/// virtual dependencies.
///
/// Malformed artifacts already on disk are never reported through this type.
/// They read as "no summary" and become garbage-collection candidates.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// An I/O error occurred while staging or installing artifacts.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A virtual path maps to a location outside the scratch root.
    #[error("virtual dependency '{virtual_path}' resolves outside of {root}")]
    PathEscapesRoot {
        /// The offending virtual path.
        virtual_path: ImportPath,
        /// The root it should have stayed inside.
        root: PathBuf,
    },

    /// Two reports disagree about who owns an entry.
    #[error("conflicting {table} entries for '{key}': '{existing}' vs '{incoming}'")]
    OwnershipConflict {
        /// The report table the conflict was found in.
        table: &'static str,
        /// The contested key.
        key: ImportPath,
        /// The value already merged.
        existing: ImportPath,
        /// The value that would have replaced it.
        incoming: ImportPath,
    },

    /// The model graph could not answer a lookup.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A generated name is not a valid import path.
    #[error(transparent)]
    InvalidPath(#[from] InvalidImportPath),

    /// The report snapshot could not be encoded.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    #[test]
    fn io_error_display() {
        let err = EngineError::io(
            "/tmp/out/__virtual__/mod_1.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("mod_1.py"));
    }

    #[test]
    fn escape_display() {
        let err = EngineError::PathEscapesRoot {
            virtual_path: ip("ns.mod_1"),
            root: PathBuf::from("/scratch"),
        };
        let msg = err.to_string();
        assert!(msg.contains("ns.mod_1"));
        assert!(msg.contains("/scratch"));
    }

    #[test]
    fn conflict_display() {
        let err = EngineError::OwnershipConflict {
            table: "concrete_annotations",
            key: ip("a.models.M"),
            existing: ip("ns.mod_1.Concrete__M"),
            incoming: ip("ns.mod_2.Concrete__M"),
        };
        let msg = err.to_string();
        assert!(msg.contains("concrete_annotations"));
        assert!(msg.contains("ns.mod_1.Concrete__M"));
        assert!(msg.contains("ns.mod_2.Concrete__M"));
    }

    #[test]
    fn model_error_is_transparent() {
        let err: EngineError = ModelError::UnknownModel("a.M".to_string()).into();
        assert_eq!(err.to_string(), "unknown model 'a.M'");
    }

    #[test]
    fn serialization_error_display() {
        let err = EngineError::Serialization {
            reason: "invalid bincode data".to_string(),
        };
        assert!(err.to_string().contains("invalid bincode data"));
    }
}
