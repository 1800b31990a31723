//! Error types for configuration loading and validation.

use std::path::PathBuf;

use vdep_common::InvalidImportPath;

/// Errors that can occur when loading or validating a `vdep.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A field that names a module or type is not a valid import path.
    #[error("{field}: {source}")]
    InvalidImportPath {
        /// Dotted name of the offending field, e.g. `virtual.namespace`.
        field: &'static str,
        /// Why the value was rejected.
        source: InvalidImportPath,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use vdep_common::ImportPath;

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("project.name".to_string());
        assert_eq!(format!("{err}"), "missing required field: project.name");
    }

    #[test]
    fn display_invalid_import_path_names_field() {
        let source = ImportPath::new("a..b").unwrap_err();
        let err = ConfigError::InvalidImportPath {
            field: "virtual.namespace",
            source,
        };
        let display = format!("{err}");
        assert!(display.starts_with("virtual.namespace: invalid import path 'a..b'"));
    }

    #[test]
    fn display_io_error_names_path() {
        let err = ConfigError::Io {
            path: PathBuf::from("/p/vdep.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert_eq!(format!("{err}"), "failed to read /p/vdep.toml: file not found");
    }
}
