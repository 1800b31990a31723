//! Validated dotted import paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string is not a valid dotted import path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid import path '{path}': {reason}")]
pub struct InvalidImportPath {
    /// The rejected input.
    pub path: String,
    /// Why the input was rejected.
    pub reason: &'static str,
}

/// A dotted identifier such as `app.models.Parent`.
///
/// Every `.`-separated segment is a valid identifier (`[A-Za-z_][A-Za-z0-9_]*`).
/// Import paths are used as map keys and as namespaces for prefix queries,
/// where a prefix only matches on a segment boundary.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImportPath(String);

impl ImportPath {
    /// Validates and wraps a dotted path.
    pub fn new(path: impl Into<String>) -> Result<Self, InvalidImportPath> {
        let path = path.into();
        if path.is_empty() {
            return Err(InvalidImportPath {
                path,
                reason: "path is empty",
            });
        }
        if !path.split('.').all(is_identifier) {
            return Err(InvalidImportPath {
                path,
                reason: "every segment must be an identifier",
            });
        }
        Ok(Self(path))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the `.`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Splits off the last segment, returning `(namespace, name)`.
    ///
    /// A single-segment path has no namespace.
    pub fn split(&self) -> (Option<ImportPath>, &str) {
        match self.0.rsplit_once('.') {
            Some((ns, name)) => (Some(Self(ns.to_string())), name),
            None => (None, self.0.as_str()),
        }
    }

    /// Returns the namespace containing this path, if any.
    pub fn parent(&self) -> Option<ImportPath> {
        self.split().0
    }

    /// Returns the final segment.
    pub fn name(&self) -> &str {
        self.split().1
    }

    /// Appends a segment.
    pub fn join(&self, name: &str) -> Result<ImportPath, InvalidImportPath> {
        Self::new(format!("{}.{name}", self.0))
    }

    /// Appends a segment made of `prefix` followed by the lowercase hex of `hash`.
    ///
    /// `prefix` must start with a letter or underscore and contain only
    /// identifier characters, so the result is always a valid path.
    pub fn join_hashed(&self, prefix: &'static str, hash: u64) -> ImportPath {
        debug_assert!(is_identifier(prefix), "prefix must be an identifier");
        Self(format!("{}.{prefix}{hash:016x}", self.0))
    }

    /// Returns `true` if this path equals `namespace` or lives beneath it.
    pub fn is_within(&self, namespace: &ImportPath) -> bool {
        match self.0.strip_prefix(namespace.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('.'),
            None => false,
        }
    }

    /// Iterates over this path and each of its namespaces, longest first.
    ///
    /// `a.b.c` yields `a.b.c`, `a.b`, `a`.
    pub fn prefixes(&self) -> impl Iterator<Item = ImportPath> + '_ {
        let dots = self
            .0
            .char_indices()
            .filter(|(_, c)| *c == '.')
            .map(|(i, _)| i)
            .rev();
        std::iter::once(self.clone()).chain(dots.map(move |i| Self(self.0[..i].to_string())))
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl TryFrom<String> for ImportPath {
    type Error = InvalidImportPath;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ImportPath {
    type Error = InvalidImportPath;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for ImportPath {
    type Err = InvalidImportPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<ImportPath> for String {
    fn from(value: ImportPath) -> Self {
        value.0
    }
}

impl AsRef<str> for ImportPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ImportPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImportPath({})", self.0)
    }
}
