//! Reading summaries back out of installed artifacts.
//!
//! Parsing is tolerant: anything that is not clearly a live artifact reads as
//! `None`, which marks it as safe to replace or delete.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use vdep_common::ImportPath;

/// Decides whether a module named by an artifact still exists.
pub trait ModuleResolver: Sync {
    /// Returns `true` if `module` can still be imported.
    fn resolves(&self, module: &ImportPath) -> bool;
}

impl<F> ModuleResolver for F
where
    F: Fn(&ImportPath) -> bool + Sync,
{
    fn resolves(&self, module: &ImportPath) -> bool {
        self(module)
    }
}

/// Resolves exactly the modules in a fixed set.
#[derive(Debug, Clone, Default)]
pub struct KnownModules(BTreeSet<ImportPath>);

impl KnownModules {
    /// Creates a resolver from a set of module paths.
    pub fn new(modules: impl IntoIterator<Item = ImportPath>) -> Self {
        Self(modules.into_iter().collect())
    }
}

impl ModuleResolver for KnownModules {
    fn resolves(&self, module: &ImportPath) -> bool {
        self.0.contains(module)
    }
}

/// Resolves modules that exist as source files under one of a set of roots.
///
/// `a.b.c` resolves if `<root>/a/b/c.<ext>` or `<root>/a/b/c/__init__.<ext>`
/// is a file.
#[derive(Debug, Clone)]
pub struct SearchPathResolver {
    roots: Vec<PathBuf>,
    extension: String,
}

impl SearchPathResolver {
    /// Creates a resolver searching `roots` for files with `extension`.
    pub fn new(roots: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            roots,
            extension: extension.into(),
        }
    }
}

impl ModuleResolver for SearchPathResolver {
    fn resolves(&self, module: &ImportPath) -> bool {
        let relative: PathBuf = module.segments().collect();
        self.roots.iter().any(|root| {
            let base = root.join(&relative);
            base.with_extension(&self.extension).is_file()
                || base
                    .join(format!("__init__.{}", self.extension))
                    .is_file()
        })
    }
}

/// Resolves a module if either resolver does.
#[derive(Debug, Clone)]
pub struct AnyOf<A, B>(pub A, pub B);

impl<A: ModuleResolver, B: ModuleResolver> ModuleResolver for AnyOf<A, B> {
    fn resolves(&self, module: &ImportPath) -> bool {
        self.0.resolves(module) || self.1.resolves(module)
    }
}

/// Returns the summary stored in the artifact at `location`.
///
/// Returns `None` if `location` is not a file (symlinks are followed), does
/// not have `extension`, lacks a `mod = "..."` or `summary = "..."` line, or
/// names a module `resolver` no longer knows about. A `summary = None` line
/// counts as no summary.
pub fn get_report_summary<R>(location: &Path, extension: &str, resolver: &R) -> Option<String>
where
    R: ModuleResolver + ?Sized,
{
    if !location.is_file() {
        return None;
    }
    if location.extension().and_then(|e| e.to_str()) != Some(extension) {
        return None;
    }

    let content = std::fs::read_to_string(location).ok()?;
    let mut module: Option<&str> = None;
    let mut summary: Option<&str> = None;
    for line in content.lines() {
        if let Some(value) = quoted_assignment(line, "mod") {
            module = Some(value);
        }
        if let Some(value) = quoted_assignment(line, "summary") {
            summary = Some(value);
        }
        if module.is_some() && summary.is_some() {
            break;
        }
    }

    let module = ImportPath::new(module?).ok()?;
    let summary = summary?;
    resolver.resolves(&module).then(|| summary.to_string())
}

/// Matches `<name> = "<value>"` exactly, with a non-empty value free of quotes.
fn quoted_assignment<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let value = line
        .strip_prefix(name)?
        .strip_prefix(" = \"")?
        .strip_suffix('"')?;
    (!value.is_empty() && !value.contains('"')).then_some(value)
}
