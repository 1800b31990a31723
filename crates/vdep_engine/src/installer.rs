//! Staging, installing, and garbage-collecting artifacts.
//!
//! Artifacts are first written into a scratch directory. Installing moves a
//! staged artifact over its destination only when the destination's stored
//! summary differs, so an unchanged pass touches nothing. Everything under
//! the namespace directory that was not produced by this pass and does not
//! read as a live artifact is then removed.
//!
//! One installer must own a destination at a time. A pass interrupted midway
//! leaves a mix of old and new artifacts; the next pass sees the mismatched
//! summaries and repairs them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use vdep_common::ImportPath;
use walkdir::WalkDir;

use crate::error::EngineError;
use crate::summary::{get_report_summary, ModuleResolver};

/// What an install step changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    /// Destination files that were written, sorted.
    pub installed: Vec<PathBuf>,
    /// Destination files left untouched because their summary matched, sorted.
    pub unchanged: Vec<PathBuf>,
    /// Stale files and emptied directories that were deleted, sorted.
    pub removed: Vec<PathBuf>,
}

impl InstallOutcome {
    /// Returns `true` if the install modified nothing.
    pub fn is_noop(&self) -> bool {
        self.installed.is_empty() && self.removed.is_empty()
    }
}

/// Stages artifacts and installs them into a destination.
#[derive(Debug, Clone)]
pub struct ReportInstaller {
    extension: String,
    /// Staged artifacts: path relative to the scratch root → summary.
    written: BTreeMap<PathBuf, Option<String>>,
}

impl ReportInstaller {
    /// Creates an installer for artifacts with the given file extension.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            written: BTreeMap::new(),
        }
    }

    /// Number of artifacts staged so far.
    pub fn staged(&self) -> usize {
        self.written.len()
    }

    /// Maps a virtual path to its location relative to a root:
    /// `a.b.c` → `a/b/c.<ext>`.
    pub fn relative_location(&self, virtual_path: &ImportPath) -> PathBuf {
        let mut location: PathBuf = virtual_path.segments().collect();
        location.set_extension(&self.extension);
        location
    }

    /// Writes `content` for `virtual_path` into `scratch_root`.
    ///
    /// Fails with [`EngineError::PathEscapesRoot`] if the location would not
    /// be strictly inside `scratch_root`.
    pub fn write_report(
        &mut self,
        scratch_root: &Path,
        virtual_path: &ImportPath,
        content: &str,
        summary_hash: Option<String>,
    ) -> Result<PathBuf, EngineError> {
        let relative = self.relative_location(virtual_path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(EngineError::PathEscapesRoot {
                virtual_path: virtual_path.clone(),
                root: scratch_root.to_path_buf(),
            });
        }

        let location = scratch_root.join(&relative);
        if let Some(parent) = location.parent() {
            std::fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
        }
        std::fs::write(&location, content).map_err(|e| EngineError::io(&location, e))?;

        self.written.insert(relative, summary_hash);
        Ok(location)
    }

    /// Installs every staged artifact into `destination`, then removes stale
    /// files under `destination/<namespace>`.
    ///
    /// A staged artifact replaces its destination when the destination is
    /// missing or its stored summary differs. Stale files are those this pass
    /// did not produce whose summary reads as `None` under `resolver`.
    /// Directories are removed once nothing is left in them.
    pub fn install_reports<R>(
        &self,
        scratch_root: &Path,
        destination: &Path,
        namespace: &ImportPath,
        resolver: &R,
    ) -> Result<InstallOutcome, EngineError>
    where
        R: ModuleResolver + ?Sized,
    {
        let mut outcome = InstallOutcome::default();
        let mut seen: BTreeSet<PathBuf> = BTreeSet::new();

        for (relative, summary) in &self.written {
            let staged = scratch_root.join(relative);
            let target = destination.join(relative);
            seen.insert(target.clone());

            let exists = target.symlink_metadata().is_ok();
            let current = if exists {
                get_report_summary(&target, &self.extension, resolver)
            } else {
                None
            };

            if exists && current == *summary {
                outcome.unchanged.push(target);
                continue;
            }

            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| EngineError::io(parent, e))?;
            }
            if target.is_dir() {
                std::fs::remove_dir_all(&target).map_err(|e| EngineError::io(&target, e))?;
            }
            move_file(&staged, &target)?;
            debug!(path = %target.display(), "installed artifact");
            outcome.installed.push(target);
        }

        let root = destination.join(namespace.segments().collect::<PathBuf>());
        if root.is_dir() {
            outcome.removed = self.collect_garbage(&root, &seen, resolver)?;
        }

        Ok(outcome)
    }

    fn collect_garbage<R>(
        &self,
        root: &Path,
        seen: &BTreeSet<PathBuf>,
        resolver: &R,
    ) -> Result<Vec<PathBuf>, EngineError>
    where
        R: ModuleResolver + ?Sized,
    {
        let entries = WalkDir::new(root)
            .min_depth(1)
            .contents_first(true)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                EngineError::io(path, e.into())
            })?;

        let mut removed = Vec::new();
        for entry in entries {
            let path = entry.path();
            if seen.contains(path) {
                continue;
            }

            if entry.file_type().is_dir() {
                let empty = std::fs::read_dir(path)
                    .map_err(|e| EngineError::io(path, e))?
                    .next()
                    .is_none();
                if empty {
                    std::fs::remove_dir(path).map_err(|e| EngineError::io(path, e))?;
                    debug!(path = %path.display(), "removed empty directory");
                    removed.push(path.to_path_buf());
                }
            } else if get_report_summary(path, &self.extension, resolver).is_none() {
                std::fs::remove_file(path).map_err(|e| EngineError::io(path, e))?;
                debug!(path = %path.display(), "removed stale artifact");
                removed.push(path.to_path_buf());
            }
        }

        removed.sort();
        Ok(removed)
    }
}

/// Moves `from` over `to`, copying through a sibling temporary file when a
/// plain rename is not possible.
fn move_file(from: &Path, to: &Path) -> Result<(), EngineError> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let mut tmp_name = to.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".vdep-tmp");
    let tmp = to.with_file_name(tmp_name);
    std::fs::copy(from, &tmp).map_err(|e| EngineError::io(&tmp, e))?;
    std::fs::rename(&tmp, to).map_err(|e| EngineError::io(to, e))?;
    Ok(())
}
