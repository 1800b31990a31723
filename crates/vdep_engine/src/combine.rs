//! Merging per-module reports into one.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;
use vdep_common::{ContentHash, ImportPath};

use crate::error::EngineError;
use crate::report::Report;
use crate::scribe::WrittenVirtualDependency;

/// The merged report for a whole pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedReport {
    /// Changes exactly when the set of `(virtual path, summary)` pairs does.
    pub version: String,
    /// The union of every per-module report.
    pub report: Report,
}

impl Report {
    /// Merges `other` into `self`.
    ///
    /// Relation sets are unioned per key. Alias and module tables may repeat
    /// an identical entry, but two different values for the same key fail
    /// with [`EngineError::OwnershipConflict`].
    pub fn merge(&mut self, other: &Report) -> Result<(), EngineError> {
        merge_owned(
            "concrete_annotations",
            &mut self.concrete_annotations,
            &other.concrete_annotations,
        )?;
        merge_owned(
            "concrete_querysets",
            &mut self.concrete_querysets,
            &other.concrete_querysets,
        )?;
        merge_owned(
            "report_import_path",
            &mut self.report_import_path,
            &other.report_import_path,
        )?;
        for (module, related) in &other.related_import_paths {
            self.related_import_paths
                .entry(module.clone())
                .or_default()
                .extend(related.iter().cloned());
        }
        Ok(())
    }
}

fn merge_owned(
    table: &'static str,
    into: &mut BTreeMap<ImportPath, ImportPath>,
    from: &BTreeMap<ImportPath, ImportPath>,
) -> Result<(), EngineError> {
    for (key, value) in from {
        match into.entry(key.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(value.clone());
            }
            Entry::Occupied(slot) if slot.get() == value => {}
            Entry::Occupied(slot) => {
                warn!(table, key = %key, "conflicting report entries");
                return Err(EngineError::OwnershipConflict {
                    table,
                    key: key.clone(),
                    existing: slot.get().clone(),
                    incoming: value.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Merges the reports of every written artifact and derives the version.
pub fn combine<'a>(
    written: impl IntoIterator<Item = &'a WrittenVirtualDependency>,
) -> Result<CombinedReport, EngineError> {
    let mut report = Report::new();
    let mut summaries: Vec<(&ImportPath, Option<&str>)> = Vec::new();

    for w in written {
        report.merge(&w.report)?;
        summaries.push((&w.virtual_import_path, w.summary_hash.as_deref()));
    }

    summaries.sort();
    // The tag part keeps a missing summary distinct from an empty one.
    let version = ContentHash::from_parts(summaries.iter().flat_map(|(path, summary)| {
        match summary {
            Some(summary) => [path.as_str(), "some", summary],
            None => [path.as_str(), "none", ""],
        }
    }));

    Ok(CombinedReport {
        version: version.to_string(),
        report,
    })
}
