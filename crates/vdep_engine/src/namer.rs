//! Real module → virtual module naming.

use std::collections::BTreeMap;

use vdep_common::{short_hash, ImportPath};

/// Maps a real module path to the virtual module that describes it.
///
/// The name is `<namespace>.mod_<hex>` where `<hex>` is a 64-bit XXH3 hash of
/// the real path. The mapping depends on nothing but its inputs, so it is
/// stable across processes. Collisions between distinct real paths are not
/// detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDependencyNamer {
    namespace: ImportPath,
}

impl VirtualDependencyNamer {
    /// Creates a namer placing every virtual module under `namespace`.
    pub fn new(namespace: ImportPath) -> Self {
        Self { namespace }
    }

    /// The namespace virtual modules are placed under.
    pub fn namespace(&self) -> &ImportPath {
        &self.namespace
    }

    /// Returns the virtual module path for `module`.
    pub fn name(&self, module: &ImportPath) -> ImportPath {
        self.namespace
            .join_hashed("mod_", short_hash(module.as_str().as_bytes()))
    }

    /// Names a batch of modules.
    pub fn name_all<'a>(
        &self,
        modules: impl IntoIterator<Item = &'a ImportPath>,
    ) -> BTreeMap<ImportPath, ImportPath> {
        modules
            .into_iter()
            .map(|m| (m.clone(), self.name(m)))
            .collect()
    }
}
