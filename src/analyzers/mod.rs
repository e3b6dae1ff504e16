pub mod python;

use crate::core::errors::Result;
use crate::core::ImportStatement;
use std::collections::HashSet;
use std::path::Path;

/// Everything extracted from a single file: its ordered import statements
/// and the set of names its body references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileImports {
    pub imports: Vec<ImportStatement>,
    pub used_names: HashSet<String>,
}

impl FileImports {
    /// Mark each import used when its bound name appears in the used set.
    /// Star imports are marked at extraction time and stay used.
    pub fn mark_usage(&mut self) {
        for import in &mut self.imports {
            if !import.is_used {
                import.is_used = self.used_names.contains(import.bound_name());
            }
        }
    }

    pub fn unused(&self) -> impl Iterator<Item = &ImportStatement> {
        self.imports.iter().filter(|i| !i.is_used)
    }
}

/// Parser-facing seam: the graph, cycle, and scoring layers never know
/// which concrete parser produced the import list.
pub trait ImportExtractor: Send + Sync {
    fn extract(&self, source: &str, path: &Path) -> Result<FileImports>;
}
