//! I/O trait definitions for import analysis.
//!
//! The analysis core never touches the disk directly; everything goes
//! through [`FileSystem`] so tests can run against an in-memory tree and
//! the resolver's existence probes stay injectable.

use crate::core::errors::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File system operations consumed by the analysis core.
///
/// Implementations must be thread-safe (`Send + Sync`); probes run from
/// parallel per-file workers.
pub trait FileSystem: Send + Sync {
    /// Read a file's contents as a UTF-8 string.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Check if a file exists at this path.
    fn file_exists(&self, path: &Path) -> bool;

    /// Check if a path is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Enumerate source files under a root, skipping ignore-glob matches.
    fn find_source_files(&self, root: &Path, ignore_patterns: &[String]) -> Result<Vec<PathBuf>>;
}

/// Production implementation backed by the real file system.
#[derive(Debug, Default, Clone)]
pub struct OsFileSystem;

impl OsFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn find_source_files(&self, root: &Path, ignore_patterns: &[String]) -> Result<Vec<PathBuf>> {
        crate::io::walker::SourceWalker::new(root.to_path_buf())
            .with_ignore_patterns(ignore_patterns.to_vec())
            .walk()
    }
}

/// In-memory file system for tests. Paths behave as files; directories
/// exist implicitly as prefixes of stored paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
            .into()
        })
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        !self.files.contains_key(path)
            && self
                .files
                .keys()
                .any(|p| p.starts_with(path) && p != path)
    }

    fn find_source_files(&self, root: &Path, ignore_patterns: &[String]) -> Result<Vec<PathBuf>> {
        let patterns = ignore_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(self
            .files
            .keys()
            .filter(|p| p.starts_with(root))
            .filter(|p| p.extension().is_some_and(|ext| ext == "py"))
            .filter(|p| {
                let path_str = p.to_string_lossy();
                !patterns.iter().any(|pat| pat.matches(&path_str))
            })
            .cloned()
            .collect())
    }
}
