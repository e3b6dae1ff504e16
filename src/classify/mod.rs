//! Five-way import classification.
//!
//! Every import name gets exactly one verdict: stdlib, third-party, local,
//! relative, or invalid. Rules are tried strictly in order and the first
//! match wins. The valid-package set grows as dotted submodules of known
//! packages are seen; growth bumps a generation counter that invalidates
//! the classification cache.

pub mod oracle;

use crate::core::ImportKind;
use crate::io::traits::FileSystem;
use dashmap::DashMap;
use oracle::NamespaceOracle;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub struct ImportClassifier {
    base_dir: PathBuf,
    source_root: String,
    tests_root: String,
    oracle: Arc<dyn NamespaceOracle>,
    fs: Arc<dyn FileSystem>,
    valid_packages: RwLock<HashSet<String>>,
    generation: AtomicU64,
    // Keyed by (name, importing directory): the sibling probe makes the
    // verdict depend on where the import appears.
    cache: DashMap<(String, String), (u64, ImportKind)>,
}

impl ImportClassifier {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        source_root: impl Into<String>,
        tests_root: impl Into<String>,
        oracle: Arc<dyn NamespaceOracle>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            source_root: source_root.into(),
            tests_root: tests_root.into(),
            oracle,
            fs,
            valid_packages: RwLock::new(HashSet::new()),
            generation: AtomicU64::new(0),
            cache: DashMap::new(),
        }
    }

    /// Seed the valid-package set, typically from configured packages and
    /// declared dependency names.
    pub fn with_valid_packages<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        {
            let mut packages = self.valid_packages.write();
            packages.extend(names.into_iter().map(Into::into));
        }
        self
    }

    /// Record a newly discovered valid package. Growth-only: names are never
    /// removed, and inserting an existing name changes nothing.
    pub fn add_valid_package(&self, name: impl Into<String>) {
        let mut packages = self.valid_packages.write();
        if packages.insert(name.into()) {
            self.generation.fetch_add(1, Ordering::Release);
        }
    }

    pub fn valid_package_count(&self) -> usize {
        self.valid_packages.read().len()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Classify one import name as seen from `current_file` (a normalized
    /// project-relative path). Total: always returns a kind, never fails.
    pub fn classify(&self, name: &str, current_file: &str) -> ImportKind {
        let dir = parent_dir(current_file);
        let generation = self.generation.load(Ordering::Acquire);
        let key = (name.to_string(), dir);
        if let Some(entry) = self.cache.get(&key) {
            let (stamp, kind) = *entry;
            if stamp == generation {
                return kind;
            }
        }
        let kind = self.classify_uncached(name, &key.1);
        let stamp = self.generation.load(Ordering::Acquire);
        self.cache.insert(key, (stamp, kind));
        kind
    }

    fn classify_uncached(&self, name: &str, dir: &str) -> ImportKind {
        if name.starts_with('.') {
            return ImportKind::Relative;
        }
        let root = name.split('.').next().unwrap_or(name);
        if root == self.source_root || root == self.tests_root {
            return ImportKind::Local;
        }
        if self.oracle.is_known(root) {
            return ImportKind::Stdlib;
        }
        if self.is_valid_package(name, root) {
            return ImportKind::ThirdParty;
        }
        if self.probe_sibling(root, dir) {
            return ImportKind::Local;
        }
        ImportKind::Invalid
    }

    fn is_valid_package(&self, name: &str, root: &str) -> bool {
        {
            let packages = self.valid_packages.read();
            if !packages.contains(root) {
                return false;
            }
            if name == root || packages.contains(name) {
                return true;
            }
        }
        // A dotted submodule of a known package: memoize the full name.
        let mut packages = self.valid_packages.write();
        if packages.insert(name.to_string()) {
            self.generation.fetch_add(1, Ordering::Release);
        }
        true
    }

    /// Rule 5: a module file or package directory next to the importing file.
    fn probe_sibling(&self, root: &str, dir: &str) -> bool {
        if root.is_empty() {
            return false;
        }
        let parent = self.base_dir.join(dir);
        self.fs.file_exists(&parent.join(format!("{root}.py")))
            || self.fs.file_exists(&parent.join(root).join("__init__.py"))
    }
}

fn parent_dir(current_file: &str) -> String {
    Path::new(current_file)
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::MemoryFileSystem;

    fn classifier(fs: MemoryFileSystem) -> ImportClassifier {
        ImportClassifier::new(
            "/proj",
            "src",
            "tests",
            Arc::new(oracle::StdlibOracle::new()),
            Arc::new(fs),
        )
    }

    #[test]
    fn rules_fire_in_order() {
        let c = classifier(MemoryFileSystem::new()).with_valid_packages(["json".to_string()]);
        // Stdlib wins over the valid-package set.
        assert_eq!(c.classify("json", "src/app.py"), ImportKind::Stdlib);
        // Leading dot wins over everything.
        assert_eq!(c.classify(".json", "src/app.py"), ImportKind::Relative);
        // The configured roots win over the stdlib table lookup.
        assert_eq!(c.classify("src.utils", "src/app.py"), ImportKind::Local);
        assert_eq!(c.classify("tests.helpers", "src/app.py"), ImportKind::Local);
    }

    #[test]
    fn stdlib_and_thirdparty_by_root_segment() {
        let c = classifier(MemoryFileSystem::new()).with_valid_packages(["requests".to_string()]);
        assert_eq!(c.classify("collections.abc", "src/app.py"), ImportKind::Stdlib);
        assert_eq!(c.classify("requests", "src/app.py"), ImportKind::ThirdParty);
        assert_eq!(
            c.classify("requests.adapters", "src/app.py"),
            ImportKind::ThirdParty
        );
    }

    #[test]
    fn submodules_of_valid_packages_are_memoized() {
        let c = classifier(MemoryFileSystem::new()).with_valid_packages(["requests".to_string()]);
        let before = c.generation();
        assert_eq!(c.valid_package_count(), 1);
        c.classify("requests.adapters", "src/app.py");
        assert_eq!(c.valid_package_count(), 2);
        assert!(c.generation() > before);
    }

    #[test]
    fn sibling_probe_depends_on_the_importing_directory() {
        let fs = MemoryFileSystem::new()
            .with_file("/proj/src/pkg/helper.py", "")
            .with_file("/proj/src/pkg/local_pkg/__init__.py", "");
        let c = classifier(fs);
        assert_eq!(c.classify("helper", "src/pkg/app.py"), ImportKind::Local);
        assert_eq!(c.classify("local_pkg", "src/pkg/app.py"), ImportKind::Local);
        // Same name from a different directory finds nothing.
        assert_eq!(c.classify("helper", "src/other/app.py"), ImportKind::Invalid);
    }

    #[test]
    fn growth_invalidates_cached_verdicts() {
        let c = classifier(MemoryFileSystem::new());
        assert_eq!(c.classify("newpkg", "src/app.py"), ImportKind::Invalid);
        c.add_valid_package("newpkg");
        assert_eq!(c.classify("newpkg", "src/app.py"), ImportKind::ThirdParty);
    }

    #[test]
    fn classification_is_total_for_odd_names() {
        let c = classifier(MemoryFileSystem::new());
        for name in ["", "...", "x-y", "1weird", "a..b"] {
            let _ = c.classify(name, "src/app.py");
        }
    }
}
