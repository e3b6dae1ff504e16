//! Module-path resolution: turning a local or relative import into the
//! project file it names.
//!
//! `None` always means "no file found", never an error. Callers decide
//! whether that makes the import invalid or external.

use crate::io::traits::FileSystem;
use crate::paths::{leading_dots, PathNormalizer};
use std::path::Path;
use std::sync::Arc;

pub struct ModuleResolver {
    source_root: String,
    tests_root: String,
    normalizer: Arc<PathNormalizer>,
    fs: Arc<dyn FileSystem>,
}

impl ModuleResolver {
    pub fn new(
        source_root: impl Into<String>,
        tests_root: impl Into<String>,
        normalizer: Arc<PathNormalizer>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            tests_root: tests_root.into(),
            normalizer,
            fs,
        }
    }

    /// Resolve a module name to a normalized project-relative file path.
    ///
    /// Absolute names rooted at the source or tests root are resolved from
    /// that root; other absolute names are tried against the importing
    /// file's own directory first and the source root second. Relative
    /// names walk their dots through the normalizer and then resolve the
    /// remaining segments incrementally.
    pub fn find_module_path(&self, module_name: &str, current_file: &str) -> Option<String> {
        if module_name.is_empty() {
            return None;
        }
        if module_name.starts_with('.') {
            return self.resolve_relative(module_name, current_file);
        }

        let mut segments: Vec<&str> = module_name.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        if segments[0] == self.source_root || segments[0] == self.tests_root {
            let root = segments.remove(0);
            if segments.is_empty() {
                return self.existing(format!("{root}/__init__.py"));
            }
            return self.try_candidates(root, &segments);
        }

        let sibling_dir = parent_dir(current_file);
        if !sibling_dir.is_empty() {
            if let Some(found) = self.try_candidates(&sibling_dir, &segments) {
                return Some(found);
            }
        }
        self.try_candidates(&self.source_root, &segments)
    }

    /// The three candidate forms under a base directory, in preference
    /// order: module file, package init, extension-less path.
    fn try_candidates(&self, base: &str, segments: &[&str]) -> Option<String> {
        let mut dir = base.to_string();
        for segment in &segments[..segments.len() - 1] {
            dir = format!("{dir}/{segment}");
        }
        let last = segments[segments.len() - 1];
        if let Some(found) = self.existing(format!("{dir}/{last}.py")) {
            return Some(found);
        }

        let full = format!("{}/{}", base, segments.join("/"));
        if let Some(found) = self.existing(format!("{full}/__init__.py")) {
            return Some(found);
        }
        self.existing(full)
    }

    fn resolve_relative(&self, module_name: &str, current_file: &str) -> Option<String> {
        let level = leading_dots(module_name);
        let base = self
            .normalizer
            .relative_base(level as u32, Path::new(current_file))?;
        let rest = &module_name[level..];

        if rest.is_empty() {
            return self.existing(format!("{}/__init__.py", base.join("/")));
        }

        let segments: Vec<&str> = rest.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let mut dir = base.join("/");
        for (i, segment) in segments.iter().enumerate() {
            let is_last = i + 1 == segments.len();
            let is_second_last = i + 2 == segments.len();

            // A sibling module file wins for the final segment, and for the
            // one before it when the trailing segment is an attribute of
            // that module rather than a module itself.
            if is_last || is_second_last {
                if let Some(found) = self.existing(format!("{dir}/{segment}.py")) {
                    return Some(found);
                }
            }

            let package_dir = format!("{dir}/{segment}");
            let init = format!("{package_dir}/__init__.py");
            if self.fs.file_exists(&self.normalizer.probe_path(&init)) {
                if is_last {
                    return Some(init);
                }
                dir = package_dir;
                continue;
            }

            // No package to descend into: last chance is the final segment
            // as a file in the directory reached so far.
            return self.existing(format!("{dir}/{}.py", segments[segments.len() - 1]));
        }
        None
    }

    fn existing(&self, rel: String) -> Option<String> {
        if self.fs.file_exists(&self.normalizer.probe_path(&rel)) {
            Some(rel)
        } else {
            None
        }
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

    fn resolver(fs: MemoryFileSystem) -> ModuleResolver {
        let fs = Arc::new(fs);
        let normalizer = Arc::new(PathNormalizer::new("/proj", "src", "tests"));
        ModuleResolver::new("src", "tests", normalizer, fs)
    }

    #[test]
    fn absolute_module_file_is_preferred() {
        let fs = MemoryFileSystem::new()
            .with_file("/proj/src/pkg/utils.py", "")
            .with_file("/proj/src/pkg/utils/__init__.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path("src.pkg.utils", "src/app.py"),
            Some("src/pkg/utils.py".to_string())
        );
    }

    #[test]
    fn absolute_falls_back_to_package_init() {
        let fs = MemoryFileSystem::new().with_file("/proj/src/pkg/__init__.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path("src.pkg", "src/app.py"),
            Some("src/pkg/__init__.py".to_string())
        );
    }

    #[test]
    fn absolute_falls_back_to_extensionless_path() {
        let fs = MemoryFileSystem::new().with_file("/proj/src/scripts/run", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path("src.scripts.run", "src/app.py"),
            Some("src/scripts/run".to_string())
        );
    }

    #[test]
    fn tests_root_resolves_like_source_root() {
        let fs = MemoryFileSystem::new().with_file("/proj/tests/helpers.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path("tests.helpers", "tests/test_app.py"),
            Some("tests/helpers.py".to_string())
        );
    }

    #[test]
    fn unrooted_name_tries_the_importing_directory_first() {
        let fs = MemoryFileSystem::new()
            .with_file("/proj/src/pkg/helper.py", "")
            .with_file("/proj/src/helper.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path("helper", "src/pkg/app.py"),
            Some("src/pkg/helper.py".to_string())
        );
        // From the root itself, only the source-root candidate exists.
        assert_eq!(
            r.find_module_path("helper", "src/app.py"),
            Some("src/helper.py".to_string())
        );
    }

    #[test]
    fn relative_single_segment() {
        let fs = MemoryFileSystem::new().with_file("/proj/src/package/utils.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path(".utils", "src/package/module.py"),
            Some("src/package/utils.py".to_string())
        );
    }

    #[test]
    fn relative_second_to_last_accepts_module_attribute() {
        // `.utils.helper` where utils.py is a module and helper one of its
        // attributes resolves to the module file.
        let fs = MemoryFileSystem::new().with_file("/proj/src/package/utils.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path(".utils.helper", "src/package/module.py"),
            Some("src/package/utils.py".to_string())
        );
    }

    #[test]
    fn relative_descends_through_packages() {
        let fs = MemoryFileSystem::new()
            .with_file("/proj/src/package/sub/__init__.py", "")
            .with_file("/proj/src/package/sub/impl.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path(".sub.impl", "src/package/module.py"),
            Some("src/package/sub/impl.py".to_string())
        );
    }

    #[test]
    fn relative_package_init_when_segment_is_a_package() {
        let fs = MemoryFileSystem::new().with_file("/proj/src/package/sub/__init__.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path(".sub", "src/package/module.py"),
            Some("src/package/sub/__init__.py".to_string())
        );
    }

    #[test]
    fn bare_dots_resolve_to_package_init() {
        let fs = MemoryFileSystem::new().with_file("/proj/src/package/__init__.py", "");
        let r = resolver(fs);
        assert_eq!(
            r.find_module_path(".", "src/package/module.py"),
            Some("src/package/__init__.py".to_string())
        );
    }

    #[test]
    fn too_many_dots_fail_closed() {
        let fs = MemoryFileSystem::new().with_file("/proj/src/other.py", "");
        let r = resolver(fs);
        assert_eq!(r.find_module_path("...other", "src/package/module.py"), None);
    }

    #[test]
    fn missing_files_resolve_to_none() {
        let r = resolver(MemoryFileSystem::new());
        assert_eq!(r.find_module_path("src.nothing", "src/app.py"), None);
        assert_eq!(r.find_module_path(".nothing", "src/package/module.py"), None);
        assert_eq!(r.find_module_path("", "src/app.py"), None);
        assert_eq!(r.find_module_path("a..b", "src/app.py"), None);
    }
}
