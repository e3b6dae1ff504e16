//! Path normalization and module-name transforms.
//!
//! All graph keys are normalized path strings produced here: forward-slash
//! relative paths rooted at a canonical `src/` or `tests/` prefix. The
//! normalizer also owns relative-import dot resolution, since dot counting
//! is a property of path space rather than of any parser.

use crate::io::traits::FileSystem;
use dashmap::DashMap;
use std::path::{Path, PathBuf};

pub struct PathNormalizer {
    base_dir: PathBuf,
    source_root: String,
    tests_root: String,
    cache: DashMap<(String, bool), String>,
}

impl PathNormalizer {
    pub fn new(
        base_dir: impl Into<PathBuf>,
        source_root: impl Into<String>,
        tests_root: impl Into<String>,
    ) -> Self {
        Self {
            base_dir: base_dir.into(),
            source_root: source_root.into(),
            tests_root: tests_root.into(),
            cache: DashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Canonicalize a path into normalized graph-key form.
    ///
    /// Strips the base directory and any leading `./`, replaces an existing
    /// `src/`/`tests/` prefix with the canonical one chosen by the
    /// test-file heuristic, and appends `.py` for lookups when the path has
    /// no extension. Idempotent: `normalize(normalize(p)) == normalize(p)`.
    pub fn normalize(&self, path: &Path, for_lookup: bool) -> String {
        let key = (path.to_string_lossy().into_owned(), for_lookup);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let rel = pathdiff::diff_paths(path, &self.base_dir)
            .filter(|p| !p.starts_with(".."))
            .unwrap_or_else(|| path.to_path_buf());

        let mut s = rel.to_string_lossy().replace('\\', "/");
        while s.starts_with("./") {
            s.drain(..2);
        }

        let is_test = self.is_test_path(&s);
        let trimmed = s
            .strip_prefix(&format!("{}/", self.source_root))
            .or_else(|| s.strip_prefix(&format!("{}/", self.tests_root)))
            .unwrap_or(&s);

        let prefix = if is_test {
            &self.tests_root
        } else {
            &self.source_root
        };
        let mut result = format!("{prefix}/{trimmed}");
        if for_lookup && Path::new(&result).extension().is_none() {
            result.push_str(".py");
        }

        self.cache.insert(key, result.clone());
        result
    }

    /// Whether a path lands in the tests tree after normalization.
    pub fn is_test_file(&self, path: &Path) -> bool {
        self.normalize(path, false)
            .starts_with(&format!("{}/", self.tests_root))
    }

    fn is_test_path(&self, rel: &str) -> bool {
        let p = Path::new(rel);
        let file_name = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        if file_name.starts_with("test_") || stem.ends_with("_test") {
            return true;
        }
        p.components()
            .any(|c| matches!(c.as_os_str().to_str(), Some("tests") | Some("test")))
    }

    /// Resolve a relative import to a normalized file path, probing the
    /// file system for the two candidate forms.
    ///
    /// Returns `None` for absolute imports, for dot counts that would walk
    /// above the source or tests root, and when neither candidate exists.
    pub fn resolve_relative_import(
        &self,
        import_name: &str,
        current_file: &Path,
        fs: &dyn FileSystem,
    ) -> Option<String> {
        let level = leading_dots(import_name);
        if level == 0 {
            return None;
        }
        let rest = &import_name[level..];
        let mut dir = self.relative_base(level as u32, current_file)?;

        if rest.is_empty() {
            dir.push("__init__.py".to_string());
            return Some(dir.join("/"));
        }

        let segments: Vec<&str> = rest.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        dir.extend(segments.iter().map(|s| s.to_string()));

        let stem = dir.join("/");
        let file_form = format!("{stem}.py");
        if fs.file_exists(&self.probe_path(&file_form)) {
            return Some(file_form);
        }
        let init_form = format!("{stem}/__init__.py");
        if fs.file_exists(&self.probe_path(&init_form)) {
            return Some(init_form);
        }
        None
    }

    /// Directory components reached by walking `level - 1` parents up from
    /// the current file's directory, in normalized path space. Fails closed
    /// when the walk would cross above the root segment.
    pub(crate) fn relative_base(&self, level: u32, current_file: &Path) -> Option<Vec<String>> {
        let norm = self.normalize(current_file, true);
        let mut parts: Vec<String> = norm.split('/').map(String::from).collect();
        parts.pop();

        for _ in 1..level {
            if parts.len() <= 1 {
                return None;
            }
            parts.pop();
        }
        Some(parts)
    }

    /// Absolute probe location for a normalized path string.
    pub(crate) fn probe_path(&self, rel: &str) -> PathBuf {
        self.base_dir.join(rel)
    }

    /// Dotted module name for a normalized file path.
    /// `src/pkg/mod.py` becomes `pkg.mod`; package inits collapse to the
    /// package name.
    pub fn get_module_name(&self, path: &str) -> String {
        let mut s = path.trim_start_matches("./").to_string();
        for root in [&self.source_root, &self.tests_root] {
            if let Some(stripped) = s.strip_prefix(&format!("{root}/")) {
                s = stripped.to_string();
                break;
            }
        }
        let s = s.strip_suffix(".py").unwrap_or(&s);
        let s = s.strip_suffix("/__init__").unwrap_or(s);
        s.replace('/', ".")
    }

    /// Absolute dotted module name for a relative import, without touching
    /// the file system. `None` for absolute imports or walks above root.
    pub fn get_relative_import(&self, import_name: &str, current_file: &Path) -> Option<String> {
        let level = leading_dots(import_name);
        if level == 0 {
            return None;
        }
        let rest = &import_name[level..];
        let dir = self.relative_base(level as u32, current_file)?;

        let mut parts: Vec<String> = dir.into_iter().skip(1).collect();
        if !rest.is_empty() {
            parts.extend(rest.split('.').map(String::from));
        }
        if parts.is_empty() {
            return None;
        }
        Some(parts.join("."))
    }

    /// Convert a dotted module name to its path fragment, dropping leading
    /// dots and an explicit root segment.
    pub fn normalize_for_import(&self, name: &str) -> String {
        let name = name.trim_start_matches('.');
        let name = name
            .strip_prefix(&format!("{}.", self.source_root))
            .or_else(|| name.strip_prefix(&format!("{}.", self.tests_root)))
            .unwrap_or(name);
        name.replace('.', "/")
    }

    /// The two file forms a module name can take under the source root,
    /// module file first.
    pub fn get_import_variants(&self, name: &str) -> Vec<String> {
        let fragment = self.normalize_for_import(name);
        vec![
            format!("{}/{fragment}.py", self.source_root),
            format!("{}/{fragment}/__init__.py", self.source_root),
        ]
    }
}

pub(crate) fn leading_dots(name: &str) -> usize {
    name.chars().take_while(|c| *c == '.').count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::MemoryFileSystem;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn normalizer() -> PathNormalizer {
        PathNormalizer::new("/proj", "src", "tests")
    }

    #[test]
    fn normalize_strips_base_and_dot_prefixes() {
        let n = normalizer();
        assert_eq!(n.normalize(Path::new("/proj/src/pkg/a.py"), false), "src/pkg/a.py");
        assert_eq!(n.normalize(Path::new("./pkg/a.py"), false), "src/pkg/a.py");
    }

    #[test]
    fn normalize_adds_canonical_source_prefix() {
        let n = normalizer();
        assert_eq!(n.normalize(Path::new("pkg/a.py"), false), "src/pkg/a.py");
    }

    #[test]
    fn normalize_routes_test_files_to_tests_prefix() {
        let n = normalizer();
        assert_eq!(n.normalize(Path::new("test_a.py"), false), "tests/test_a.py");
        assert_eq!(n.normalize(Path::new("pkg/a_test.py"), false), "tests/pkg/a_test.py");
        assert_eq!(
            n.normalize(Path::new("pkg/tests/helper.py"), false),
            "tests/pkg/tests/helper.py"
        );
        assert_eq!(
            n.normalize(Path::new("tests/helper.py"), false),
            "tests/helper.py"
        );
    }

    #[test]
    fn normalize_appends_suffix_for_lookup() {
        let n = normalizer();
        assert_eq!(n.normalize(Path::new("pkg/mod"), true), "src/pkg/mod.py");
        assert_eq!(n.normalize(Path::new("pkg/mod.py"), true), "src/pkg/mod.py");
    }

    #[test]
    fn normalize_is_idempotent_for_known_shapes() {
        let n = normalizer();
        for case in [
            "/proj/src/pkg/a.py",
            "pkg/a.py",
            "tests/test_b.py",
            "./deep/nested/mod.py",
        ] {
            let once = n.normalize(Path::new(case), true);
            let twice = n.normalize(Path::new(&once), true);
            assert_eq!(once, twice, "not idempotent for {case}");
        }
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(path in "[a-z_]{1,8}(/[a-z_]{1,8}){0,3}(\\.py)?") {
            let n = normalizer();
            for lookup in [false, true] {
                let once = n.normalize(Path::new(&path), lookup);
                let twice = n.normalize(Path::new(&once), lookup);
                prop_assert_eq!(&once, &twice);
            }
        }
    }

    #[test]
    fn relative_sibling_resolves_to_sibling_file() {
        let n = normalizer();
        let fs = MemoryFileSystem::new().with_file("/proj/src/package/utils.py", "");
        let resolved =
            n.resolve_relative_import(".utils", Path::new("src/package/module.py"), &fs);
        assert_eq!(resolved.as_deref(), Some("src/package/utils.py"));
    }

    #[test]
    fn double_dot_walks_one_directory_up() {
        let n = normalizer();
        let fs = MemoryFileSystem::new().with_file("/proj/src/package/other.py", "");
        let resolved =
            n.resolve_relative_import("..other", Path::new("src/package/subdir/module.py"), &fs);
        assert_eq!(resolved.as_deref(), Some("src/package/other.py"));
    }

    #[test]
    fn bare_dot_resolves_to_package_init() {
        let n = normalizer();
        let fs = MemoryFileSystem::new();
        let resolved = n.resolve_relative_import(".", Path::new("src/package/module.py"), &fs);
        assert_eq!(resolved.as_deref(), Some("src/package/__init__.py"));
    }

    #[test]
    fn package_candidate_used_when_no_sibling_file() {
        let n = normalizer();
        let fs = MemoryFileSystem::new().with_file("/proj/src/package/sub/__init__.py", "");
        let resolved = n.resolve_relative_import(".sub", Path::new("src/package/module.py"), &fs);
        assert_eq!(resolved.as_deref(), Some("src/package/sub/__init__.py"));
    }

    #[test]
    fn walking_above_root_fails_closed() {
        let n = normalizer();
        let fs = MemoryFileSystem::new().with_file("/proj/src/other.py", "");
        assert_eq!(
            n.resolve_relative_import("...other", Path::new("src/package/module.py"), &fs),
            None
        );
    }

    #[test]
    fn absolute_import_is_not_relative() {
        let n = normalizer();
        let fs = MemoryFileSystem::new();
        assert_eq!(
            n.resolve_relative_import("os.path", Path::new("src/a.py"), &fs),
            None
        );
    }

    #[test]
    fn module_name_round_trips_path_shapes() {
        let n = normalizer();
        assert_eq!(n.get_module_name("src/pkg/mod.py"), "pkg.mod");
        assert_eq!(n.get_module_name("src/pkg/__init__.py"), "pkg");
        assert_eq!(n.get_module_name("tests/test_a.py"), "test_a");
    }

    #[test]
    fn relative_import_maps_to_dotted_module() {
        let n = normalizer();
        assert_eq!(
            n.get_relative_import(".utils", Path::new("src/package/module.py")),
            Some("package.utils".to_string())
        );
        assert_eq!(
            n.get_relative_import("..shared.helpers", Path::new("src/package/sub/module.py")),
            Some("package.shared.helpers".to_string())
        );
        assert_eq!(
            n.get_relative_import("os", Path::new("src/package/module.py")),
            None
        );
    }

    #[test]
    fn import_variants_cover_module_and_package_forms() {
        let n = normalizer();
        assert_eq!(
            n.get_import_variants("pkg.mod"),
            vec!["src/pkg/mod.py".to_string(), "src/pkg/mod/__init__.py".to_string()]
        );
    }

    #[test]
    fn cache_returns_identical_results() {
        let n = normalizer();
        let first = n.normalize(Path::new("pkg/a.py"), true);
        let second = n.normalize(Path::new("pkg/a.py"), true);
        assert_eq!(first, second);
    }
}
