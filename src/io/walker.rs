use crate::core::errors::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Walks a project tree collecting Python source files, honoring gitignore
/// rules and user-supplied ignore globs.
pub struct SourceWalker {
    root: PathBuf,
    ignore_patterns: Vec<String>,
}

impl SourceWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ignore_patterns: vec![],
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        let patterns = self
            .ignore_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.should_process(path, &patterns) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    fn should_process(&self, path: &Path, patterns: &[glob::Pattern]) -> bool {
        if !path.extension().is_some_and(|ext| ext == "py") {
            return false;
        }

        let path_str = path.to_string_lossy();
        !patterns.iter().any(|p| p.matches(&path_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        dir
    }

    #[test]
    fn walk_finds_only_python_files() {
        let dir = make_tree(&["src/a.py", "src/b.py", "src/readme.md", "data.json"]);
        let files = SourceWalker::new(dir.path().to_path_buf()).walk().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "py"));
    }

    #[test]
    fn walk_results_are_sorted() {
        let dir = make_tree(&["src/z.py", "src/a.py", "src/m.py"]);
        let files = SourceWalker::new(dir.path().to_path_buf()).walk().unwrap();
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn walk_skips_ignored_patterns() {
        let dir = make_tree(&["src/a.py", "build/gen.py"]);
        let files = SourceWalker::new(dir.path().to_path_buf())
            .with_ignore_patterns(vec!["*build*".to_string()])
            .walk()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/a.py"));
    }

    #[test]
    fn invalid_ignore_pattern_is_an_error() {
        let dir = make_tree(&["src/a.py"]);
        let result = SourceWalker::new(dir.path().to_path_buf())
            .with_ignore_patterns(vec!["[".to_string()])
            .walk();
        assert!(result.is_err());
    }
}
