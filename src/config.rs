//! Project configuration and `.importvet.toml` discovery.
//!
//! The config file is searched upward from the analyzed path, a bounded
//! number of directories deep. A malformed file or invalid weight table
//! warns and falls back to defaults rather than aborting discovery.

use crate::core::errors::{Error, Result};
use crate::scoring::WeightConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".importvet.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Directory name holding production sources.
    #[serde(default = "default_source_root")]
    pub source_root: String,

    /// Directory name holding test sources.
    #[serde(default = "default_tests_root")]
    pub tests_root: String,

    /// Glob patterns excluded from file enumeration.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Package names accepted as third-party without further checks.
    #[serde(default)]
    pub valid_packages: Vec<String>,

    /// Dependency names declared in the project's manifests.
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Complexity weight factors.
    #[serde(default)]
    pub weights: WeightConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            tests_root: default_tests_root(),
            ignore_patterns: Vec::new(),
            valid_packages: Vec::new(),
            dependencies: Vec::new(),
            weights: WeightConfig::default(),
        }
    }
}

impl ValidationConfig {
    /// Names seeding the classifier's valid-package set: explicit packages
    /// plus declared dependencies.
    pub fn known_packages(&self) -> Vec<String> {
        let mut names = self.valid_packages.clone();
        names.extend(self.dependencies.iter().cloned());
        names
    }

    /// Render as TOML, e.g. for writing a starter config file.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to render config: {e}")))
    }
}

fn default_source_root() -> String {
    "src".to_string()
}

fn default_tests_root() -> String {
    "tests".to_string()
}

/// Read config file contents through a buffered reader.
fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse a TOML config. Invalid weight tables warn and fall back to the
/// default weights; a syntactically broken file is an error.
pub(crate) fn parse_config(contents: &str) -> std::result::Result<ValidationConfig, String> {
    let mut config = toml::from_str::<ValidationConfig>(contents)
        .map_err(|e| format!("failed to parse {CONFIG_FILE_NAME}: {e}"))?;

    if let Err(e) = config.weights.validate() {
        log::warn!("invalid weight table: {e}; using default weights");
        config.weights = WeightConfig::default();
    }
    Ok(config)
}

fn try_load_from_path(config_path: &Path) -> Option<ValidationConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            log::debug!("loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            None
        }
    }
}

fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // "Not found" just means this ancestor has no config file.
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Nearest config file at or above `start`, within the traversal bound.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    const MAX_TRAVERSAL_DEPTH: usize = 10;
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load configuration for a project rooted at `start`, walking up the
/// directory hierarchy. Falls back to defaults when nothing usable exists.
pub fn load_config(start: &Path) -> ValidationConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!("no config file found above {}; using defaults", start.display());
            ValidationConfig::default()
        })
}

/// Load an explicitly named config file. Unlike discovery, a missing or
/// unparseable file is an error here: the user asked for this one.
pub fn load_config_file(path: &Path) -> Result<ValidationConfig> {
    let contents = read_config_file(path)
        .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
    parse_config(&contents).map_err(Error::config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn empty_input_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, ValidationConfig::default());
        assert_eq!(config.source_root, "src");
        assert_eq!(config.tests_root, "tests");
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let config = parse_config("source_root = \"lib\"\n").unwrap();
        assert_eq!(config.source_root, "lib");
        assert_eq!(config.tests_root, "tests");
        assert!(config.weights.validate().is_ok());
    }

    #[test]
    fn full_config_parses_weights_and_packages() {
        let contents = indoc! {r#"
            source_root = "src"
            tests_root = "tests"
            ignore_patterns = ["**/migrations/**"]
            valid_packages = ["requests"]
            dependencies = ["numpy", "pandas"]

            [weights]
            total_imports = 0.5
            unique_imports = 1.0
            edges = 2.0
            invalid_imports = 3.0
            unused_imports = 2.0
            relative_imports = 1.0
            circular_refs = 5.0
        "#};
        let config = parse_config(contents).unwrap();
        assert_eq!(config.weights.get("edges"), Some(2.0));
        assert_eq!(
            config.known_packages(),
            vec!["requests", "numpy", "pandas"]
        );
    }

    #[test]
    fn invalid_weights_fall_back_to_defaults() {
        let contents = indoc! {r#"
            [weights]
            total_imports = 9.0
        "#};
        let config = parse_config(contents).unwrap();
        assert_eq!(config.weights, WeightConfig::default());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(parse_config("source_root = [").is_err());
    }

    #[test]
    fn ancestors_are_depth_bounded() {
        let dirs: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }

    #[test]
    fn config_is_found_in_an_ancestor_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "source_root = \"app\"\n").unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE_NAME));
        assert_eq!(load_config(&nested).source_root, "app");
    }

    #[test]
    fn rendered_config_parses_back() {
        let config = ValidationConfig::default();
        let rendered = config.to_toml().unwrap();
        assert_eq!(parse_config(&rendered).unwrap(), config);
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_file(&missing).is_err());

        let present = dir.path().join("custom.toml");
        fs::write(&present, "source_root = \"app\"\n").unwrap();
        assert_eq!(load_config_file(&present).unwrap().source_root, "app");
    }
}
