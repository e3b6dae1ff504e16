pub mod errors;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Whether a discovered file belongs to the source tree or the test tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOrigin {
    Source,
    Test,
}

/// A file discovered during project enumeration. Immutable after discovery;
/// identity is the normalized path string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub origin: FileOrigin,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, origin: FileOrigin) -> Self {
        Self {
            path: path.into(),
            origin,
        }
    }

    pub fn is_test(&self) -> bool {
        self.origin == FileOrigin::Test
    }
}

/// Classification assigned to an import target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Stdlib,
    ThirdParty,
    Local,
    Relative,
    Invalid,
}

impl ImportKind {
    /// Kinds that resolve to a project file rather than an external name.
    pub fn is_project_local(&self) -> bool {
        matches!(self, Self::Local | Self::Relative)
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stdlib => "stdlib",
            Self::ThirdParty => "thirdparty",
            Self::Local => "local",
            Self::Relative => "relative",
            Self::Invalid => "invalid",
        };
        write!(f, "{s}")
    }
}

/// One import extracted from a source file.
///
/// `name` keeps the raw dotted form, dot-prefixed for relative imports.
/// `level` is the count of leading dots (0 for absolute imports).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportStatement {
    pub name: String,
    pub alias: Option<String>,
    pub level: u32,
    pub line: usize,
    pub is_used: bool,
}

impl ImportStatement {
    pub fn new(name: impl Into<String>, level: u32, line: usize) -> Self {
        Self {
            name: name.into(),
            alias: None,
            level,
            line,
            is_used: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn is_relative(&self) -> bool {
        self.level > 0 || self.name.starts_with('.')
    }

    /// The name this import binds in the file's namespace: the alias when
    /// present, otherwise the last dotted segment.
    pub fn bound_name(&self) -> &str {
        if let Some(alias) = &self.alias {
            return alias;
        }
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Target of an import edge: a resolved project file, or an external name
/// tagged with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeTarget {
    File(String),
    External { name: String, kind: ImportKind },
}

impl EdgeTarget {
    /// Stable key used for edge deduplication.
    pub fn key(&self) -> String {
        match self {
            Self::File(path) => format!("file:{path}"),
            Self::External { name, .. } => format!("ext:{name}"),
        }
    }

    pub fn as_file(&self) -> Option<&str> {
        match self {
            Self::File(path) => Some(path),
            Self::External { .. } => None,
        }
    }
}

impl fmt::Display for EdgeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{path}"),
            Self::External { name, kind } => write!(f, "{name} ({kind})"),
        }
    }
}

/// Directed edge in the dependency graph. Never mutated after insertion
/// except for the `circular` flag, set once after cycle detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportEdge {
    pub source: String,
    pub target: EdgeTarget,
    pub kind: ImportKind,
    pub invalid: bool,
    pub circular: bool,
}

impl ImportEdge {
    pub fn new(source: impl Into<String>, target: EdgeTarget, kind: ImportKind) -> Self {
        Self {
            source: source.into(),
            target,
            kind,
            invalid: false,
            circular: false,
        }
    }

    pub fn invalid(mut self) -> Self {
        self.invalid = true;
        self
    }
}

/// Per-file aggregate of import relationships. Created lazily on first
/// reference by either endpoint of an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRelationship {
    /// Everything this file imports: resolved paths for project-local
    /// targets, raw names otherwise.
    pub imports: im::HashSet<String>,
    /// Project files that import this file.
    pub imported_by: im::HashSet<String>,
    pub stdlib: im::HashSet<String>,
    pub thirdparty: im::HashSet<String>,
    pub local: im::HashSet<String>,
    pub relative: im::HashSet<String>,
    pub invalid: im::HashSet<String>,
    /// Cycles this file participates in.
    pub cycles: im::HashSet<Cycle>,
}

impl ImportRelationship {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_cycle(&self) -> bool {
        !self.cycles.is_empty()
    }
}

/// A simple cycle in the dependency graph, stored in canonical rotation
/// (lexicographically smallest node first) so cycle sets compare
/// deterministically across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cycle {
    nodes: Vec<String>,
}

impl Cycle {
    pub fn new(nodes: Vec<String>) -> Self {
        Self {
            nodes: canonical_rotation(nodes),
        }
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    /// Successive (from, to) pairs of the closed walk, including the wrap
    /// from the last node back to the first.
    pub fn edge_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        let wrap = self
            .nodes
            .last()
            .zip(self.nodes.first())
            .map(|(a, b)| (a.as_str(), b.as_str()));
        self.nodes
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .chain(wrap)
    }
}

/// Rotate so the smallest node comes first. Simple cycles visit each node
/// once, so the minimum is unique.
fn canonical_rotation(nodes: Vec<String>) -> Vec<String> {
    if nodes.is_empty() {
        return nodes;
    }
    let min_idx = nodes
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let mut rotated = Vec::with_capacity(nodes.len());
    rotated.extend_from_slice(&nodes[min_idx..]);
    rotated.extend_from_slice(&nodes[..min_idx]);
    rotated
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{node} -> ")?;
        }
        match self.nodes.first() {
            Some(first) => write!(f, "{first}"),
            None => Ok(()),
        }
    }
}

/// Aggregate counters and rankings over a completed analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportStats {
    pub total_imports: usize,
    pub unique_imports: usize,
    pub stdlib_imports: usize,
    pub thirdparty_imports: usize,
    pub local_imports: usize,
    pub relative_imports: usize,
    pub invalid_imports: usize,
    pub unused_imports: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub circular_refs_count: usize,
    /// Top-10 import names by occurrence count.
    pub most_common_imports: Vec<(String, usize)>,
    /// Top-10 files by number of imports.
    pub heaviest_importers: Vec<(String, usize)>,
    pub complexity_score: f64,
}

/// Pipeline state reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Idle,
    Enumerating,
    Analyzing,
    GraphComplete,
    CyclesFound,
    Scored,
    Done,
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Enumerating => "enumerating",
            Self::Analyzing => "analyzing",
            Self::GraphComplete => "graph complete",
            Self::CyclesFound => "cycles found",
            Self::Scored => "scored",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Immutable snapshot returned by the orchestrator. Later runs produce a
/// new snapshot; this one is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResults {
    pub project_root: PathBuf,
    pub timestamp: DateTime<Utc>,
    pub files: Vec<SourceFile>,
    pub graph: crate::graph::DependencyGraph,
    pub stats: ImportStats,
    pub errors: Vec<crate::errors::ErrorRecord>,
}

impl ValidationResults {
    pub fn cycles(&self) -> &[Cycle] {
        self.graph.cycles()
    }

    pub fn has_cycles(&self) -> bool {
        self.stats.circular_refs_count > 0
    }
}
