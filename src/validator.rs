//! The validation pipeline: enumerate files, analyze each in parallel,
//! merge into the graph, detect cycles, score.
//!
//! Per-file failures never abort the run; they become error records in the
//! results. Only invalid weights and a missing project root are fatal, and
//! both are checked before any file is touched. Workers observe the
//! cancellation token between files, and the merge only sees completed
//! outcomes, so a cancelled run still yields a consistent partial snapshot.

use crate::analyzers::python::PythonExtractor;
use crate::analyzers::ImportExtractor;
use crate::classify::oracle::StdlibOracle;
use crate::classify::ImportClassifier;
use crate::config::ValidationConfig;
use crate::core::errors::{Error, Result};
use crate::core::{
    AnalysisPhase, EdgeTarget, FileOrigin, ImportEdge, ImportKind, ImportStatement, SourceFile,
    ValidationResults,
};
use crate::errors::{ErrorKind, ErrorRecord};
use crate::graph::cycles::find_simple_cycles;
use crate::graph::DependencyGraph;
use crate::io::traits::{FileSystem, OsFileSystem};
use crate::paths::PathNormalizer;
use crate::resolve::ModuleResolver;
use crate::scoring::calculate_complexity;
use crate::stats::{build_stats, ImportFact};
use chrono::Utc;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation handle. Cloning yields another handle to the same
/// flag; cancellation is sticky.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

pub struct ImportValidator {
    project_root: PathBuf,
    config: ValidationConfig,
    fs: Arc<dyn FileSystem>,
    extractor: Arc<dyn ImportExtractor>,
    token: CancellationToken,
    jobs: usize,
    show_progress: bool,
}

impl ImportValidator {
    pub fn new(project_root: impl Into<PathBuf>, config: ValidationConfig) -> Self {
        Self {
            project_root: project_root.into(),
            config,
            fs: Arc::new(OsFileSystem::new()),
            extractor: Arc::new(PythonExtractor::new()),
            token: CancellationToken::new(),
            jobs: 0,
            show_progress: false,
        }
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn ImportExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Worker count for per-file analysis. Zero means the default pool.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// A handle that cancels this validator's runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run the whole pipeline and return an immutable results snapshot.
    pub fn validate_all(&self) -> Result<ValidationResults> {
        self.config.weights.validate()?;
        if !self.fs.is_dir(&self.project_root) {
            return Err(Error::project(
                &self.project_root,
                "project root is not a directory",
            ));
        }

        log::debug!("phase: {}", AnalysisPhase::Enumerating);
        let mut files = self
            .fs
            .find_source_files(&self.project_root, &self.config.ignore_patterns)?;
        files.sort();
        log::info!(
            "analyzing {} files under {}",
            files.len(),
            self.project_root.display()
        );

        let normalizer = Arc::new(PathNormalizer::new(
            &self.project_root,
            &self.config.source_root,
            &self.config.tests_root,
        ));
        let classifier = ImportClassifier::new(
            &self.project_root,
            &self.config.source_root,
            &self.config.tests_root,
            Arc::new(StdlibOracle::new()),
            Arc::clone(&self.fs),
        )
        .with_valid_packages(self.config.known_packages());
        let resolver = ModuleResolver::new(
            &self.config.source_root,
            &self.config.tests_root,
            Arc::clone(&normalizer),
            Arc::clone(&self.fs),
        );

        log::debug!("phase: {}", AnalysisPhase::Analyzing);
        let progress = self.progress_bar(files.len());
        let outcomes = if self.jobs > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| Error::config(format!("failed to build worker pool: {e}")))?;
            pool.install(|| {
                self.analyze_files(&files, &progress, &normalizer, &classifier, &resolver)
            })
        } else {
            self.analyze_files(&files, &progress, &normalizer, &classifier, &resolver)
        };
        progress.finish_and_clear();

        // Single writer: fold completed outcomes into the shared structures
        // in file order.
        let mut graph = DependencyGraph::new();
        let mut facts: Vec<ImportFact> = Vec::new();
        let mut records: Vec<ErrorRecord> = Vec::new();
        let mut analyzed: Vec<SourceFile> = Vec::new();
        for outcome in outcomes.into_iter().flatten() {
            let FileOutcome {
                file,
                origin,
                imports,
                error,
            } = outcome;
            analyzed.push(SourceFile::new(file.as_str(), origin));
            if let Some(record) = error {
                records.push(record);
            }
            for import in imports {
                let ClassifiedImport {
                    statement,
                    kind,
                    target,
                    invalid,
                } = import;
                if invalid {
                    records.push(ErrorRecord::invalid_import(
                        file.as_str(),
                        &statement.name,
                        statement.line,
                    ));
                }
                if !statement.is_used {
                    records.push(ErrorRecord::unused_import(
                        file.as_str(),
                        &statement.name,
                        statement.line,
                    ));
                }
                let mut edge = ImportEdge::new(file.as_str(), target, kind);
                if invalid {
                    edge = edge.invalid();
                }
                graph.add_edge(edge);
                facts.push(ImportFact {
                    file: file.clone(),
                    name: statement.name,
                    kind,
                    used: statement.is_used,
                    invalid,
                });
            }
        }
        log::debug!("phase: {}", AnalysisPhase::GraphComplete);

        let cycles = find_simple_cycles(&graph.adjacency());
        log::debug!("phase: {} ({})", AnalysisPhase::CyclesFound, cycles.len());
        for cycle in &cycles {
            if let Some(first) = cycle.nodes().first() {
                records.push(ErrorRecord::circular_import(first.as_str(), cycle));
            }
        }
        graph.apply_cycles(cycles);

        let mut stats = build_stats(&facts, &graph);
        stats.complexity_score = calculate_complexity(&stats, &self.config.weights)?;
        log::debug!("phase: {}", AnalysisPhase::Scored);

        let results = ValidationResults {
            project_root: self.project_root.clone(),
            timestamp: Utc::now(),
            files: analyzed,
            graph,
            stats,
            errors: records,
        };
        log::debug!("phase: {}", AnalysisPhase::Done);
        Ok(results)
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template("[{bar:30}] {pos}/{len} files") {
            bar.set_style(style);
        }
        bar
    }

    fn analyze_files(
        &self,
        files: &[PathBuf],
        progress: &ProgressBar,
        normalizer: &PathNormalizer,
        classifier: &ImportClassifier,
        resolver: &ModuleResolver,
    ) -> Vec<Option<FileOutcome>> {
        files
            .par_iter()
            .progress_with(progress.clone())
            .map(|path| self.analyze_file(path, normalizer, classifier, resolver))
            .collect()
    }

    /// Extract, classify, and resolve one file. `None` when the run was
    /// cancelled before this file started.
    fn analyze_file(
        &self,
        path: &Path,
        normalizer: &PathNormalizer,
        classifier: &ImportClassifier,
        resolver: &ModuleResolver,
    ) -> Option<FileOutcome> {
        if self.token.is_cancelled() {
            return None;
        }

        let file = normalizer.normalize(path, true);
        let origin = if normalizer.is_test_file(path) {
            FileOrigin::Test
        } else {
            FileOrigin::Source
        };

        let source = match self.fs.read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                let record = ErrorRecord::read(file.clone(), e.to_string());
                return Some(FileOutcome::failed(file, origin, record));
            }
        };

        let extracted = match self.extractor.extract(&source, path) {
            Ok(extracted) => extracted,
            Err(Error::Parse { line, message, .. }) => {
                let record = ErrorRecord::parse(file.clone(), line, message);
                return Some(FileOutcome::failed(file, origin, record));
            }
            Err(e) => {
                let record = ErrorRecord::new(file.clone(), ErrorKind::Analysis, e.to_string());
                return Some(FileOutcome::failed(file, origin, record));
            }
        };

        let mut imports = Vec::with_capacity(extracted.imports.len());
        for statement in extracted.imports {
            let kind = classifier.classify(&statement.name, &file);
            let (target, invalid) = match kind {
                ImportKind::Local | ImportKind::Relative => {
                    match resolver.find_module_path(&statement.name, &file) {
                        Some(resolved) => (EdgeTarget::File(resolved), false),
                        None => (
                            EdgeTarget::External {
                                name: statement.name.clone(),
                                kind,
                            },
                            true,
                        ),
                    }
                }
                ImportKind::Invalid => (
                    EdgeTarget::External {
                        name: statement.name.clone(),
                        kind,
                    },
                    true,
                ),
                ImportKind::Stdlib | ImportKind::ThirdParty => (
                    EdgeTarget::External {
                        name: statement.name.clone(),
                        kind,
                    },
                    false,
                ),
            };
            imports.push(ClassifiedImport {
                statement,
                kind,
                target,
                invalid,
            });
        }

        Some(FileOutcome {
            file,
            origin,
            imports,
            error: None,
        })
    }
}

/// Everything one worker produced for one file.
struct FileOutcome {
    file: String,
    origin: FileOrigin,
    imports: Vec<ClassifiedImport>,
    error: Option<ErrorRecord>,
}

impl FileOutcome {
    fn failed(file: String, origin: FileOrigin, record: ErrorRecord) -> Self {
        Self {
            file,
            origin,
            imports: Vec::new(),
            error: Some(record),
        }
    }
}

struct ClassifiedImport {
    statement: ImportStatement,
    kind: ImportKind,
    target: EdgeTarget,
    invalid: bool,
}
