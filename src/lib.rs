// Export modules for library usage
pub mod analyzers;
pub mod classify;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod graph;
pub mod io;
pub mod paths;
pub mod resolve;
pub mod scoring;
pub mod stats;
pub mod validator;

// Re-export commonly used types
pub use crate::core::errors::{Error, Result};
pub use crate::core::{
    AnalysisPhase, Cycle, EdgeTarget, FileOrigin, ImportEdge, ImportKind, ImportRelationship,
    ImportStatement, ImportStats, SourceFile, ValidationResults,
};

pub use crate::analyzers::{python::PythonExtractor, FileImports, ImportExtractor};
pub use crate::classify::{oracle::NamespaceOracle, oracle::StdlibOracle, ImportClassifier};
pub use crate::config::{load_config, load_config_file, ValidationConfig};
pub use crate::errors::reporting::{CompositeSink, ConsoleSink, ErrorSink, FileSink, LogSink};
pub use crate::errors::{ErrorKind, ErrorRecord, ErrorSummary};
pub use crate::graph::{cycles::find_simple_cycles, DependencyGraph};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::paths::PathNormalizer;
pub use crate::resolve::ModuleResolver;
pub use crate::scoring::{calculate_complexity, WeightConfig};
pub use crate::stats::{build_stats, ImportFact};
pub use crate::validator::{CancellationToken, ImportValidator};
