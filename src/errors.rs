//! Per-file error records collected during a validation run.
//!
//! Fatal errors travel as [`crate::core::errors::Error`]; everything scoped
//! to a single file or finding becomes an [`ErrorRecord`] in the results,
//! including the synthesized records for invalid, unused, and circular
//! imports the user must see.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod reporting;

/// Category of a collected finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Source could not be parsed; the file is excluded from the graph.
    Parse,
    /// File could not be read.
    Read,
    /// Unexpected failure while walking a parsed tree.
    Analysis,
    /// Import that resolved to nothing known.
    InvalidImport,
    /// Import bound to a name the file never uses.
    UnusedImport,
    /// Import participating in a dependency cycle.
    CircularImport,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parse => "parse error",
            Self::Read => "read error",
            Self::Analysis => "analysis error",
            Self::InvalidImport => "invalid import",
            Self::UnusedImport => "unused import",
            Self::CircularImport => "circular import",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One finding tied to a file, with an optional line and free-form context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub file: String,
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ErrorRecord {
    pub fn new(file: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            message: message.into(),
            line: None,
            context: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::new(file, ErrorKind::Parse, message).with_line(line)
    }

    pub fn read(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, ErrorKind::Read, message)
    }

    pub fn invalid_import(file: impl Into<String>, name: &str, line: usize) -> Self {
        Self::new(
            file,
            ErrorKind::InvalidImport,
            format!("cannot resolve import '{name}'"),
        )
        .with_line(line)
    }

    pub fn unused_import(file: impl Into<String>, name: &str, line: usize) -> Self {
        Self::new(
            file,
            ErrorKind::UnusedImport,
            format!("import '{name}' is never used"),
        )
        .with_line(line)
    }

    pub fn circular_import(file: impl Into<String>, cycle: &crate::core::Cycle) -> Self {
        Self::new(
            file,
            ErrorKind::CircularImport,
            format!("import cycle: {cycle}"),
        )
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] {}:{}: {}", self.kind, self.file, line, self.message)?,
            None => write!(f, "[{}] {}: {}", self.kind, self.file, self.message)?,
        }
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

/// Format errors as a numbered, indented list.
pub fn format_error_list(errors: &[ErrorRecord]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  {}. {}", i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a full error report with a header line, or an empty string when
/// there is nothing to report.
pub fn format_error_report(errors: &[ErrorRecord]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let issue_count = if errors.len() == 1 {
        "1 issue".to_string()
    } else {
        format!("{} issues", errors.len())
    };

    format!("{issue_count} found:\n\n{}", format_error_list(errors))
}

/// Aggregated view over a run's error records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub total_count: usize,
    pub by_kind: HashMap<String, usize>,
    pub affected_files: Vec<String>,
}

impl ErrorSummary {
    pub fn from_records(errors: &[ErrorRecord]) -> Self {
        let mut by_kind: HashMap<String, usize> = HashMap::new();
        let mut affected: Vec<String> = Vec::new();

        for error in errors {
            *by_kind.entry(error.kind.label().to_string()).or_insert(0) += 1;
            if !affected.contains(&error.file) {
                affected.push(error.file.clone());
            }
        }

        Self {
            total_count: errors.len(),
            by_kind,
            affected_files: affected,
        }
    }

    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.by_kind.get(kind.label()).copied().unwrap_or(0)
    }
}
