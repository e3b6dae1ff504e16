//! Error sinks: composable destinations for collected records.

use crate::errors::{ErrorKind, ErrorRecord};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;

/// Destination for error records. Sinks never alter analysis behavior;
/// they only observe.
pub trait ErrorSink: Send + Sync {
    fn report(&self, record: &ErrorRecord);

    fn report_all(&self, records: &[ErrorRecord]) {
        for record in records {
            self.report(record);
        }
    }
}

/// Writes records to stderr with severity coloring.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }

    fn colorize(record: &ErrorRecord) -> String {
        let rendered = record.to_string();
        match record.kind {
            ErrorKind::Parse | ErrorKind::Read | ErrorKind::Analysis => {
                rendered.red().to_string()
            }
            ErrorKind::InvalidImport | ErrorKind::CircularImport => {
                rendered.yellow().to_string()
            }
            ErrorKind::UnusedImport => rendered.normal().to_string(),
        }
    }
}

impl ErrorSink for ConsoleSink {
    fn report(&self, record: &ErrorRecord) {
        eprintln!("{}", Self::colorize(record));
    }
}

/// Routes records through the `log` facade at warn level.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorSink for LogSink {
    fn report(&self, record: &ErrorRecord) {
        log::warn!("{record}");
    }
}

/// Appends records to a file, one per line. Write failures are logged and
/// otherwise ignored; a broken sink must not fail the run.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ErrorSink for FileSink {
    fn report(&self, record: &ErrorRecord) {
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{record}"));
        if let Err(e) = result {
            log::warn!("failed to append to {}: {e}", self.path.display());
        }
    }
}

/// Fans records out to any number of inner sinks.
#[derive(Default)]
pub struct CompositeSink {
    sinks: Vec<Box<dyn ErrorSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ErrorSink for CompositeSink {
    fn report(&self, record: &ErrorRecord) {
        for sink in &self.sinks {
            sink.report(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CollectingSink {
        seen: Mutex<Vec<ErrorRecord>>,
    }

    impl CollectingSink {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ErrorSink for &'static CollectingSink {
        fn report(&self, record: &ErrorRecord) {
            self.seen.lock().unwrap().push(record.clone());
        }
    }

    #[test]
    fn composite_fans_out_to_every_sink() {
        let first: &'static CollectingSink = Box::leak(Box::new(CollectingSink::new()));
        let second: &'static CollectingSink = Box::leak(Box::new(CollectingSink::new()));
        let composite = CompositeSink::new().with(first).with(second);

        let record = ErrorRecord::unused_import("src/a.py", "os", 3);
        composite.report(&record);

        assert_eq!(first.seen.lock().unwrap().len(), 1);
        assert_eq!(second.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn report_all_preserves_order() {
        let sink: &'static CollectingSink = Box::leak(Box::new(CollectingSink::new()));
        let records = vec![
            ErrorRecord::unused_import("src/a.py", "os", 1),
            ErrorRecord::unused_import("src/a.py", "sys", 2),
        ];
        ErrorSink::report_all(&sink, &records);

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen[0].line, Some(1));
        assert_eq!(seen[1].line, Some(2));
    }

    #[test]
    fn file_sink_appends_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let sink = FileSink::new(&path);

        sink.report(&ErrorRecord::unused_import("src/a.py", "os", 1));
        sink.report(&ErrorRecord::unused_import("src/a.py", "sys", 2));

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
