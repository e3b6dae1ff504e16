//! Rendering [`ValidationResults`] for people and machines.
//!
//! Two consumers: a colored terminal report (summary, category breakdown,
//! top-10 rankings, cycle listing, numbered error report) and a pretty
//! JSON dump of the full results snapshot for downstream tooling.

use crate::core::{ImportStats, ValidationResults};
use crate::errors::format_error_report;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait OutputWriter {
    fn write_results(&mut self, results: &ValidationResults) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_results(&mut self, results: &ValidationResults) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(results)?;
        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_results(&mut self, results: &ValidationResults) -> anyhow::Result<()> {
        self.write_header(results)?;
        self.write_summary(results)?;
        self.write_categories(&results.stats)?;
        self.write_rankings(&results.stats)?;
        self.write_cycles(results)?;
        self.write_error_report(results)?;
        Ok(())
    }
}

impl<W: Write> TerminalWriter<W> {
    fn write_header(&mut self, results: &ValidationResults) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", "Import Validation Report".bold().blue())?;
        writeln!(self.writer, "{}", "========================".blue())?;
        writeln!(self.writer, "Project: {}", results.project_root.display())?;
        writeln!(
            self.writer,
            "Analyzed: {}",
            results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, results: &ValidationResults) -> anyhow::Result<()> {
        let stats = &results.stats;
        writeln!(self.writer, "{}", "Summary".bold())?;
        writeln!(self.writer, "  Files analyzed: {}", results.files.len())?;
        writeln!(self.writer, "  Total imports: {}", stats.total_imports)?;
        writeln!(self.writer, "  Unique names: {}", stats.unique_imports)?;
        writeln!(
            self.writer,
            "  Graph: {} nodes, {} edges",
            stats.total_nodes, stats.total_edges
        )?;
        writeln!(
            self.writer,
            "  Complexity score: {}",
            format!("{:.1}", stats.complexity_score).bold()
        )?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_categories(&mut self, stats: &ImportStats) -> anyhow::Result<()> {
        let rows = [
            ("stdlib", stats.stdlib_imports, false),
            ("third-party", stats.thirdparty_imports, false),
            ("local", stats.local_imports, false),
            ("relative", stats.relative_imports, false),
            ("invalid", stats.invalid_imports, true),
            ("unused", stats.unused_imports, true),
        ];

        let mut table = new_table();
        table.set_header(vec!["Category", "Count"]);
        for (label, count, highlight) in rows {
            let count = if highlight && count > 0 {
                count.to_string().red().to_string()
            } else {
                count.to_string()
            };
            table.add_row(vec![label.to_string(), count]);
        }
        writeln!(self.writer, "{table}")?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_rankings(&mut self, stats: &ImportStats) -> anyhow::Result<()> {
        if !stats.most_common_imports.is_empty() {
            writeln!(self.writer, "{}", "Most imported names".bold())?;
            writeln!(
                self.writer,
                "{}",
                ranking_table("Name", &stats.most_common_imports)
            )?;
            writeln!(self.writer)?;
        }
        if !stats.heaviest_importers.is_empty() {
            writeln!(self.writer, "{}", "Heaviest importers".bold())?;
            writeln!(
                self.writer,
                "{}",
                ranking_table("File", &stats.heaviest_importers)
            )?;
            writeln!(self.writer)?;
        }
        Ok(())
    }

    fn write_cycles(&mut self, results: &ValidationResults) -> anyhow::Result<()> {
        let cycles = results.cycles();
        if cycles.is_empty() {
            writeln!(self.writer, "{} no circular imports", "ok:".green().bold())?;
            writeln!(self.writer)?;
            return Ok(());
        }

        let noun = if cycles.len() == 1 { "cycle" } else { "cycles" };
        writeln!(
            self.writer,
            "{} {} import {noun}:",
            "warning:".yellow().bold(),
            cycles.len()
        )?;
        for (i, cycle) in cycles.iter().enumerate() {
            writeln!(self.writer, "  {}. {}", i + 1, cycle.to_string().yellow())?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_error_report(&mut self, results: &ValidationResults) -> anyhow::Result<()> {
        let report = format_error_report(&results.errors);
        if report.is_empty() {
            writeln!(self.writer, "{} no issues found", "ok:".green().bold())?;
        } else {
            writeln!(self.writer, "{report}")?;
        }
        Ok(())
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn ranking_table(label: &str, entries: &[(String, usize)]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", label, "Count"]);
    for (i, (name, count)) in entries.iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), name.clone(), count.to_string()]);
    }
    table
}

pub fn create_writer(format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(std::io::stdout())),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(std::io::stdout())),
    }
}

/// Render results to a string for file output.
pub fn format_results_to_string(
    results: &ValidationResults,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
        OutputFormat::Terminal => {
            let mut buffer = Vec::new();
            TerminalWriter::new(&mut buffer).write_results(results)?;
            Ok(String::from_utf8_lossy(&buffer).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileOrigin, ImportStats, SourceFile};
    use crate::errors::ErrorRecord;
    use crate::graph::DependencyGraph;
    use chrono::Utc;
    use std::path::PathBuf;

    fn sample_results() -> ValidationResults {
        let stats = ImportStats {
            total_imports: 4,
            unique_imports: 3,
            stdlib_imports: 2,
            invalid_imports: 1,
            total_nodes: 3,
            total_edges: 4,
            most_common_imports: vec![("os".to_string(), 2)],
            heaviest_importers: vec![("src/app.py".to_string(), 3)],
            complexity_score: 12.5,
            ..Default::default()
        };
        ValidationResults {
            project_root: PathBuf::from("/proj"),
            timestamp: Utc::now(),
            files: vec![SourceFile::new("src/app.py", FileOrigin::Source)],
            graph: DependencyGraph::new(),
            stats,
            errors: vec![ErrorRecord::invalid_import("src/app.py", "missing", 4)],
        }
    }

    #[test]
    fn json_writer_emits_parseable_results() {
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer)
            .write_results(&sample_results())
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["stats"]["total_imports"], 4);
        assert_eq!(value["stats"]["complexity_score"], 12.5);
    }

    #[test]
    fn terminal_report_includes_all_sections() {
        let rendered = format_results_to_string(&sample_results(), OutputFormat::Terminal).unwrap();
        assert!(rendered.contains("Import Validation Report"));
        assert!(rendered.contains("Summary"));
        assert!(rendered.contains("Most imported names"));
        assert!(rendered.contains("Heaviest importers"));
        assert!(rendered.contains("no circular imports"));
        assert!(rendered.contains("1 issue found"));
    }

    #[test]
    fn terminal_report_lists_cycles() {
        let mut results = sample_results();
        let cycle = crate::core::Cycle::new(vec!["src/a.py".into(), "src/b.py".into()]);
        results.graph.apply_cycles(vec![cycle]);
        let rendered = format_results_to_string(&results, OutputFormat::Terminal).unwrap();
        assert!(rendered.contains("1 import cycle:"));
        assert!(rendered.contains("src/a.py -> src/b.py -> src/a.py"));
    }

    #[test]
    fn json_string_form_matches_writer_output() {
        let results = sample_results();
        let from_string = format_results_to_string(&results, OutputFormat::Json).unwrap();
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer).write_results(&results).unwrap();
        assert_eq!(from_string.as_bytes(), &buffer[..buffer.len() - 1]);
    }
}
