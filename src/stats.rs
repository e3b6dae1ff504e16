//! Aggregation of per-import facts into project-wide statistics.

use crate::core::{ImportKind, ImportStats};
use crate::graph::DependencyGraph;
use std::collections::HashMap;

/// Length of the most-common / heaviest-importer rankings.
const RANKING_LIMIT: usize = 10;

/// One observed import statement, flattened for counting.
///
/// `invalid` is not the same as `kind == Invalid`: a relative or local
/// import that failed to resolve keeps its classified kind and is counted
/// in both its own category and the invalid total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFact {
    pub file: String,
    pub name: String,
    pub kind: ImportKind,
    pub used: bool,
    pub invalid: bool,
}

pub fn build_stats(facts: &[ImportFact], graph: &DependencyGraph) -> ImportStats {
    let mut stats = ImportStats {
        total_imports: facts.len(),
        total_nodes: graph.node_count(),
        total_edges: graph.edge_count(),
        circular_refs_count: graph.cycles().len(),
        ..Default::default()
    };

    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    let mut file_counts: HashMap<&str, usize> = HashMap::new();
    for fact in facts {
        *name_counts.entry(fact.name.as_str()).or_default() += 1;
        *file_counts.entry(fact.file.as_str()).or_default() += 1;

        match fact.kind {
            ImportKind::Stdlib => stats.stdlib_imports += 1,
            ImportKind::ThirdParty => stats.thirdparty_imports += 1,
            ImportKind::Local => stats.local_imports += 1,
            ImportKind::Relative => stats.relative_imports += 1,
            ImportKind::Invalid => {}
        }
        if fact.invalid {
            stats.invalid_imports += 1;
        }
        if !fact.used {
            stats.unused_imports += 1;
        }
    }

    stats.unique_imports = name_counts.len();
    stats.most_common_imports = top_ranked(name_counts);
    stats.heaviest_importers = top_ranked(file_counts);
    stats
}

/// Sort by count descending, name ascending on ties, and keep the head.
fn top_ranked(counts: HashMap<&str, usize>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(RANKING_LIMIT);
    ranked
}
