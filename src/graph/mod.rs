//! The file dependency graph and per-file relationship records.
//!
//! Edges are deduplicated on (source, target) and relationship updates go
//! through one mutation point with set semantics, so replaying the same
//! import never double-counts anything.

pub mod cycles;

use crate::core::{Cycle, EdgeTarget, ImportEdge, ImportKind, ImportRelationship};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    nodes: im::OrdSet<String>,
    edges: im::OrdMap<String, ImportEdge>,
    relationships: im::OrdMap<String, ImportRelationship>,
    cycles: Vec<Cycle>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge, creating graph nodes for the source and any resolved
    /// file target. Returns false when the (source, target) pair is already
    /// present.
    pub fn add_edge(&mut self, edge: ImportEdge) -> bool {
        let key = edge_key(&edge.source, &edge.target);
        if self.edges.contains_key(&key) {
            return false;
        }
        self.nodes.insert(edge.source.clone());
        if let Some(file) = edge.target.as_file() {
            self.nodes.insert(file.to_string());
        }
        self.update_import_relationship(&edge.source, &edge.target, edge.kind);
        if edge.invalid {
            let entry = self
                .relationships
                .entry(edge.source.clone())
                .or_insert_with(ImportRelationship::new);
            entry.invalid.insert(target_label(&edge.target).to_string());
        }
        self.edges.insert(key, edge);
        true
    }

    /// The single mutation point for relationship records: adds the target
    /// to the source's imports and kind subset, and the source to the
    /// target's `imported_by` when the target is a project file.
    pub fn update_import_relationship(
        &mut self,
        source: &str,
        target: &EdgeTarget,
        kind: ImportKind,
    ) {
        let label = target_label(target).to_string();
        let entry = self
            .relationships
            .entry(source.to_string())
            .or_insert_with(ImportRelationship::new);
        entry.imports.insert(label.clone());
        match kind {
            ImportKind::Stdlib => entry.stdlib.insert(label.clone()),
            ImportKind::ThirdParty => entry.thirdparty.insert(label.clone()),
            ImportKind::Local => entry.local.insert(label.clone()),
            ImportKind::Relative => entry.relative.insert(label.clone()),
            ImportKind::Invalid => entry.invalid.insert(label.clone()),
        };

        if kind.is_project_local() {
            if let Some(file) = target.as_file() {
                let reverse = self
                    .relationships
                    .entry(file.to_string())
                    .or_insert_with(ImportRelationship::new);
                reverse.imported_by.insert(source.to_string());
            }
        }
    }

    /// Adjacency over resolved file-to-file edges only, in sorted order.
    /// External targets cannot participate in cycles.
    pub fn adjacency(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for edge in self.edges.values() {
            if let Some(file) = edge.target.as_file() {
                adjacency
                    .entry(edge.source.clone())
                    .or_default()
                    .insert(file.to_string());
            }
        }
        adjacency
    }

    /// Record detected cycles: stores the set, stamps the `circular` flag on
    /// every edge that lies along one, and adds each cycle to the membership
    /// set of every node it visits.
    pub fn apply_cycles(&mut self, cycles: Vec<Cycle>) {
        for cycle in &cycles {
            for node in cycle.nodes() {
                let entry = self
                    .relationships
                    .entry(node.clone())
                    .or_insert_with(ImportRelationship::new);
                entry.cycles.insert(cycle.clone());
            }
            for (from, to) in cycle.edge_pairs() {
                let key = edge_key(from, &EdgeTarget::File(to.to_string()));
                if let Some(edge) = self.edges.get_mut(&key) {
                    edge.circular = true;
                }
            }
        }
        self.cycles = cycles;
    }

    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter()
    }

    pub fn contains_node(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &ImportEdge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn relationships(&self) -> impl Iterator<Item = (&String, &ImportRelationship)> {
        self.relationships.iter()
    }

    pub fn relationship(&self, node: &str) -> Option<&ImportRelationship> {
        self.relationships.get(node)
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }
}

fn edge_key(source: &str, target: &EdgeTarget) -> String {
    format!("{source} -> {}", target.key())
}

fn target_label(target: &EdgeTarget) -> &str {
    match target {
        EdgeTarget::File(path) => path,
        EdgeTarget::External { name, .. } => name,
    }
}
