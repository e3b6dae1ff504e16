//! Simple-cycle enumeration for the dependency graph.
//!
//! Johnson's algorithm: starting from each vertex in ascending order, the
//! search is restricted to the strongly connected component of the
//! remaining vertices, and a blocked-set discipline keeps the walk from
//! revisiting dead branches. Self-loops are split off first as length-1
//! cycles. For a fixed graph the returned set is identical across runs.

use crate::core::Cycle;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::NodeFiltered;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Enumerate every simple cycle in the adjacency map, sorted and in
/// canonical rotation. Each cycle appears exactly once.
pub fn find_simple_cycles(adjacency: &BTreeMap<String, BTreeSet<String>>) -> Vec<Cycle> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for (source, targets) in adjacency {
        names.insert(source.as_str());
        for target in targets {
            names.insert(target.as_str());
        }
    }
    let names: Vec<&str> = names.into_iter().collect();
    let index_of: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(index, name)| (*name, index))
        .collect();

    let mut cycles = Vec::new();
    let mut graph: DiGraph<(), ()> = DiGraph::new();
    let node_ids: Vec<NodeIndex> = names.iter().map(|_| graph.add_node(())).collect();

    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); names.len()];
    for (source, targets) in adjacency {
        let from = index_of[source.as_str()];
        for target in targets {
            let to = index_of[target.as_str()];
            if from == to {
                cycles.push(Cycle::new(vec![source.clone()]));
                continue;
            }
            neighbors[from].push(to);
            graph.add_edge(node_ids[from], node_ids[to], ());
        }
    }
    // Names are sorted, so ascending index order is ascending name order;
    // the search visits neighbors in that order to stay deterministic.
    for list in &mut neighbors {
        list.sort_unstable();
    }

    let search = CircuitSearch {
        names: &names,
        neighbors: &neighbors,
    };
    let mut state = SearchState::new(names.len());

    for start in 0..names.len() {
        // Only the strongly connected component of the not-yet-started
        // vertices can contain a cycle through `start`.
        let filtered = NodeFiltered::from_fn(&graph, move |n: NodeIndex| n.index() >= start);
        let components = tarjan_scc(&filtered);
        let Some(component) = components
            .into_iter()
            .find(|scc| scc.iter().any(|n| n.index() == start))
        else {
            continue;
        };
        if component.len() < 2 {
            continue;
        }
        let members: HashSet<usize> = component.iter().map(|n| n.index()).collect();
        state.reset();
        search.circuit(start, start, &members, &mut state, &mut cycles);
    }

    cycles.sort();
    cycles
}

struct CircuitSearch<'a> {
    names: &'a [&'a str],
    neighbors: &'a [Vec<usize>],
}

impl CircuitSearch<'_> {
    fn circuit(
        &self,
        v: usize,
        start: usize,
        members: &HashSet<usize>,
        state: &mut SearchState,
        out: &mut Vec<Cycle>,
    ) -> bool {
        let mut found = false;
        state.stack.push(v);
        state.blocked[v] = true;

        for &w in &self.neighbors[v] {
            if !members.contains(&w) {
                continue;
            }
            if w == start {
                let nodes = state
                    .stack
                    .iter()
                    .map(|&i| self.names[i].to_string())
                    .collect();
                out.push(Cycle::new(nodes));
                found = true;
            } else if !state.blocked[w] && self.circuit(w, start, members, state, out) {
                found = true;
            }
        }

        if found {
            state.unblock(v);
        } else {
            for &w in &self.neighbors[v] {
                if members.contains(&w) {
                    state.block_map[w].insert(v);
                }
            }
        }

        state.stack.pop();
        found
    }
}

struct SearchState {
    blocked: Vec<bool>,
    block_map: Vec<BTreeSet<usize>>,
    stack: Vec<usize>,
}

impl SearchState {
    fn new(n: usize) -> Self {
        Self {
            blocked: vec![false; n],
            block_map: vec![BTreeSet::new(); n],
            stack: Vec::new(),
        }
    }

    fn reset(&mut self) {
        for b in &mut self.blocked {
            *b = false;
        }
        for pending in &mut self.block_map {
            pending.clear();
        }
        self.stack.clear();
    }

    fn unblock(&mut self, v: usize) {
        self.blocked[v] = false;
        let pending = std::mem::take(&mut self.block_map[v]);
        for u in pending {
            if self.blocked[u] {
                self.unblock(u);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(edges: &[(&str, &str)]) -> BTreeMap<String, BTreeSet<String>> {
        let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (from, to) in edges {
            adjacency
                .entry(from.to_string())
                .or_default()
                .insert(to.to_string());
        }
        adjacency
    }

    #[test]
    fn triangle_yields_one_cycle() {
        let cycles = find_simple_cycles(&adjacency(&[("a", "b"), ("b", "c"), ("c", "a")]));
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
        for node in ["a", "b", "c"] {
            assert!(cycles[0].contains(node));
        }
    }

    #[test]
    fn acyclic_graph_yields_nothing() {
        let cycles = find_simple_cycles(&adjacency(&[("a", "b"), ("b", "c"), ("a", "c")]));
        assert!(cycles.is_empty());
    }

    #[test]
    fn self_loop_is_a_length_one_cycle() {
        let cycles = find_simple_cycles(&adjacency(&[("a", "a"), ("a", "b")]));
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 1);
        assert!(cycles[0].contains("a"));
    }

    #[test]
    fn disjoint_cycles_are_both_found() {
        let cycles =
            find_simple_cycles(&adjacency(&[("a", "b"), ("b", "a"), ("c", "d"), ("d", "c")]));
        assert_eq!(cycles.len(), 2);
        assert!(cycles.iter().all(|c| c.len() == 2));
    }

    #[test]
    fn cycles_sharing_a_node_stay_distinct() {
        // Figure eight through a: a -> b -> a and a -> c -> a.
        let cycles =
            find_simple_cycles(&adjacency(&[("a", "b"), ("b", "a"), ("a", "c"), ("c", "a")]));
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn complete_digraph_on_three_nodes_has_five_cycles() {
        let cycles = find_simple_cycles(&adjacency(&[
            ("a", "b"),
            ("b", "a"),
            ("a", "c"),
            ("c", "a"),
            ("b", "c"),
            ("c", "b"),
        ]));
        // Three 2-cycles plus the two orientations of the triangle.
        assert_eq!(cycles.len(), 5);
        assert_eq!(cycles.iter().filter(|c| c.len() == 2).count(), 3);
        assert_eq!(cycles.iter().filter(|c| c.len() == 3).count(), 2);
    }

    #[test]
    fn enumeration_is_deterministic() {
        let adj = adjacency(&[
            ("m", "n"),
            ("n", "o"),
            ("o", "m"),
            ("n", "m"),
            ("o", "o"),
        ]);
        let first = find_simple_cycles(&adj);
        let second = find_simple_cycles(&adj);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn empty_graph_yields_nothing() {
        assert!(find_simple_cycles(&BTreeMap::new()).is_empty());
    }
}
