//! Offline construction of the document graph induced by an edge schema.
//!
//! Declarative: no adapter involved. Intended for analysis of a corpus
//! before (or instead of) running traversals against it.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;

use crate::content::Content;
use crate::edges::{Edge, EdgeFunction};
use crate::error::{RagraphError, Result};

/// Directed graph over a document collection. Vertices carry document ids;
/// an arc `u -> v` exists when some outgoing edge of `u` structurally
/// equals an incoming edge of `v`. Self-loops are omitted.
pub struct DocumentGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl DocumentGraph {
    /// Build the graph for `contents` under the given edge schema.
    pub fn build(contents: &[Content], edge_function: &dyn EdgeFunction) -> Result<Self> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut indices: HashMap<String, NodeIndex> = HashMap::new();
        let mut incoming_index: HashMap<Edge, Vec<NodeIndex>> = HashMap::new();
        let mut content_edges = Vec::with_capacity(contents.len());

        for content in contents {
            if content.id.is_empty() {
                return Err(RagraphError::MissingId);
            }
            if indices.contains_key(&content.id) {
                log::warn!("Duplicate document id '{}' ignored", content.id);
                continue;
            }
            let index = graph.add_node(content.id.clone());
            indices.insert(content.id.clone(), index);
            let edges = edge_function.edges(content);
            for edge in &edges.incoming {
                incoming_index.entry(edge.clone()).or_default().push(index);
            }
            content_edges.push((index, edges));
        }

        for (source, edges) in &content_edges {
            for edge in &edges.outgoing {
                let Some(targets) = incoming_index.get(edge) else {
                    continue;
                };
                for &target in targets {
                    if target != *source {
                        graph.update_edge(*source, target, ());
                    }
                }
            }
        }

        Ok(Self { graph, indices })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.indices.contains_key(id)
    }

    /// Ids reachable from `id` over one outgoing arc.
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let Some(&index) = self.indices.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<String> = self
            .graph
            .neighbors(index)
            .map(|n| self.graph[n].clone())
            .collect();
        ids.sort();
        ids
    }

    /// Underlying petgraph view for further analysis.
    pub fn graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    /// Partition the documents into communities: connected components over
    /// the undirected view of the graph. Components are ordered by first
    /// appearance, members by insertion order.
    pub fn communities(&self) -> Vec<Vec<String>> {
        let mut sets = UnionFind::new(self.graph.node_count());
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut group_of_root: HashMap<usize, usize> = HashMap::new();
        for index in self.graph.node_indices() {
            let root = sets.find(index.index());
            let group = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[group].push(self.graph[index].clone());
        }
        groups
    }
}
