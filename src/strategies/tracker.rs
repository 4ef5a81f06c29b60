//! Node bookkeeping shared by every strategy: discovery, selection order,
//! the frontier, and termination.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::node::{Node, DEPTH_KEY, SIMILARITY_SCORE_KEY};

/// Owns all nodes discovered during one traversal and enforces depth,
/// uniqueness and termination.
///
/// Strategies drive it through [`select`](NodeTracker::select),
/// [`traverse`](NodeTracker::traverse) and
/// [`annotate`](NodeTracker::annotate); the engine feeds it nodes and drains
/// its frontier.
pub struct NodeTracker {
    select_k: usize,
    max_depth: Option<usize>,
    nodes: HashMap<String, Node>,
    selected: Vec<String>,
    to_traverse: Vec<String>,
    traversed: HashSet<String>,
}

impl NodeTracker {
    pub(crate) fn new(select_k: usize, max_depth: Option<usize>) -> Self {
        Self {
            select_k,
            max_depth,
            nodes: HashMap::new(),
            selected: Vec::new(),
            to_traverse: Vec::new(),
            traversed: HashSet::new(),
        }
    }

    /// Look up a discovered node.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// How many more nodes may be selected before `select_k` is reached.
    pub fn num_remaining(&self) -> usize {
        self.select_k.saturating_sub(self.selected.len())
    }

    /// True once the output quota is met or the frontier is empty.
    pub fn should_stop(&self) -> bool {
        self.num_remaining() == 0 || self.to_traverse.is_empty()
    }

    /// Append nodes to the output in order, stamping `_depth` and
    /// `_similarity_score` annotations.
    pub fn select(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.extra_metadata
                    .insert(DEPTH_KEY.to_string(), Value::from(node.depth));
                node.extra_metadata.insert(
                    SIMILARITY_SCORE_KEY.to_string(),
                    Value::from(node.similarity_score as f64),
                );
                self.selected.push(id.clone());
            }
        }
    }

    /// Queue nodes for expansion in the next round. Nodes already queued
    /// once, and nodes at or beyond `max_depth`, are skipped. Returns the
    /// count actually queued.
    pub fn traverse(&mut self, ids: &[String]) -> usize {
        let mut queued = 0;
        for id in ids {
            if self.traversed.contains(id) {
                continue;
            }
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if let Some(max_depth) = self.max_depth {
                if node.depth >= max_depth {
                    continue;
                }
            }
            self.traversed.insert(id.clone());
            self.to_traverse.push(id.clone());
            queued += 1;
        }
        queued
    }

    /// `select` then `traverse`; returns the traverse count.
    pub fn select_and_traverse(&mut self, ids: &[String]) -> usize {
        self.select(ids);
        self.traverse(ids)
    }

    /// Write a strategy annotation into a node's `extra_metadata`.
    pub fn annotate(&mut self, id: &str, key: &str, value: Value) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.extra_metadata.insert(key.to_string(), value);
        }
    }

    /// Insert a freshly materialized node. Returns false if the id was
    /// already discovered.
    pub(crate) fn insert_node(&mut self, node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Take the current frontier, leaving it empty.
    pub(crate) fn drain_frontier(&mut self) -> Vec<String> {
        std::mem::take(&mut self.to_traverse)
    }

    /// Extract up to `limit` selected nodes in selection order.
    pub fn take_selected(&mut self, limit: usize) -> Vec<Node> {
        self.selected
            .iter()
            .take(limit)
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect()
    }
}
