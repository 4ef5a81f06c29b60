//! Traversal engine: seed, expand, select, finalize.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Map;

use crate::adapters::{Adapter, AdapterOptions, MetadataFilter};
use crate::content::Content;
use crate::edges::{Edge, EdgeFunction, EdgeSpec, MetadataEdgeFunction};
use crate::error::{RagraphError, Result};
use crate::math::cosine_similarity_batch;
use crate::node::Node;
use crate::strategies::{NodeTracker, Strategy};

/// A single-shot graph traversal.
///
/// Combines similarity seeds and explicit root ids, then repeatedly expands
/// the frontier through the store's `adjacent` operation under the control
/// of the strategy. Running an instance a second time fails with
/// `AlreadyUsed`.
pub struct Traversal {
    store: Arc<dyn Adapter>,
    strategy: Box<dyn Strategy>,
    edges: Option<Arc<dyn EdgeFunction>>,
    metadata_filter: Option<MetadataFilter>,
    initial_root_ids: Vec<String>,
    store_options: AdapterOptions,
    used: bool,
}

impl Traversal {
    pub fn new(store: Arc<dyn Adapter>, strategy: Box<dyn Strategy>) -> Self {
        Self {
            store,
            strategy,
            edges: None,
            metadata_filter: None,
            initial_root_ids: Vec::new(),
            store_options: AdapterOptions::default(),
            used: false,
        }
    }

    /// Define the graph schema from declarative edge specs.
    pub fn with_edge_specs(mut self, specs: Vec<EdgeSpec>) -> Self {
        self.edges = Some(Arc::new(MetadataEdgeFunction::new(specs)));
        self
    }

    /// Define the graph schema from an arbitrary edge function.
    pub fn with_edge_function(mut self, edges: Arc<dyn EdgeFunction>) -> Self {
        self.edges = Some(edges);
        self
    }

    /// Filter applied to every adapter call.
    pub fn with_metadata_filter(mut self, filter: MetadataFilter) -> Self {
        self.metadata_filter = Some(filter);
        self
    }

    /// Ids guaranteed to be fetched as seeds, independent of similarity.
    pub fn with_initial_root_ids(mut self, ids: Vec<String>) -> Self {
        self.initial_root_ids = ids;
        self
    }

    /// Opaque options forwarded to the adapter on every call.
    pub fn with_store_options(mut self, options: AdapterOptions) -> Self {
        self.store_options = options;
        self
    }

    /// Run the traversal for `query` and return the finalized nodes.
    pub async fn run(&mut self, query: &str) -> Result<Vec<Node>> {
        if self.used {
            return Err(RagraphError::AlreadyUsed);
        }
        self.used = true;
        let edges = self.edges.clone().ok_or(RagraphError::MissingEdges)?;

        let store = Arc::clone(&self.store);
        let filter = self.metadata_filter.clone();
        let options = self.store_options.clone();
        let params = self.strategy.params().clone();

        // Both seed sources are dispatched together; roots come first in the
        // merged result.
        let root_ids = self.initial_root_ids.clone();
        let (roots, similar) = tokio::join!(
            async {
                if root_ids.is_empty() {
                    Ok(Vec::new())
                } else {
                    store.get(&root_ids, filter.as_ref(), &options).await
                }
            },
            async {
                if params.start_k == 0 {
                    Ok(None)
                } else {
                    store
                        .search_with_embedding(query, params.start_k, filter.as_ref(), &options)
                        .await
                        .map(Some)
                }
            }
        );

        let mut seeds = roots?;
        let mut query_embedding: Vec<f32> = Vec::new();
        if let Some((embedding, contents)) = similar? {
            query_embedding = embedding;
            seeds.extend(contents);
        }

        let mut tracker = NodeTracker::new(params.select_k, params.max_depth);
        let mut visited_edges: HashSet<Edge> = HashSet::new();
        let mut edge_depths: HashMap<Edge, usize> = HashMap::new();

        let seed_ids = materialize(
            &mut tracker,
            seeds,
            edges.as_ref(),
            &query_embedding,
            &edge_depths,
            true,
        )?;
        log::debug!("Traversal seeded with {} nodes", seed_ids.len());
        self.strategy.iteration(&seed_ids, &mut tracker);

        while !tracker.should_stop() {
            let frontier = tracker.drain_frontier();
            let mut round_edges: Vec<Edge> = Vec::new();
            'collect: for id in &frontier {
                let Some(node) = tracker.node(id) else {
                    continue;
                };
                let depth = node.depth + 1;
                let mut outgoing: Vec<Edge> = node.outgoing_edges.iter().cloned().collect();
                outgoing.sort();
                for edge in outgoing {
                    if visited_edges.contains(&edge) {
                        continue;
                    }
                    if let Some(budget) = params.max_traverse {
                        if visited_edges.len() >= budget {
                            log::debug!("Edge budget of {budget} reached");
                            break 'collect;
                        }
                    }
                    visited_edges.insert(edge.clone());
                    edge_depths.insert(edge.clone(), depth);
                    round_edges.push(edge);
                }
            }
            if round_edges.is_empty() {
                break;
            }

            let contents = store
                .adjacent(
                    &round_edges,
                    &query_embedding,
                    params.adjacent_k,
                    filter.as_ref(),
                    &options,
                )
                .await?;

            let new_ids = materialize(
                &mut tracker,
                contents,
                edges.as_ref(),
                &query_embedding,
                &edge_depths,
                false,
            )?;
            log::debug!(
                "Traversal round: {} edges expanded, {} new nodes",
                round_edges.len(),
                new_ids.len()
            );
            self.strategy.iteration(&new_ids, &mut tracker);
        }

        Ok(self.strategy.finalize(&mut tracker))
    }
}

/// Turn adapter contents into tracked nodes, skipping ids already
/// discovered. Similarity scores come from one batched cosine call against
/// the query embedding.
fn materialize(
    tracker: &mut NodeTracker,
    contents: Vec<Content>,
    edge_function: &dyn EdgeFunction,
    query_embedding: &[f32],
    edge_depths: &HashMap<Edge, usize>,
    seeds: bool,
) -> Result<Vec<String>> {
    let mut fresh: Vec<Content> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for content in contents {
        if tracker.contains(&content.id) || !seen.insert(content.id.clone()) {
            continue;
        }
        fresh.push(content);
    }

    let scores = cosine_similarity_batch(
        query_embedding,
        fresh.iter().map(|content| content.embedding.as_slice()),
    )?;

    let mut ids = Vec::with_capacity(fresh.len());
    for (content, similarity_score) in fresh.into_iter().zip(scores) {
        let content_edges = edge_function.edges(&content);
        let depth = if seeds {
            0
        } else {
            content_edges
                .incoming
                .iter()
                .filter_map(|edge| edge_depths.get(edge))
                .min()
                .copied()
                .unwrap_or(0)
        };
        let id = content.id.clone();
        tracker.insert_node(Node {
            id: id.clone(),
            content: content.content,
            embedding: content.embedding,
            metadata: content.metadata,
            depth,
            similarity_score,
            incoming_edges: content_edges.incoming,
            outgoing_edges: content_edges.outgoing,
            extra_metadata: Map::new(),
        });
        ids.push(id);
    }
    Ok(ids)
}

/// Convenience entry point: build a [`Traversal`] over declarative edge
/// specs and run it once.
pub async fn traverse(
    query: &str,
    store: Arc<dyn Adapter>,
    edge_specs: Vec<EdgeSpec>,
    strategy: Box<dyn Strategy>,
) -> Result<Vec<Node>> {
    Traversal::new(store, strategy)
        .with_edge_specs(edge_specs)
        .run(query)
        .await
}
